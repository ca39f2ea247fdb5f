//! The seam where an `HttpRequest` becomes a network round-trip.
//!
//! Implementations must hand back non-2xx responses as data; status
//! interpretation belongs to `LbsClient`. Only failures that produce no
//! response at all map to `ApiError::Transport`.

use std::future::Future;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP request. No retries, no timeouts of its own.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use super::*;
    use crate::http::HttpMethod;

    /// `Transport` backed by a shared `reqwest::Client`.
    ///
    /// Timeouts, proxies and TLS settings are configured on the client passed
    /// to `with_client`.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl Transport for ReqwestTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let url = request.url();
            let builder = match request.method {
                HttpMethod::Get => self.client.get(&url),
            };
            let response = builder
                .send()
                .await
                .map_err(|e| ApiError::Transport(e.without_url().to_string()))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| ApiError::Transport(e.without_url().to_string()))?;
            Ok(HttpResponse { status, body })
        }
    }
}
