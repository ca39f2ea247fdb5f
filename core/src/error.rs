//! Error types for the LBS client.
//!
//! # Design
//! Three families of failure exist. Configuration errors are raised at
//! construction, before any request is built. Transport errors cover the
//! HTTP exchange itself (network, non-2xx, unparseable body). Validation
//! errors are produced only by the coordinate transform, the one call whose
//! body is inspected. Vendor error envelopes on every other call are not
//! errors here: they are returned to the caller as data.

use thiserror::Error;

/// Coarse grouping of `ApiError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Validation,
}

/// Errors returned by `LbsClient` and `LbsService`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API token (`ak`) was absent or empty.
    #[error("missing Baidu API token")]
    MissingToken,

    /// Configuration could not be loaded or extracted.
    #[error("failed to load configuration: {0}")]
    Config(String),

    /// The request never produced a response (connect, TLS, I/O).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body was not valid JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The transform response carried no data at all.
    #[error("baidu api response without data")]
    NoData,

    /// The transform response reported a non-zero (or missing) status.
    #[error("baidu api status not ok (status: {})", .status.map_or_else(|| "missing".to_string(), |s| s.to_string()))]
    StatusNotOk { status: Option<i64> },

    /// The transform response carried a `status` that is not an integer.
    #[error("baidu api status is not an integer (status: {0})")]
    StatusNotInteger(String),

    /// The transform response had no usable `result` entry.
    #[error("baidu api response missing transform result")]
    MissingTransformResult,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::MissingToken | ApiError::Config(_) => ErrorKind::Configuration,
            ApiError::Transport(_) | ApiError::Http { .. } | ApiError::Deserialization(_) => {
                ErrorKind::Transport
            }
            ApiError::NoData
            | ApiError::StatusNotOk { .. }
            | ApiError::StatusNotInteger(_)
            | ApiError::MissingTransformResult => ErrorKind::Validation,
        }
    }
}

impl From<figment::Error> for ApiError {
    fn from(e: figment::Error) -> Self {
        ApiError::Config(e.to_string())
    }
}
