//! Async facade: one method per endpoint, one request per call.
//!
//! # Design
//! `LbsService` pairs an immutable `LbsClient` with a `Transport`. Each
//! method builds the request, hands it to the transport once, and parses the
//! response. Calls share nothing mutable, so they can run concurrently on
//! the same service; ordering between them is the server's business.

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::LbsClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{Conversion, NewColumn, NewTable, Page, PoiInput};

#[derive(Debug, Clone)]
pub struct LbsService<T> {
    client: LbsClient,
    transport: T,
}

#[cfg(feature = "reqwest")]
impl LbsService<crate::transport::ReqwestTransport> {
    /// Service against the public endpoint using a default reqwest client.
    pub fn from_token(token: &str) -> Result<Self, ApiError> {
        Ok(Self::new(
            LbsClient::new(token)?,
            crate::transport::ReqwestTransport::new(),
        ))
    }
}

impl<T: Transport> LbsService<T> {
    pub fn new(client: LbsClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &LbsClient {
        &self.client
    }

    pub async fn search(&self, city: &str, address: &str) -> Result<Value, ApiError> {
        self.json(self.client.build_search(city, address)).await
    }

    pub async fn list_tables(&self) -> Result<Value, ApiError> {
        self.json(self.client.build_list_tables()).await
    }

    pub async fn create_table(&self, table: &NewTable) -> Result<Value, ApiError> {
        self.json(self.client.build_create_table(table)).await
    }

    pub async fn delete_table(&self, id: &str) -> Result<Value, ApiError> {
        self.json(self.client.build_delete_table(id)).await
    }

    pub async fn table_detail(&self, id: &str) -> Result<Value, ApiError> {
        self.json(self.client.build_table_detail(id)).await
    }

    pub async fn create_column(&self, table_id: &str, column: &NewColumn) -> Result<Value, ApiError> {
        self.json(self.client.build_create_column(table_id, column)).await
    }

    pub async fn list_columns(&self, table_id: &str, name: &str, key: &str) -> Result<Value, ApiError> {
        self.json(self.client.build_list_columns(table_id, name, key)).await
    }

    pub async fn create_poi(&self, table_id: &str, poi: &PoiInput) -> Result<Value, ApiError> {
        self.json(self.client.build_create_poi(table_id, poi)).await
    }

    pub async fn list_pois(&self, table_id: &str, page: Page) -> Result<Value, ApiError> {
        self.json(self.client.build_list_pois(table_id, page)).await
    }

    pub async fn get_poi(&self, table_id: &str, poi_id: &str) -> Result<Value, ApiError> {
        self.json(self.client.build_get_poi(table_id, poi_id)).await
    }

    pub async fn update_poi(&self, table_id: &str, poi_id: &str, poi: &PoiInput) -> Result<Value, ApiError> {
        self.json(self.client.build_update_poi(table_id, poi_id, poi)).await
    }

    pub async fn delete_poi(&self, table_id: &str, poi_id: &str) -> Result<Value, ApiError> {
        self.json(self.client.build_delete_poi(table_id, poi_id)).await
    }

    pub async fn delete_all_pois(&self, table_id: &str) -> Result<Value, ApiError> {
        self.json(self.client.build_delete_all_pois(table_id)).await
    }

    pub async fn nearby(
        &self,
        table_id: &str,
        latitude: f64,
        longitude: f64,
        radius: u32,
    ) -> Result<Value, ApiError> {
        self.json(self.client.build_nearby(table_id, latitude, longitude, radius))
            .await
    }

    /// Convert one coordinate pair; resolves to `(x, y)` in the target system.
    pub async fn transform(
        &self,
        latitude: f64,
        longitude: f64,
        conversion: Conversion,
    ) -> Result<(f64, f64), ApiError> {
        let response = self
            .send(self.client.build_transform(latitude, longitude, conversion))
            .await?;
        self.client.parse_transform(response).inspect_err(|e| {
            warn!(error = %e, "coordinate transform rejected");
        })
    }

    async fn json(&self, request: HttpRequest) -> Result<Value, ApiError> {
        let response = self.send(request).await?;
        self.client.parse_json(response)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        // path only: the query carries the token
        debug!(method = request.method.as_str(), path = %request.path, "dispatching request");
        let response = self.transport.execute(request).await?;
        debug!(status = response.status, "response received");
        Ok(response)
    }
}
