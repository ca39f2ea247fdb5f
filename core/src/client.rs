//! Stateless request builder and response parser for the Baidu LBS API.
//!
//! # Design
//! `LbsClient` holds only the base URL and the `ak` token, both fixed at
//! construction. Each endpoint has a `build_*` method that produces an
//! `HttpRequest`; responses go through `parse_json` (passthrough) or
//! `parse_transform` (the one validated call). The caller executes the HTTP
//! round-trip in between.
//!
//! Every query starts with `ak` and ends with `output=json`.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{flag, Conversion, CoordType, NewColumn, NewTable, Page, PoiInput};

pub const DEFAULT_BASE_URL: &str = "http://api.map.baidu.com";

/// Synchronous, stateless client for the Baidu LBS API.
#[derive(Debug, Clone)]
pub struct LbsClient {
    base_url: String,
    token: String,
}

impl LbsClient {
    /// Client against the public endpoint. Fails if `token` is empty.
    pub fn new(token: &str) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    /// Client against an alternative host, e.g. a local stub.
    pub fn with_base_url(base_url: &str, token: &str) -> Result<Self, ApiError> {
        if token.is_empty() {
            return Err(ApiError::MissingToken);
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Geocoding
    // -----------------------------------------------------------------------

    pub fn build_search(&self, city: &str, address: &str) -> HttpRequest {
        self.get(
            "/geocoder/v2/",
            vec![("city", city.to_string()), ("address", address.to_string())],
        )
    }

    // -----------------------------------------------------------------------
    // Geotables
    // -----------------------------------------------------------------------

    pub fn build_list_tables(&self) -> HttpRequest {
        self.get("/geodata/v4/geotable/list", Vec::new())
    }

    pub fn build_create_table(&self, table: &NewTable) -> HttpRequest {
        self.get(
            "/geodata/v4/geotable/create",
            vec![
                ("name", table.name.clone()),
                ("is_published", flag(table.is_published).to_string()),
            ],
        )
    }

    pub fn build_delete_table(&self, id: &str) -> HttpRequest {
        self.get("/geodata/v4/geotable/delete", vec![("id", id.to_string())])
    }

    pub fn build_table_detail(&self, id: &str) -> HttpRequest {
        self.get("/geodata/v4/geotable/detail", vec![("id", id.to_string())])
    }

    // -----------------------------------------------------------------------
    // Columns
    // -----------------------------------------------------------------------

    pub fn build_create_column(&self, table_id: &str, column: &NewColumn) -> HttpRequest {
        self.get(
            "/geodata/v4/column/create",
            vec![
                ("geotable_id", table_id.to_string()),
                ("name", column.name.clone()),
                ("key", column.key.clone()),
                ("type", column.column_type.code().to_string()),
                ("is_search_field", flag(column.is_search_field).to_string()),
                ("is_index_field", flag(column.is_index_field).to_string()),
            ],
        )
    }

    pub fn build_list_columns(&self, table_id: &str, name: &str, key: &str) -> HttpRequest {
        self.get(
            "/geodata/v4/column/list",
            vec![
                ("geotable_id", table_id.to_string()),
                ("name", name.to_string()),
                ("key", key.to_string()),
            ],
        )
    }

    // -----------------------------------------------------------------------
    // Points of interest
    // -----------------------------------------------------------------------

    /// Create a POI. Coordinates are always tagged as raw GPS.
    pub fn build_create_poi(&self, table_id: &str, poi: &PoiInput) -> HttpRequest {
        self.get(
            "/geodata/v4/poi/create",
            vec![
                ("coord_type", CoordType::Gps.code().to_string()),
                ("geotable_id", table_id.to_string()),
                ("title", poi.title.clone()),
                ("address", poi.address.clone()),
                ("latitude", poi.latitude.to_string()),
                ("longitude", poi.longitude.to_string()),
            ],
        )
    }

    pub fn build_list_pois(&self, table_id: &str, page: Page) -> HttpRequest {
        self.get(
            "/geodata/v4/poi/list",
            vec![
                ("geotable_id", table_id.to_string()),
                ("page_index", page.index.to_string()),
                ("page_size", page.size.to_string()),
            ],
        )
    }

    pub fn build_get_poi(&self, table_id: &str, poi_id: &str) -> HttpRequest {
        self.get(
            "/geodata/v4/poi/detail",
            vec![("geotable_id", table_id.to_string()), ("id", poi_id.to_string())],
        )
    }

    pub fn build_update_poi(&self, table_id: &str, poi_id: &str, poi: &PoiInput) -> HttpRequest {
        self.get(
            "/geodata/v4/poi/update",
            vec![
                ("geotable_id", table_id.to_string()),
                ("id", poi_id.to_string()),
                ("title", poi.title.clone()),
                ("address", poi.address.clone()),
                ("latitude", poi.latitude.to_string()),
                ("longitude", poi.longitude.to_string()),
            ],
        )
    }

    pub fn build_delete_poi(&self, table_id: &str, poi_id: &str) -> HttpRequest {
        self.get(
            "/geodata/v4/poi/delete",
            vec![("geotable_id", table_id.to_string()), ("id", poi_id.to_string())],
        )
    }

    /// Delete every POI in a table (`is_total_del=1`).
    pub fn build_delete_all_pois(&self, table_id: &str) -> HttpRequest {
        self.get(
            "/geodata/v4/poi/delete",
            vec![
                ("geotable_id", table_id.to_string()),
                ("is_total_del", "1".to_string()),
            ],
        )
    }

    // -----------------------------------------------------------------------
    // Search and conversion
    // -----------------------------------------------------------------------

    /// Nearby search. `location` carries a literal `%2C` separator, which the
    /// query encoder escapes once more on the wire.
    pub fn build_nearby(&self, table_id: &str, latitude: f64, longitude: f64, radius: u32) -> HttpRequest {
        self.get(
            "/geosearch/v4/nearby",
            vec![
                ("geotable_id", table_id.to_string()),
                ("location", format!("{latitude}%2C{longitude}")),
                ("radius", radius.to_string()),
            ],
        )
    }

    pub fn build_transform(&self, latitude: f64, longitude: f64, conversion: Conversion) -> HttpRequest {
        self.get(
            "/geoconv/v1/",
            vec![
                ("coords", format!("{latitude},{longitude}")),
                ("from", conversion.from.code().to_string()),
                ("to", conversion.to.code().to_string()),
            ],
        )
    }

    // -----------------------------------------------------------------------
    // Parsers
    // -----------------------------------------------------------------------

    /// Parse any passthrough response. Vendor error envelopes are returned
    /// as-is; only transport-level failures become errors.
    pub fn parse_json(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Parse a geoconv response into `(x, y)`.
    pub fn parse_transform(&self, response: HttpResponse) -> Result<(f64, f64), ApiError> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Err(ApiError::NoData);
        }
        let value: Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;
        transform_result(value)
    }

    fn get(&self, endpoint: &str, params: Vec<(&str, String)>) -> HttpRequest {
        let mut query = Vec::with_capacity(params.len() + 2);
        query.push(("ak".to_string(), self.token.clone()));
        query.extend(params.into_iter().map(|(k, v)| (k.to_string(), v)));
        query.push(("output".to_string(), "json".to_string()));
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{endpoint}", self.base_url),
            query,
        }
    }
}

#[derive(Deserialize)]
struct TransformPoint {
    x: f64,
    y: f64,
}

/// Validate a decoded geoconv envelope, in order: data present, status zero,
/// at least one result entry.
fn transform_result(value: Value) -> Result<(f64, f64), ApiError> {
    if value.is_null() {
        return Err(ApiError::NoData);
    }
    let status = match value.get("status") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(
            raw.as_i64()
                .ok_or_else(|| ApiError::StatusNotInteger(raw.to_string()))?,
        ),
    };
    if status != Some(0) {
        return Err(ApiError::StatusNotOk { status });
    }
    let first = value
        .get("result")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .ok_or(ApiError::MissingTransformResult)?;
    let point = TransformPoint::deserialize(first)
        .map_err(|e| ApiError::Deserialization(e.to_string()))?;
    Ok((point.x, point.y))
}

/// Map non-2xx status codes to `ApiError::Http`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
