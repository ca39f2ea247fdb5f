//! In-memory stand-in for the Baidu LBS endpoints.
//!
//! Answers with the vendor's envelope shape (`status` + `message`, HTTP 200
//! even for vendor-level errors) so clients can be exercised end-to-end
//! without a real `ak`. Any non-empty `ak` is accepted.

use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

const STATUS_OK: i64 = 0;
const STATUS_NO_RESULT: i64 = 1;
const STATUS_BAD_PARAM: i64 = 2;
const STATUS_NOT_FOUND: i64 = 3;
const STATUS_MISSING_AK: i64 = 101;
const STATUS_BAD_FROM: i64 = 21;
const STATUS_BAD_TO: i64 = 22;
const STATUS_BAD_COORDS: i64 = 24;

const ID_BASE: u64 = 100_000_000;
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Geotable {
    pub id: String,
    pub name: String,
    pub is_published: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub geotable_id: String,
    #[serde(rename = "type")]
    pub column_type: u8,
    pub name: String,
    pub key: String,
    pub is_search_field: u8,
    pub is_index_field: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    pub geotable_id: String,
    pub title: String,
    pub address: String,
    pub coord_type: u8,
    /// `[longitude, latitude]`, as the vendor orders it.
    pub location: [f64; 2],
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    tables: BTreeMap<String, Geotable>,
    columns: Vec<Column>,
    pois: BTreeMap<String, Poi>,
}

impl Store {
    /// Ids share one width, so map order is creation order.
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        (ID_BASE + self.next_id).to_string()
    }
}

pub type Db = Arc<RwLock<Store>>;
type Params = HashMap<String, String>;

/// Fixed gazetteer for the geocoder: (city, address, lat, lng, level).
const GAZETTEER: &[(&str, &str, f64, f64, &str)] = &[
    ("shanghai", "foo", 31.23, 121.52, "宾馆"),
    ("beijing", "天安门", 39.915, 116.404, "旅游景点"),
];

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/geocoder/v2/", get(geocode))
        .route("/geodata/v4/geotable/list", get(list_tables))
        .route("/geodata/v4/geotable/create", get(create_table))
        .route("/geodata/v4/geotable/delete", get(delete_table))
        .route("/geodata/v4/geotable/detail", get(table_detail))
        .route("/geodata/v4/column/create", get(create_column))
        .route("/geodata/v4/column/list", get(list_columns))
        .route("/geodata/v4/poi/create", get(create_poi))
        .route("/geodata/v4/poi/list", get(list_pois))
        .route("/geodata/v4/poi/detail", get(poi_detail))
        .route("/geodata/v4/poi/update", get(update_poi))
        .route("/geodata/v4/poi/delete", get(delete_poi))
        .route("/geosearch/v4/nearby", get(nearby))
        .route("/geoconv/v1/", get(geoconv))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

fn envelope(status: i64, message: &str) -> Json<Value> {
    Json(json!({ "status": status, "message": message }))
}

fn ok(mut body: Value) -> Json<Value> {
    if let Value::Object(map) = &mut body {
        map.insert("status".into(), json!(STATUS_OK));
        map.insert("message".into(), json!("成功"));
    }
    Json(body)
}

/// Reject requests without a non-empty `ak`.
fn authorize(q: &Params) -> Result<(), Json<Value>> {
    match q.get("ak") {
        Some(ak) if !ak.is_empty() => Ok(()),
        _ => {
            tracing::debug!("rejecting request without ak");
            Err(envelope(STATUS_MISSING_AK, "AK参数不存在"))
        }
    }
}

fn require<'a>(q: &'a Params, key: &str) -> Result<&'a str, Json<Value>> {
    q.get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| envelope(STATUS_BAD_PARAM, &format!("参数错误: {key}")))
}

fn require_num<T: std::str::FromStr>(q: &Params, key: &str) -> Result<T, Json<Value>> {
    require(q, key)?
        .parse()
        .map_err(|_| envelope(STATUS_BAD_PARAM, &format!("参数错误: {key}")))
}

fn maybe_num<T: std::str::FromStr>(q: &Params, key: &str) -> Result<Option<T>, Json<Value>> {
    match q.get(key) {
        Some(_) => require_num(q, key).map(Some),
        None => Ok(None),
    }
}

fn optional_num<T: std::str::FromStr>(q: &Params, key: &str, default: T) -> Result<T, Json<Value>> {
    Ok(maybe_num(q, key)?.unwrap_or(default))
}

/// Accepts `lat,lng` as well as a literal `lat%2Clng`.
fn parse_pair(raw: &str) -> Option<(f64, f64)> {
    let normalized = raw.replace("%2C", ",").replace("%2c", ",");
    let (a, b) = normalized.split_once(',')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lng2 - lng1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn geocode(Query(q): Query<Params>) -> Json<Value> {
    let run = || -> Result<Json<Value>, Json<Value>> {
        authorize(&q)?;
        let city = require(&q, "city")?;
        let address = require(&q, "address")?;
        let hit = GAZETTEER
            .iter()
            .find(|(c, a, ..)| c.eq_ignore_ascii_case(city) && *a == address);
        Ok(match hit {
            Some((_, _, lat, lng, level)) => Json(json!({
                "status": STATUS_OK,
                "result": {
                    "location": { "lng": lng, "lat": lat },
                    "precise": 1,
                    "confidence": 75,
                    "level": level,
                }
            })),
            None => Json(json!({
                "status": STATUS_NO_RESULT,
                "msg": "Internal Service Error:无相关结果",
                "results": [],
            })),
        })
    };
    run().unwrap_or_else(|e| e)
}

async fn list_tables(State(db): State<Db>, Query(q): Query<Params>) -> Json<Value> {
    if let Err(e) = authorize(&q) {
        return e;
    }
    let store = db.read().await;
    let tables: Vec<&Geotable> = store.tables.values().collect();
    ok(json!({ "size": tables.len(), "geotables": tables }))
}

async fn create_table(State(db): State<Db>, Query(q): Query<Params>) -> Json<Value> {
    let parsed = authorize(&q).and_then(|_| {
        let name = require(&q, "name")?.to_string();
        let is_published = optional_num::<u8>(&q, "is_published", 1)?;
        Ok((name, is_published))
    });
    let (name, is_published) = match parsed {
        Ok(v) => v,
        Err(e) => return e,
    };
    let mut store = db.write().await;
    let id = store.allocate_id();
    store.tables.insert(
        id.clone(),
        Geotable {
            id: id.clone(),
            name,
            is_published,
        },
    );
    tracing::debug!(%id, "geotable created");
    ok(json!({ "id": id }))
}

async fn delete_table(State(db): State<Db>, Query(q): Query<Params>) -> Json<Value> {
    let id = match authorize(&q).and_then(|_| require(&q, "id")) {
        Ok(id) => id.to_string(),
        Err(e) => return e,
    };
    let mut store = db.write().await;
    if store.tables.remove(&id).is_none() {
        return envelope(STATUS_NOT_FOUND, "geotable不存在");
    }
    store.columns.retain(|c| c.geotable_id != id);
    store.pois.retain(|_, p| p.geotable_id != id);
    tracing::debug!(%id, "geotable deleted");
    ok(json!({}))
}

async fn table_detail(State(db): State<Db>, Query(q): Query<Params>) -> Json<Value> {
    let id = match authorize(&q).and_then(|_| require(&q, "id")) {
        Ok(id) => id,
        Err(e) => return e,
    };
    let store = db.read().await;
    match store.tables.get(id) {
        Some(table) => ok(json!({ "geotable": table })),
        None => envelope(STATUS_NOT_FOUND, "geotable不存在"),
    }
}

async fn create_column(State(db): State<Db>, Query(q): Query<Params>) -> Json<Value> {
    let parsed = authorize(&q).and_then(|_| {
        Ok(Column {
            id: String::new(),
            geotable_id: require(&q, "geotable_id")?.to_string(),
            column_type: require_num(&q, "type")?,
            name: require(&q, "name")?.to_string(),
            key: require(&q, "key")?.to_string(),
            is_search_field: optional_num(&q, "is_search_field", 0)?,
            is_index_field: optional_num(&q, "is_index_field", 0)?,
        })
    });
    let mut column = match parsed {
        Ok(c) => c,
        Err(e) => return e,
    };
    if !(1..=4).contains(&column.column_type) {
        return envelope(STATUS_BAD_PARAM, "参数错误: type");
    }
    let mut store = db.write().await;
    if !store.tables.contains_key(&column.geotable_id) {
        return envelope(STATUS_NOT_FOUND, "geotable不存在");
    }
    column.id = store.allocate_id();
    let id = column.id.clone();
    store.columns.push(column);
    ok(json!({ "id": id }))
}

async fn list_columns(State(db): State<Db>, Query(q): Query<Params>) -> Json<Value> {
    let table_id = match authorize(&q).and_then(|_| require(&q, "geotable_id")) {
        Ok(id) => id,
        Err(e) => return e,
    };
    let name = q.get("name").filter(|v| !v.is_empty());
    let key = q.get("key").filter(|v| !v.is_empty());
    let store = db.read().await;
    let columns: Vec<&Column> = store
        .columns
        .iter()
        .filter(|c| c.geotable_id == table_id)
        .filter(|c| name.is_none_or(|n| &c.name == n))
        .filter(|c| key.is_none_or(|k| &c.key == k))
        .collect();
    ok(json!({ "size": columns.len(), "columns": columns }))
}

async fn create_poi(State(db): State<Db>, Query(q): Query<Params>) -> Json<Value> {
    let parsed = authorize(&q).and_then(|_| {
        let latitude: f64 = require_num(&q, "latitude")?;
        let longitude: f64 = require_num(&q, "longitude")?;
        Ok(Poi {
            id: String::new(),
            geotable_id: require(&q, "geotable_id")?.to_string(),
            title: q.get("title").cloned().unwrap_or_default(),
            address: q.get("address").cloned().unwrap_or_default(),
            coord_type: require_num(&q, "coord_type")?,
            location: [longitude, latitude],
        })
    });
    let mut poi = match parsed {
        Ok(p) => p,
        Err(e) => return e,
    };
    let mut store = db.write().await;
    if !store.tables.contains_key(&poi.geotable_id) {
        return envelope(STATUS_NOT_FOUND, "geotable不存在");
    }
    poi.id = store.allocate_id();
    let id = poi.id.clone();
    store.pois.insert(id.clone(), poi);
    ok(json!({ "id": id }))
}

async fn list_pois(State(db): State<Db>, Query(q): Query<Params>) -> Json<Value> {
    let parsed = authorize(&q).and_then(|_| {
        Ok((
            require(&q, "geotable_id")?,
            optional_num::<usize>(&q, "page_index", 0)?,
            optional_num::<usize>(&q, "page_size", 10)?,
        ))
    });
    let (table_id, index, size) = match parsed {
        Ok(v) => v,
        Err(e) => return e,
    };
    let store = db.read().await;
    let all: Vec<&Poi> = store
        .pois
        .values()
        .filter(|p| p.geotable_id == table_id)
        .collect();
    let page: Vec<&Poi> = all.iter().skip(index.saturating_mul(size)).take(size).copied().collect();
    ok(json!({ "size": page.len(), "total": all.len(), "pois": page }))
}

async fn poi_detail(State(db): State<Db>, Query(q): Query<Params>) -> Json<Value> {
    let parsed = authorize(&q).and_then(|_| Ok((require(&q, "geotable_id")?, require(&q, "id")?)));
    let (table_id, id) = match parsed {
        Ok(v) => v,
        Err(e) => return e,
    };
    let store = db.read().await;
    match store.pois.get(id).filter(|p| p.geotable_id == table_id) {
        Some(poi) => ok(json!({ "poi": poi })),
        None => envelope(STATUS_NOT_FOUND, "poi不存在"),
    }
}

async fn update_poi(State(db): State<Db>, Query(q): Query<Params>) -> Json<Value> {
    let parsed = authorize(&q).and_then(|_| {
        Ok((
            require(&q, "geotable_id")?.to_string(),
            require(&q, "id")?.to_string(),
            maybe_num::<f64>(&q, "latitude")?,
            maybe_num::<f64>(&q, "longitude")?,
        ))
    });
    let (table_id, id, latitude, longitude) = match parsed {
        Ok(v) => v,
        Err(e) => return e,
    };
    let mut store = db.write().await;
    let Some(poi) = store.pois.get_mut(&id).filter(|p| p.geotable_id == table_id) else {
        return envelope(STATUS_NOT_FOUND, "poi不存在");
    };
    if let Some(title) = q.get("title") {
        poi.title = title.clone();
    }
    if let Some(address) = q.get("address") {
        poi.address = address.clone();
    }
    if let Some(latitude) = latitude {
        poi.location[1] = latitude;
    }
    if let Some(longitude) = longitude {
        poi.location[0] = longitude;
    }
    ok(json!({ "id": id }))
}

async fn delete_poi(State(db): State<Db>, Query(q): Query<Params>) -> Json<Value> {
    let parsed = authorize(&q).and_then(|_| {
        Ok((
            require(&q, "geotable_id")?.to_string(),
            optional_num::<u8>(&q, "is_total_del", 0)?,
        ))
    });
    let (table_id, total) = match parsed {
        Ok(v) => v,
        Err(e) => return e,
    };
    let mut store = db.write().await;
    if total == 1 {
        let ids: Vec<String> = store
            .pois
            .values()
            .filter(|p| p.geotable_id == table_id)
            .map(|p| p.id.clone())
            .collect();
        store.pois.retain(|_, p| p.geotable_id != table_id);
        return ok(json!({ "ids": ids }));
    }
    let id = match require(&q, "id") {
        Ok(id) => id.to_string(),
        Err(e) => return e,
    };
    let owned = store.pois.get(&id).is_some_and(|p| p.geotable_id == table_id);
    if !owned {
        return envelope(STATUS_NOT_FOUND, "poi不存在");
    }
    store.pois.remove(&id);
    ok(json!({ "ids": [id] }))
}

async fn nearby(State(db): State<Db>, Query(q): Query<Params>) -> Json<Value> {
    let parsed = authorize(&q).and_then(|_| {
        let table_id = require(&q, "geotable_id")?;
        let (lat, lng) = parse_pair(require(&q, "location")?)
            .ok_or_else(|| envelope(STATUS_BAD_PARAM, "参数错误: location"))?;
        let radius = optional_num::<f64>(&q, "radius", 1000.0)?;
        Ok((table_id, lat, lng, radius))
    });
    let (table_id, lat, lng, radius) = match parsed {
        Ok(v) => v,
        Err(e) => return e,
    };
    let store = db.read().await;
    let mut hits: Vec<(f64, &Poi)> = store
        .pois
        .values()
        .filter(|p| p.geotable_id == table_id)
        .map(|p| (haversine_m(lat, lng, p.location[1], p.location[0]), p))
        .filter(|(d, _)| *d <= radius)
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0));
    let contents: Vec<Value> = hits
        .into_iter()
        .map(|(distance, p)| {
            json!({
                "uid": p.id,
                "geotable_id": p.geotable_id,
                "title": p.title,
                "address": p.address,
                "location": p.location,
                "distance": distance.round() as i64,
            })
        })
        .collect();
    ok(json!({ "total": contents.len(), "size": contents.len(), "contents": contents }))
}

/// Deterministic fake of the vendor conversion: a fixed per-system offset,
/// identity when source and target coincide.
async fn geoconv(Query(q): Query<Params>) -> Json<Value> {
    let run = || -> Result<Json<Value>, Json<Value>> {
        authorize(&q)?;
        let (a, b) = parse_pair(require(&q, "coords")?)
            .ok_or_else(|| envelope(STATUS_BAD_COORDS, "coords格式非法"))?;
        let from = optional_num::<u8>(&q, "from", 1).map_err(|_| envelope(STATUS_BAD_FROM, "from非法"))?;
        let to = optional_num::<u8>(&q, "to", 5).map_err(|_| envelope(STATUS_BAD_TO, "to非法"))?;
        let shift = |code: u8| -> Option<(f64, f64)> {
            match code {
                1 => Some((0.0, 0.0)),
                3 => Some((0.0020, 0.0045)),
                5 => Some((0.0080, 0.0110)),
                _ => None,
            }
        };
        let src = shift(from).ok_or_else(|| envelope(STATUS_BAD_FROM, "from非法"))?;
        let dst = shift(to).ok_or_else(|| envelope(STATUS_BAD_TO, "to非法"))?;
        Ok(Json(json!({
            "status": STATUS_OK,
            "result": [{ "x": a - src.0 + dst.0, "y": b - src.1 + dst.1 }],
        })))
    };
    run().unwrap_or_else(|e| e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_pair_accepts_both_separators() {
        assert_eq!(parse_pair("31.2,121.5"), Some((31.2, 121.5)));
        assert_eq!(parse_pair("31.2%2C121.5"), Some((31.2, 121.5)));
        assert_eq!(parse_pair("31.2;121.5"), None);
        assert_eq!(parse_pair("a,b"), None);
    }

    #[test]
    fn haversine_zero_and_known_distance() {
        assert_eq!(haversine_m(31.0, 121.0, 31.0, 121.0), 0.0);
        // one degree of latitude is roughly 111 km
        let d = haversine_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 100.0, "{d}");
    }

    #[test]
    fn authorize_requires_non_empty_ak() {
        assert!(authorize(&params(&[("ak", "k")])).is_ok());
        let Json(body) = authorize(&params(&[("ak", "")])).unwrap_err();
        assert_eq!(body["status"], STATUS_MISSING_AK);
        assert!(authorize(&params(&[])).is_err());
    }

    #[test]
    fn require_num_rejects_garbage() {
        let q = params(&[("radius", "wide")]);
        let Json(body) = require_num::<f64>(&q, "radius").unwrap_err();
        assert_eq!(body["status"], STATUS_BAD_PARAM);
    }

    #[test]
    fn poi_serializes_location_lng_first() {
        let poi = Poi {
            id: "1".into(),
            geotable_id: "2".into(),
            title: "t".into(),
            address: "a".into(),
            coord_type: 1,
            location: [121.5, 31.2],
        };
        let json = serde_json::to_value(&poi).unwrap();
        assert_eq!(json["location"][0], 121.5);
        assert_eq!(json["location"][1], 31.2);
    }

    #[test]
    fn column_type_serializes_as_type() {
        let column = Column {
            id: "1".into(),
            geotable_id: "2".into(),
            column_type: 3,
            name: "n".into(),
            key: "k".into(),
            is_search_field: 0,
            is_index_field: 0,
        };
        let json = serde_json::to_value(&column).unwrap();
        assert_eq!(json["type"], 3);
        assert!(json.get("column_type").is_none());
    }
}
