//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and drives every operation over
//! real HTTP twice: once host-does-IO style (build, execute with ureq, parse)
//! and once through the async `LbsService` with `ReqwestTransport`.

use lbs_core::{
    ApiError, ColumnType, Conversion, ConvSystem, HttpMethod, HttpRequest, HttpResponse, LbsClient,
    LbsService, NewColumn, NewTable, Page, PoiInput, ReqwestTransport,
};

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's status-code-as-error behavior so 4xx/5xx responses come
/// back as data and the core client interprets them.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let url = req.url();
    let mut response = match req.method {
        HttpMethod::Get => agent.get(&url).call(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    HttpResponse { status, body }
}

/// Start the mock server on its own thread; returns its base URL.
fn spawn_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn shop(title: &str, latitude: f64, longitude: f64) -> PoiInput {
    PoiInput {
        title: title.to_string(),
        address: "1 Road".to_string(),
        latitude,
        longitude,
    }
}

#[test]
fn geodata_lifecycle() {
    let base = spawn_server();
    let client = LbsClient::with_base_url(&base, "secret").unwrap();
    let call = |req: HttpRequest| client.parse_json(execute(req)).unwrap();

    // Step 1: geocode a known address.
    let data = call(client.build_search("shanghai", "foo"));
    assert_eq!(data["status"], 0);
    assert_eq!(data["result"]["location"]["lat"], 31.23);
    assert_eq!(data["result"]["location"]["lng"], 121.52);

    // Step 2: no tables yet.
    let data = call(client.build_list_tables());
    assert_eq!(data["size"], 0);

    // Step 3: create a table and a column.
    let data = call(client.build_create_table(&NewTable::new("stores")));
    assert_eq!(data["status"], 0);
    let table_id = data["id"].as_str().unwrap().to_string();

    let data = call(client.build_table_detail(&table_id));
    assert_eq!(data["geotable"]["name"], "stores");
    assert_eq!(data["geotable"]["is_published"], 1);

    let column = NewColumn::new("storeId", "storeId", ColumnType::String);
    let data = call(client.build_create_column(&table_id, &column));
    assert_eq!(data["status"], 0);

    let data = call(client.build_list_columns(&table_id, "storeId", "storeId"));
    assert_eq!(data["size"], 1);
    assert_eq!(data["columns"][0]["type"], 3);

    // Step 4: create two points.
    let data = call(client.build_create_poi(&table_id, &shop("here", 31.2, 121.5)));
    let here = data["id"].as_str().unwrap().to_string();
    let data = call(client.build_create_poi(&table_id, &shop("far", 31.4, 121.5)));
    let far = data["id"].as_str().unwrap().to_string();

    let data = call(client.build_get_poi(&table_id, &here));
    assert_eq!(data["poi"]["title"], "here");
    assert_eq!(data["poi"]["coord_type"], 1);

    // Step 5: nearby finds only the close one.
    let data = call(client.build_nearby(&table_id, 31.2, 121.5, 1000));
    assert_eq!(data["total"], 1);
    assert_eq!(data["contents"][0]["uid"], here.as_str());

    // Step 6: move the far point next door.
    let data = call(client.build_update_poi(&table_id, &far, &shop("moved", 31.201, 121.5)));
    assert_eq!(data["status"], 0);
    let data = call(client.build_nearby(&table_id, 31.2, 121.5, 1000));
    assert_eq!(data["total"], 2);

    // Step 7: list, delete one, delete all.
    let data = call(client.build_list_pois(&table_id, Page::default()));
    assert_eq!(data["total"], 2);

    let data = call(client.build_delete_poi(&table_id, &here));
    assert_eq!(data["status"], 0);
    let data = call(client.build_get_poi(&table_id, &here));
    assert_eq!(data["status"], 3, "vendor not-found is passed through");

    let data = call(client.build_delete_all_pois(&table_id));
    assert_eq!(data["ids"].as_array().unwrap().len(), 1);
    let data = call(client.build_list_pois(&table_id, Page::default()));
    assert_eq!(data["total"], 0);

    // Step 8: drop the table.
    let data = call(client.build_delete_table(&table_id));
    assert_eq!(data["status"], 0);
    let data = call(client.build_list_tables());
    assert_eq!(data["size"], 0);

    // Step 9: transform.
    let (x, y) = client
        .parse_transform(execute(client.build_transform(31.2, 121.5, Conversion::default())))
        .unwrap();
    assert!((x - 31.208).abs() < 1e-9);
    assert!((y - 121.511).abs() < 1e-9);

    let identity = Conversion {
        from: ConvSystem::Wgs84,
        to: ConvSystem::Wgs84,
    };
    let pair = client
        .parse_transform(execute(client.build_transform(31.2, 121.5, identity)))
        .unwrap();
    assert_eq!(pair, (31.2, 121.5));

    // Step 10: an unsupported target is a vendor status error.
    let bad = Conversion {
        from: ConvSystem::Wgs84,
        to: ConvSystem::Sogou,
    };
    let err = client
        .parse_transform(execute(client.build_transform(31.2, 121.5, bad)))
        .unwrap_err();
    assert!(matches!(err, ApiError::StatusNotOk { status: Some(22) }));
}

#[test]
fn unknown_route_is_http_error() {
    let base = spawn_server();
    let client = LbsClient::with_base_url(&format!("{base}/missing"), "secret").unwrap();
    let err = client.parse_json(execute(client.build_list_tables())).unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 404, .. }));
}

#[tokio::test]
async fn async_service_lifecycle() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));

    let client = LbsClient::with_base_url(&format!("http://{addr}"), "secret").unwrap();
    let svc = LbsService::new(client, ReqwestTransport::new());

    let data = svc.search("shanghai", "foo").await.unwrap();
    assert_eq!(data["result"]["location"]["lat"], 31.23);

    let data = svc.create_table(&NewTable::new("stores")).await.unwrap();
    let table_id = data["id"].as_str().unwrap().to_string();

    let shop_a = shop("a", 31.2, 121.5);
    let shop_b = shop("b", 31.2001, 121.5);
    let (a, b) = tokio::join!(
        svc.create_poi(&table_id, &shop_a),
        svc.create_poi(&table_id, &shop_b),
    );
    assert_eq!(a.unwrap()["status"], 0);
    assert_eq!(b.unwrap()["status"], 0);

    let data = svc.list_pois(&table_id, Page::default()).await.unwrap();
    assert_eq!(data["total"], 2);

    let data = svc.nearby(&table_id, 31.2, 121.5, 100).await.unwrap();
    assert_eq!(data["total"], 2);

    let pair = svc.transform(31.2, 121.5, Conversion::default()).await.unwrap();
    assert!((pair.0 - 31.208).abs() < 1e-9);

    let data = svc.delete_all_pois(&table_id).await.unwrap();
    assert_eq!(data["status"], 0);
    let data = svc.delete_table(&table_id).await.unwrap();
    assert_eq!(data["status"], 0);
}

#[tokio::test]
async fn async_connection_refused_is_transport_error() {
    // bind then drop to get a port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = LbsClient::with_base_url(&format!("http://{addr}"), "secret").unwrap();
    let svc = LbsService::new(client, ReqwestTransport::new());
    let err = svc.list_tables().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
