use std::net::SocketAddr;
use std::time::Duration;

use pilotlog::config::PagingConfig;
use pilotlog::server::{router, AppState};
use pilotlog::Logbook;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn spawn_app() -> SocketAddr {
    let logbook = Logbook::open_in_memory().expect("open logbook");
    let app = router(
        AppState::new(logbook, PagingConfig::default()),
        Duration::from_secs(10),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(payload) = body {
        req.push_str("Content-Type: application/json\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", payload.len()));
    }
    req.push_str("\r\n");
    if let Some(payload) = body {
        req.push_str(payload);
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_ascii_lowercase(), body.to_string())
}

async fn get(addr: SocketAddr, path: &str) -> (u16, String, String) {
    send_raw(addr, "GET", path, None).await
}

fn xml_field<'a>(xml: &'a str, name: &str) -> &'a str {
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    let start = xml.find(&open).expect("field present") + open.len();
    let end = start + xml[start..].find(&close).expect("field closed");
    &xml[start..end]
}

fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("json body")
}

async fn depart(addr: SocketAddr, callsign: &str, origin: &str) -> i64 {
    let (status, _, body) = get(
        addr,
        &format!(
            "/api/departure?callsign={callsign}&aircraft=C172&airport={origin}&fuel=40&odometer=1000"
        ),
    )
    .await;
    assert_eq!(status, 200, "departure failed: {body}");
    xml_field(&body, "id").parse().expect("numeric id")
}

#[tokio::test]
async fn departure_and_arrival_update_airports() {
    let addr = spawn_app().await;

    let (status, head, body) = get(
        addr,
        "/api/departure?callsign=N123AB&aircraft=C172&airport=KORD&fuel=40&odometer=1000",
    )
    .await;
    assert_eq!(status, 200);
    assert!(head.contains("content-type: text/xml"));
    assert!(body.starts_with("<flight>"));
    assert_eq!(xml_field(&body, "status"), "OPEN");
    let id = xml_field(&body, "id").to_string();

    let (status, _, body) = get(
        addr,
        &format!("/api/arrival?id={id}&airport=KJFK&fuel=10&odometer=1100"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(xml_field(&body, "status"), "COMPLETE");
    assert_eq!(xml_field(&body, "destination"), "KJFK");

    let (status, _, body) = get(addr, "/api/airports.json").await;
    assert_eq!(status, 200);
    let airports = json(&body);
    assert_eq!(airports.as_array().map(Vec::len), Some(2));
    assert_eq!(airports[0]["code"], "KJFK");
    assert_eq!(airports[0]["arrivals"], 1);
    assert_eq!(airports[0]["departures"], 0);
    assert_eq!(airports[1]["code"], "KORD");
    assert_eq!(airports[1]["arrivals"], 0);
    assert_eq!(airports[1]["departures"], 1);
}

#[tokio::test]
async fn unknown_flight_is_not_found() {
    let addr = spawn_app().await;

    let (status, _, body) = get(addr, "/api/arrival?id=99&airport=KJFK&fuel=1&odometer=1").await;
    assert_eq!(status, 404);
    assert_eq!(json(&body)["error"]["code"], "not_found");

    let (status, _, _) = get(addr, "/api/flights/flight/99").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn closed_flight_rejects_transitions() {
    let addr = spawn_app().await;
    let id = depart(addr, "N1", "KORD").await;

    let (status, _, body) = get(addr, &format!("/api/invalidate?id={id}")).await;
    assert_eq!(status, 200);
    assert_eq!(xml_field(&body, "status"), "INVALID");

    let (status, _, body) = get(addr, &format!("/api/invalidate?id={id}")).await;
    assert_eq!(status, 400);
    let error = json(&body);
    assert_eq!(error["error"]["code"], "invalid_state");
    assert!(error["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("INVALID"));

    let (status, _, _) = get(
        addr,
        &format!("/api/arrival?id={id}&airport=KJFK&fuel=1&odometer=1"),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn missing_parameter_is_bad_request() {
    let addr = spawn_app().await;

    let (status, _, body) = get(addr, "/api/departure?callsign=N1&aircraft=C172").await;
    assert_eq!(status, 400);
    assert_eq!(json(&body)["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn flight_listing_is_paged() {
    let addr = spawn_app().await;
    for callsign in ["N1", "N2", "N3"] {
        depart(addr, callsign, "EGLL").await;
    }

    let (status, _, body) = get(addr, "/api/flights?size=2&sort=callsign,asc").await;
    assert_eq!(status, 200);
    let page = json(&body);
    assert_eq!(page["total_elements"], 3);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["content"][0]["callsign"], "N1");
    assert_eq!(page["content"].as_array().map(Vec::len), Some(2));
    assert_eq!(page["total_duration"], 0);

    let (status, _, body) = get(addr, "/api/flights?status=open").await;
    assert_eq!(status, 200);
    assert_eq!(json(&body)["total_elements"], 3);

    let (status, _, body) = get(addr, "/api/flights?status=complete").await;
    assert_eq!(status, 200);
    assert_eq!(json(&body)["total_elements"], 0);

    let (status, _, _) = get(addr, "/api/flights?sort=wingspan").await;
    assert_eq!(status, 400);

    let (status, _, _) = get(addr, "/api/flights?size=0").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn search_by_example() {
    let addr = spawn_app().await;
    depart(addr, "N1", "EGLL").await;
    depart(addr, "N2", "EGLL").await;
    depart(addr, "N2", "EGKK").await;

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/api/flights?size=10",
        Some(r#"{"callsign": "N2", "origin": "EGKK"}"#),
    )
    .await;
    assert_eq!(status, 200);
    let page = json(&body);
    assert_eq!(page["total_elements"], 1);
    assert_eq!(page["content"][0]["origin"], "EGKK");
}

#[tokio::test]
async fn delete_flight_removes_summaries() {
    let addr = spawn_app().await;
    let id = depart(addr, "N1", "KORD").await;

    let (status, _, _) = send_raw(addr, "DELETE", &format!("/api/flights/flight/{id}"), None).await;
    assert_eq!(status, 204);

    let (status, _, _) = get(addr, &format!("/api/flights/flight/{id}")).await;
    assert_eq!(status, 404);

    let (status, _, body) = get(addr, "/api/airports").await;
    assert_eq!(status, 200);
    assert_eq!(json(&body)["total_elements"], 0);
}

#[tokio::test]
async fn reports_have_matching_content_types() {
    let addr = spawn_app().await;
    depart(addr, "N1", "KORD").await;

    let (status, head, body) = get(addr, "/api/flights.csv").await;
    assert_eq!(status, 200);
    assert!(head.contains("content-type: text/csv"));
    assert!(body.starts_with("id,callsign,aircraft,origin,destination,start_time,end_time"));
    assert_eq!(body.lines().count(), 2);

    let (status, head, body) = get(addr, "/api/flights.xml").await;
    assert_eq!(status, 200);
    assert!(head.contains("content-type: text/xml"));
    assert!(body.starts_with("<flights>"));

    let (status, head, body) = get(addr, "/api/airports.csv").await;
    assert_eq!(status, 200);
    assert!(head.contains("content-type: text/csv"));
    assert!(body.starts_with("code,arrivals,departures,last"));

    let (status, _, body) = get(addr, "/api/flights.json").await;
    assert_eq!(status, 200);
    assert_eq!(json(&body)[0]["status"], "OPEN");
}

#[tokio::test]
async fn status_reports_counts() {
    let addr = spawn_app().await;
    depart(addr, "N1", "KORD").await;

    let (status, _, body) = get(addr, "/api/status").await;
    assert_eq!(status, 200);
    let value = json(&body);
    assert_eq!(value["service"], "pilotlog");
    assert_eq!(value["stats"]["total_flights"], 1);
    assert_eq!(value["stats"]["open_flights"], 1);
    assert_eq!(value["stats"]["airports"], 1);
}
