use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::time::{Duration, Instant};

use httpmock::prelude::*;
use serde_json::{Value, json};

use gempaview::server::{self, AppState, ServerConfig};
use gempaview::{ClientConfig, GempaClient};

const SAMPLE_KATALOG: &str = include_str!("../tools/sample_katalog.json");

/// Serve the dashboard against `backend` on an ephemeral port.
fn start_dashboard(backend: &MockServer) -> String {
    start_dashboard_polling(backend, 3600)
}

fn start_dashboard_polling(backend: &MockServer, poll_interval: u64) -> String {
    let client = Arc::new(
        GempaClient::new(&ClientConfig {
            base_url: backend.base_url(),
            timeout: Duration::from_secs(5),
        })
        .unwrap(),
    );
    // Poll a limit no panel uses so poller hits never count against panel mocks
    let config = ServerConfig {
        poll_interval,
        poll_limit: 7,
        ..ServerConfig::default()
    };

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            server::serve(listener, AppState::new(client, config))
                .await
                .unwrap();
        });
    });

    format!("http://{addr}")
}

fn get_text(url: &str) -> (u16, String) {
    let response = reqwest::blocking::get(url).unwrap();
    let status = response.status().as_u16();
    (status, response.text().unwrap())
}

/// Block until `mock` has been hit at least `hits` times.
fn wait_for_hits(mock: &httpmock::Mock<'_>, hits: usize) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while mock.hits() < hits {
        assert!(Instant::now() < deadline, "backend saw {} polls", mock.hits());
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Read SSE frames until one carries an `earthquake` event.
fn next_earthquake_frame(lines: &mut impl Iterator<Item = std::io::Result<String>>) -> String {
    let mut frame = String::new();
    for line in lines {
        let line = line.unwrap();
        if !line.is_empty() {
            frame.push_str(&line);
            frame.push('\n');
            continue;
        }
        if frame.contains("event: earthquake") {
            return frame;
        }
        frame.clear();
    }
    panic!("stream closed without an earthquake event");
}

fn mock_katalog<'a>(backend: &'a MockServer, limit: &str, status: u16, body: &str) -> httpmock::Mock<'a> {
    let body = body.to_string();
    let limit = limit.to_string();
    backend.mock(move |when, then| {
        when.method(GET)
            .path("/katalog")
            .query_param("limit", limit.as_str());
        then.status(status)
            .header("content-type", "application/json")
            .body(body);
    })
}

#[test]
fn test_health_and_pages() {
    let backend = MockServer::start();
    let base = start_dashboard(&backend);

    assert_eq!(get_text(&format!("{base}/health")), (200, "OK".to_string()));

    let (status, index) = get_text(&format!("{base}/"));
    assert_eq!(status, 200);
    assert!(index.contains("sse-connect=\"/stream\""));

    let (status, risk) = get_text(&format!("{base}/risk"));
    assert_eq!(status, 200);
    assert!(risk.contains("province-select"));
}

#[test]
fn test_recent_panel_renders_catalog() {
    let backend = MockServer::start();
    let katalog = mock_katalog(&backend, "10", 200, SAMPLE_KATALOG);
    let base = start_dashboard(&backend);

    let (status, html) = get_text(&format!("{base}/panel/recent"));
    katalog.assert();
    assert_eq!(status, 200);
    assert!(html.contains("Recent earthquakes"));
    assert!(html.contains("DI Yogyakarta"));
    assert!(html.contains("Unknown location"));
}

#[test]
fn test_recent_panel_shows_backend_error() {
    let backend = MockServer::start();
    mock_katalog(&backend, "10", 500, r#"{"error": "Database connection failed"}"#);
    let base = start_dashboard(&backend);

    let (_, html) = get_text(&format!("{base}/panel/recent"));
    assert!(html.contains("Database connection failed"));
}

#[test]
fn test_api_quakes_markers() {
    let backend = MockServer::start();
    mock_katalog(&backend, "50", 200, SAMPLE_KATALOG);
    let base = start_dashboard(&backend);

    let response = reqwest::blocking::get(format!("{base}/api/quakes")).unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let markers: Vec<Value> = response.json().unwrap();

    // The record without province or coordinates is not mappable
    assert_eq!(markers.len(), 10);
    let papua = markers.iter().find(|m| m["province"] == "Papua").unwrap();
    assert_eq!(papua["color"], "red");
    assert_eq!(papua["name"], "Gempa Papua (Mag: 6.1)");
    let no_mag = markers.iter().find(|m| m["province"] == "Sumatera Barat").unwrap();
    assert_eq!(no_mag["color"], "#808080");
    assert_eq!(no_mag["name"], "Gempa Sumatera Barat (Mag: N/A)");
}

#[test]
fn test_api_quakes_backend_failure() {
    let backend = MockServer::start();
    mock_katalog(&backend, "50", 500, r#"{"error": "katalog unavailable"}"#);
    let base = start_dashboard(&backend);

    let response = reqwest::blocking::get(format!("{base}/api/quakes")).unwrap();
    assert_eq!(response.status().as_u16(), 502);
    let body: Value = response.json().unwrap();
    assert_eq!(body["error"], "katalog unavailable");
}

#[test]
fn test_chart_panel_counts_provinces() {
    let backend = MockServer::start();
    mock_katalog(&backend, "200", 200, SAMPLE_KATALOG);
    let base = start_dashboard(&backend);

    let (_, html) = get_text(&format!("{base}/panel/chart"));
    assert!(html.contains("200 most recent"));
    assert!(html.contains(">Unknown<"));
}

#[test]
fn test_prediction_panel_blank_province() {
    let backend = MockServer::start();
    let base = start_dashboard(&backend);

    let (_, html) = get_text(&format!("{base}/panel/prediction?provinsi="));
    assert!(html.contains("Please select a province first."));
}

#[test]
fn test_prediction_panel_uses_risk_cache() {
    let backend = MockServer::start();
    let papua = backend.mock(|when, then| {
        when.method(POST)
            .path("/predict_lstm")
            .json_body(json!({ "provinsi": "Papua" }));
        then.status(200).json_body(json!({
            "Provinsi": "Papua",
            "Probabilitas_Gempa_30_Hari": 0.88,
            "Prediksi_Gempa": 1
        }));
    });
    let base = start_dashboard(&backend);

    let (_, map) = get_text(&format!("{base}/panel/risk"));
    assert!(map.contains(r#"id="ID-PA""#));
    assert!(map.contains("Papua (88.0%)"));

    let (_, detail) = get_text(&format!("{base}/panel/prediction?provinsi=Papua"));
    assert!(detail.contains("LIKELY EARTHQUAKE"));
    assert!(detail.contains("Prediction based on the latest historical data."));
    // Served from the map load, no second request
    papua.assert_hits(1);
}

#[test]
fn test_predict_form_posts_to_backend() {
    let backend = MockServer::start();
    let aceh = backend.mock(|when, then| {
        when.method(POST)
            .path("/predict_lstm")
            .json_body(json!({ "provinsi": "Aceh" }));
        then.status(200).json_body(json!({
            "Provinsi": "Aceh",
            "Probabilitas_Gempa_30_Hari": 0.12,
            "Prediksi_Gempa": 0
        }));
    });
    let base = start_dashboard(&backend);

    let html = reqwest::blocking::Client::new()
        .post(format!("{base}/predict"))
        .form(&[("provinsi", "Aceh")])
        .send()
        .unwrap()
        .text()
        .unwrap();
    aceh.assert();
    assert!(html.contains("UNLIKELY EARTHQUAKE"));
    assert!(html.contains("12.00%"));
}

#[test]
fn test_feed_pause_and_resume() {
    let backend = MockServer::start();
    let base = start_dashboard(&backend);
    let http = reqwest::blocking::Client::new();

    let paused = http.post(format!("{base}/feed/stop")).send().unwrap().text().unwrap();
    assert!(paused.contains("Paused"));
    assert!(get_text(&format!("{base}/feed/status")).1.contains("Paused"));

    let live = http.post(format!("{base}/feed/start")).send().unwrap().text().unwrap();
    assert!(live.contains("Live"));
}

#[test]
fn test_popup_panel_whole_percent() {
    let backend = MockServer::start();
    let bali = backend.mock(|when, then| {
        when.method(POST)
            .path("/predict_lstm")
            .json_body(json!({ "provinsi": "Bali" }));
        then.status(200).json_body(json!({
            "Provinsi": "Bali",
            "Probabilitas_Gempa_30_Hari": 0.456,
            "Prediksi_Gempa": 0
        }));
    });
    let base = start_dashboard(&backend);

    let (status, html) = get_text(&format!(
        "{base}/panel/popup?provinsi=Bali&name=Gempa%20Bali%20(Mag%3A%203.1)"
    ));
    bali.assert();
    assert_eq!(status, 200);
    assert!(html.contains("Gempa Bali (Mag: 3.1)"));
    assert!(html.contains("Earthquake probability: <b>46%</b>"));
}

#[test]
fn test_popup_panel_without_province() {
    let backend = MockServer::start();
    let base = start_dashboard(&backend);

    let (status, html) = get_text(&format!("{base}/panel/popup?name=Gempa"));
    assert_eq!(status, 200);
    assert!(html.contains("error-text"));
    assert!(html.contains("Please select a province first."));
}

#[test]
fn test_stream_pushes_only_new_events() {
    let backend = MockServer::start();
    let mut seeded = mock_katalog(
        &backend,
        "7",
        200,
        r#"[{"id": "a", "tgl": "2024-06-01 10:00:00", "provinsi": "Bali", "lat": -8.4, "lon": 115.2, "mag": 3.1, "depth": 10}]"#,
    );
    let base = start_dashboard_polling(&backend, 1);

    let stream = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()
        .unwrap()
        .get(format!("{base}/stream"))
        .send()
        .unwrap();
    assert_eq!(stream.status().as_u16(), 200);

    // The first poll seeds the ring; swap in a catalog with one new event
    wait_for_hits(&seeded, 1);
    seeded.delete();
    let updated = mock_katalog(
        &backend,
        "7",
        200,
        r#"[
            {"id": "b", "tgl": "2024-06-01 10:05:00", "provinsi": "Papua", "lat": -4.3, "lon": 138.1, "mag": 5.2, "depth": 33},
            {"id": "a", "tgl": "2024-06-01 10:00:00", "provinsi": "Bali", "lat": -8.4, "lon": 115.2, "mag": 3.1, "depth": 10}
        ]"#,
    );

    let mut lines = BufReader::new(stream).lines();
    let frame = next_earthquake_frame(&mut lines);
    assert!(updated.hits() >= 1);
    assert!(frame.contains(r#"id="quake-b""#));
    assert!(frame.contains("Papua"));
    assert!(!frame.contains("quake-a"));
}

#[test]
fn test_paused_feed_stops_polling() {
    let backend = MockServer::start();
    let katalog = mock_katalog(&backend, "7", 200, "[]");
    let base = start_dashboard_polling(&backend, 1);
    let http = reqwest::blocking::Client::new();

    wait_for_hits(&katalog, 1);
    http.post(format!("{base}/feed/stop")).send().unwrap();
    // Let a poll already in flight finish
    std::thread::sleep(Duration::from_millis(1500));
    let paused_hits = katalog.hits();
    std::thread::sleep(Duration::from_millis(2500));
    assert_eq!(katalog.hits(), paused_hits);

    http.post(format!("{base}/feed/start")).send().unwrap();
    wait_for_hits(&katalog, paused_hits + 1);
}
