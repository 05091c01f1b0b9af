//! The demo API served through the full dispatch path.

use std::sync::{Arc, Mutex};

use http::StatusCode;
use serde_json::json;
use strata::config::ConfigLoader;
use strata::core::MetricsSink;
use strata::{demo, App};
use strata_test::TestClient;

const CONFIG: &str = r#"
[general]
server_ident = "demo/1.0"
cross_origin_domains = "https://app.example"

[apis]
demo = "demo"

[api_config.demo]
greeting = "hi"
"#;

#[derive(Debug, Default)]
struct CountingMetrics {
    names: Mutex<Vec<String>>,
}

impl MetricsSink for CountingMetrics {
    fn increment(&self, counter_name: &str) {
        self.names.lock().unwrap().push(counter_name.to_string());
    }
}

fn app() -> App {
    let config = ConfigLoader::new()
        .with_string(CONFIG, "toml")
        .unwrap()
        .load()
        .unwrap();
    App::new(config).api(demo::api().unwrap())
}

fn client() -> TestClient {
    TestClient::from_dispatcher(app().dispatcher().unwrap()).with_version("demo-1.0+test")
}

#[tokio::test]
async fn test_ping_echoes_capture_and_mode() {
    let response = client().get("/demo/ping%26io").send().await;

    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.json_value().unwrap(),
        json!({"group1": "&io", "mode": "test"})
    );
    assert_eq!(response.header("server"), Some("demo/1.0"));
    assert_eq!(response.header("cache-control"), Some("no-cache"));
    assert_eq!(response.header("pragma"), Some("no-cache"));
    assert_eq!(
        response.header("access-control-allow-origin"),
        Some("https://app.example")
    );
    assert_eq!(response.content_type(), Some("application/json; charset=utf-8"));
}

#[tokio::test]
async fn test_ping_in_prod_mode() {
    let response = client()
        .get("/demo/ping")
        .version("demo-0.9+prod")
        .send()
        .await;
    assert_eq!(
        response.json_value().unwrap(),
        json!({"group1": "", "mode": "prod"})
    );
}

#[tokio::test]
async fn test_echo_validates_body() {
    let client = client();

    let response = client
        .post("/demo/echo")
        .json(&json!({"arg1": "hello", "arg2": 7}))
        .send()
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json_value().unwrap(), json!({"arg1": "hello", "arg2": 7}));

    let response = client.post("/demo/echo").json(&json!({"arg2": 7})).send().await;
    response
        .assert_status(StatusCode::CONFLICT)
        .assert_error("ValueError");

    let response = client
        .post("/demo/echo")
        .json(&json!({"arg1": "hello", "arg2": "seven"}))
        .send()
        .await;
    response.assert_error("ValueError");

    let response = client
        .post("/demo/echo")
        .content_type("text/plain; charset=utf-8")
        .body("arg1=hello")
        .send()
        .await;
    response
        .assert_status(StatusCode::NOT_ACCEPTABLE)
        .assert_error("ContentTypeError");

    let response = client
        .post("/demo/echo")
        .content_type("application/json; charset=utf-8")
        .body("{not json")
        .send()
        .await;
    response.assert_error("JSONDecodeError");

    let response = client.post("/demo/echo").json(&json!(["arg1"])).send().await;
    response.assert_error("RequestNotHashError");
}

#[tokio::test]
async fn test_letters_are_paged() {
    let client = client();

    let response = client.get("/demo/letters").send().await;
    assert_eq!(
        response.json_value().unwrap(),
        json!({"page": 0, "page_len": 5, "letters": ["a", "b", "c", "d", "e"]})
    );

    let response = client.get("/demo/letters?page=1&page_len=3").send().await;
    assert_eq!(
        response.json_value().unwrap()["letters"],
        json!(["d", "e", "f"])
    );

    let response = client.get("/demo/letters?page=9&page_len=10").send().await;
    assert_eq!(response.json_value().unwrap()["letters"], json!([]));

    let response = client.get("/demo/letters?page_len=11").send().await;
    response.assert_error("ValueError");
    assert!(response
        .text()
        .unwrap()
        .contains("Argument must be 10 or less."));

    let response = client.get("/demo/letters?page=first").send().await;
    response.assert_error("ValueError");
}

#[tokio::test]
async fn test_settings_come_from_api_config() {
    let response = client().get("/demo/settings").send().await;
    assert_eq!(response.json_value().unwrap(), json!({"greeting": "hi"}));
}

#[tokio::test]
async fn test_list_versions() {
    let response = client()
        .get("/demo/list_versions")
        .version("demo-0.9+test")
        .send()
        .await;
    assert_eq!(
        response.json_value().unwrap(),
        json!({"all_versions": ["0.9", "1.0"], "curr_version": "0.9"})
    );
}

#[tokio::test]
async fn test_deferred_call() {
    let response = client().get("/demo/later").send().await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json_value().unwrap(), json!("later"));
}

#[tokio::test]
async fn test_method_not_allowed() {
    let response = client().delete("/demo/ping").send().await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.header("allow"), Some("GET, HEAD"));
    assert!(response.body().is_empty());
}

#[tokio::test]
async fn test_cors_preflight() {
    let response = TestClient::from_dispatcher(app().dispatcher().unwrap())
        .options("/demo/echo")
        .header("Access-Control-Request-Headers", "content-type, x-digitar-api-version")
        .send()
        .await;

    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.header("access-control-allow-headers"),
        Some("content-type, x-digitar-api-version")
    );
    assert_eq!(
        response.header("access-control-allow-origin"),
        Some("https://app.example")
    );
    assert_eq!(response.header("access-control-allow-credentials"), Some("true"));
    assert!(response.body().is_empty());
}

#[tokio::test]
async fn test_terminal_resources_and_counters() {
    let metrics = Arc::new(CountingMetrics::default());
    let dispatcher = app()
        .metrics(metrics.clone())
        .dispatcher()
        .unwrap();
    let client = TestClient::from_dispatcher(dispatcher).with_version("demo-1.0+test");

    client
        .get("/billing/ping")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error("UnknownAPIError");

    client
        .get("/demo/pong")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error("UnknownAPICallError");

    client
        .get("/demo/ping")
        .version("demo-1.0+staging")
        .send()
        .await
        .assert_status(StatusCode::NOT_ACCEPTABLE)
        .assert_error("UnknownAPIVersionError");

    client
        .get("/demo/ping")
        .version("demo-2.0+test")
        .send()
        .await
        .assert_error("UnknownAPIVersionError");

    let names = metrics.names.lock().unwrap().clone();
    assert_eq!(
        names,
        [
            "unknown_api.error.UnknownAPIError",
            "demo.error.UnknownAPICallError",
            "demo.error.UnknownAPIVersionError",
            "demo.error.UnknownAPIVersionError",
        ]
    );
}
