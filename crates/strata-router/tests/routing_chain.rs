//! End-to-end resolution through the three router tiers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use http::{Method, StatusCode};
use serde_json::{json, Map, Value};
use strata_core::{write_json, ApiError, MetricsSink, Reply, RequestContext};
use strata_router::{
    ApiModule, ApiRouter, CallHandler, CallRouter, HandlerRegistry, Resolution, Terminal,
    VersionRouter, CORS_ALLOWED_METHODS,
};

#[derive(Debug, Default)]
struct CountingMetrics {
    names: Mutex<Vec<String>>,
}

impl MetricsSink for CountingMetrics {
    fn increment(&self, counter_name: &str) {
        self.names.lock().unwrap().push(counter_name.to_string());
    }
}

#[derive(Serialize)]
struct Echo {
    version: &'static str,
    group1: String,
}

fn version(body: &'static str, hits: Arc<AtomicUsize>) -> CallRouter {
    let registry = HandlerRegistry::new().register(
        CallHandler::new("PingCall")
            .route("ping(?P<group1>.*)")
            .get(move |ctx, _call| {
                hits.fetch_add(1, Ordering::SeqCst);
                let echo = Echo {
                    version: body,
                    group1: ctx.url_match("group1").unwrap_or_default().to_string(),
                };
                Ok(Reply::Ready(write_json(ctx, &echo)))
            }),
    );
    CallRouter::builder(registry)
        .auto_list_versions(true)
        .build()
        .unwrap()
}

fn router(metrics: Arc<CountingMetrics>, hits: Arc<AtomicUsize>) -> ApiRouter {
    let versions = VersionRouter::new([
        ("1.0", r"1\.0", version("v1", Arc::clone(&hits))),
        ("0.9", r"0\.9", version("v0", hits)),
    ])
    .unwrap();

    let mut config = Map::new();
    config.insert("arg1".into(), Value::Bool(true));
    config.insert("arg2".into(), json!(42));

    ApiRouter::builder()
        .route("example", ApiModule::new("dummy_api", versions))
        .config("dummy_api", config)
        .cross_origin_domains("*")
        .metrics(metrics)
        .build()
        .unwrap()
}

fn request(method: Method, uri: &str, token: Option<&str>) -> RequestContext {
    let mut builder = RequestContext::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("X-DigiTar-API-Version", token);
    }
    builder.build()
}

fn respond(router: &ApiRouter, ctx: &mut RequestContext) -> Vec<u8> {
    match router.resolve(ctx) {
        Resolution::Call(call) => match call.invoke(ctx).unwrap() {
            Reply::Ready(body) => body.to_vec(),
            Reply::Pending(_) => panic!("handler should answer synchronously"),
        },
        Resolution::Terminal(terminal) => terminal.render(ctx).to_vec(),
    }
}

#[test]
fn resolves_version_and_call() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = router(Arc::default(), Arc::clone(&hits));
    let mut ctx = request(Method::GET, "/example/ping%20me", Some("dummy_api-0.9+test"));

    let body = respond(&router, &mut ctx);
    assert_eq!(
        body,
        br#"{"version": "v0", "group1": " me"}"#.to_vec()
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(ctx.status(), StatusCode::OK);
    assert_eq!(ctx.api_version(), "0.9");
    assert_eq!(ctx.api_config()["arg2"], json!(42));
    assert_eq!(ctx.response_headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[test]
fn unknown_version_scenarios() {
    let router = router(Arc::default(), Arc::default());
    for token in [
        Some("badmojoapi-1.0+prod"),
        Some("dummy_api-3.0+prod"),
        Some("dummy_api-1.0+staging"),
        Some("dummy_api"),
        None,
    ] {
        let mut ctx = request(Method::GET, "/example/ping", token);
        let body = respond(&router, &mut ctx);
        assert_eq!(ctx.status(), StatusCode::NOT_ACCEPTABLE, "token {token:?}");
        assert_eq!(
            body,
            ApiError::unknown_version(token.unwrap_or_default())
                .to_json()
                .into_bytes()
        );
    }
}

#[test]
fn unknown_api_and_call() {
    let metrics = Arc::new(CountingMetrics::default());
    let router = router(Arc::clone(&metrics), Arc::default());

    let mut ctx = request(Method::POST, "/nope/ping", Some("dummy_api-1.0+prod"));
    let body = respond(&router, &mut ctx);
    assert_eq!(ctx.status(), StatusCode::NOT_FOUND);
    assert_eq!(body, ApiError::unknown_api("nope").to_json().into_bytes());

    let mut ctx = request(Method::GET, "/example/pong", Some("dummy_api-1.0+prod"));
    let body = respond(&router, &mut ctx);
    assert_eq!(ctx.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.response_headers()[CONTENT_TYPE], "application/json; charset=utf-8");
    assert_eq!(body, ApiError::unknown_call("pong").to_json().into_bytes());

    let names = metrics.names.lock().unwrap().clone();
    assert_eq!(
        names,
        vec![
            "unknown_api.error.UnknownAPIError".to_string(),
            "dummy_api.error.UnknownAPICallError".to_string(),
        ]
    );
}

#[test]
fn cors_preflight_bypasses_negotiation() {
    let router = router(Arc::default(), Arc::default());
    let mut ctx = RequestContext::builder()
        .method(Method::OPTIONS)
        .uri("/whatever")
        .header("Access-Control-Request-Headers", "Content-Type")
        .build();

    let resolution = router.resolve(&mut ctx);
    assert!(matches!(
        resolution.terminal(),
        Some(Terminal::CorsInterrogation(_))
    ));
    let body = respond(&router, &mut ctx);
    assert!(body.is_empty());
    assert_eq!(ctx.status(), StatusCode::OK);
    assert_eq!(ctx.response_headers()[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    assert_eq!(
        ctx.response_headers()["access-control-allow-methods"],
        CORS_ALLOWED_METHODS
    );
}

#[test]
fn list_versions_reports_all_versions() {
    let router = router(Arc::default(), Arc::default());
    let mut ctx = request(
        Method::GET,
        "/example/list_versions",
        Some("dummy_api-1.0+prod"),
    );
    let body = respond(&router, &mut ctx);
    assert_eq!(
        body,
        br#"{"all_versions": ["0.9", "1.0"], "curr_version": "1.0"}"#.to_vec()
    );
}

#[test]
fn version_token_from_query() {
    let router = router(Arc::default(), Arc::default());
    let mut ctx = request(
        Method::GET,
        "/example/ping?X-DigiTar-API-Version=dummy_api-1.0%2Bprod",
        None,
    );
    let body = respond(&router, &mut ctx);
    assert_eq!(body, br#"{"version": "v1", "group1": ""}"#.to_vec());
}
