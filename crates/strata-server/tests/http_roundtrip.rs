//! Requests served over a real socket.

use std::time::Duration;

use strata_core::{HandlerFailure, Reply};
use strata_router::{ApiModule, ApiRouter, CallHandler, CallRouter, HandlerRegistry, VersionRouter};
use strata_server::{Dispatcher, Server, ServerConfig, ShutdownSignal, Site};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn dispatcher() -> Dispatcher {
    let registry = HandlerRegistry::new()
        .register(
            CallHandler::new("WhoAmI")
                .route("whoami")
                .get(|ctx, _call| {
                    let ip = ctx.client_ip().map(|ip| ip.to_string()).unwrap_or_default();
                    Ok(Reply::body(format!("\"{ip}\"")))
                }),
        )
        .register(CallHandler::new("Later").route("later").get(|_ctx, _call| {
            Ok(Reply::deferred(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, HandlerFailure>(Some("\"later\""))
            }))
        }));
    let versions =
        VersionRouter::new([("1.0", r"1\.0", CallRouter::new(registry).unwrap())]).unwrap();
    let router = ApiRouter::builder()
        .route("svc", ApiModule::new("svc", versions))
        .build()
        .unwrap();
    Dispatcher::new(router).with_site(Site::new(Some("svc/1.0"), true).unwrap())
}

async fn start() -> (std::net::SocketAddr, ShutdownSignal, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let server = Server::new(
        ServerConfig::builder()
            .shutdown_timeout(Duration::from_secs(1))
            .build(),
        dispatcher(),
    );
    let signal = shutdown.clone();
    let handle = tokio::spawn(async move {
        server.serve(listener, signal).await.unwrap();
    });
    (addr, shutdown, handle)
}

async fn send(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(2), stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    String::from_utf8(response).unwrap()
}

fn get(path: &str, extra: &str) -> String {
    format!(
        "GET {path} HTTP/1.1\r\nHost: localhost\r\nX-DigiTar-API-Version: svc-1.0+prod\r\n{extra}Connection: close\r\n\r\n"
    )
}

#[tokio::test]
async fn serves_ready_and_deferred_responses() {
    let (addr, shutdown, handle) = start().await;

    let response = send(addr, &get("/svc/whoami", "X-Real-IP: 198.51.100.7\r\n")).await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.to_lowercase().contains("server: svc/1.0"));
    assert!(response.ends_with("\"198.51.100.7\""));

    let response = send(addr, &get("/svc/later", "")).await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.ends_with("\"later\""));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn unknown_api_over_the_wire() {
    let (addr, shutdown, handle) = start().await;

    let response = send(addr, &get("/other/whoami", "")).await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found"), "{response}");
    assert!(response.contains(
        r#"{"result": null, "error": {"error_code": 208, "exception_class": "UnknownAPIError", "exception_text": "The requested API 'other' is unknown."}}"#
    ));

    shutdown.trigger();
    handle.await.unwrap();
}
