//! The hyper accept loop.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use strata_core::{ApiError, RequestContext, ResponseHead};
use tokio::net::{TcpListener, TcpStream};

use crate::{ConnectionTracker, Dispatcher, Result, ServerConfig, ServerError, ShutdownSignal};

/// Response type produced by the server.
pub type HttpResponse = Response<Full<Bytes>>;

/// The Strata HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    dispatcher: Dispatcher,
}

impl Server {
    /// Creates a server.
    #[must_use]
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        Self { config, dispatcher }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serves until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// fires, then waits for open connections up to the shutdown timeout.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<()> {
        tracing::info!(addr = %listener.local_addr()?, "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let server = Arc::clone(&server);
                        let guard = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, peer, shutdown).await {
                                tracing::debug!(peer = %peer, error = %e, "connection error");
                            }
                            drop(guard);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            open = tracker.active_connections(),
            timeout = ?timeout,
            "waiting for open connections"
        );
        if tokio::time::timeout(timeout, tracker.wait_idle()).await.is_err() {
            tracing::warn!(
                open = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }
        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        peer: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> std::result::Result<(), hyper::Error> {
        let server = Arc::clone(self);
        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(req, peer).await) }
        });

        let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_request(&self, req: Request<Incoming>, peer: SocketAddr) -> HttpResponse {
        let (parts, body) = req.into_parts();
        let timeout = self.config.request_timeout();

        let body = match tokio::time::timeout(timeout, body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::warn!(peer = %peer, error = %e, "failed to read request body");
                return self.failure(StatusCode::BAD_REQUEST, "request body could not be read");
            }
            Err(_) => {
                tracing::warn!(peer = %peer, "timed out reading request body");
                return self.failure(StatusCode::REQUEST_TIMEOUT, "request body timed out");
            }
        };

        let mut ctx = RequestContext::from_parts(parts, body);
        self.dispatcher
            .site()
            .set_client_ip(&mut ctx, Some(peer.ip()));

        let (head, body) = self.dispatcher.respond(ctx, timeout).await;
        into_response(head, body)
    }

    fn failure(&self, status: StatusCode, reason: &str) -> HttpResponse {
        let mut head = ResponseHead {
            status,
            ..ResponseHead::default()
        };
        head.headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static(strata_core::JSON_CONTENT_TYPE),
        );
        self.dispatcher.site().stamp(&mut head);
        into_response(head, Bytes::from(ApiError::unexpected(reason).to_json()))
    }
}

fn into_response(head: ResponseHead, body: Bytes) -> HttpResponse {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = head.status;
    *response.headers_mut() = head.headers;
    // The transport sets the length of the body actually sent.
    response.headers_mut().remove(http::header::CONTENT_LENGTH);
    response
}
