//! Request dispatch: routing plus completion.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use strata_core::{ApiError, CompletionFlag, RequestContext, RequestId, ResponseHead};
use strata_router::{ApiRouter, Resolution};
use tokio::sync::oneshot;

use crate::completion::{render_call, Rendered, ResponseSink};
use crate::Site;

/// Runs requests through the router chain and the completion adapter.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Arc<ApiRouter>,
    site: Site,
}

impl Dispatcher {
    /// Creates a dispatcher with the default site settings.
    #[must_use]
    pub fn new(router: ApiRouter) -> Self {
        Self {
            router: Arc::new(router),
            site: Site::default(),
        }
    }

    /// Sets the site settings.
    #[must_use]
    pub fn with_site(mut self, site: Site) -> Self {
        self.site = site;
        self
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &ApiRouter {
        &self.router
    }

    /// Returns the site settings.
    #[must_use]
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Resolves `ctx` and renders its response.
    ///
    /// A ready response is returned; a deferred one is written to `sink`
    /// when it completes.
    pub fn dispatch(&self, mut ctx: RequestContext, sink: Arc<dyn ResponseSink>) -> Rendered {
        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            uri = %ctx.uri(),
            "dispatching"
        );
        match self.router.resolve(&mut ctx) {
            Resolution::Call(call) => render_call(ctx, &call, sink),
            Resolution::Terminal(terminal) => {
                let body = terminal.render(&mut ctx);
                Rendered::Ready(ctx, body)
            }
        }
    }

    /// Dispatches `ctx` and waits for its response, for at most `timeout`.
    ///
    /// A request that outlives `timeout` is answered with
    /// `UnexpectedServerError` and its late result is discarded. A result
    /// that claimed completion as the timer fired is still delivered.
    pub async fn respond(&self, ctx: RequestContext, timeout: Duration) -> (ResponseHead, Bytes) {
        let completion = ctx.completion().clone();
        let request_id = ctx.request_id();
        let (sink, receiver) = ChannelSink::new();

        let (mut head, body) = match self.dispatch(ctx, Arc::new(sink)) {
            Rendered::Ready(ctx, body) => {
                completion.try_complete();
                (ctx.response_head().clone(), body)
            }
            Rendered::InFlight => await_deferred(receiver, &completion, request_id, timeout).await,
        };
        self.site.stamp(&mut head);
        (head, body)
    }
}

/// How long to wait for a response whose completion was claimed just as the
/// request timed out.
const COMPLETION_GRACE: Duration = Duration::from_secs(1);

async fn await_deferred(
    mut receiver: oneshot::Receiver<(ResponseHead, Bytes)>,
    completion: &CompletionFlag,
    request_id: RequestId,
    timeout: Duration,
) -> (ResponseHead, Bytes) {
    match tokio::time::timeout(timeout, &mut receiver).await {
        Ok(Ok(response)) => response,
        Ok(Err(_)) => unanswered(request_id, "deferred response was dropped"),
        Err(_) if completion.try_complete() => unanswered(request_id, "request timed out"),
        // The deferred result claimed completion as the timer fired.
        Err(_) => match tokio::time::timeout(COMPLETION_GRACE, receiver).await {
            Ok(Ok(response)) => response,
            _ => unanswered(request_id, "request timed out while completing"),
        },
    }
}

fn unanswered(request_id: RequestId, reason: &str) -> (ResponseHead, Bytes) {
    tracing::error!(request_id = %request_id, reason, "no response produced");
    let err = ApiError::unexpected(reason);
    let mut head = ResponseHead {
        status: err.status(),
        ..ResponseHead::default()
    };
    head.headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static(strata_core::JSON_CONTENT_TYPE),
    );
    (head, Bytes::from(err.to_json()))
}

/// Collects a deferred response and hands it to the waiting connection.
struct ChannelSink {
    body: Mutex<BytesMut>,
    sender: Mutex<Option<oneshot::Sender<(ResponseHead, Bytes)>>>,
}

impl ChannelSink {
    fn new() -> (Self, oneshot::Receiver<(ResponseHead, Bytes)>) {
        let (sender, receiver) = oneshot::channel();
        let sink = Self {
            body: Mutex::new(BytesMut::new()),
            sender: Mutex::new(Some(sender)),
        };
        (sink, receiver)
    }
}

impl ResponseSink for ChannelSink {
    fn write(&self, chunk: Bytes) {
        self.body.lock().extend_from_slice(&chunk);
    }

    fn finish(&self, head: ResponseHead) {
        let body = self.body.lock().split().freeze();
        if let Some(sender) = self.sender.lock().take() {
            if sender.send((head, body)).is_err() {
                tracing::debug!("connection closed before the deferred response was ready");
            }
        }
    }
}
