//! The completion adapter.
//!
//! A handler hands back one of four things: a ready body, a pending result,
//! an error, or a panic. The adapter turns each into exactly one response:
//!
//! | Handler outcome | Response |
//! |-----------------|----------|
//! | `Ok(Reply::Ready(body))` | `body`, returned to the caller for writing |
//! | `Ok(Reply::Pending(fut))` | written to the sink when `fut` resolves |
//! | `Err(e)` or a panic, before or after deferral | `UnexpectedServerError` envelope |
//!
//! A pending result that resumes with a continuation gets the request
//! context back; the continuation's own reply is resolved the same way.
//! Whichever path finishes first claims the request's
//! [`CompletionFlag`](strata_core::CompletionFlag); later attempts are
//! dropped.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use strata_core::{
    ApiError, Deferred, HandlerFailure, HandlerResult, Reply, RequestContext, ResponseHead, Resume,
};
use strata_router::Call;

/// Where a deferred response is delivered.
pub trait ResponseSink: Send + Sync + 'static {
    /// Writes a body chunk.
    fn write(&self, chunk: Bytes);

    /// Finishes the response with its status and headers.
    fn finish(&self, head: ResponseHead);
}

/// What the adapter did with a handler's result.
#[derive(Debug)]
pub enum Rendered {
    /// The response is ready now; the caller writes it.
    Ready(RequestContext, Bytes),
    /// The response will be written to the sink.
    InFlight,
}

/// Invokes `call` and resolves its result.
pub fn render_call(mut ctx: RequestContext, call: &Call, sink: Arc<dyn ResponseSink>) -> Rendered {
    let result = panic::catch_unwind(AssertUnwindSafe(|| call.invoke(&mut ctx)))
        .unwrap_or_else(|payload| Err(panic_failure(payload.as_ref())));
    settle(ctx, result, sink)
}

fn settle(mut ctx: RequestContext, result: HandlerResult, sink: Arc<dyn ResponseSink>) -> Rendered {
    match result {
        Ok(Reply::Ready(body)) => Rendered::Ready(ctx, body),
        Ok(Reply::Pending(pending)) => {
            tracing::debug!(request_id = %ctx.request_id(), "handler deferred its response");
            tokio::spawn(drive(ctx, pending, sink));
            Rendered::InFlight
        }
        Err(err) => {
            let body = fail(&mut ctx, &err);
            Rendered::Ready(ctx, body)
        }
    }
}

async fn drive(mut ctx: RequestContext, mut pending: Deferred, sink: Arc<dyn ResponseSink>) {
    let body = loop {
        let outcome = AssertUnwindSafe(pending)
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(panic_failure(payload.as_ref())));

        let continuation = match outcome {
            Ok(Resume::Done(body)) => break body.unwrap_or_default(),
            Ok(Resume::Continue(continuation)) => continuation,
            Err(err) => break fail(&mut ctx, &err),
        };

        let resumed = panic::catch_unwind(AssertUnwindSafe(|| continuation(&mut ctx)))
            .unwrap_or_else(|payload| Err(panic_failure(payload.as_ref())));
        match resumed {
            Ok(Reply::Ready(body)) => break body,
            Ok(Reply::Pending(next)) => pending = next,
            Err(err) => break fail(&mut ctx, &err),
        }
    };
    deliver(&ctx, body, sink.as_ref());
}

/// Writes `body` and finishes, unless the request was already completed.
fn deliver(ctx: &RequestContext, body: Bytes, sink: &dyn ResponseSink) {
    if ctx.completion().try_complete() {
        sink.write(body);
        sink.finish(ctx.response_head().clone());
    } else {
        tracing::warn!(
            request_id = %ctx.request_id(),
            "response already completed; dropping deferred result"
        );
    }
}

/// Renders a handler failure as `UnexpectedServerError`.
fn fail(ctx: &mut RequestContext, err: &HandlerFailure) -> Bytes {
    tracing::error!(
        request_id = %ctx.request_id(),
        uri = %ctx.uri(),
        error = %format!("{err:#}"),
        "handler failed"
    );
    ctx.set_json_content_type();
    ctx.reject(&ApiError::unexpected(format!("{err:#}")))
}

fn panic_failure(payload: &(dyn Any + Send)) -> HandlerFailure {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string());
    anyhow::anyhow!(message)
}
