//! Handler results.
//!
//! A handler either has its body ready when it returns, or hands back a
//! [`Deferred`] future that completes later. A deferred result may itself
//! resume with a [`Continuation`] that needs the request context again,
//! which is how gates that await an external service (an authentication
//! backend, say) run the wrapped handler once the service has answered.

use std::future::Future;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::RequestContext;

/// Failure raised by a handler. Rendered as `UnexpectedServerError`.
pub type HandlerFailure = anyhow::Error;

/// What a handler returns.
pub type HandlerResult = Result<Reply, HandlerFailure>;

/// A pending handler result.
pub type Deferred = BoxFuture<'static, Result<Resume, HandlerFailure>>;

/// Work to run against the request context after a deferred step.
pub type Continuation = Box<dyn FnOnce(&mut RequestContext) -> HandlerResult + Send>;

/// The outcome of a handler invocation.
pub enum Reply {
    /// The body is ready now.
    Ready(Bytes),
    /// The body will be produced later.
    Pending(Deferred),
}

impl Reply {
    /// An empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Ready(Bytes::new())
    }

    /// A ready body from anything convertible to bytes.
    #[must_use]
    pub fn body(body: impl Into<Bytes>) -> Self {
        Self::Ready(body.into())
    }

    /// A pending body produced by `fut`. `None` finishes with an empty body.
    pub fn deferred<F, B>(fut: F) -> Self
    where
        F: Future<Output = Result<Option<B>, HandlerFailure>> + Send + 'static,
        B: Into<Bytes>,
    {
        Self::Pending(
            fut.map(|res| res.map(|body| Resume::Done(body.map(Into::into))))
                .boxed(),
        )
    }

    /// A pending step that resumes with access to the request context.
    pub fn then<F, C>(fut: F) -> Self
    where
        F: Future<Output = Result<C, HandlerFailure>> + Send + 'static,
        C: FnOnce(&mut RequestContext) -> HandlerResult + Send + 'static,
    {
        Self::Pending(
            fut.map(|res| res.map(|cont| Resume::Continue(Box::new(cont) as Continuation)))
                .boxed(),
        )
    }

    /// Returns `true` if the reply is still pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(body) => f.debug_tuple("Ready").field(body).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// What a [`Deferred`] produces when it completes successfully.
pub enum Resume {
    /// Final body; `None` is written as an empty body.
    Done(Option<Bytes>),
    /// Run the continuation against the request context.
    Continue(Continuation),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deferred_maps_body() {
        let reply = Reply::deferred(async { Ok::<_, HandlerFailure>(Some("later")) });
        assert!(reply.is_pending());

        let Reply::Pending(fut) = reply else {
            panic!("expected pending reply");
        };
        match fut.await.unwrap() {
            Resume::Done(Some(body)) => assert_eq!(&body[..], b"later"),
            _ => panic!("expected body"),
        }
    }

    #[tokio::test]
    async fn test_then_resumes_with_context() {
        let reply = Reply::then(async {
            Ok::<_, HandlerFailure>(|ctx: &mut RequestContext| {
                ctx.set_auth_namespace("ns");
                Ok(Reply::body("resumed"))
            })
        });
        let Reply::Pending(fut) = reply else {
            panic!("expected pending reply");
        };
        let Resume::Continue(cont) = fut.await.unwrap() else {
            panic!("expected continuation");
        };

        let mut ctx = RequestContext::builder().build();
        let next = cont(&mut ctx).unwrap();
        assert_eq!(ctx.auth_namespace(), Some("ns"));
        assert!(matches!(next, Reply::Ready(ref b) if &b[..] == b"resumed"));
    }

    #[test]
    fn test_deferred_none_is_empty_done() {
        let Reply::Pending(fut) = Reply::deferred(async { Ok::<Option<&str>, _>(None) }) else {
            panic!("expected pending reply");
        };
        assert!(matches!(tokio_test::block_on(fut), Ok(Resume::Done(None))));
    }

    #[test]
    fn test_ready_constructors() {
        assert!(matches!(Reply::empty(), Reply::Ready(ref b) if b.is_empty()));
        assert!(!Reply::body("x").is_pending());
    }
}
