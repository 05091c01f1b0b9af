//! The validator contract.

use bytes::Bytes;
use strata_core::{ApiError, RequestContext};

/// A rendered error envelope that stops the request before its handler.
#[derive(Debug, Clone)]
pub struct Rejection {
    body: Bytes,
}

impl Rejection {
    /// Raises `err` on the request and captures the rendered envelope.
    pub fn raise(ctx: &mut RequestContext, err: &ApiError) -> Self {
        Self {
            body: ctx.reject(err),
        }
    }

    /// Wraps an already rendered body.
    #[must_use]
    pub fn from_body(body: Bytes) -> Self {
        Self { body }
    }

    /// Returns the rendered body.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }
}

/// A request-preprocessing stage.
///
/// Validators run in the order they were attached to an endpoint. The first
/// one to return `Err` ends the request with the rejection body.
pub trait Validator: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Checks the request, recording anything it parsed on `ctx`.
    fn validate(&self, ctx: &mut RequestContext) -> Result<(), Rejection>;
}
