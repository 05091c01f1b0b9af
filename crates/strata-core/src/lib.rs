//! # Strata Core
//!
//! Core types shared by every tier of the Strata dispatcher.
//!
//! This crate provides the foundational types used throughout Strata:
//!
//! - [`VersionToken`] / [`decode`] - The `X-DigiTar-API-Version` negotiation codec
//! - [`ApiError`] / [`ErrorEnvelope`] - Canonical error taxonomy and JSON envelope
//! - [`RequestContext`] - Per-request state threaded through the router chain
//! - [`Reply`] - Immediate or pending handler results
//! - [`MetricsSink`] - Narrow counter interface for the stats collaborator
//!
//! ## Error Envelope
//!
//! Every failure path renders the same body:
//!
//! ```json
//! {"result": null, "error": {"error_code": 208, "exception_class": "UnknownAPIError", "exception_text": "The requested API 'foo' is unknown."}}
//! ```

#![doc(html_root_url = "https://docs.rs/strata-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
pub mod json;
mod metrics;
pub mod negotiation;
mod reply;

pub use context::{
    CaptureMap, CompletionFlag, RequestContext, RequestContextBuilder, RequestId, ResponseHead,
    JSON_CONTENT_TYPE,
};
pub use error::{ApiError, ErrorBody, ErrorEnvelope, ErrorKind};
pub use json::write_json;
pub use metrics::{MetricsSink, NoopMetrics};
pub use negotiation::{decode, ApiMode, NegotiationError, VersionToken, VERSION_HEADER};
pub use reply::{Continuation, Deferred, HandlerFailure, HandlerResult, Reply, Resume};
