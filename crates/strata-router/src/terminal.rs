//! Terminal resources: where routing ends without a handler.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS,
};
use http::{HeaderValue, StatusCode};
use strata_core::{ApiError, RequestContext};

use crate::api::first_segment;
use crate::ResponsePolicy;

/// Methods advertised in answer to a CORS preflight.
pub const CORS_ALLOWED_METHODS: &str =
    "PUT,GET,DELETE,POST,HEAD,TRACE,CONNECT,PROPFIND,PROPPATCH,MKCOL,COPY,MOVE,LOCK,UNLOCK";

/// A resource that answers a request no handler resolved.
///
/// Every variant answers any method.
#[derive(Debug, Clone)]
pub enum Terminal {
    /// No API prefix matched. 404, `UnknownAPIError`.
    UnknownApi,
    /// The version token was missing, malformed, or named an API, version
    /// or mode that does not exist. 406, `UnknownAPIVersionError`.
    UnknownVersion,
    /// No call pattern matched. 404, `UnknownAPICallError`.
    UnknownCall,
    /// A CORS preflight (`OPTIONS`) request.
    CorsInterrogation(Arc<ResponsePolicy>),
}

impl Terminal {
    /// Renders the response: sets the status and headers on `ctx` and
    /// returns the body.
    pub fn render(&self, ctx: &mut RequestContext) -> Bytes {
        ctx.set_json_content_type();
        match self {
            Self::UnknownApi => {
                let api = first_segment(ctx.path()).to_string();
                tracing::warn!(uri = %ctx.uri(), "unknown API");
                ctx.reject(&ApiError::unknown_api(&api))
            }
            Self::UnknownVersion => {
                let token = ctx.raw_version_token().unwrap_or_default().to_string();
                tracing::warn!(
                    token = %token,
                    "version token is missing, invalid or names an API/version that does not exist"
                );
                ctx.reject(&ApiError::unknown_version(&token))
            }
            Self::UnknownCall => {
                let call = ctx.path().rsplit('/').next().unwrap_or_default().to_string();
                tracing::warn!(uri = %ctx.uri(), "unknown API call");
                ctx.reject(&ApiError::unknown_call(&call))
            }
            Self::CorsInterrogation(policy) => {
                preflight(ctx, policy);
                Bytes::new()
            }
        }
    }
}

fn preflight(ctx: &mut RequestContext, policy: &ResponsePolicy) {
    let allowed_headers = match ctx.headers().get(ACCESS_CONTROL_REQUEST_HEADERS) {
        Some(requested) => requested.clone(),
        None => {
            let names = ctx
                .headers()
                .keys()
                .map(http::HeaderName::as_str)
                .collect::<Vec<_>>()
                .join(",");
            // Header names are always valid header values.
            HeaderValue::from_str(&names).unwrap_or_else(|_| HeaderValue::from_static(""))
        }
    };

    if let Some(origin) = policy.cross_origin() {
        ctx.set_response_header(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    }
    ctx.set_status(StatusCode::OK);
    ctx.set_response_header(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOWED_METHODS),
    );
    ctx.set_response_header(ACCESS_CONTROL_ALLOW_HEADERS, allowed_headers);
    ctx.set_response_header(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    tracing::debug!(uri = %ctx.uri(), "CORS preflight answered");
}
