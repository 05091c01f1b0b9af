//! Settings a resolved call inherits from the routers above it.

use std::sync::Arc;

use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, PRAGMA,
};
use http::HeaderValue;
use serde_json::{Map, Value};
use strata_core::RequestContext;

use crate::{Result, RouterBuildError};

/// Cross-origin and caching headers applied to every call response.
#[derive(Debug, Clone)]
pub struct ResponsePolicy {
    cross_origin: Option<HeaderValue>,
    inhibit_http_caching: bool,
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self {
            cross_origin: None,
            inhibit_http_caching: true,
        }
    }
}

impl ResponsePolicy {
    /// Creates a policy.
    pub fn new(cross_origin: Option<&str>, inhibit_http_caching: bool) -> Result<Self> {
        let cross_origin = cross_origin
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| RouterBuildError::InvalidHeaderValue {
                    name: "access-control-allow-origin",
                    value: origin.to_string(),
                })
            })
            .transpose()?;
        Ok(Self {
            cross_origin,
            inhibit_http_caching,
        })
    }

    /// Returns the allowed origin, if cross-origin requests are enabled.
    #[must_use]
    pub fn cross_origin(&self) -> Option<&HeaderValue> {
        self.cross_origin.as_ref()
    }

    /// Returns `true` if responses must not be cached.
    #[must_use]
    pub fn inhibit_http_caching(&self) -> bool {
        self.inhibit_http_caching
    }

    /// Sets the JSON content type and the policy headers on the response.
    pub fn apply(&self, ctx: &mut RequestContext) {
        ctx.set_json_content_type();
        if let Some(origin) = &self.cross_origin {
            ctx.set_response_header(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            ctx.set_response_header(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        if self.inhibit_http_caching {
            ctx.set_response_header(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            ctx.set_response_header(PRAGMA, HeaderValue::from_static("no-cache"));
        }
    }
}

/// What a call can see of the API and version it was resolved under.
///
/// Built by the [`ApiRouter`](crate::ApiRouter) and extended by the
/// [`VersionRouter`](crate::VersionRouter) on the way down; a resolved
/// [`Call`](crate::Call) carries it to the handler.
#[derive(Debug, Clone)]
pub struct RouteScope {
    api_name: String,
    config: Arc<Map<String, Value>>,
    policy: Arc<ResponsePolicy>,
    versions: Arc<[String]>,
}

impl RouteScope {
    /// Creates a scope for one API.
    #[must_use]
    pub fn new(
        api_name: impl Into<String>,
        config: Arc<Map<String, Value>>,
        policy: Arc<ResponsePolicy>,
    ) -> Self {
        Self {
            api_name: api_name.into(),
            config,
            policy,
            versions: Arc::from(Vec::new()),
        }
    }

    /// A scope with no API-level settings, for routers used on their own.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(String::new(), Arc::default(), Arc::default())
    }

    /// Records the version ids of the API.
    #[must_use]
    pub fn with_versions(mut self, versions: Arc<[String]>) -> Self {
        self.versions = versions;
        self
    }

    /// Returns the resolved API name.
    #[must_use]
    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    /// Returns the API configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<Map<String, Value>> {
        &self.config
    }

    /// Returns the response policy.
    #[must_use]
    pub fn policy(&self) -> &ResponsePolicy {
        &self.policy
    }

    /// Returns every version id of the API, ascending.
    #[must_use]
    pub fn versions(&self) -> &[String] {
        &self.versions
    }
}
