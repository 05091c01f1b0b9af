//! The API tier: entry point of the router chain.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use serde_json::{Map, Value};
use strata_core::{MetricsSink, NoopMetrics, RequestContext};

use crate::{Resolution, ResponsePolicy, Result, RoutePattern, RouteScope, Terminal, VersionRouter};

/// An API: its declared name and its versions.
#[derive(Debug, Clone)]
pub struct ApiModule {
    name: String,
    versions: VersionRouter,
}

impl ApiModule {
    /// Creates an API module.
    ///
    /// The name is compared, lower-cased, with the API named by the
    /// negotiation token.
    #[must_use]
    pub fn new(name: impl Into<String>, versions: VersionRouter) -> Self {
        Self {
            name: name.into(),
            versions,
        }
    }

    /// Returns the declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the version router.
    #[must_use]
    pub fn versions(&self) -> &VersionRouter {
        &self.versions
    }
}

struct ApiRoute {
    pattern: RoutePattern,
    module: ApiModule,
}

/// Resolves which API answers a request and answers CORS preflights.
///
/// The first path segment is matched against each URL-prefix pattern in
/// order. On the first match the module's lower-cased name is recorded as
/// the request's API name and must equal the API named by the negotiation
/// token, otherwise the request ends in `UnknownVersion`.
pub struct ApiRouter {
    routes: Vec<ApiRoute>,
    configs: HashMap<String, Arc<Map<String, Value>>>,
    policy: Arc<ResponsePolicy>,
    metrics: Arc<dyn MetricsSink>,
}

impl ApiRouter {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> ApiRouterBuilder {
        ApiRouterBuilder::default()
    }

    /// Iterates over `(prefix pattern, module)` pairs in match order.
    pub fn route_map(&self) -> impl Iterator<Item = (&str, &ApiModule)> {
        self.routes.iter().map(|r| (r.pattern.as_str(), &r.module))
    }

    /// Returns the configuration attached to requests for `api_name`.
    #[must_use]
    pub fn config(&self, api_name: &str) -> Option<&Map<String, Value>> {
        self.configs.get(api_name).map(AsRef::as_ref)
    }

    /// Returns the response policy.
    #[must_use]
    pub fn policy(&self) -> &ResponsePolicy {
        &self.policy
    }

    /// Resolves the request to a call or a terminal resource.
    pub fn resolve(&self, ctx: &mut RequestContext) -> Resolution {
        ctx.set_metrics(Arc::clone(&self.metrics));

        if ctx.method() == Method::OPTIONS {
            return Resolution::Terminal(Terminal::CorsInterrogation(Arc::clone(&self.policy)));
        }

        let token = match ctx.version_token() {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = %e, "malformed version token");
                return Resolution::Terminal(Terminal::UnknownVersion);
            }
        };

        let segment = first_segment(ctx.path()).to_string();
        for route in &self.routes {
            if !route.pattern.is_match(&segment) {
                continue;
            }

            let api_name = route.module.name.to_lowercase();
            ctx.set_api_name(api_name.clone());
            if token.api != api_name {
                tracing::debug!(
                    api = %api_name,
                    requested = %token.api,
                    "version token names a different API"
                );
                return Resolution::Terminal(Terminal::UnknownVersion);
            }

            tracing::debug!(api = %api_name, prefix = route.pattern.as_str(), "API resolved");
            let config = self.configs.get(&api_name).cloned().unwrap_or_default();
            let scope = RouteScope::new(api_name, config, Arc::clone(&self.policy));
            return route.module.versions.resolve(ctx, scope);
        }

        tracing::debug!(segment = %segment, "no API prefix matched");
        Resolution::Terminal(Terminal::UnknownApi)
    }
}

impl fmt::Debug for ApiRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRouter")
            .field(
                "routes",
                &self.route_map().map(|(p, m)| (p, m.name())).collect::<Vec<_>>(),
            )
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// The first segment of a request path.
pub(crate) fn first_segment(path: &str) -> &str {
    path.split('/').nth(1).unwrap_or_default()
}

/// Builder for [`ApiRouter`].
#[derive(Default)]
pub struct ApiRouterBuilder {
    routes: Vec<(String, ApiModule)>,
    configs: HashMap<String, Map<String, Value>>,
    cross_origin: Option<String>,
    inhibit_http_caching: Option<bool>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl ApiRouterBuilder {
    /// Appends an API under a URL-prefix pattern.
    #[must_use]
    pub fn route(mut self, prefix_pattern: impl Into<String>, module: ApiModule) -> Self {
        self.routes.push((prefix_pattern.into(), module));
        self
    }

    /// Sets the configuration attached to requests for `api_name`.
    #[must_use]
    pub fn config(mut self, api_name: impl Into<String>, config: Map<String, Value>) -> Self {
        self.configs.insert(api_name.into().to_lowercase(), config);
        self
    }

    /// Enables cross-origin requests from `origin`.
    #[must_use]
    pub fn cross_origin_domains(mut self, origin: impl Into<String>) -> Self {
        self.cross_origin = Some(origin.into());
        self
    }

    /// Sets whether responses carry `no-cache` headers. Defaults to `true`.
    #[must_use]
    pub fn inhibit_http_caching(mut self, inhibit: bool) -> Self {
        self.inhibit_http_caching = Some(inhibit);
        self
    }

    /// Sets the metrics sink attached to every request.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Compiles the prefix table.
    pub fn build(self) -> Result<ApiRouter> {
        let policy = ResponsePolicy::new(
            self.cross_origin.as_deref(),
            self.inhibit_http_caching.unwrap_or(true),
        )?;

        let mut routes = Vec::with_capacity(self.routes.len());
        for (pattern, module) in self.routes {
            routes.push(ApiRoute {
                pattern: RoutePattern::new(&pattern)?,
                module,
            });
        }

        Ok(ApiRouter {
            routes,
            configs: self
                .configs
                .into_iter()
                .map(|(k, v)| (k, Arc::new(v)))
                .collect(),
            policy: Arc::new(policy),
            metrics: self.metrics.unwrap_or_else(|| Arc::new(NoopMetrics)),
        })
    }
}

impl fmt::Debug for ApiRouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRouterBuilder")
            .field("routes", &self.routes.len())
            .field("cross_origin", &self.cross_origin)
            .finish_non_exhaustive()
    }
}
