//! The call tier: one API version's route table.

use std::fmt;
use std::sync::Arc;

use strata_core::{HandlerResult, RequestContext};

use crate::handler::method_not_allowed;
use crate::list_versions::list_versions_handler;
use crate::{HandlerRegistry, RequestHandler, Resolution, Result, RoutePattern, RouteScope, Terminal};

struct RouteEntry {
    pattern: RoutePattern,
    handler: Arc<dyn RequestHandler>,
}

/// Resolves a handler within one API version.
///
/// The route table holds one entry per (pattern, handler) pair, in handler
/// registration order and then pattern declaration order. Resolution is
/// first-match-wins; a later entry with the same pattern is unreachable.
pub struct CallRouter {
    routes: Vec<RouteEntry>,
}

impl CallRouter {
    /// Builds a route table from `registry`.
    pub fn new(registry: HandlerRegistry) -> Result<Self> {
        Self::builder(registry).build()
    }

    /// Starts a builder, for options such as the `list_versions` call.
    #[must_use]
    pub fn builder(registry: HandlerRegistry) -> CallRouterBuilder {
        CallRouterBuilder {
            registry,
            auto_list_versions: false,
        }
    }

    /// Returns the number of route entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates over `(pattern, handler name)` pairs in match order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes
            .iter()
            .map(|r| (r.pattern.as_str(), r.handler.name()))
    }

    /// Resolves the handler for the request.
    ///
    /// Records the negotiated mode, the API configuration and the path
    /// captures on `ctx`, and sets the policy headers of `scope` on the
    /// response before returning the call.
    pub fn resolve(self: &Arc<Self>, ctx: &mut RequestContext, scope: RouteScope) -> Resolution {
        let token = match ctx.version_token() {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = %e, "malformed version token at call tier");
                return Resolution::Terminal(Terminal::UnknownVersion);
            }
        };
        let Some(mode) = token.api_mode() else {
            tracing::debug!(mode = %token.mode, "unknown API mode");
            return Resolution::Terminal(Terminal::UnknownVersion);
        };
        ctx.set_api_mode(mode);
        ctx.set_api_config(Arc::clone(scope.config()));

        let path = call_path(ctx.path());
        for route in &self.routes {
            if let Some(matches) = route.pattern.captures(&path) {
                tracing::debug!(
                    handler = route.handler.name(),
                    pattern = route.pattern.as_str(),
                    mode = %mode,
                    "call resolved"
                );
                ctx.set_url_matches(matches);
                scope.policy().apply(ctx);
                return Resolution::Call(Call {
                    handler: Arc::clone(&route.handler),
                    router: Arc::clone(self),
                    scope,
                });
            }
        }

        tracing::debug!(path = %path, "no call pattern matched");
        Resolution::Terminal(Terminal::UnknownCall)
    }
}

impl fmt::Debug for CallRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.routes()).finish()
    }
}

/// Builder for [`CallRouter`].
#[derive(Debug)]
pub struct CallRouterBuilder {
    registry: HandlerRegistry,
    auto_list_versions: bool,
}

impl CallRouterBuilder {
    /// Appends a `list_versions` call after every registered route.
    #[must_use]
    pub fn auto_list_versions(mut self, enabled: bool) -> Self {
        self.auto_list_versions = enabled;
        self
    }

    /// Compiles the route table.
    pub fn build(self) -> Result<CallRouter> {
        let mut registry = self.registry;
        if self.auto_list_versions {
            registry = registry.register(list_versions_handler());
        }

        let mut routes = Vec::new();
        for handler in registry.iter() {
            for pattern in handler.routes() {
                routes.push(RouteEntry {
                    pattern: RoutePattern::new(pattern)?,
                    handler: Arc::clone(handler),
                });
            }
        }
        Ok(CallRouter { routes })
    }
}

/// The request path below the API segment.
///
/// `/dummy_api/ping%26io` becomes `ping%26io`.
fn call_path(path: &str) -> String {
    path.split('/').skip(2).collect::<Vec<_>>().join("/")
}

/// A resolved call: the handler plus what it inherited from the routers.
#[derive(Clone)]
pub struct Call {
    handler: Arc<dyn RequestHandler>,
    router: Arc<CallRouter>,
    scope: RouteScope,
}

impl Call {
    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn RequestHandler> {
        &self.handler
    }

    /// Returns the call router that resolved this call.
    #[must_use]
    pub fn router(&self) -> &Arc<CallRouter> {
        &self.router
    }

    /// Returns the API and version settings.
    #[must_use]
    pub fn scope(&self) -> &RouteScope {
        &self.scope
    }

    /// Invokes the handler, answering 405 for methods it does not serve.
    pub fn invoke(&self, ctx: &mut RequestContext) -> HandlerResult {
        let allowed = self.handler.methods();
        if !allowed.contains(ctx.method()) {
            tracing::debug!(
                handler = self.handler.name(),
                method = %ctx.method(),
                "method not allowed"
            );
            return Ok(method_not_allowed(ctx, &allowed));
        }
        self.handler.handle(ctx, self)
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("handler", &self.handler.name())
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
