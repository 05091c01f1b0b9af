//! Call handlers and their registration.
//!
//! A handler declares the route patterns it answers and the methods it
//! serves. Handlers are registered explicitly, in order, in a
//! [`HandlerRegistry`]; a [`CallRouter`](crate::CallRouter) turns the
//! registry into its route table.
//!
//! Most handlers are built with [`CallHandler`]:
//!
//! ```
//! use strata_core::{write_json, Reply};
//! use strata_router::{CallHandler, Endpoint, HandlerRegistry};
//! use strata_validate::{ArgType, JsonArguments};
//!
//! # fn main() -> Result<(), strata_router::RouterBuildError> {
//! let ping = CallHandler::new("PingCall")
//!     .route("ping(?P<group1>.*)")
//!     .route("me")
//!     .get(|ctx, _call| {
//!         let echo = ctx.url_match("group1").unwrap_or_default().to_string();
//!         Ok(Reply::Ready(write_json(ctx, &echo)))
//!     })
//!     .on(
//!         http::Method::POST,
//!         Endpoint::new(|ctx, _call| Ok(Reply::body("{}")))
//!             .require(JsonArguments::builder().required("arg1", ArgType::String).build()?),
//!     );
//!
//! let registry = HandlerRegistry::new().register(ping);
//! assert_eq!(registry.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use http::header::ALLOW;
use http::{HeaderValue, Method, StatusCode};
use strata_core::{HandlerResult, Reply, RequestContext};
use strata_validate::Validator;

use crate::{Call, MethodTable};

/// A request handler registered with a call router.
pub trait RequestHandler: Send + Sync + 'static {
    /// Handler name, used in logs.
    fn name(&self) -> &str;

    /// Route patterns this handler answers, relative to the API segment.
    ///
    /// A handler with no routes is never reachable.
    fn routes(&self) -> &[String];

    /// Methods this handler serves.
    fn methods(&self) -> Vec<Method>;

    /// Handles one request.
    ///
    /// Only called for a method listed by [`methods`](Self::methods).
    fn handle(&self, ctx: &mut RequestContext, call: &Call) -> HandlerResult;
}

type RenderFn = dyn Fn(&mut RequestContext, &Call) -> HandlerResult + Send + Sync;

/// A render function plus the validators it requires.
///
/// Validators run in the order they were added. The first rejection is the
/// response and the render function does not run.
#[derive(Clone)]
pub struct Endpoint {
    render: Arc<RenderFn>,
    validators: Vec<Arc<dyn Validator>>,
}

impl Endpoint {
    /// Creates an endpoint without validators.
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&mut RequestContext, &Call) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
            validators: Vec::new(),
        }
    }

    /// Adds a validator after the ones already attached.
    #[must_use]
    pub fn require<V: Validator>(mut self, validator: V) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Returns the names of the attached validators, in order.
    #[must_use]
    pub fn validator_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Runs the validators and then the render function.
    pub fn call(&self, ctx: &mut RequestContext, call: &Call) -> HandlerResult {
        for validator in &self.validators {
            if let Err(rejection) = validator.validate(ctx) {
                tracing::debug!(
                    validator = validator.name(),
                    status = ctx.status().as_u16(),
                    "request rejected by validator"
                );
                return Ok(Reply::Ready(rejection.into_body()));
            }
        }
        (self.render)(ctx, call)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("validators", &self.validator_names())
            .finish_non_exhaustive()
    }
}

/// A handler assembled from routes and per-method endpoints.
#[derive(Debug, Clone)]
pub struct CallHandler {
    name: String,
    routes: Vec<String>,
    endpoints: MethodTable,
}

impl CallHandler {
    /// Creates a handler with no routes and no endpoints.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: Vec::new(),
            endpoints: MethodTable::new(),
        }
    }

    /// Adds a route pattern.
    #[must_use]
    pub fn route(mut self, pattern: impl Into<String>) -> Self {
        self.routes.push(pattern.into());
        self
    }

    /// Registers an endpoint for `method`.
    #[must_use]
    pub fn on(mut self, method: Method, endpoint: Endpoint) -> Self {
        self.endpoints = self.endpoints.method(method, endpoint);
        self
    }

    /// Registers a `GET` render function.
    #[must_use]
    pub fn get<F>(self, render: F) -> Self
    where
        F: Fn(&mut RequestContext, &Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::GET, Endpoint::new(render))
    }

    /// Registers a `POST` render function.
    #[must_use]
    pub fn post<F>(self, render: F) -> Self
    where
        F: Fn(&mut RequestContext, &Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::POST, Endpoint::new(render))
    }

    /// Registers a `PUT` render function.
    #[must_use]
    pub fn put<F>(self, render: F) -> Self
    where
        F: Fn(&mut RequestContext, &Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::PUT, Endpoint::new(render))
    }

    /// Registers a `DELETE` render function.
    #[must_use]
    pub fn delete<F>(self, render: F) -> Self
    where
        F: Fn(&mut RequestContext, &Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::DELETE, Endpoint::new(render))
    }
}

impl RequestHandler for CallHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn routes(&self) -> &[String] {
        &self.routes
    }

    fn methods(&self) -> Vec<Method> {
        self.endpoints.allowed()
    }

    fn handle(&self, ctx: &mut RequestContext, call: &Call) -> HandlerResult {
        match self.endpoints.get(ctx.method()) {
            Some(endpoint) => endpoint.call(ctx, call),
            None => Ok(method_not_allowed(ctx, &self.methods())),
        }
    }
}

/// Answers with 405 and an `Allow` header listing `allowed`.
pub(crate) fn method_not_allowed(ctx: &mut RequestContext, allowed: &[Method]) -> Reply {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    ctx.set_status(StatusCode::METHOD_NOT_ALLOWED);
    if let Ok(value) = HeaderValue::from_str(&allow) {
        ctx.set_response_header(ALLOW, value);
    }
    Reply::empty()
}

/// The ordered set of handlers one API version exposes.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn RequestHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler. Registration order is route-table order.
    #[must_use]
    pub fn register<H: RequestHandler>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Appends a shared handler.
    #[must_use]
    pub fn register_shared(mut self, handler: Arc<dyn RequestHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Returns the number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Iterates over the handlers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn RequestHandler>> {
        self.handlers.iter()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.name()))
            .finish()
    }
}
