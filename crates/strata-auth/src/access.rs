//! The permission gate.

use std::fmt;
use std::sync::Arc;

use http::Method;
use serde_json::Value;
use strata_core::{HandlerFailure, HandlerResult, Reply, RequestContext};
use strata_router::{Call, RequestHandler};

use crate::{AuthBackend, AuthError, PermissionMap};

/// How the declared permissions are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Every declared permission must be held.
    AllOf,
    /// At least one declared permission must be held.
    AnyOf,
}

#[derive(Debug)]
struct Policy {
    namespace_var: String,
    permissions: Vec<String>,
    requirement: Requirement,
}

impl Policy {
    /// The namespace the request acts in: JSON arguments first, then path
    /// captures, then the query string.
    fn namespace(&self, ctx: &RequestContext) -> Result<String, AuthError> {
        let var = self.namespace_var.as_str();
        if let Some(value) = ctx.json_args().and_then(|args| args.get(var)) {
            return Ok(match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
        if let Some(value) = ctx.url_match(var) {
            return Ok(value.to_string());
        }
        ctx.query_arg(var).map(str::to_string).ok_or_else(|| {
            AuthError::InvalidAuthentication(format!("request is missing required variable {var}"))
        })
    }

    fn authorize(
        &self,
        ctx: &RequestContext,
        mut granted: PermissionMap,
    ) -> Result<(String, Vec<String>), AuthError> {
        let namespace = self.namespace(ctx)?;
        let insufficient = || AuthError::NotAuthorized("insufficient permissions".into());

        let held = granted.remove(&namespace).ok_or_else(insufficient)?;
        let matched = held
            .iter()
            .filter(|p| self.permissions.contains(p))
            .count();
        let passes = match self.requirement {
            Requirement::AllOf => matched > 0 && matched >= self.permissions.len(),
            Requirement::AnyOf => matched > 0,
        };
        if passes {
            Ok((namespace, held))
        } else {
            Err(insufficient())
        }
    }
}

/// Wraps a handler so it only runs for callers holding the declared
/// permissions in the namespace the request names.
///
/// The namespace and the caller's full permission list in it are attached
/// to the request context before the wrapped handler runs.
///
/// | Backend / gate outcome | Response |
/// |------------------------|----------|
/// | namespace variable missing, or invalid credentials | `InvalidAuthenticationError` |
/// | permissions insufficient | `AccessDeniedError` |
/// | any other backend failure | `UnexpectedServerError` |
pub struct Access {
    inner: Arc<dyn RequestHandler>,
    backend: Arc<dyn AuthBackend>,
    policy: Arc<Policy>,
}

impl Access {
    /// Gates `handler` on holding every permission in `permissions`.
    pub fn all_of<H, I, P>(
        backend: Arc<dyn AuthBackend>,
        namespace_var: impl Into<String>,
        permissions: I,
        handler: H,
    ) -> Self
    where
        H: RequestHandler,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self::new(backend, namespace_var, permissions, Requirement::AllOf, handler)
    }

    /// Gates `handler` on holding at least one permission in `permissions`.
    pub fn any_of<H, I, P>(
        backend: Arc<dyn AuthBackend>,
        namespace_var: impl Into<String>,
        permissions: I,
        handler: H,
    ) -> Self
    where
        H: RequestHandler,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self::new(backend, namespace_var, permissions, Requirement::AnyOf, handler)
    }

    fn new<H, I, P>(
        backend: Arc<dyn AuthBackend>,
        namespace_var: impl Into<String>,
        permissions: I,
        requirement: Requirement,
        handler: H,
    ) -> Self
    where
        H: RequestHandler,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            inner: Arc::new(handler),
            backend,
            policy: Arc::new(Policy {
                namespace_var: namespace_var.into(),
                permissions: permissions.into_iter().map(Into::into).collect(),
                requirement,
            }),
        }
    }

    /// Returns how the declared permissions are checked.
    #[must_use]
    pub fn requirement(&self) -> Requirement {
        self.policy.requirement
    }

    /// Returns the declared permissions.
    #[must_use]
    pub fn permissions(&self) -> &[String] {
        &self.policy.permissions
    }
}

fn admit(
    ctx: &mut RequestContext,
    outcome: Result<PermissionMap, AuthError>,
    policy: &Policy,
    inner: &dyn RequestHandler,
    call: &Call,
) -> HandlerResult {
    match outcome.and_then(|granted| policy.authorize(ctx, granted)) {
        Ok((namespace, permissions)) => {
            tracing::debug!(
                handler = inner.name(),
                namespace = %namespace,
                "access granted"
            );
            ctx.set_auth_namespace(namespace);
            ctx.set_permissions(permissions);
            inner.handle(ctx, call)
        }
        Err(e @ (AuthError::InvalidAuthentication(_) | AuthError::NotAuthorized(_))) => {
            tracing::debug!(handler = inner.name(), error = %e, "access refused");
            Ok(Reply::Ready(ctx.reject(&e.to_api_error())))
        }
        Err(e) => {
            tracing::error!(handler = inner.name(), error = %e, "authentication backend failed");
            Ok(Reply::Ready(ctx.reject(&e.to_api_error())))
        }
    }
}

impl RequestHandler for Access {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn routes(&self) -> &[String] {
        self.inner.routes()
    }

    fn methods(&self) -> Vec<Method> {
        self.inner.methods()
    }

    fn handle(&self, ctx: &mut RequestContext, call: &Call) -> HandlerResult {
        let authenticating = self.backend.authenticate(ctx);
        let policy = Arc::clone(&self.policy);
        let inner = Arc::clone(&self.inner);
        let call = call.clone();

        Ok(Reply::then(async move {
            let outcome = authenticating.await;
            Ok::<_, HandlerFailure>(move |ctx: &mut RequestContext| {
                admit(ctx, outcome, &policy, inner.as_ref(), &call)
            })
        }))
    }
}

impl fmt::Debug for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Access")
            .field("handler", &self.inner.name())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn granted(namespace: &str, perms: &[&str]) -> PermissionMap {
        HashMap::from([(
            namespace.to_string(),
            perms.iter().map(|p| (*p).to_string()).collect(),
        )])
    }

    fn policy(requirement: Requirement, perms: &[&str]) -> Policy {
        Policy {
            namespace_var: "domain".into(),
            permissions: perms.iter().map(|p| (*p).to_string()).collect(),
            requirement,
        }
    }

    fn with_query(query: &str) -> RequestContext {
        RequestContext::builder()
            .uri(&format!("/api/call?{query}"))
            .build()
    }

    #[test]
    fn test_any_of_needs_one() {
        let ctx = with_query("domain=digitar.com");
        let (ns, held) = policy(Requirement::AnyOf, &["read", "admin"])
            .authorize(&ctx, granted("digitar.com", &["read", "write"]))
            .unwrap();
        assert_eq!(ns, "digitar.com");
        assert_eq!(held, vec!["read", "write"]);
    }

    #[test]
    fn test_all_of_needs_every_permission() {
        let ctx = with_query("domain=digitar.com");
        let err = policy(Requirement::AllOf, &["read", "admin"])
            .authorize(&ctx, granted("digitar.com", &["read", "write"]))
            .unwrap_err();
        assert!(matches!(err, AuthError::NotAuthorized(_)));

        assert!(policy(Requirement::AllOf, &["read", "write"])
            .authorize(&ctx, granted("digitar.com", &["read", "write"]))
            .is_ok());
    }

    #[test]
    fn test_other_namespace_is_not_authorized() {
        let ctx = with_query("domain=example.com");
        let err = policy(Requirement::AnyOf, &["read"])
            .authorize(&ctx, granted("digitar.com", &["read"]))
            .unwrap_err();
        assert!(matches!(err, AuthError::NotAuthorized(_)));
    }

    #[test]
    fn test_missing_namespace_is_invalid_authentication() {
        let ctx = with_query("other=1");
        let err = policy(Requirement::AnyOf, &["read"])
            .authorize(&ctx, granted("digitar.com", &["read"]))
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidAuthentication(_)));
    }

    #[test]
    fn test_json_args_take_precedence() {
        let mut ctx = with_query("domain=example.com");
        let mut args = serde_json::Map::new();
        args.insert("domain".into(), Value::String("digitar.com".into()));
        ctx.set_json_args(args);

        let (ns, _) = policy(Requirement::AnyOf, &["read"])
            .authorize(&ctx, granted("digitar.com", &["read"]))
            .unwrap();
        assert_eq!(ns, "digitar.com");
    }
}
