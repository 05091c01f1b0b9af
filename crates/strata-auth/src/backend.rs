//! Authentication backends.

use std::collections::{BTreeSet, HashMap};

use futures_util::future::{self, BoxFuture, FutureExt};
use strata_core::RequestContext;
use strata_validate::Credentials;

use crate::AuthError;

/// Permissions held by a caller, keyed by authentication namespace.
pub type PermissionMap = HashMap<String, Vec<String>>;

/// The future returned by [`AuthBackend::authenticate`].
pub type AuthFuture = BoxFuture<'static, Result<PermissionMap, AuthError>>;

/// Authenticates requests.
///
/// `authenticate` reads what it needs from the request up front; the
/// returned future must not borrow the context.
pub trait AuthBackend: Send + Sync + 'static {
    /// Every permission id the backend knows about.
    fn permission_list(&self) -> Result<Vec<String>, AuthError>;

    /// Authenticates the request and returns the caller's permissions.
    fn authenticate(&self, ctx: &RequestContext) -> AuthFuture;
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    permissions: PermissionMap,
}

/// An in-memory backend that authenticates HTTP Basic credentials.
///
/// Suited to tests and small deployments with a fixed set of accounts.
#[derive(Debug, Clone, Default)]
pub struct StaticBackend {
    accounts: HashMap<String, Account>,
}

impl StaticBackend {
    /// Creates a backend with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account.
    #[must_use]
    pub fn account(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.accounts.insert(
            username.into(),
            Account {
                password: password.into(),
                permissions: PermissionMap::new(),
            },
        );
        self
    }

    /// Grants `permissions` in `namespace` to an existing account.
    #[must_use]
    pub fn grant<I, P>(mut self, username: &str, namespace: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        if let Some(account) = self.accounts.get_mut(username) {
            account
                .permissions
                .entry(namespace.into())
                .or_default()
                .extend(permissions.into_iter().map(Into::into));
        }
        self
    }

    fn check(&self, credentials: &Credentials) -> Result<PermissionMap, AuthError> {
        if credentials.username.is_empty() {
            return Err(AuthError::InvalidAuthentication(
                "request carries no credentials".into(),
            ));
        }
        match self.accounts.get(&credentials.username) {
            Some(account) if account.password == credentials.password => {
                Ok(account.permissions.clone())
            }
            _ => Err(AuthError::NotAuthorized("unknown user or bad password".into())),
        }
    }
}

impl AuthBackend for StaticBackend {
    fn permission_list(&self) -> Result<Vec<String>, AuthError> {
        let all: BTreeSet<&String> = self
            .accounts
            .values()
            .flat_map(|a| a.permissions.values().flatten())
            .collect();
        Ok(all.into_iter().cloned().collect())
    }

    fn authenticate(&self, ctx: &RequestContext) -> AuthFuture {
        let result = self.check(&Credentials::from_context(ctx));
        if let Err(e) = &result {
            tracing::debug!(request_id = %ctx.request_id(), error = %e, "authentication failed");
        }
        future::ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> StaticBackend {
        StaticBackend::new()
            .account("alice", "secret")
            .grant("alice", "digitar.com", ["read", "write"])
            .grant("alice", "example.com", ["read"])
            .account("bob", "hunter2")
            .grant("bob", "digitar.com", ["admin"])
    }

    fn basic(user: &str, password: &str) -> RequestContext {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;

        let encoded = STANDARD.encode(format!("{user}:{password}"));
        RequestContext::builder()
            .header("Authorization", &format!("Basic {encoded}"))
            .build()
    }

    #[test]
    fn test_permission_list_sorted_unique() {
        assert_eq!(
            backend().permission_list().unwrap(),
            vec!["admin", "read", "write"]
        );
    }

    #[tokio::test]
    async fn test_authenticates_known_account() {
        let perms = backend().authenticate(&basic("alice", "secret")).await.unwrap();
        assert_eq!(perms["digitar.com"], vec!["read", "write"]);
        assert_eq!(perms["example.com"], vec!["read"]);
    }

    #[tokio::test]
    async fn test_rejects_bad_password() {
        let err = backend()
            .authenticate(&basic("alice", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn test_missing_credentials_invalid() {
        let ctx = RequestContext::builder().build();
        let err = backend().authenticate(&ctx).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidAuthentication(_)));
    }

    #[test]
    fn test_grant_to_unknown_account_ignored() {
        let backend = StaticBackend::new().grant("nobody", "ns", ["read"]);
        assert!(backend.permission_list().unwrap().is_empty());
    }
}
