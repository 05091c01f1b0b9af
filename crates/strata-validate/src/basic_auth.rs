//! HTTP Basic authentication.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, WWW_AUTHENTICATE};
use http::{HeaderValue, StatusCode};
use strata_core::{ApiError, RequestContext};

use crate::{Rejection, Validator};

/// Realm advertised when none is configured.
pub const DEFAULT_REALM: &str = "Strata";

/// Username and password from an `Authorization: Basic` header.
///
/// Both are empty when the header is absent or malformed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Extracts credentials from the request.
    #[must_use]
    pub fn from_context(ctx: &RequestContext) -> Self {
        ctx.headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or_default()
    }

    fn parse(header: &str) -> Option<Self> {
        let encoded = header
            .strip_prefix("Basic ")
            .or_else(|| header.strip_prefix("basic "))?;
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

type CheckFn = dyn Fn(&str, &str) -> bool + Send + Sync;

/// Checks Basic credentials with a caller-supplied predicate.
///
/// On failure the request is answered with status 401, a
/// `WWW-Authenticate: Basic realm="<realm>"` challenge and an
/// `AccessDeniedError` envelope.
#[derive(Clone)]
pub struct BasicAuth {
    check: Arc<CheckFn>,
    realm: String,
}

impl BasicAuth {
    /// Creates a validator calling `check(username, password)`.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
            realm: DEFAULT_REALM.to_string(),
        }
    }

    /// Sets the realm.
    #[must_use]
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    /// Returns the realm.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

impl Validator for BasicAuth {
    fn name(&self) -> &'static str {
        "auth_http_basic"
    }

    fn validate(&self, ctx: &mut RequestContext) -> Result<(), Rejection> {
        let creds = Credentials::from_context(ctx);
        if (self.check)(&creds.username, &creds.password) {
            return Ok(());
        }

        tracing::debug!(username = %creds.username, realm = %self.realm, "basic auth rejected");
        let body = ctx.reject(&ApiError::access_denied());
        ctx.set_status(StatusCode::UNAUTHORIZED);

        let challenge = format!("Basic realm=\"{}\"", self.realm);
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            ctx.set_response_header(WWW_AUTHENTICATE, value);
        }
        ctx.set_response_header(CONTENT_LENGTH, HeaderValue::from(body.len()));
        Err(Rejection::from_body(body))
    }
}
