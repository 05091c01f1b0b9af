//! Error types for authentication and cookies.

use strata_core::ApiError;
use thiserror::Error;

/// Errors reported by an authentication backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// The backend is misconfigured.
    #[error("bad authentication backend: {0}")]
    BadBackend(String),

    /// No backend is available.
    #[error("no authentication backend: {0}")]
    NoBackend(String),

    /// Credentials are missing or malformed.
    #[error("invalid authentication: {0}")]
    InvalidAuthentication(String),

    /// The caller lacks the required permissions.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// The backend is still loading and cannot answer yet.
    #[error("authentication backend warming up: {0}")]
    WarmingUp(String),
}

impl AuthError {
    /// Converts the error into the envelope the caller receives.
    #[must_use]
    pub fn to_api_error(&self) -> ApiError {
        match self {
            Self::InvalidAuthentication(_) => ApiError::invalid_authentication(),
            Self::NotAuthorized(_) => ApiError::access_denied(),
            other => ApiError::unexpected(other),
        }
    }
}

/// Errors raised by [`SecureCookies`](crate::SecureCookies).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CookieError {
    /// No signing secret was supplied.
    #[error("at least one cookie secret is required")]
    NoSecrets,

    /// A secret could not be used as an HMAC key.
    #[error("cookie secret is not a valid HMAC key")]
    InvalidSecret,

    /// A cookie lifetime in days is outside the representable date range.
    #[error("cookie lifetime of {days} days is out of range")]
    ExpiryOutOfRange {
        /// Configured lifetime.
        days: i64,
    },

    /// The signature verified but the cookie is older than allowed.
    #[error("secure cookie '{name}' is expired")]
    Expired {
        /// Cookie name.
        name: String,
    },

    /// No secret produced the cookie's signature.
    #[error("secure cookie '{name}' signature '{signature}' is invalid")]
    InvalidSignature {
        /// Cookie name.
        name: String,
        /// Signature carried by the cookie.
        signature: String,
    },
}

impl CookieError {
    /// Converts the error into the envelope the caller receives.
    #[must_use]
    pub fn to_api_error(&self) -> ApiError {
        match self {
            Self::Expired { name } => ApiError::expired_secure_cookie(name),
            Self::InvalidSignature { name, signature } => {
                ApiError::invalid_secure_cookie(name, signature)
            }
            Self::NoSecrets | Self::InvalidSecret | Self::ExpiryOutOfRange { .. } => {
                ApiError::unexpected(self)
            }
        }
    }
}
