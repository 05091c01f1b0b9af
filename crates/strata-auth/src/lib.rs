//! # Strata Auth
//!
//! Permission gates and signed cookies.
//!
//! ## Access gate
//!
//! [`Access`] wraps a handler. Before the handler runs, the configured
//! [`AuthBackend`] authenticates the request and returns the permissions the
//! caller holds in each authentication namespace. The gate looks up the
//! namespace the request wants to act in and checks the caller's
//! permissions there:
//!
//! | Mode | Passes when |
//! |------|-------------|
//! | [`Access::all_of`] | every declared permission is held |
//! | [`Access::any_of`] | at least one declared permission is held |
//!
//! The backend is handed to the gate when it is built; there is no
//! process-wide backend.
//!
//! ## Secure cookies
//!
//! [`SecureCookies`] signs cookie values with HMAC-SHA1 over a rotating list
//! of secrets. The first secret signs, any secret verifies, so a secret can
//! be retired without invalidating cookies it already signed.

#![doc(html_root_url = "https://docs.rs/strata-auth/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod access;
mod backend;
mod cookie;
mod error;

pub use access::{Access, Requirement};
pub use backend::{AuthBackend, AuthFuture, PermissionMap, StaticBackend};
pub use cookie::{CookieOptions, SecureCookies};
pub use error::{AuthError, CookieError};
