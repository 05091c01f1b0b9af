//! # Strata Router
//!
//! Resolves an inbound request to exactly one call handler, or to exactly
//! one terminal resource, in three tiers:
//!
//! ```text
//!   request ──► ApiRouter ──► VersionRouter ──► CallRouter ──► Call
//!                  │               │                │
//!                  ├─ OPTIONS ─────┼────────────────┼──► CorsInterrogation
//!                  ├─ no prefix ───┼────────────────┼──► UnknownApi      (404)
//!                  └─ bad token ───┴─ no version ───┴──► UnknownVersion  (406)
//!                                                   └──► UnknownCall     (404)
//! ```
//!
//! - [`ApiRouter`] matches the first path segment against URL-prefix
//!   patterns and checks that the negotiation token names the same API.
//! - [`VersionRouter`] matches the token's version against version patterns,
//!   in ascending order of version id.
//! - [`CallRouter`] checks the mode and matches the rest of the path against
//!   the call patterns of its [`HandlerRegistry`], first match wins.
//!
//! Every pattern is anchored at both ends, so a prefix match is never taken
//! for a full one. Route tables are immutable once built and are shared
//! freely between concurrent requests.
//!
//! ## Example
//!
//! ```
//! use strata_core::{Reply, RequestContext};
//! use strata_router::{
//!     ApiModule, ApiRouter, CallHandler, CallRouter, HandlerRegistry, Resolution, VersionRouter,
//! };
//!
//! let registry = HandlerRegistry::new().register(
//!     CallHandler::new("PingCall")
//!         .route("ping")
//!         .get(|_ctx, _call| Ok(Reply::body("pong"))),
//! );
//! let versions = VersionRouter::new([("1.0", r"1\.0", CallRouter::new(registry)?)])?;
//! let router = ApiRouter::builder()
//!     .route("dummy_api", ApiModule::new("dummy_api", versions))
//!     .build()?;
//!
//! let mut ctx = RequestContext::builder()
//!     .uri("/dummy_api/ping")
//!     .header("X-DigiTar-API-Version", "dummy_api-1.0+prod")
//!     .build();
//! assert!(matches!(router.resolve(&mut ctx), Resolution::Call(_)));
//! # Ok::<(), strata_router::RouterBuildError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/strata-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
mod call;
mod error;
mod handler;
mod list_versions;
mod method_table;
mod pattern;
mod scope;
mod terminal;
mod version;

pub use api::{ApiModule, ApiRouter, ApiRouterBuilder};
pub use call::{Call, CallRouter, CallRouterBuilder};
pub use error::{Result, RouterBuildError};
pub use handler::{CallHandler, Endpoint, HandlerRegistry, RequestHandler};
pub use list_versions::LIST_VERSIONS_ROUTE;
pub use method_table::MethodTable;
pub use pattern::RoutePattern;
pub use scope::{ResponsePolicy, RouteScope};
pub use terminal::{Terminal, CORS_ALLOWED_METHODS};
pub use version::{VersionEntry, VersionRouter};

/// The outcome of routing one request.
#[derive(Debug)]
pub enum Resolution {
    /// A handler answers the request.
    Call(Call),
    /// A terminal resource answers the request.
    Terminal(Terminal),
}

impl Resolution {
    /// Returns the terminal resource, if routing ended in one.
    #[must_use]
    pub fn terminal(&self) -> Option<&Terminal> {
        match self {
            Self::Terminal(t) => Some(t),
            Self::Call(_) => None,
        }
    }

    /// Returns the resolved call, if any.
    #[must_use]
    pub fn call(&self) -> Option<&Call> {
        match self {
            Self::Call(c) => Some(c),
            Self::Terminal(_) => None,
        }
    }
}
