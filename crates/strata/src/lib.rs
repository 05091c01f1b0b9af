//! # Strata
//!
//! **Versioned JSON API dispatcher**
//!
//! Strata routes each request through three tiers (API, version, call)
//! chosen by the URL prefix and the `X-DigiTar-API-Version` negotiation
//! header, runs the call's validators and handler, and renders every
//! failure as the same JSON error envelope.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = HandlerRegistry::new().register(
//!         CallHandler::new("PingCall")
//!             .route("ping")
//!             .get(|_ctx, _call| Ok(Reply::body("pong"))),
//!     );
//!     let versions = VersionRouter::new([("1.0", r"1\.0", CallRouter::new(registry)?)])?;
//!
//!     App::from_file("strata.toml")?
//!         .api(ApiModule::new("records", versions))
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! hyper ─► Site (client IP) ─► ApiRouter ─► VersionRouter ─► CallRouter
//!                                                                 │
//!   response ◄─ Server header ◄─ completion adapter ◄─ validators ◄┘
//! ```

#![doc(html_root_url = "https://docs.rs/strata/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
pub mod demo;
mod error;

pub use app::{App, ENV_PREFIX};
pub use error::{AppError, Result};

pub use strata_auth as auth;
pub use strata_config as config;
pub use strata_core as core;
pub use strata_router as router;
pub use strata_server as server;
pub use strata_telemetry as telemetry;
pub use strata_validate as validate;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use strata::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{App, AppError};

    pub use strata_core::{
        write_json, ApiError, ApiMode, HandlerResult, Reply, RequestContext, Resume,
    };

    pub use strata_router::{
        ApiModule, Call, CallHandler, CallRouter, Endpoint, HandlerRegistry, RequestHandler,
        VersionRouter,
    };

    pub use strata_validate::{ArgType, BasicAuth, JsonArguments, Paging, UrlArguments};

    pub use strata_auth::{Access, AuthBackend, SecureCookies};

    pub use strata_config::{ConfigLoader, StrataConfig};
}
