//! Typed configuration for Strata sites.
//!
//! Configuration is layered, later layers overriding earlier ones:
//! built-in defaults, then a TOML or JSON file, then environment variables.
//!
//! # Example
//!
//! ```no_run
//! use strata_config::ConfigLoader;
//!
//! # fn main() -> Result<(), strata_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_file("strata.toml")?
//!     .with_env_prefix("STRATA")
//!     .load()?;
//!
//! println!("listening on {}:{}", config.general.listen_ip, config.general.listen_port);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [general]
//! listen_ip = "0.0.0.0"
//! listen_port = 9990
//! server_ident = "records/2.1"
//! cross_origin_domains = "*"
//! inhibit_http_caching = true
//! honor_x_real_ip = true
//!
//! [metrics]
//! prefix = "records"
//! prometheus = true
//!
//! [logging]
//! level = "info"
//! format = "json"
//! prefix = "records"
//!
//! # API name -> URL prefix pattern, matched in this order.
//! [apis]
//! records = "records"
//! admin = "admin"
//!
//! # Free-form settings handed to the `records` API's handlers.
//! [api_config.records]
//! page_limit = 100
//! ```
//!
//! # Environment Variable Overrides
//!
//! Variables take the form `PREFIX__SECTION__KEY`:
//!
//! - `STRATA__GENERAL__LISTEN_PORT=8080`
//! - `STRATA__LOGGING__FORMAT=pretty`
//! - `STRATA__APIS__RECORDS=records`

#![doc(html_root_url = "https://docs.rs/strata-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::StrataConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{GeneralConfig, LogFormat, LoggingConfig, MetricsConfig};
