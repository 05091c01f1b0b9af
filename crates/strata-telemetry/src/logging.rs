//! Structured logging.
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default().with_prefix("records"))?;
//! tracing::info!(api = "records", "site started");
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::{TelemetryError, TelemetryResult};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level filter used when `RUST_LOG` is unset (e.g. "info", "strata_router=debug").
    pub level: String,

    /// Whether to output JSON lines.
    pub json_format: bool,

    /// Name logged with the startup event, like a syslog tag.
    pub prefix: Option<String>,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: true,
            prefix: None,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            prefix: None,
            file_line_info: true,
            include_target: true,
        }
    }

    /// Sets the syslog-style prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Builds the level filter: `RUST_LOG` when set, the configured level otherwise.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the configured level does not parse.
pub fn create_env_filter(level: &str) -> TelemetryResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}"))),
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the level does not parse or a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = create_env_filter(&config.level)?;

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    match &config.prefix {
        Some(prefix) => tracing::info!(prefix = %prefix, level = %config.level, "logging initialized"),
        None => tracing::info!(level = %config.level, "logging initialized"),
    }

    Ok(())
}
