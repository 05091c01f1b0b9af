//! Site assembly errors.

use thiserror::Error;

/// Errors raised while assembling or starting a site.
#[derive(Debug, Error)]
pub enum AppError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] strata_config::ConfigError),

    /// A route table could not be compiled.
    #[error(transparent)]
    Router(#[from] strata_router::RouterBuildError),

    /// The server could not be configured or failed while serving.
    #[error(transparent)]
    Server(#[from] strata_server::ServerError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] strata_telemetry::TelemetryError),

    /// `[apis]` names an API that was never registered.
    #[error("configured API {0:?} has no registered module")]
    UnknownModule(String),
}

/// Result alias for site assembly.
pub type Result<T> = std::result::Result<T, AppError>;
