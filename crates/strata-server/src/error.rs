//! Server errors.

use std::net::SocketAddr;

use thiserror::Error;

/// Result alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors raised while starting or running the server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    /// The listen address could not be parsed.
    #[error("invalid listen address '{0}'")]
    InvalidAddress(String),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configured server identity is not a valid header value.
    #[error("invalid server ident '{0}'")]
    InvalidServerIdent(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
