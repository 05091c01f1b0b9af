//! Router construction errors.

use strata_validate::ValidatorBuildError;
use thiserror::Error;

/// Result alias for router construction.
pub type Result<T> = std::result::Result<T, RouterBuildError>;

/// A route table could not be built.
#[derive(Debug, Error)]
pub enum RouterBuildError {
    /// A route, version or prefix pattern is not a valid regular expression.
    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as written.
        pattern: String,
        /// The regex compiler error.
        #[source]
        source: regex::Error,
    },

    /// A validator attached to an endpoint is misconfigured.
    #[error("invalid validator: {0}")]
    Validator(#[from] ValidatorBuildError),

    /// A configured header value is not a valid HTTP header value.
    #[error("invalid header value for {name}: '{value}'")]
    InvalidHeaderValue {
        /// Header name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },
}
