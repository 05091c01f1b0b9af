//! Validator construction errors.

use thiserror::Error;

/// A validator was configured inconsistently.
///
/// These are programming errors in the API definition and surface when the
/// router is built, never while serving a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidatorBuildError {
    /// An argument name was empty.
    #[error("argument names must not be empty")]
    EmptyArgumentName,

    /// The same argument was declared twice.
    #[error("argument '{0}' is declared more than once")]
    DuplicateArgument(String),

    /// The default page length is larger than the maximum.
    #[error("default page length ({default}) cannot be greater than maximum page length ({max})")]
    DefaultPageLenExceedsMax {
        /// Configured default page length.
        default: i64,
        /// Configured maximum page length.
        max: i64,
    },

    /// A paging bound was negative.
    #[error("{field} ({value}) cannot be < 0")]
    NegativePagingBound {
        /// The offending setting.
        field: &'static str,
        /// Its value.
        value: i64,
    },
}
