//! # Strata Validate
//!
//! Request-preprocessing stages that a handler can require before it runs.
//!
//! Every [`Validator`] inspects the [`RequestContext`](strata_core::RequestContext)
//! and either lets the request through or short-circuits it with a rendered
//! error envelope, in which case the handler is never invoked.
//!
//! | Validator | Checks | Failure |
//! |-----------|--------|---------|
//! | [`JsonArguments`] | `Content-Type`, charset, JSON object body, typed arguments | `ContentTypeError`, `CharsetNotUTF8Error`, `JSONDecodeError`, `RequestNotHashError`, `ValueError` |
//! | [`UrlArguments`] | required query arguments, optional `Content-Type` | `ValueError`, `ContentTypeError`, `CharsetNotUTF8Error` |
//! | [`Paging`] | `page` / `page_len` query arguments | `ValueError` |
//! | [`BasicAuth`] | HTTP Basic credentials | `AccessDeniedError` with status 401 |
//!
//! ## Example
//!
//! ```
//! use strata_validate::{ArgType, JsonArguments, Paging};
//!
//! let json = JsonArguments::builder()
//!     .required("arg1", ArgType::String)
//!     .optional("arg2", ArgType::Integer)
//!     .build()
//!     .unwrap();
//!
//! // Defaults out of range are rejected before any request is served.
//! assert!(Paging::new(0, 100, 10).is_err());
//! ```

#![doc(html_root_url = "https://docs.rs/strata-validate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod basic_auth;
mod content_type;
mod error;
mod json;
mod paging;
mod query;
mod validator;

pub use basic_auth::{BasicAuth, Credentials, DEFAULT_REALM};
pub use content_type::{check_content_type, JSON_MEDIA_TYPE};
pub use error::ValidatorBuildError;
pub use json::{ArgSpec, ArgType, JsonArguments, JsonArgumentsBuilder};
pub use paging::{PageArgs, Paging};
pub use query::UrlArguments;
pub use validator::{Rejection, Validator};
