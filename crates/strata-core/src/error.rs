//! API error taxonomy and the JSON error envelope.
//!
//! Every failure that reaches a client is an [`ApiError`]: a stable integer
//! code, a stable class name and a message that may embed contextual values.
//! Rendering always produces the same shape:
//!
//! ```json
//! {"result": null, "error": {"error_code": 502, "exception_class": "ValueError", "exception_text": "Invalid value for argument 'page'. Argument must be an integer."}}
//! ```
//!
//! # Reserved kinds
//!
//! | Kind | Code | Status |
//! |------|------|--------|
//! | `UnknownApiCall` | 203 | 404 |
//! | `JsonEncode` | 204 | 409 |
//! | `JsonDecode` | 205 | 409 |
//! | `RequestNotHash` | 206 | 409 |
//! | `UnknownApiVersion` | 207 | 406 |
//! | `UnknownApi` | 208 | 404 |
//! | `AccessDenied` | 501 | 409 |
//! | `Value` | 502 | 409 |
//! | `ContentType` | 503 | 406 |
//! | `CharsetNotUtf8` | 504 | 409 |
//! | `UnexpectedServer` | 505 | 409 |
//! | `InvalidAuthentication` | 506 | 409 |
//! | `InvalidSecureCookie` | 507 | 409 |
//! | `ExpiredSecureCookie` | 508 | 409 |
//!
//! Applications add their own kinds with [`ApiError::custom`].

use std::borrow::Cow;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::json;

/// The kind of an [`ApiError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No API prefix matched the request path.
    UnknownApi,
    /// The negotiation token was malformed or named no known version/mode.
    UnknownApiVersion,
    /// No call pattern matched within the resolved version.
    UnknownApiCall,
    /// The handler result could not be serialized.
    JsonEncode,
    /// The request body was not valid JSON.
    JsonDecode,
    /// The request body was JSON but not an object.
    RequestNotHash,
    /// The caller lacks the required permission.
    AccessDenied,
    /// An argument was missing or invalid.
    Value,
    /// The request `Content-Type` was missing or unexpected.
    ContentType,
    /// The request charset was missing or not UTF-8.
    CharsetNotUtf8,
    /// A handler failed unexpectedly.
    UnexpectedServer,
    /// Authentication data was malformed or incomplete.
    InvalidAuthentication,
    /// A secure cookie carried a bad signature.
    InvalidSecureCookie,
    /// A secure cookie is past its expiry.
    ExpiredSecureCookie,
    /// Application-defined error.
    Custom {
        /// Numeric error code.
        code: i64,
        /// Error class name.
        class: Cow<'static, str>,
        /// HTTP status to respond with.
        status: StatusCode,
    },
}

impl ErrorKind {
    /// Returns the stable numeric code.
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::UnknownApiCall => 203,
            Self::JsonEncode => 204,
            Self::JsonDecode => 205,
            Self::RequestNotHash => 206,
            Self::UnknownApiVersion => 207,
            Self::UnknownApi => 208,
            Self::AccessDenied => 501,
            Self::Value => 502,
            Self::ContentType => 503,
            Self::CharsetNotUtf8 => 504,
            Self::UnexpectedServer => 505,
            Self::InvalidAuthentication => 506,
            Self::InvalidSecureCookie => 507,
            Self::ExpiredSecureCookie => 508,
            Self::Custom { code, .. } => *code,
        }
    }

    /// Returns the stable class name.
    #[must_use]
    pub fn class(&self) -> &str {
        match self {
            Self::UnknownApi => "UnknownAPIError",
            Self::UnknownApiVersion => "UnknownAPIVersionError",
            Self::UnknownApiCall => "UnknownAPICallError",
            Self::JsonEncode => "JSONEncodeError",
            Self::JsonDecode => "JSONDecodeError",
            Self::RequestNotHash => "RequestNotHashError",
            Self::AccessDenied => "AccessDeniedError",
            Self::Value => "ValueError",
            Self::ContentType => "ContentTypeError",
            Self::CharsetNotUtf8 => "CharsetNotUTF8Error",
            Self::UnexpectedServer => "UnexpectedServerError",
            Self::InvalidAuthentication => "InvalidAuthenticationError",
            Self::InvalidSecureCookie => "InvalidSecureCookieError",
            Self::ExpiredSecureCookie => "ExpiredSecureCookieError",
            Self::Custom { class, .. } => class,
        }
    }

    /// Returns the HTTP status this kind responds with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownApi | Self::UnknownApiCall => StatusCode::NOT_FOUND,
            Self::UnknownApiVersion | Self::ContentType => StatusCode::NOT_ACCEPTABLE,
            Self::Custom { status, .. } => *status,
            _ => StatusCode::CONFLICT,
        }
    }
}

/// A client-facing API error.
///
/// # Example
///
/// ```
/// use strata_core::{ApiError, ErrorKind};
///
/// let err = ApiError::value("page", "Argument must be an integer.");
/// assert_eq!(err.code(), 502);
/// assert_eq!(
///     err.text(),
///     "Invalid value for argument 'page'. Argument must be an integer."
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {}", .kind.class(), .text)]
pub struct ApiError {
    kind: ErrorKind,
    text: String,
}

impl ApiError {
    /// Creates an error of the given kind with explicit text.
    #[must_use]
    pub fn new(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// The requested API is unknown.
    #[must_use]
    pub fn unknown_api(api_name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownApi,
            format!("The requested API '{api_name}' is unknown."),
        )
    }

    /// The negotiation token names no valid API/version.
    #[must_use]
    pub fn unknown_version(token: &str) -> Self {
        Self::new(
            ErrorKind::UnknownApiVersion,
            format!(
                "API version '{token}' is invalid or specifies an API/version that does not exist."
            ),
        )
    }

    /// The requested call is unknown.
    #[must_use]
    pub fn unknown_call(call_name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownApiCall,
            format!("The requested API call '{call_name}' is unknown."),
        )
    }

    /// The result could not be JSON-encoded.
    #[must_use]
    pub fn json_encode() -> Self {
        Self::new(
            ErrorKind::JsonEncode,
            "An unrecoverable error has occurred JSON-encoding the API call result.",
        )
    }

    /// The request body was not valid JSON.
    #[must_use]
    pub fn json_decode() -> Self {
        Self::new(
            ErrorKind::JsonDecode,
            "Arguments passed in API call request are not validly formed JSON.",
        )
    }

    /// The request body was not a JSON object.
    #[must_use]
    pub fn request_not_hash() -> Self {
        Self::new(
            ErrorKind::RequestNotHash,
            "Request body must be a JSON-encoded hash table/dictionary.",
        )
    }

    /// The caller lacks permission.
    #[must_use]
    pub fn access_denied() -> Self {
        Self::new(
            ErrorKind::AccessDenied,
            "Insufficient permission to perform the requested action.",
        )
    }

    /// An argument was missing or invalid.
    #[must_use]
    pub fn value(argument: &str, detail: &str) -> Self {
        Self::new(
            ErrorKind::Value,
            format!("Invalid value for argument '{argument}'. {detail}"),
        )
    }

    /// The request `Content-Type` was missing or unexpected.
    #[must_use]
    pub fn content_type() -> Self {
        Self::new(
            ErrorKind::ContentType,
            "The Content-Type of the API request was not of the expected format...or the API/version requested does not exist.",
        )
    }

    /// The request charset was missing or not UTF-8.
    #[must_use]
    pub fn charset_not_utf8() -> Self {
        Self::new(
            ErrorKind::CharsetNotUtf8,
            "The Content-Type of the API request did not specify a charset, or the charset specified was not UTF-8.",
        )
    }

    /// A handler failed unexpectedly.
    #[must_use]
    pub fn unexpected(detail: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::UnexpectedServer,
            format!("An unexpected error has occurred processing the request. Error: '{detail}'"),
        )
    }

    /// Authentication data was malformed or incomplete.
    #[must_use]
    pub fn invalid_authentication() -> Self {
        Self::new(
            ErrorKind::InvalidAuthentication,
            "Authentication information is invalidly formed and/or missing required elements.",
        )
    }

    /// A secure cookie signature did not verify.
    #[must_use]
    pub fn invalid_secure_cookie(name: &str, signature: &str) -> Self {
        Self::new(
            ErrorKind::InvalidSecureCookie,
            format!("Secure cookie '{name}' signature '{signature}' is invalid."),
        )
    }

    /// A secure cookie has expired.
    #[must_use]
    pub fn expired_secure_cookie(name: &str) -> Self {
        Self::new(
            ErrorKind::ExpiredSecureCookie,
            format!("Secure cookie '{name}' is expired."),
        )
    }

    /// An application-defined error with the default 409 status.
    #[must_use]
    pub fn custom(code: i64, class: impl Into<Cow<'static, str>>, text: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Custom {
                code,
                class: class.into(),
                status: StatusCode::CONFLICT,
            },
            text,
        )
    }

    /// Overrides the HTTP status of a custom error.
    ///
    /// Reserved kinds keep their fixed status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        if let ErrorKind::Custom { status: s, .. } = &mut self.kind {
            *s = status;
        }
        self
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the numeric error code.
    #[must_use]
    pub fn code(&self) -> i64 {
        self.kind.code()
    }

    /// Returns the error class name.
    #[must_use]
    pub fn class(&self) -> &str {
        self.kind.class()
    }

    /// Returns the message text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Returns the counter name recorded when this error is raised.
    #[must_use]
    pub fn counter_name(&self, api_name: &str) -> String {
        let api = if api_name.is_empty() {
            "unknown_api"
        } else {
            api_name
        };
        format!("{api}.error.{}", self.class())
    }

    /// Builds the serializable envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            result: None,
            error: ErrorBody {
                error_code: self.code(),
                exception_class: self.class().to_string(),
                exception_text: self.text.clone(),
            },
        }
    }

    /// Renders the envelope as a JSON string.
    #[must_use]
    pub fn to_json(&self) -> String {
        json::to_string(&self.to_envelope()).unwrap_or_default()
    }
}

/// The JSON error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `null` for errors.
    pub result: Option<serde_json::Value>,
    /// Error details.
    pub error: ErrorBody,
}

/// The `error` member of an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub error_code: i64,
    /// Error class name.
    pub exception_class: String,
    /// Message text.
    pub exception_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_codes_and_statuses() {
        let cases = [
            (ApiError::unknown_api("x"), 208, "UnknownAPIError", 404),
            (ApiError::unknown_version("x"), 207, "UnknownAPIVersionError", 406),
            (ApiError::unknown_call("x"), 203, "UnknownAPICallError", 404),
            (ApiError::json_encode(), 204, "JSONEncodeError", 409),
            (ApiError::json_decode(), 205, "JSONDecodeError", 409),
            (ApiError::request_not_hash(), 206, "RequestNotHashError", 409),
            (ApiError::access_denied(), 501, "AccessDeniedError", 409),
            (ApiError::value("a", "b"), 502, "ValueError", 409),
            (ApiError::content_type(), 503, "ContentTypeError", 406),
            (ApiError::charset_not_utf8(), 504, "CharsetNotUTF8Error", 409),
            (ApiError::unexpected("boom"), 505, "UnexpectedServerError", 409),
            (ApiError::invalid_authentication(), 506, "InvalidAuthenticationError", 409),
            (ApiError::invalid_secure_cookie("c", "s"), 507, "InvalidSecureCookieError", 409),
            (ApiError::expired_secure_cookie("c"), 508, "ExpiredSecureCookieError", 409),
        ];

        for (err, code, class, status) in cases {
            assert_eq!(err.code(), code, "{class}");
            assert_eq!(err.class(), class);
            assert_eq!(err.status().as_u16(), status, "{class}");
        }
    }

    #[test]
    fn test_envelope_json_shape() {
        let err = ApiError::unknown_api("foo");
        assert_eq!(
            err.to_json(),
            r#"{"result": null, "error": {"error_code": 208, "exception_class": "UnknownAPIError", "exception_text": "The requested API 'foo' is unknown."}}"#
        );
    }

    #[test]
    fn test_envelope_round_trips_through_serde() {
        let err = ApiError::value("arg1", "Argument is missing.");
        let parsed: ErrorEnvelope = serde_json::from_str(&err.to_json()).unwrap();
        assert_eq!(parsed, err.to_envelope());
        assert!(parsed.result.is_none());
    }

    #[test]
    fn test_templated_texts() {
        assert_eq!(
            ApiError::unknown_version("").text(),
            "API version '' is invalid or specifies an API/version that does not exist."
        );
        assert_eq!(
            ApiError::unexpected("boom").text(),
            "An unexpected error has occurred processing the request. Error: 'boom'"
        );
        assert_eq!(
            ApiError::invalid_secure_cookie("sid", "abc").text(),
            "Secure cookie 'sid' signature 'abc' is invalid."
        );
    }

    #[test]
    fn test_custom_error() {
        let err = ApiError::custom(100, "SampleNormalError", "Something sample happened.");
        assert_eq!(err.code(), 100);
        assert_eq!(err.class(), "SampleNormalError");
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = err.with_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_with_status_ignored_for_reserved() {
        let err = ApiError::access_denied().with_status(StatusCode::UNAUTHORIZED);
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_counter_name() {
        let err = ApiError::json_decode();
        assert_eq!(err.counter_name("mylogin_api"), "mylogin_api.error.JSONDecodeError");
        assert_eq!(err.counter_name(""), "unknown_api.error.JSONDecodeError");
    }

    #[test]
    fn test_display() {
        let err = ApiError::access_denied();
        assert_eq!(
            err.to_string(),
            "AccessDeniedError: Insufficient permission to perform the requested action."
        );
    }
}
