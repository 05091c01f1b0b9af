//! Test response inspection.

use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use strata_core::ResponseHead;

use crate::TestError;

/// A response captured by the test client.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Creates a response from its parts.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub(crate) fn from_head(head: ResponseHead, body: Bytes) -> Self {
        Self::new(head.status, head.headers, body)
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status as a number.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns all headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the first value of header `name` as a string.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes the body as a JSON value.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Returns `(error_code, exception_class)` if the body is an error envelope.
    #[must_use]
    pub fn error(&self) -> Option<(i64, String)> {
        let value = self.json_value().ok()?;
        let error = value.get("error")?;
        let code = error.get("error_code")?.as_i64()?;
        let class = error.get("exception_class")?.as_str()?.to_string();
        Some((code, class))
    }

    /// Asserts the status.
    ///
    /// # Panics
    ///
    /// Panics if the status does not match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}: {}",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that the body is an error envelope of class `class`.
    ///
    /// # Panics
    ///
    /// Panics if the body is not an error envelope or the class differs.
    pub fn assert_error(&self, class: &str) -> &Self {
        match self.error() {
            Some((_, actual)) => assert_eq!(actual, class, "unexpected error class"),
            None => panic!(
                "Expected {class} envelope, got {}",
                String::from_utf8_lossy(&self.body)
            ),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> TestResponse {
        TestResponse::new(
            StatusCode::CONFLICT,
            HeaderMap::new(),
            Bytes::from_static(
                br#"{"result": null, "error": {"error_code": 501, "exception_class": "AccessDeniedError", "exception_text": "Access Denied."}}"#,
            ),
        )
    }

    #[test]
    fn test_error_envelope() {
        let response = envelope();
        assert_eq!(response.error(), Some((501, "AccessDeniedError".to_string())));
        response
            .assert_status(StatusCode::CONFLICT)
            .assert_error("AccessDeniedError");
    }

    #[test]
    fn test_non_envelope() {
        let response = TestResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from("pong"));
        assert!(response.error().is_none());
        assert_eq!(response.text().unwrap(), "pong");
        assert!(response.json_value().is_err());
    }

    #[test]
    #[should_panic(expected = "Expected AccessDeniedError envelope")]
    fn test_assert_error_on_plain_body() {
        TestResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from("pong"))
            .assert_error("AccessDeniedError");
    }
}
