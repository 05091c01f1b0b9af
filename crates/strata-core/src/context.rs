//! Per-request state.
//!
//! A [`RequestContext`] is created for every inbound request and threaded by
//! `&mut` through the router chain, the argument validators and the handler.
//! Routers record what they resolved on it (API name, version, mode, path
//! captures, API configuration); validators record parsed arguments; and
//! every tier writes response status and headers to it. It is discarded once
//! the response has been finalized.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::negotiation::{self, ApiMode, NegotiationError, VersionToken, VERSION_HEADER};
use crate::{ApiError, MetricsSink};

/// The JSON content type set on every dispatcher response.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Named path captures, percent-decoded, in pattern order.
pub type CaptureMap = IndexMap<String, String>;

/// A unique, time-ordered request identifier (UUID v7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Guard that lets exactly one caller finalize a response.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CompletionFlag(Arc<AtomicBool>);

impl CompletionFlag {
    /// Claims completion. Returns `true` only for the first caller.
    pub fn try_complete(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    /// Returns `true` once completion has been claimed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Response status and headers accumulated while a request is processed.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
}

impl Default for ResponseHead {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }
}

/// Per-request mutable state.
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    query: Vec<(String, String)>,
    client_ip: Option<IpAddr>,

    api_name: String,
    api_version: String,
    api_mode: Option<ApiMode>,
    url_matches: CaptureMap,
    api_config: Arc<Map<String, Value>>,
    json_args: Option<Map<String, Value>>,
    permissions: Vec<String>,
    auth_namespace: Option<String>,
    metrics: Option<Arc<dyn MetricsSink>>,

    response: ResponseHead,
    completion: CompletionFlag,
}

impl RequestContext {
    /// Starts building a context.
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Builds a context from HTTP request parts and a collected body.
    #[must_use]
    pub fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        RequestContextBuilder {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            client_ip: None,
        }
        .build()
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a request header as a string, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the request `Content-Type`, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns all query arguments in order.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the first value of a query argument.
    #[must_use]
    pub fn query_arg(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if the query carries the named argument.
    #[must_use]
    pub fn has_query_arg(&self, name: &str) -> bool {
        self.query.iter().any(|(k, _)| k == name)
    }

    /// Appends a query argument if it is absent.
    pub fn set_query_default(&mut self, name: &str, value: impl Into<String>) {
        if !self.has_query_arg(name) {
            self.query.push((name.to_string(), value.into()));
        }
    }

    /// Returns the client address.
    #[must_use]
    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_ip
    }

    /// Sets the client address.
    pub fn set_client_ip(&mut self, ip: Option<IpAddr>) {
        self.client_ip = ip;
    }

    /// Returns the raw negotiation token. The header wins over the query.
    #[must_use]
    pub fn raw_version_token(&self) -> Option<&str> {
        self.header(VERSION_HEADER)
            .filter(|v| !v.is_empty())
            .or_else(|| self.query_arg(negotiation::VERSION_QUERY_PARAM))
    }

    /// Decodes the negotiation token.
    pub fn version_token(&self) -> Result<VersionToken, NegotiationError> {
        negotiation::decode(self.raw_version_token())
    }

    /// Returns the resolved API name, empty until an API matched.
    #[must_use]
    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    /// Records the resolved API name.
    pub fn set_api_name(&mut self, name: impl Into<String>) {
        self.api_name = name.into();
    }

    /// Returns the resolved version id, empty until a version matched.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Records the resolved version id.
    pub fn set_api_version(&mut self, version: impl Into<String>) {
        self.api_version = version.into();
    }

    /// Returns the negotiated mode.
    #[must_use]
    pub fn api_mode(&self) -> Option<ApiMode> {
        self.api_mode
    }

    /// Records the negotiated mode.
    pub fn set_api_mode(&mut self, mode: ApiMode) {
        self.api_mode = Some(mode);
    }

    /// Returns the percent-decoded path captures.
    #[must_use]
    pub fn url_matches(&self) -> &CaptureMap {
        &self.url_matches
    }

    /// Returns one path capture.
    #[must_use]
    pub fn url_match(&self, name: &str) -> Option<&str> {
        self.url_matches.get(name).map(String::as_str)
    }

    /// Records the path captures.
    pub fn set_url_matches(&mut self, matches: CaptureMap) {
        self.url_matches = matches;
    }

    /// Returns the configuration of the resolved API.
    #[must_use]
    pub fn api_config(&self) -> &Map<String, Value> {
        &self.api_config
    }

    /// Attaches the configuration of the resolved API.
    pub fn set_api_config(&mut self, config: Arc<Map<String, Value>>) {
        self.api_config = config;
    }

    /// Returns the parsed JSON body, once a JSON validator accepted it.
    #[must_use]
    pub fn json_args(&self) -> Option<&Map<String, Value>> {
        self.json_args.as_ref()
    }

    /// Records the parsed JSON body.
    pub fn set_json_args(&mut self, args: Map<String, Value>) {
        self.json_args = Some(args);
    }

    /// Returns the permissions granted by the access gate.
    #[must_use]
    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Records the granted permissions.
    pub fn set_permissions(&mut self, permissions: Vec<String>) {
        self.permissions = permissions;
    }

    /// Returns the namespace the access gate authorized against.
    #[must_use]
    pub fn auth_namespace(&self) -> Option<&str> {
        self.auth_namespace.as_deref()
    }

    /// Records the authorized namespace.
    pub fn set_auth_namespace(&mut self, namespace: impl Into<String>) {
        self.auth_namespace = Some(namespace.into());
    }

    /// Returns the attached metrics sink.
    #[must_use]
    pub fn metrics(&self) -> Option<&Arc<dyn MetricsSink>> {
        self.metrics.as_ref()
    }

    /// Attaches the shared metrics sink.
    pub fn set_metrics(&mut self, metrics: Arc<dyn MetricsSink>) {
        self.metrics = Some(metrics);
    }

    /// Returns the response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.response.status = status;
    }

    /// Returns the response headers.
    #[must_use]
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response.headers
    }

    /// Returns the response headers mutably.
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response.headers
    }

    /// Sets a response header, replacing any previous value.
    pub fn set_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.headers.insert(name, value);
    }

    /// Sets the JSON content type on the response.
    pub fn set_json_content_type(&mut self) {
        self.set_response_header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    }

    /// Returns the accumulated response head.
    #[must_use]
    pub fn response_head(&self) -> &ResponseHead {
        &self.response
    }

    /// Returns the completion guard for this request.
    #[must_use]
    pub fn completion(&self) -> &CompletionFlag {
        &self.completion
    }

    /// Raises `err` against this request and renders its envelope.
    ///
    /// Sets the response status for the error kind and, when a metrics sink
    /// is attached, increments `"<api>.error.<class>"`.
    pub fn reject(&mut self, err: &ApiError) -> Bytes {
        self.response.status = err.status();
        if let Some(metrics) = &self.metrics {
            metrics.increment(&err.counter_name(&self.api_name));
        }
        tracing::debug!(
            request_id = %self.request_id,
            code = err.code(),
            class = err.class(),
            "request rejected"
        );
        Bytes::from(err.to_json())
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    client_ip: Option<IpAddr>,
}

impl RequestContextBuilder {
    /// Sets the method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the URI. Unparseable input leaves the URI at `/`.
    pub fn uri(mut self, uri: &str) -> Self {
        if let Ok(uri) = uri.parse() {
            self.uri = uri;
        }
        self
    }

    /// Adds a request header. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the client address.
    pub fn client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> RequestContext {
        let query = self
            .uri
            .query()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .unwrap_or_default();

        RequestContext {
            request_id: RequestId::new(),
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            body: self.body,
            query,
            client_ip: self.client_ip,
            api_name: String::new(),
            api_version: String::new(),
            api_mode: None,
            url_matches: CaptureMap::new(),
            api_config: Arc::default(),
            json_args: None,
            permissions: Vec::new(),
            auth_namespace: None,
            metrics: None,
            response: ResponseHead::default(),
            completion: CompletionFlag::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct CountingMetrics(Mutex<Vec<String>>);

    impl MetricsSink for CountingMetrics {
        fn increment(&self, counter_name: &str) {
            self.0.lock().unwrap().push(counter_name.to_string());
        }
    }

    #[test]
    fn test_query_parsing() {
        let ctx = RequestContext::builder()
            .uri("/api/1.0/call?page=2&name=a%20b&page=3")
            .build();
        assert_eq!(ctx.query_arg("page"), Some("2"));
        assert_eq!(ctx.query_arg("name"), Some("a b"));
        assert!(!ctx.has_query_arg("missing"));
        assert_eq!(ctx.query_pairs().len(), 3);
    }

    #[test]
    fn test_set_query_default_keeps_existing() {
        let mut ctx = RequestContext::builder().uri("/x?page=4").build();
        ctx.set_query_default("page", "0");
        ctx.set_query_default("page_len", "50");
        assert_eq!(ctx.query_arg("page"), Some("4"));
        assert_eq!(ctx.query_arg("page_len"), Some("50"));
    }

    #[test]
    fn test_header_wins_over_query() {
        let ctx = RequestContext::builder()
            .uri("/x?X-DigiTar-API-Version=q-1.0%2Bprod")
            .header("X-DigiTar-API-Version", "h-2.0+test")
            .build();
        assert_eq!(ctx.raw_version_token(), Some("h-2.0+test"));
        assert_eq!(ctx.version_token().unwrap().api, "h");
    }

    #[test]
    fn test_query_token_used_without_header() {
        let ctx = RequestContext::builder()
            .uri("/x?X-DigiTar-API-Version=q-1.0%2Bprod")
            .build();
        let token = ctx.version_token().unwrap();
        assert_eq!(token.api, "q");
        assert_eq!(token.mode, "prod");
    }

    #[test]
    fn test_no_token_is_unversioned() {
        let ctx = RequestContext::builder().uri("/x").build();
        assert!(ctx.version_token().unwrap().is_unversioned());
    }

    #[test]
    fn test_reject_sets_status_and_counts() {
        let metrics = Arc::new(CountingMetrics::default());
        let mut ctx = RequestContext::builder().build();
        ctx.set_metrics(metrics.clone());

        let body = ctx.reject(&ApiError::unknown_call("nope"));
        assert_eq!(ctx.status(), StatusCode::NOT_FOUND);
        assert!(String::from_utf8_lossy(&body).contains("UnknownAPICallError"));

        ctx.set_api_name("dummy_api");
        ctx.reject(&ApiError::json_decode());
        assert_eq!(ctx.status(), StatusCode::CONFLICT);

        let seen = metrics.0.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                "unknown_api.error.UnknownAPICallError".to_string(),
                "dummy_api.error.JSONDecodeError".to_string(),
            ]
        );
    }

    #[test]
    fn test_completion_flag_single_winner() {
        let flag = CompletionFlag::default();
        let other = flag.clone();
        assert!(!flag.is_complete());
        assert!(flag.try_complete());
        assert!(!other.try_complete());
        assert!(!flag.try_complete());
        assert!(other.is_complete());
    }

    #[test]
    fn test_completion_flag_concurrent() {
        let flag = CompletionFlag::default();
        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let flag = flag.clone();
                    s.spawn(move || usize::from(flag.try_complete()))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(winners, 1);
    }
}
