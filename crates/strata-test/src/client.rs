//! In-memory test client.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use bytes::Bytes;
use http::Method;
use strata_router::ApiRouter;
use strata_server::Dispatcher;

use crate::{TestError, TestRequest, TestRequestBuilder, TestResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A client that dispatches requests without a network.
///
/// Each request goes through [`Dispatcher::respond`], the same path the
/// server takes after reading a request off the wire, so the response
/// carries the `Server` header and every header the router chain set.
///
/// # Example
///
/// ```ignore
/// let client = TestClient::new(router).with_version("records-1.0+test");
///
/// let response = client.get("/records/ping").send().await;
/// assert_eq!(response.status_code(), 200);
/// ```
#[must_use]
#[derive(Debug)]
pub struct TestClient {
    dispatcher: Dispatcher,
    default_headers: Vec<(String, String)>,
    peer: IpAddr,
    timeout: Duration,
}

impl TestClient {
    /// Creates a client for `router` with default site settings.
    pub fn new(router: ApiRouter) -> Self {
        Self::from_dispatcher(Dispatcher::new(router))
    }

    /// Creates a client for an existing dispatcher.
    pub fn from_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            default_headers: Vec::new(),
            peer: IpAddr::V4(Ipv4Addr::LOCALHOST),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Sends the negotiation token with every request.
    pub fn with_version(self, token: impl Into<String>) -> Self {
        self.with_default_header(strata_core::VERSION_HEADER, token)
    }

    /// Sets the peer address requests appear to come from.
    pub fn with_peer(mut self, peer: IpAddr) -> Self {
        self.peer = peer;
        self
    }

    /// Sets how long a deferred response may take.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::get(uri))
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::post(uri))
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::put(uri))
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::delete(uri))
    }

    /// Creates an OPTIONS request builder.
    pub fn options(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::options(uri))
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    /// Dispatches a built request.
    pub async fn execute(&self, request: TestRequest) -> TestResponse {
        let mut ctx = request.into_context();
        self.dispatcher
            .site()
            .set_client_ip(&mut ctx, Some(self.peer));
        let (head, body) = self.dispatcher.respond(ctx, self.timeout).await;
        TestResponse::from_head(head, body)
    }
}

/// A request builder bound to a test client.
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, mut builder: TestRequestBuilder) -> Self {
        for (name, value) in &client.default_headers {
            builder = builder.header(name, value);
        }
        Self { client, builder }
    }

    /// Appends a header.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the negotiation token, replacing the client default.
    #[must_use]
    pub fn version(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.version(token);
        self
    }

    /// Sets the Content-Type header.
    #[must_use]
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets HTTP basic credentials.
    #[must_use]
    pub fn basic_auth(mut self, username: &str, password: &str) -> Self {
        self.builder = self.builder.basic_auth(username, password);
        self
    }

    /// Sets the raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request could not be built: {e}"),
        }
    }

    /// Sends the request, reporting build failures.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        Ok(self.client.execute(request).await)
    }
}
