//! # Strata Test
//!
//! In-memory testing for Strata sites. Requests run through the full
//! dispatch path (API, version and call resolution, validators, handlers
//! and the completion adapter) without binding a socket.
//!
//! ## Example
//!
//! ```ignore
//! use strata_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_echo() {
//!     let client = TestClient::new(router).with_version("records-1.0+test");
//!
//!     let response = client
//!         .post("/records/echo")
//!         .json(&json!({"arg1": "hello"}))
//!         .send()
//!         .await;
//!
//!     assert_eq!(response.status_code(), 200);
//!     assert_eq!(response.json_value().unwrap()["arg1"], "hello");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/strata-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
