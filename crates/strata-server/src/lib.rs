//! # Strata Server
//!
//! HTTP transport for the Strata dispatcher.
//!
//! - [`Dispatcher`] runs one request through the [`ApiRouter`] and the
//!   completion adapter and yields the response head and body.
//! - The completion adapter ([`render_call`]) turns whatever a handler
//!   returns (a body, a pending result, an error or a panic) into exactly
//!   one response written to a [`ResponseSink`].
//! - [`Server`] is a hyper HTTP/1 accept loop with graceful shutdown.
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_server::{Dispatcher, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), strata_server::ServerError> {
//!     let dispatcher = Dispatcher::new(router);
//!     let config = ServerConfig::builder().listen_addr("127.0.0.1:9990").build();
//!     Server::new(config, dispatcher).run().await
//! }
//! ```
//!
//! [`ApiRouter`]: strata_router::ApiRouter

#![doc(html_root_url = "https://docs.rs/strata-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod completion;
mod config;
mod dispatch;
mod error;
mod server;
mod shutdown;
mod site;

pub use completion::{render_call, Rendered, ResponseSink};
pub use config::{ServerConfig, ServerConfigBuilder, DEFAULT_LISTEN_ADDR};
pub use dispatch::Dispatcher;
pub use error::{Result, ServerError};
pub use server::{HttpResponse, Server};
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
pub use site::{Site, DEFAULT_SERVER_IDENT, X_REAL_IP};
