//! Logging and metrics for Strata sites.
//!
//! - **Logging**: a `tracing-subscriber` registry with JSON or pretty output
//! - **Metrics**: [`CounterMetrics`], a [`MetricsSink`](strata_core::MetricsSink)
//!   backed by the `metrics` crate, and an optional Prometheus recorder
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use strata_telemetry::{init_logging, init_prometheus, CounterMetrics, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! let handle = init_prometheus()?;
//! let sink = Arc::new(CounterMetrics::with_prefix("records"));
//!
//! // ... build the router with `sink`, then later:
//! println!("{}", handle.render());
//! ```
//!
//! # Counter names
//!
//! Error responses increment `{api}.error.{ErrorClass}`, with `unknown_api`
//! standing in when no API was resolved. A configured prefix is prepended
//! with a dot, matching statsd naming.

#![doc(html_root_url = "https://docs.rs/strata-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_prometheus, render_metrics, CounterMetrics};
pub use metrics_exporter_prometheus::PrometheusHandle;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
