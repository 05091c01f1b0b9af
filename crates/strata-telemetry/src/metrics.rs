//! Counter export.
//!
//! [`CounterMetrics`] forwards every increment to the global `metrics`
//! recorder. Without a recorder installed the increments are dropped, so the
//! sink is safe to use before (or without) [`init_prometheus`].

use std::sync::OnceLock;

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use strata_core::MetricsSink;

use crate::{TelemetryError, TelemetryResult};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// A [`MetricsSink`] backed by the `metrics` crate.
#[derive(Debug, Clone, Default)]
pub struct CounterMetrics {
    prefix: Option<String>,
}

impl CounterMetrics {
    /// Creates a sink without a name prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that prepends `prefix.` to every counter name.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: (!prefix.is_empty()).then_some(prefix),
        }
    }

    /// Returns the full name recorded for `counter_name`.
    #[must_use]
    pub fn qualified_name(&self, counter_name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}.{counter_name}"),
            None => counter_name.to_string(),
        }
    }
}

impl MetricsSink for CounterMetrics {
    fn increment(&self, counter_name: &str) {
        counter!(self.qualified_name(counter_name)).increment(1);
    }
}

/// Installs the Prometheus recorder as the global `metrics` recorder.
///
/// The recorder is installed once; later calls return the same handle.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if another global recorder is
/// already installed.
pub fn init_prometheus() -> TelemetryResult<PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    Ok(METRICS_HANDLE.get_or_init(|| handle).clone())
}

/// Renders the installed recorder in Prometheus text format.
///
/// Returns `None` if [`init_prometheus`] has not run.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}
