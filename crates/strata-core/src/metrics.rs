//! Counter sink for the stats collaborator.

use std::fmt;

/// Increment-only counter sink shared by all requests.
///
/// Implementations must be cheap to call and internally synchronized; the
/// dispatcher reaches the sink through an `Arc` from every in-flight request.
pub trait MetricsSink: Send + Sync + fmt::Debug {
    /// Increments the counter with the given name by one.
    fn increment(&self, counter_name: &str);
}

/// A sink that discards every increment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn increment(&self, _counter_name: &str) {}
}
