// crates/meshgraph-daemon/src/metrics.rs
//
// Metrics sink that forwards every sample to tracing and remembers the
// latest value per series.

use std::collections::HashMap;
use std::sync::Mutex;

use meshgraph_core::MetricsSink;

#[derive(Debug, Default)]
pub struct TracingMetrics {
    latest: Mutex<HashMap<String, f64>>,
}

impl TracingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest value recorded for `series`.
    #[cfg(test)]
    pub fn last(&self, series: &str) -> Option<f64> {
        self.latest
            .lock()
            .ok()
            .and_then(|latest| latest.get(series).copied())
    }
}

impl MetricsSink for TracingMetrics {
    fn record(&self, series: &str, value: f64) {
        tracing::debug!(series, value, "metric");
        if let Ok(mut latest) = self.latest.lock() {
            latest.insert(series.to_string(), value);
        }
    }
}
