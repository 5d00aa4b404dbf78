//! Prometheus wiring for match telemetry.

use homologador::MatchMetrics;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub const MATCH_REQUESTS: &str = "homolog_match_requests_total";
pub const MATCH_FAILURES: &str = "homolog_match_failures_total";
pub const MATCH_LATENCY: &str = "homolog_match_latency_seconds";
pub const MATCH_CANDIDATES: &str = "homolog_match_candidates";
pub const MATCH_HITS: &str = "homolog_match_hits";

/// Forwards matcher telemetry to the global `metrics` recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMatchMetrics;

impl MatchMetrics for PrometheusMatchMetrics {
    fn record_match(&self, latency: Duration, candidates: usize, hits: usize) {
        counter!(MATCH_REQUESTS).increment(1);
        histogram!(MATCH_LATENCY).record(latency.as_secs_f64());
        histogram!(MATCH_CANDIDATES).record(candidates as f64);
        histogram!(MATCH_HITS).record(hits as f64);
    }

    fn record_failure(&self, latency: Duration) {
        counter!(MATCH_FAILURES).increment(1);
        histogram!(MATCH_LATENCY).record(latency.as_secs_f64());
    }
}

/// Installs the process-wide Prometheus recorder. Call once per process.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}
