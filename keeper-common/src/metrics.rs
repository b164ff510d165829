use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Cleanup cycles take anywhere from a fraction of a second to several minutes on large namespaces.
const CYCLE_DURATION_SECONDS: &[f64] = &[
    0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0,
];

pub const CYCLE_DURATION_METRIC: &str = "keeper_cycle_duration_seconds";

/// Install the process-wide Prometheus recorder. Can only succeed once per process.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(CYCLE_DURATION_METRIC.to_string()),
            CYCLE_DURATION_SECONDS,
        )?
        .install_recorder()
}
