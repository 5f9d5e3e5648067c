use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn describe_metrics() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "refresh_runs_total",
            "Completed refresh passes over all sources."
        );
        describe_counter!(
            "refresh_source_errors_total",
            "Per-source refresh failures (previous document kept)."
        );
        describe_counter!("extract_items_total", "Records emitted by extractors.");
        describe_counter!(
            "extract_skipped_total",
            "Candidate items dropped during extraction."
        );
        describe_gauge!(
            "refresh_last_run_ts",
            "Unix ts when the refresh loop last completed a pass."
        );
        describe_histogram!("extract_parse_ms", "Extractor parse time in milliseconds.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder.
    pub fn init() -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");
        describe_metrics();
        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
