use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the process-wide Prometheus recorder. Call once at startup, before
/// the scheduler or any handler records a series.
pub fn install_recorder(scheduler_interval_secs: u64) -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("prometheus: install recorder");

    gauge!("ingest_scheduler_interval_secs").set(scheduler_interval_secs as f64);

    handle
}

/// Router exposing `/metrics` in the Prometheus exposition format.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let h = handle.clone();
            async move { h.render() }
        }),
    )
}
