//! Prometheus metrics (ambient observability, no pack-internal file to
//! ground on; built directly from the `metrics`/`metrics-exporter-
//! prometheus` crates' documented `PrometheusBuilder` idiom).

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Installs the global recorder and returns a handle whose `render()`
/// backs the `/metrics` endpoint.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

pub fn record_request(route: &'static str, status: u16) {
    metrics::counter!("bv_rag_http_requests_total", "route" => route, "status" => status.to_string()).increment(1);
}

pub fn record_pipeline_stage_latency(stage: &'static str, millis: u64) {
    metrics::histogram!("bv_rag_pipeline_stage_latency_ms", "stage" => stage).record(millis as f64);
}

pub fn record_pipeline_error(error_kind: &'static str) {
    metrics::counter!("bv_rag_pipeline_errors_total", "kind" => error_kind).increment(1);
}

pub fn record_websocket_connection(delta: i64) {
    if delta >= 0 {
        metrics::gauge!("bv_rag_websocket_connections").increment(delta as f64);
    } else {
        metrics::gauge!("bv_rag_websocket_connections").decrement((-delta) as f64);
    }
}
