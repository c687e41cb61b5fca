use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// GET /metrics: booth job counters and timings in Prometheus text format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}

/// Register descriptions for every metric the booth records.
pub fn describe() {
    metrics::describe_counter!(
        "booth_jobs_submitted_total",
        "Generation jobs accepted by the upstream service"
    );
    metrics::describe_counter!(
        "booth_jobs_completed_total",
        "Generation jobs that reached COMPLETED"
    );
    metrics::describe_counter!(
        "booth_jobs_failed_total",
        "Generation jobs that reached FAILED or whose polling errored"
    );
    metrics::describe_counter!(
        "booth_jobs_timed_out_total",
        "Generation jobs with no terminal status before the poll timeout"
    );
    metrics::describe_counter!("booth_status_polls_total", "Status queries issued");
    metrics::describe_histogram!(
        "booth_generation_seconds",
        "Time from submission to COMPLETED"
    );
    metrics::describe_counter!(
        "booth_composite_fallbacks_total",
        "Sessions delivered without the overlay"
    );
    metrics::describe_counter!(
        "booth_publish_fallbacks_total",
        "Sessions delivered inline because publishing failed"
    );
}
