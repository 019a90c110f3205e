use axum::response::IntoResponse;

pub async fn health_check() -> &'static str {
    "OK"
}

/// Prometheus text exposition.
pub async fn metrics() -> impl IntoResponse {
    crate::services::metrics::get_metrics()
}
