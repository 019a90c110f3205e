use axum::{
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};
use service_core::middleware::tracing::request_id_middleware;
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    app::{health_check, metrics},
    auth::{login_handler, logout_handler},
    payables,
};
use crate::middleware::metrics::metrics_middleware;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    // Session setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            state.session.inactivity_hours,
        )));

    let payables_routes = Router::new()
        .route("/payables", get(payables::get_console))
        .route("/payables/refresh", post(payables::refresh_console))
        .route("/payables/filter", put(payables::set_filter))
        .route(
            "/payables/groups/:group_id/toggle",
            post(payables::toggle_group),
        )
        .route("/payables/plans", post(payables::create_plan))
        .route(
            "/payables/:id",
            put(payables::edit).delete(payables::delete),
        )
        .route("/payables/:id/settle", post(payables::settle))
        .route("/payables/:id/early-settle", post(payables::early_settle))
        .route("/payables/:id/cancel", post(payables::cancel))
        .route("/suppliers", get(payables::list_suppliers))
        .route("/suppliers/refresh", post(payables::refresh_suppliers))
        .route("/banner", delete(payables::dismiss_banner));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .merge(payables_routes)
        .with_state(state)
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
}
