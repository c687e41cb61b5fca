pub mod booth;
pub mod eventstation;
pub mod health;
pub mod metrics;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::app_state::AppState;

/// Base64 capture frames run to several megabytes.
pub const BODY_LIMIT_BYTES: usize = 20 * 1024 * 1024;

/// Application routes, without the metrics endpoint and middleware layers.
///
/// The extractor body limit is raised here so the `Json` and `Bytes`
/// extractors accept full-size captures.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/eventstation",
            get(eventstation::proxy_get).post(eventstation::proxy_post),
        )
        .route("/api/upload", post(upload::upload_image))
        .route("/api/v1/booth/sessions", post(booth::create_session))
        .route("/api/v1/booth/multi-swap", post(booth::create_multi_swap_session))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}
