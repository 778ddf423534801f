use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::errors::app_error::AppError;
use crate::handlers::{api, availability, sessions};
use crate::state::AppState;

/// Create the API router
///
/// Note: CORS (including the OPTIONS preflight) is layered on in main.rs
/// where the configuration is available.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/", get(api::health_check))
        .route(
            "/voice/check-availability",
            post(availability::check_availability),
        )
        .route("/voice/get-signed-url", post(sessions::open_session))
        .route("/voice/update-duration", post(sessions::update_duration))
        .route("/voice/end-session", post(sessions::end_session))
        // Keep the JSON error shape on 405s instead of axum's empty body.
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TraceLayer::new_for_http())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
