//! HTTP route handlers for Letterbox.

use std::time::Duration;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::ApiError;
use crate::state::AppState;

mod admin;
mod contact;
pub mod cors;
mod extract;
mod health;


/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))

        // Public submission
        .merge(
            Router::new()
                .route("/api/contact", post(contact::submit).fallback(only_post))
                .layer(middleware::from_fn_with_state(
                    (state.origins.clone(), cors::PUBLIC_POST),
                    cors::enforce_origin,
                )),
        )

        // Admin endpoints (shared admin key)
        .nest("/api/admin", admin_routes(&state))

        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())

        // Add shared state
        .with_state(state)
}

/// Admin routes (inbox listing, seen markers)
fn admin_routes(state: &AppState) -> Router<AppState> {
    let listing = Router::new()
        // HEAD falls through to the GET handler unless routed explicitly
        .route(
            "/contacts",
            get(admin::list_contacts).head(only_get).fallback(only_get),
        )
        .layer(middleware::from_fn_with_state(
            (state.origins.clone(), cors::ADMIN_GET),
            cors::enforce_origin,
        ));

    let seen = Router::new()
        .route("/seen", post(admin::set_seen).fallback(only_post))
        .layer(middleware::from_fn_with_state(
            (state.origins.clone(), cors::ADMIN_POST),
            cors::enforce_origin,
        ));

    listing.merge(seen)
}

async fn only_post() -> ApiError {
    ApiError::MethodNotAllowed("POST")
}

async fn only_get() -> ApiError {
    ApiError::MethodNotAllowed("GET")
}

/// Parse a JSON request body; an empty body reads as `{}`
pub(crate) fn parse_json<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Malformed JSON body");
        ApiError::MalformedJson
    })
}
