//! Liveness and readiness checks.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Liveness: the process is up and serving
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    encryption_key: bool,
    admin_key: bool,
    captcha: bool,
}

/// Readiness check (are the required secrets configured?)
pub async fn ready_check(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let encryption_key = state.secrets.encryption_key().is_ok();
    let admin_key = state.secrets.has_admin_key();
    let captcha = state.captcha.is_some();

    if encryption_key && admin_key {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready",
                encryption_key,
                admin_key,
                captcha,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                status: "misconfigured",
                encryption_key,
                admin_key,
                captcha,
            }),
        )
    }
}
