//! Public submission endpoint.

use axum::{Json, body::Bytes, extract::State};
use chrono::Utc;

use letterbox_common::paths::{contact_pathname, format_timestamp};
use letterbox_common::{
    ContactData, EncryptedRecord, NormalizedSubmission, SubmitRequest, SubmitResponse,
    ValidationError,
};

use super::extract::ClientIp;
use super::parse_json;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::PutOptions;

/// Accept, validate, encrypt, and store one contact submission.
///
/// The origin check has already run in middleware. Every failing step
/// returns before anything is written.
pub async fn submit(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    body: Bytes,
) -> Result<Json<SubmitResponse>, ApiError> {
    let decision = state.rate_limiter.check(&ip);
    if !decision.is_allowed() {
        tracing::info!(ip = %ip, decision = ?decision, "Submission rate limited");
        return Err(ApiError::RateLimited);
    }

    let request: SubmitRequest = parse_json(&body)?;
    let submission = NormalizedSubmission::from_request(&request);

    if submission.is_spam() {
        tracing::info!(ip = %ip, "Honeypot filled, dropping submission");
        return Ok(Json(SubmitResponse {
            ok: true,
            id: None,
            created_at: None,
        }));
    }

    submission.validate()?;

    if let Some(verifier) = state.captcha.as_ref() {
        if submission.captcha_token.is_empty() {
            return Err(ValidationError::MissingCaptcha.into());
        }
        let remote_ip = (!ip.is_empty()).then_some(ip.as_str());
        if !verifier.verify(&submission.captcha_token, remote_ip).await? {
            return Err(ValidationError::CaptchaRejected.into());
        }
    }

    let key = state.secrets.encryption_key()?;

    let created_at = format_timestamp(Utc::now());
    let NormalizedSubmission {
        name,
        email,
        message,
        ..
    } = submission;
    let contact = ContactData {
        name,
        email,
        message,
        created_at: Some(created_at.clone()),
    };

    let envelope = key
        .seal(&contact)
        .map_err(|e| ApiError::Internal(e.into()))?;
    let record = EncryptedRecord::new(created_at.clone(), envelope);
    let object = serde_json::to_vec(&record).map_err(|e| ApiError::Internal(e.into()))?;

    let pathname = contact_pathname(&created_at);
    state
        .store
        .put(&pathname, object, PutOptions::create_json())
        .await?;

    tracing::info!(id = %pathname, "📨 Contact submission stored");

    Ok(Json(SubmitResponse {
        ok: true,
        id: Some(pathname),
        created_at: Some(created_at),
    }))
}
