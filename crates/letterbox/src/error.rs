//! Request-level errors and their HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use letterbox_common::{ErrorBody, KeyError, ValidationError};

use crate::captcha::CaptchaError;
use crate::storage::StorageError;

/// Every way a request can fail
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Origin not allowed.")]
    OriginNotAllowed,

    #[error("Only {0} is allowed.")]
    MethodNotAllowed(&'static str),

    #[error("Too many requests. Try again later.")]
    RateLimited,

    #[error("Invalid JSON body.")]
    MalformedJson,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Invalid pathname.")]
    InvalidPathname,

    #[error("Invalid admin key.")]
    Unauthorized,

    /// Missing or broken server configuration; the message names the setting
    #[error("{0}")]
    Misconfigured(String),

    /// Storage or network failure; details are logged, not returned
    #[error("Server error.")]
    Internal(anyhow::Error),
}

impl ApiError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::OriginNotAllowed => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::MalformedJson | Self::Invalid(_) | Self::InvalidPathname => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Misconfigured(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<KeyError> for ApiError {
    fn from(err: KeyError) -> Self {
        Self::Misconfigured(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::MissingCredentials => Self::Misconfigured(err.to_string()),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<CaptchaError> for ApiError {
    fn from(err: CaptchaError) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Internal(source) => tracing::error!(error = ?source, "Request failed"),
            Self::Misconfigured(message) => tracing::error!(%message, "Server misconfigured"),
            _ => tracing::debug!(status = status.as_u16(), error = %self, "Request rejected"),
        }

        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
