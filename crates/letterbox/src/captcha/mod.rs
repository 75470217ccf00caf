//! CAPTCHA verification against an external provider.
//!
//! Enforcement is optional: with no verification secret configured the
//! service accepts submissions without a token.

mod verifier;

pub use verifier::TurnstileVerifier;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("CAPTCHA provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Checks a client-supplied token with the provider
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// `Ok(false)` means the provider rejected the token
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, CaptchaError>;
}
