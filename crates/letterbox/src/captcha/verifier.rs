//! Cloudflare Turnstile token verification.

use async_trait::async_trait;
use serde::Deserialize;

use super::{CaptchaError, CaptchaVerifier};

/// Provider reply; unknown fields are ignored
#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Turnstile verifier service
pub struct TurnstileVerifier {
    client: reqwest::Client,
    secret: String,
    verify_url: String,
}

impl TurnstileVerifier {
    pub fn new(client: reqwest::Client, secret: String, verify_url: String) -> Self {
        Self {
            client,
            secret,
            verify_url,
        }
    }
}

#[async_trait]
impl CaptchaVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, CaptchaError> {
        let mut form = vec![("secret", self.secret.as_str()), ("response", token)];
        if let Some(ip) = remote_ip.filter(|ip| !ip.is_empty()) {
            form.push(("remoteip", ip));
        }

        let response = self.client.post(&self.verify_url).form(&form).send().await?;
        let status = response.status();

        // An unreadable reply counts as a failed check, not a transport error
        let reply = match response.json::<SiteVerifyResponse>().await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(status = %status, error = %e, "Unreadable CAPTCHA provider reply");
                return Ok(false);
            }
        };

        if !reply.success {
            tracing::debug!(
                remote_ip = ?remote_ip,
                error_codes = ?reply.error_codes,
                "CAPTCHA token rejected"
            );
        }

        Ok(reply.success)
    }
}
