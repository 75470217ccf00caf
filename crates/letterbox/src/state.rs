//! Application state and shared resources.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::auth::Secrets;
use crate::captcha::{CaptchaVerifier, TurnstileVerifier};
use crate::config::{AppConfig, StorageBackend};
use crate::ratelimit::RateLimiter;
use crate::routes::cors::OriginPolicy;
use crate::storage::{BlobStore, HttpBlobStore, MemoryBlobStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Admin key and data encryption key
    pub secrets: Arc<Secrets>,

    /// Blob storage for records and seen markers
    pub store: Arc<dyn BlobStore>,

    /// CAPTCHA verifier, `None` when CAPTCHA is not enforced
    pub captcha: Option<Arc<dyn CaptchaVerifier>>,

    /// Process-local submission rate limiter
    pub rate_limiter: Arc<RateLimiter>,

    /// CORS origin allow-list
    pub origins: Arc<OriginPolicy>,
}

impl AppState {
    /// Create application state, wiring the configured collaborators
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("letterbox/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let store: Arc<dyn BlobStore> = match config.storage.backend {
            StorageBackend::Http => {
                let base_url = config
                    .storage
                    .base_url
                    .as_deref()
                    .context("storage.base_url is required for the http backend")?;
                Arc::new(HttpBlobStore::new(client.clone(), base_url, config.storage.token.clone()))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory blob store (records are lost on restart)");
                Arc::new(MemoryBlobStore::new())
            }
        };

        let captcha = config.captcha.secret.clone().map(|secret| {
            Arc::new(TurnstileVerifier::new(
                client.clone(),
                secret,
                config.captcha.verify_url.clone(),
            )) as Arc<dyn CaptchaVerifier>
        });
        if captcha.is_none() {
            tracing::warn!("TURNSTILE_SECRET_KEY not set; CAPTCHA is not enforced");
        }

        Ok(Self::from_parts(config, store, captcha))
    }

    /// Assemble state from already-built collaborators
    pub fn from_parts(
        config: AppConfig,
        store: Arc<dyn BlobStore>,
        captcha: Option<Arc<dyn CaptchaVerifier>>,
    ) -> Self {
        let secrets = Arc::new(Secrets::from_config(&config.secrets));
        let rate_limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let origins = Arc::new(OriginPolicy::new(config.allowed_origins.clone()));

        Self {
            config: Arc::new(config),
            secrets,
            store,
            captcha,
            rate_limiter,
            origins,
        }
    }
}
