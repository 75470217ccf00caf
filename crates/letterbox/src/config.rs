//! Configuration management for Letterbox.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use letterbox_common::constants::{
    BURST_INTERVAL_SECS, DEFAULT_CAPTCHA_VERIFY_URL, DEFAULT_LISTEN_ADDR, HOURLY_REQUEST_CAP,
    RATE_WINDOW_SECS,
};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Origins allowed to call the API; empty allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Upper bound on a single request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Admin and encryption secrets
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// CAPTCHA configuration
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Blob storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Shared secrets. Debug output is redacted.
#[derive(Clone, Default, Deserialize)]
pub struct SecretsConfig {
    /// Shared admin key expected in `x-admin-key`
    #[serde(default)]
    pub admin_key: Option<String>,

    /// Base64 32-byte AES-256-GCM key
    #[serde(default)]
    pub data_enc_key: Option<String>,
}

impl fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("admin_key", &self.admin_key.as_ref().map(|_| "<redacted>"))
            .field("data_enc_key", &self.data_enc_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// CAPTCHA-specific configuration
#[derive(Clone, Deserialize)]
pub struct CaptchaConfig {
    /// Verification secret; CAPTCHA is enforced only when set
    #[serde(default)]
    pub secret: Option<String>,

    /// Provider verification endpoint
    #[serde(default = "default_captcha_verify_url")]
    pub verify_url: String,
}

impl fmt::Debug for CaptchaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptchaConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("verify_url", &self.verify_url)
            .finish()
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            secret: None,
            verify_url: default_captcha_verify_url(),
        }
    }
}

/// Where records are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Remote blob service over HTTP
    #[default]
    Http,
    /// Process memory, lost on restart
    Memory,
}

/// Blob storage configuration
#[derive(Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Blob service base URL (http backend)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Read/write bearer token (http backend)
    #[serde(default)]
    pub token: Option<String>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum seconds between two admitted requests from one IP
    #[serde(default = "default_burst_interval")]
    pub burst_interval_secs: u64,

    /// Maximum admitted requests per IP inside the window
    #[serde(default = "default_hourly_cap")]
    pub hourly_cap: usize,

    /// Sliding window length in seconds
    #[serde(default = "default_window")]
    pub window_secs: u64,

    /// How often idle entries are evicted, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst_interval_secs: default_burst_interval(),
            hourly_cap: default_hourly_cap(),
            window_secs: default_window(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_captcha_verify_url() -> String { DEFAULT_CAPTCHA_VERIFY_URL.to_string() }
fn default_burst_interval() -> u64 { BURST_INTERVAL_SECS }
fn default_hourly_cap() -> usize { HOURLY_REQUEST_CAP }
fn default_window() -> u64 { RATE_WINDOW_SECS }
fn default_sweep_interval() -> u64 { 600 } // 10 minutes

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Treat blank strings from the environment as unset
fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl AppConfig {
    /// Load configuration from file, with CLI and environment overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .add_source(config::Environment::with_prefix("LETTERBOX").separator("__"))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            // Use defaults if config file doesn't exist
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI / environment overrides
        if let Some(listen) = non_blank(&args.listen) {
            config.listen_addr = listen;
        }
        if let Some(origins) = non_blank(&args.allowed_origin) {
            config.allowed_origins = parse_origin_list(&origins);
        }
        if let Some(key) = non_blank(&args.admin_key) {
            config.secrets.admin_key = Some(key);
        }
        if let Some(key) = non_blank(&args.data_enc_key) {
            config.secrets.data_enc_key = Some(key);
        }
        if let Some(secret) = non_blank(&args.turnstile_secret) {
            config.captcha.secret = Some(secret);
        }
        if let Some(backend) = args.storage {
            config.storage.backend = backend;
        }
        if let Some(url) = non_blank(&args.blob_url) {
            config.storage.base_url = Some(url);
        }
        if let Some(token) = non_blank(&args.blob_token) {
            config.storage.token = Some(token);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the service cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.storage.backend == StorageBackend::Http && non_blank(&self.storage.base_url).is_none() {
            anyhow::bail!("storage.base_url (BLOB_API_URL) is required for the http storage backend");
        }
        if self.rate_limit.sweep_interval_secs == 0 {
            anyhow::bail!("rate_limit.sweep_interval_secs must be positive");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            allowed_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            secrets: SecretsConfig::default(),
            captcha: CaptchaConfig::default(),
            storage: StorageConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}
