//! Admin key check and resolved server secrets.

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use letterbox_common::constants::headers::X_ADMIN_KEY;
use letterbox_common::{EncryptionKey, KeyError};

use crate::config::SecretsConfig;
use crate::error::ApiError;

/// Secrets resolved once at startup.
///
/// A missing or malformed value is kept as an error and reported on the
/// requests that need it.
pub struct Secrets {
    admin_key: Option<String>,
    encryption_key: Result<EncryptionKey, KeyError>,
}

impl Secrets {
    pub fn from_config(config: &SecretsConfig) -> Self {
        let admin_key = config
            .admin_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        let encryption_key = match config.data_enc_key.as_deref() {
            Some(raw) => EncryptionKey::from_base64(raw),
            None => Err(KeyError::Missing),
        };

        if admin_key.is_none() {
            tracing::warn!("ADMIN_KEY is not set; admin endpoints will fail");
        }
        if let Err(ref e) = encryption_key {
            tracing::warn!(error = %e, "Encryption key unavailable; submissions will fail");
        }

        Self {
            admin_key,
            encryption_key,
        }
    }

    pub fn has_admin_key(&self) -> bool {
        self.admin_key.is_some()
    }

    pub fn encryption_key(&self) -> Result<&EncryptionKey, ApiError> {
        self.encryption_key.as_ref().map_err(|e| e.clone().into())
    }

    /// Check the `x-admin-key` header in constant time
    pub fn authorize_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let expected = self
            .admin_key
            .as_deref()
            .ok_or_else(|| ApiError::Misconfigured("ADMIN_KEY is not set on the server.".to_string()))?;

        let presented = headers
            .get(X_ADMIN_KEY)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if presented.is_empty() || !bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn secrets(admin_key: Option<&str>) -> Secrets {
        Secrets::from_config(&SecretsConfig {
            admin_key: admin_key.map(str::to_string),
            data_enc_key: Some(EncryptionKey::generate_base64()),
        })
    }

    #[test]
    fn test_admin_key_check() {
        let secrets = secrets(Some("s3cret"));
        let mut headers = HeaderMap::new();
        assert!(matches!(secrets.authorize_admin(&headers), Err(ApiError::Unauthorized)));

        headers.insert(X_ADMIN_KEY, HeaderValue::from_static("wrong"));
        assert!(matches!(secrets.authorize_admin(&headers), Err(ApiError::Unauthorized)));

        headers.insert(X_ADMIN_KEY, HeaderValue::from_static(" s3cret "));
        assert!(secrets.authorize_admin(&headers).is_ok());
    }

    #[test]
    fn test_unset_admin_key_is_misconfiguration() {
        let secrets = secrets(Some("   "));
        let mut headers = HeaderMap::new();
        headers.insert(X_ADMIN_KEY, HeaderValue::from_static("anything"));
        assert!(matches!(
            secrets.authorize_admin(&headers),
            Err(ApiError::Misconfigured(_))
        ));
    }

    #[test]
    fn test_encryption_key_errors_surface() {
        let secrets = Secrets::from_config(&SecretsConfig {
            admin_key: None,
            data_enc_key: Some("dG9vIHNob3J0".to_string()),
        });
        let err = secrets.encryption_key().unwrap_err();
        assert_eq!(err.to_string(), "DATA_ENC_KEY must be 32 bytes, base64 encoded.");
    }
}
