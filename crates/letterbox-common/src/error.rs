//! Common error types for Letterbox components.

use thiserror::Error;

use crate::constants::{
    EMAIL_MAX_CHARS, MESSAGE_MAX_CHARS, MESSAGE_MIN_CHARS, NAME_MAX_CHARS, NAME_MIN_CHARS,
};

/// A submission that fails the field rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One of name, email, message is empty
    #[error("Missing required fields.")]
    MissingFields,

    #[error("Name must be between {min} and {max} characters.", min = NAME_MIN_CHARS, max = NAME_MAX_CHARS)]
    NameLength,

    #[error("Invalid email address (max {max} characters).", max = EMAIL_MAX_CHARS)]
    InvalidEmail,

    #[error(
        "Message must be between {min} and {max} characters.",
        min = MESSAGE_MIN_CHARS,
        max = MESSAGE_MAX_CHARS
    )]
    MessageLength,

    /// CAPTCHA is enabled but no token was sent
    #[error("Missing CAPTCHA token.")]
    MissingCaptcha,

    /// The CAPTCHA provider rejected the token
    #[error("CAPTCHA verification failed. Please try again.")]
    CaptchaRejected,
}

/// Failures while sealing or opening an envelope
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Unsupported envelope (v={version}, alg={alg})")]
    Unsupported { version: u8, alg: String },

    #[error("Envelope field `{0}` is not valid base64")]
    Encoding(&'static str),

    #[error("Invalid IV or tag length")]
    Malformed,

    #[error("Encryption failed")]
    Encrypt,

    /// Wrong key or tampered ciphertext
    #[error("Decryption failed")]
    Decrypt,

    #[error("Envelope payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Problems with the configured data encryption key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("DATA_ENC_KEY is not set on the server.")]
    Missing,

    #[error("DATA_ENC_KEY must be 32 bytes, base64 encoded.")]
    Invalid,
}
