//! Submission field rules, shared by the service and the submit client.

use crate::constants::{
    EMAIL_MAX_CHARS, MESSAGE_MAX_CHARS, MESSAGE_MIN_CHARS, NAME_MAX_CHARS, NAME_MIN_CHARS,
};
use crate::error::ValidationError;
use crate::types::SubmitRequest;

/// A submission after trimming and normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSubmission {
    pub name: String,
    /// Lower-cased
    pub email: String,
    pub message: String,
    pub company: String,
    pub captcha_token: String,
}

impl NormalizedSubmission {
    pub fn from_request(req: &SubmitRequest) -> Self {
        fn clean(field: &Option<String>) -> String {
            field.as_deref().unwrap_or_default().trim().to_string()
        }

        Self {
            name: clean(&req.name),
            email: clean(&req.email).to_lowercase(),
            message: clean(&req.message),
            company: clean(&req.company),
            captcha_token: clean(&req.turnstile_token),
        }
    }

    /// True when the hidden honeypot field was filled in
    pub fn is_spam(&self) -> bool {
        !self.company.is_empty()
    }

    /// Check the field rules in order; the first failure wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() || self.email.is_empty() || self.message.is_empty() {
            return Err(ValidationError::MissingFields);
        }

        let name_len = self.name.chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&name_len) {
            return Err(ValidationError::NameLength);
        }

        if !is_valid_email(&self.email) || self.email.chars().count() > EMAIL_MAX_CHARS {
            return Err(ValidationError::InvalidEmail);
        }

        let message_len = self.message.chars().count();
        if !(MESSAGE_MIN_CHARS..=MESSAGE_MAX_CHARS).contains(&message_len) {
            return Err(ValidationError::MessageLength);
        }

        Ok(())
    }
}

/// Equivalent of `^[^\s@]+@[^\s@]+\.[^\s@]+$`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // some dot with at least one char on each side
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
