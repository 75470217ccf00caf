//! # Letterbox Common
//!
//! Shared types, rules, and utilities used across Letterbox components.
//!
//! ## Modules
//! - `types` - Wire types and stored record formats
//! - `validation` - Submission field rules
//! - `envelope` - AES-256-GCM envelope for records at rest
//! - `paths` - Blob store key layout
//! - `error` - Common error types
//! - `constants` - Shared limits and names

pub mod constants;
pub mod envelope;
pub mod error;
pub mod paths;
pub mod types;
pub mod validation;

pub use envelope::{EncryptionKey, Envelope};
pub use error::{EnvelopeError, KeyError, ValidationError};
pub use types::*;
pub use validation::NormalizedSubmission;
