//! Core types shared across Letterbox components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::ENVELOPE_VERSION;
use crate::envelope::Envelope;

/// The decrypted content of one contact record.
///
/// `created_at` is always set by the server when the record is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactData {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body of `POST /api/contact`.
///
/// Every field is optional on the wire; presence rules live in
/// [`crate::validation`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Honeypot, left empty by humans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turnstile_token: Option<String>,
}

/// Successful reply of `POST /api/contact`.
///
/// `id` and `created_at` are absent when the honeypot swallowed the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// One entry of the admin listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminItem {
    pub pathname: String,
    pub uploaded_at: DateTime<Utc>,
    pub size: u64,
    pub seen: bool,
    /// `None` when the object could not be fetched or decrypted
    pub data: Option<ContactData>,
}

impl AdminItem {
    /// Creation time used for filtering and sorting: the record's own
    /// `createdAt`, falling back to the blob upload time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.data
            .as_ref()
            .and_then(|d| d.created_at.as_deref())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(self.uploaded_at)
    }
}

/// Reply of `GET /api/admin/contacts`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub ok: bool,
    pub items: Vec<AdminItem>,
}

/// Body of `POST /api/admin/seen`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeenRequest {
    #[serde(default)]
    pub pathname: String,
    #[serde(default, deserialize_with = "truthy")]
    pub seen: bool,
}

/// Loose boolean: `0`, `""`, `null`, and `false` are false, anything else is true
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Plain `{ "ok": true }` reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Body of every error reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Object body written under `contacts/`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedRecord {
    #[serde(default)]
    pub v: u8,
    #[serde(default)]
    pub created_at: String,
    pub enc: Envelope,
}

impl EncryptedRecord {
    pub fn new(created_at: String, enc: Envelope) -> Self {
        Self {
            v: ENVELOPE_VERSION,
            created_at,
            enc,
        }
    }
}

/// Every body format that has ever been written under `contacts/`.
///
/// Resolved once at read time; variant order matters for untagged matching.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredRecord {
    Encrypted(EncryptedRecord),
    /// Oldest format: the contact fields stored in the clear
    LegacyPlain(ContactData),
    /// Plain fields nested under `data`
    LegacyWrapped { data: ContactData },
}

/// Object body written under `seen/`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeenMarker {
    pub pathname: String,
    pub seen_at: String,
}
