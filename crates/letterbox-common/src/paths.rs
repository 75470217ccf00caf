//! Blob store key layout.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::constants::MAX_PATHNAME_CHARS;
use crate::constants::blob_keys::{CONTACTS_PREFIX, JSON_SUFFIX, SEEN_PREFIX};

/// Server timestamp in the record format, e.g. `2026-10-18T12:34:56.789Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `contacts/<timestamp with ':' and '.' as '-'>-<16 hex>.json`
pub fn contact_pathname(created_at: &str) -> String {
    let mut suffix = [0u8; 8];
    rand::rng().fill(&mut suffix);
    contact_pathname_with_suffix(created_at, &hex::encode(suffix))
}

fn contact_pathname_with_suffix(created_at: &str, suffix: &str) -> String {
    let stamp = created_at.replace([':', '.'], "-");
    format!("{CONTACTS_PREFIX}{stamp}-{suffix}{JSON_SUFFIX}")
}

/// `seen/<hex(sha256(pathname))>.json`
pub fn seen_marker_pathname(pathname: &str) -> String {
    let digest = Sha256::digest(pathname.as_bytes());
    format!("{SEEN_PREFIX}{}{JSON_SUFFIX}", hex::encode(digest))
}

/// Whether `pathname` names a single object directly under `contacts/`.
pub fn is_contact_pathname(pathname: &str) -> bool {
    if pathname.chars().count() > MAX_PATHNAME_CHARS || pathname.contains("..") {
        return false;
    }

    let Some(file) = pathname
        .strip_prefix(CONTACTS_PREFIX)
        .and_then(|rest| rest.strip_suffix(JSON_SUFFIX))
    else {
        return false;
    };

    !file.is_empty()
        && file
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
