//! Admin endpoints: inbox listing and seen markers.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::HeaderMap,
};
use chrono::Utc;
use serde::Deserialize;

use letterbox_common::constants::blob_keys::CONTACTS_PREFIX;
use letterbox_common::constants::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use letterbox_common::paths::{format_timestamp, is_contact_pathname, seen_marker_pathname};
use letterbox_common::{
    AdminItem, ContactData, EncryptionKey, ListResponse, OkResponse, SeenMarker, SeenRequest,
    StoredRecord,
};

use super::parse_json;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{BlobMeta, BlobStore, PutOptions};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<String>,
}

/// Requested page size: default when absent or unusable, capped at the maximum
pub fn parse_limit(raw: Option<&str>) -> usize {
    match raw.map(str::trim).and_then(|s| s.parse::<usize>().ok()) {
        Some(n) if n >= 1 => n.min(MAX_LIST_LIMIT),
        _ => DEFAULT_LIST_LIMIT,
    }
}

/// List the most recent records, decrypted, with their seen state
pub async fn list_contacts(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    state.secrets.authorize_admin(&headers)?;
    let key = state.secrets.encryption_key()?;
    // An unparseable query string (e.g. a repeated `limit`) means the default
    let limit = parse_limit(query.ok().and_then(|Query(q)| q.limit).as_deref());

    let mut blobs = state.store.list(CONTACTS_PREFIX).await?;
    // Pathnames start with the creation timestamp
    blobs.sort_by(|a, b| b.pathname.cmp(&a.pathname));
    blobs.truncate(limit);

    let mut items = Vec::with_capacity(blobs.len());
    for blob in blobs {
        let data = load_record(state.store.as_ref(), key, &blob).await;
        let seen = is_seen(state.store.as_ref(), &blob.pathname).await;
        items.push(AdminItem {
            pathname: blob.pathname,
            uploaded_at: blob.uploaded_at,
            size: blob.size,
            seen,
            data,
        });
    }

    tracing::debug!(count = items.len(), limit, "Listed contacts");

    Ok(Json(ListResponse { ok: true, items }))
}

/// Set or clear the seen marker of one record
pub async fn set_seen(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<OkResponse>, ApiError> {
    state.secrets.authorize_admin(&headers)?;

    let request: SeenRequest = parse_json(&body)?;
    let pathname = request.pathname.trim();
    if !is_contact_pathname(pathname) {
        return Err(ApiError::InvalidPathname);
    }

    let marker = seen_marker_pathname(pathname);
    if request.seen {
        let body = serde_json::to_vec(&SeenMarker {
            pathname: pathname.to_string(),
            seen_at: format_timestamp(Utc::now()),
        })
        .map_err(|e| ApiError::Internal(e.into()))?;
        state
            .store
            .put(&marker, body, PutOptions::replace_json())
            .await?;
    } else {
        state.store.delete(&marker).await?;
    }

    tracing::info!(pathname = %pathname, seen = request.seen, "Seen marker updated");

    Ok(Json(OkResponse { ok: true }))
}

/// Fetch and resolve one record; any failure yields `None`
async fn load_record(
    store: &dyn BlobStore,
    key: &EncryptionKey,
    blob: &BlobMeta,
) -> Option<ContactData> {
    let result = match store.fetch(blob).await {
        Ok(raw) => resolve_record(key, &raw),
        Err(e) => Err(e.into()),
    };

    result
        .map_err(|e| {
            tracing::warn!(pathname = %blob.pathname, error = %e, "Unreadable contact record");
        })
        .ok()
}

/// Decode any stored record format into contact data
pub fn resolve_record(key: &EncryptionKey, raw: &[u8]) -> anyhow::Result<ContactData> {
    let record: StoredRecord = serde_json::from_slice(raw)?;
    Ok(match record {
        StoredRecord::Encrypted(record) => key.open(&record.enc)?,
        StoredRecord::LegacyPlain(data) => data,
        StoredRecord::LegacyWrapped { data } => data,
    })
}

async fn is_seen(store: &dyn BlobStore, pathname: &str) -> bool {
    match store.head(&seen_marker_pathname(pathname)).await {
        Ok(marker) => marker.is_some(),
        Err(e) => {
            tracing::warn!(pathname = %pathname, error = %e, "Seen marker lookup failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None), 50);
        assert_eq!(parse_limit(Some("")), 50);
        assert_eq!(parse_limit(Some("abc")), 50);
        assert_eq!(parse_limit(Some("0")), 50);
        assert_eq!(parse_limit(Some("-3")), 50);
        assert_eq!(parse_limit(Some(" 5 ")), 5);
        assert_eq!(parse_limit(Some("500")), 50);
    }

    #[test]
    fn test_resolve_record_formats() {
        let key = EncryptionKey::from_base64(&EncryptionKey::generate_base64()).unwrap();
        let contact = ContactData {
            name: "Ona".to_string(),
            email: "ona@example.lt".to_string(),
            message: "Sveiki".to_string(),
            created_at: Some("2026-03-01T10:00:00.000Z".to_string()),
        };

        let sealed = letterbox_common::EncryptedRecord::new(
            "2026-03-01T10:00:00.000Z".to_string(),
            key.seal(&contact).unwrap(),
        );
        let raw = serde_json::to_vec(&sealed).unwrap();
        assert_eq!(resolve_record(&key, &raw).unwrap(), contact);

        let legacy = serde_json::to_vec(&contact).unwrap();
        assert_eq!(resolve_record(&key, &legacy).unwrap(), contact);

        let wrapped = serde_json::to_vec(&serde_json::json!({ "data": contact })).unwrap();
        assert_eq!(resolve_record(&key, &wrapped).unwrap(), contact);

        let other_key = EncryptionKey::from_base64(&EncryptionKey::generate_base64()).unwrap();
        assert!(resolve_record(&other_key, &raw).is_err());
        assert!(resolve_record(&key, b"not json").is_err());
    }
}
