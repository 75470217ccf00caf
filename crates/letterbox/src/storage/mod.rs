//! Blob storage access.
//!
//! Records and seen markers are independent objects addressed by pathname.
//! The service never mutates a record after writing it.

mod http;
mod memory;

pub use http::HttpBlobStore;
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metadata the blob service keeps for each object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMeta {
    pub pathname: String,
    pub url: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Options for a single write
#[derive(Debug, Clone, Copy)]
pub struct PutOptions {
    pub content_type: &'static str,
    /// Replace an existing object instead of failing
    pub allow_overwrite: bool,
}

impl PutOptions {
    /// JSON object that must not already exist
    pub const fn create_json() -> Self {
        Self {
            content_type: "application/json",
            allow_overwrite: false,
        }
    }

    /// JSON object that replaces any previous version
    pub const fn replace_json() -> Self {
        Self {
            content_type: "application/json",
            allow_overwrite: true,
        }
    }
}

/// Blob storage failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("BLOB_READ_WRITE_TOKEN is not set on the server.")]
    MissingCredentials,

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Blob service returned {status} for {operation}")]
    Status { operation: &'static str, status: u16 },

    #[error("Blob service request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Minimal object store interface used by the handlers
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write an object
    async fn put(&self, pathname: &str, body: Vec<u8>, options: PutOptions) -> Result<BlobMeta, StorageError>;

    /// All objects whose pathname starts with `prefix`, in no particular order
    async fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, StorageError>;

    /// Metadata for one object, `None` when absent
    async fn head(&self, pathname: &str) -> Result<Option<BlobMeta>, StorageError>;

    /// Object body
    async fn fetch(&self, blob: &BlobMeta) -> Result<Vec<u8>, StorageError>;

    /// Remove an object; removing an absent object succeeds
    async fn delete(&self, pathname: &str) -> Result<(), StorageError>;
}
