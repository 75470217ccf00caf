//! In-process blob store for local runs and tests.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{BlobMeta, BlobStore, PutOptions, StorageError};

struct StoredObject {
    meta: BlobMeta,
    body: Vec<u8>,
}

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored pathname, sorted
    pub fn pathnames(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Raw body of an object
    pub fn body(&self, pathname: &str) -> Option<Vec<u8>> {
        self.read().get(pathname).map(|o| o.body.clone())
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, pathname: &str, body: Vec<u8>, options: PutOptions) -> Result<BlobMeta, StorageError> {
        let mut objects = self.write();
        if !options.allow_overwrite && objects.contains_key(pathname) {
            return Err(StorageError::AlreadyExists(pathname.to_string()));
        }

        let meta = BlobMeta {
            pathname: pathname.to_string(),
            url: format!("memory:///{pathname}"),
            size: body.len() as u64,
            uploaded_at: Utc::now(),
        };
        objects.insert(
            pathname.to_string(),
            StoredObject {
                meta: meta.clone(),
                body,
            },
        );
        Ok(meta)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, StorageError> {
        Ok(self
            .read()
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, object)| object.meta.clone())
            .collect())
    }

    async fn head(&self, pathname: &str) -> Result<Option<BlobMeta>, StorageError> {
        Ok(self.read().get(pathname).map(|o| o.meta.clone()))
    }

    async fn fetch(&self, blob: &BlobMeta) -> Result<Vec<u8>, StorageError> {
        self.body(&blob.pathname)
            .ok_or_else(|| StorageError::NotFound(blob.pathname.clone()))
    }

    async fn delete(&self, pathname: &str) -> Result<(), StorageError> {
        self.write().remove(pathname);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_put_list_head_delete() {
        let store = MemoryBlobStore::new();
        store
            .put("contacts/a.json", b"{}".to_vec(), PutOptions::create_json())
            .await
            .unwrap();
        store
            .put("contacts/b.json", b"{\"x\":1}".to_vec(), PutOptions::create_json())
            .await
            .unwrap();
        store
            .put("seen/zz.json", b"{}".to_vec(), PutOptions::replace_json())
            .await
            .unwrap();

        let listed = store.list("contacts/").await.unwrap();
        let names: Vec<_> = listed.iter().map(|b| b.pathname.as_str()).collect();
        assert_eq!(names, ["contacts/a.json", "contacts/b.json"]);
        assert_eq!(listed[1].size, 7);

        let head = store.head("contacts/b.json").await.unwrap().unwrap();
        assert_eq!(store.fetch(&head).await.unwrap(), b"{\"x\":1}");
        assert!(store.head("contacts/c.json").await.unwrap().is_none());

        assert_ok!(store.delete("seen/zz.json").await);
        // Deleting an absent object succeeds
        assert_ok!(store.delete("seen/zz.json").await);
        assert!(store.head("seen/zz.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_refuses_overwrite() {
        let store = MemoryBlobStore::new();
        let opts = PutOptions::create_json();
        assert_ok!(store.put("contacts/a.json", vec![1], opts).await);
        let err = assert_err!(store.put("contacts/a.json", vec![2], opts).await);
        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(store.body("contacts/a.json").unwrap(), vec![1]);

        store
            .put("contacts/a.json", vec![3], PutOptions::replace_json())
            .await
            .unwrap();
        assert_eq!(store.body("contacts/a.json").unwrap(), vec![3]);
        assert_eq!(store.pathnames().len(), 1);
    }
}
