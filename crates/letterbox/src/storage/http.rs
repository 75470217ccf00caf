//! Client for the remote blob service.
//!
//! Contract (bearer-token authenticated):
//! ```text
//! PUT    {base}/{pathname}             -> BlobMeta   (409 if exists and overwrite disallowed)
//! GET    {base}?prefix=..&cursor=..    -> { blobs, cursor?, hasMore }
//! GET    {base}/meta/{pathname}        -> BlobMeta   (404 if absent)
//! DELETE {base}/{pathname}             -> 2xx        (404 treated as success)
//! GET    {BlobMeta.url}                -> object body
//! ```

use async_trait::async_trait;
use reqwest::{StatusCode, header::CONTENT_TYPE};
use serde::Deserialize;

use letterbox_common::constants::headers::X_ALLOW_OVERWRITE;

use super::{BlobMeta, BlobStore, PutOptions, StorageError};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    blobs: Vec<BlobMeta>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBlobStore {
    pub fn new(client: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn token(&self) -> Result<&str, StorageError> {
        self.token.as_deref().ok_or(StorageError::MissingCredentials)
    }

    fn object_url(&self, pathname: &str) -> String {
        format!("{}/{}", self.base_url, pathname.trim_start_matches('/'))
    }
}

fn check(operation: &'static str, status: StatusCode) -> Result<(), StorageError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(StorageError::Status {
            operation,
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, pathname: &str, body: Vec<u8>, options: PutOptions) -> Result<BlobMeta, StorageError> {
        let response = self
            .client
            .put(self.object_url(pathname))
            .bearer_auth(self.token()?)
            .header(CONTENT_TYPE, options.content_type)
            .header(X_ALLOW_OVERWRITE, if options.allow_overwrite { "1" } else { "0" })
            .body(body)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Err(StorageError::AlreadyExists(pathname.to_string()));
        }
        check("put", response.status())?;

        Ok(response.json().await?)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, StorageError> {
        let token = self.token()?;
        let mut blobs = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&self.base_url)
                .bearer_auth(token)
                .query(&[("prefix", prefix)]);
            if let Some(ref c) = cursor {
                request = request.query(&[("cursor", c.as_str())]);
            }

            let response = request.send().await?;
            check("list", response.status())?;
            let page: ListPage = response.json().await?;

            blobs.extend(page.blobs);
            match page.cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        tracing::debug!(prefix = %prefix, count = blobs.len(), "Listed blobs");
        Ok(blobs)
    }

    async fn head(&self, pathname: &str) -> Result<Option<BlobMeta>, StorageError> {
        let url = format!("{}/meta/{}", self.base_url, pathname.trim_start_matches('/'));
        let response = self.client.get(url).bearer_auth(self.token()?).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check("head", response.status())?;

        Ok(Some(response.json().await?))
    }

    async fn fetch(&self, blob: &BlobMeta) -> Result<Vec<u8>, StorageError> {
        // Object URLs are public; the token is not sent to them
        let response = self.client.get(&blob.url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(blob.pathname.clone()));
        }
        check("fetch", response.status())?;

        Ok(response.bytes().await?.to_vec())
    }

    async fn delete(&self, pathname: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(self.object_url(pathname))
            .bearer_auth(self.token()?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check("delete", response.status())
    }
}
