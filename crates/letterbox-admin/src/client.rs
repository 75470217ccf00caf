//! HTTP client for the Letterbox API.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

use letterbox_common::constants::headers::X_ADMIN_KEY;
use letterbox_common::{
    AdminItem, ErrorBody, ListResponse, SeenRequest, SubmitRequest, SubmitResponse,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("admin key required (pass --admin-key or set LETTERBOX_ADMIN_KEY)")]
    MissingAdminKey,

    /// The server answered with an error body
    #[error("{message} (HTTP {status})")]
    Server { status: StatusCode, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    admin_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, admin_key: Option<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("letterbox-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_key: admin_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn admin_key(&self) -> Result<&str, ClientError> {
        self.admin_key.as_deref().ok_or(ClientError::MissingAdminKey)
    }

    /// `GET /api/admin/contacts?limit=N`
    pub async fn list(&self, limit: usize) -> Result<Vec<AdminItem>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/admin/contacts"))
            .query(&[("limit", limit)])
            .header(X_ADMIN_KEY, self.admin_key()?)
            .send()
            .await?;
        let body: ListResponse = read_json(response, "Failed to load contacts.").await?;
        Ok(body.items)
    }

    /// `POST /api/admin/seen`
    pub async fn set_seen(&self, pathname: &str, seen: bool) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/api/admin/seen"))
            .header(X_ADMIN_KEY, self.admin_key()?)
            .json(&SeenRequest {
                pathname: pathname.to_string(),
                seen,
            })
            .send()
            .await?;
        let _: serde_json::Value = read_json(response, "Failed to update seen state.").await?;
        Ok(())
    }

    /// `POST /api/contact`
    pub async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse, ClientError> {
        let response = self
            .http
            .post(self.url("/api/contact"))
            .json(request)
            .send()
            .await?;
        read_json(response, "Failed to send the message.").await
    }
}

/// Decode a success body, or surface the server's `error` message
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback: &str,
) -> Result<T, ClientError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        return Err(ClientError::Server {
            status,
            message: error_message(&bytes, fallback),
        });
    }

    serde_json::from_slice(&bytes).map_err(|_| ClientError::Server {
        status,
        message: "Unexpected response from server.".to_string(),
    })
}

fn error_message(body: &[u8], fallback: &str) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
