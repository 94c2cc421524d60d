//! Cloud Storage client for write-only report persistence

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use super::google_auth::GoogleTokenProvider;
use crate::error::{AppError, AppResult};

/// Location of a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub name: String,
}

impl std::fmt::Display for StoredObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.name)
    }
}

/// Named blob writes
#[axum::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create `name` with a UTF-8 text body. Must fail rather than overwrite.
    async fn put_text(&self, name: &str, body: &str) -> AppResult<StoredObject>;
}

#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
    bucket: String,
}

/// Cloud Storage JSON API client bound to one bucket
#[derive(Clone)]
pub struct CloudStorageClient {
    http_client: Client,
    tokens: GoogleTokenProvider,
    base_url: String,
    bucket: String,
    timeout: Duration,
}

impl CloudStorageClient {
    pub fn new(
        http_client: Client,
        tokens: GoogleTokenProvider,
        base_url: String,
        bucket: String,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket,
            timeout,
        }
    }
}

#[axum::async_trait]
impl ObjectStore for CloudStorageClient {
    async fn put_text(&self, name: &str, body: &str) -> AppResult<StoredObject> {
        let url = format!("{}/upload/storage/v1/b/{}/o", self.base_url, self.bucket);
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| AppError::Storage(format!("Authentication failed: {}", e)))?;

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.timeout)
            // ifGenerationMatch=0: only create, never replace an existing object
            .query(&[("uploadType", "media"), ("name", name), ("ifGenerationMatch", "0")])
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Upload failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let object: ObjectResource = response
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to parse response: {}", e)))?;

        Ok(StoredObject {
            bucket: object.bucket,
            name: object.name,
        })
    }
}
