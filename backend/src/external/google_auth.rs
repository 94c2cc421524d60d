//! Google OAuth access tokens for the Cloud REST APIs
//!
//! Tokens come either from a pre-minted value in configuration or from a
//! service-account key, exchanged through the JWT bearer grant.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

/// Scope covering Earth Engine, Vertex AI and Cloud Storage
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Minted tokens are replaced this long before they expire
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Fields of a service-account key file this client needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file(path: &str) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!("Cannot read credentials file {}: {}", path, e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            AppError::Configuration(format!("Invalid credentials file {}: {}", path, e))
        })
    }
}

#[derive(Debug, Clone)]
enum Credentials {
    Static(String),
    ServiceAccount(ServiceAccountKey),
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Source of bearer tokens shared by all Google API clients
#[derive(Clone)]
pub struct GoogleTokenProvider {
    credentials: Credentials,
    token_uri: String,
    timeout: std::time::Duration,
    http_client: Client,
    cache: Arc<Mutex<Option<CachedToken>>>,
}

impl GoogleTokenProvider {
    /// Provider that always hands out the same token
    pub fn with_static_token(token: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::Static(token.into()),
            token_uri: String::new(),
            timeout: std::time::Duration::from_secs(30),
            http_client: Client::new(),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Provider that mints tokens from a service-account key
    pub fn with_service_account(
        key: ServiceAccountKey,
        default_token_uri: String,
        http_client: Client,
        timeout: std::time::Duration,
    ) -> Self {
        let token_uri = key.token_uri.clone().unwrap_or(default_token_uri);
        Self {
            credentials: Credentials::ServiceAccount(key),
            token_uri,
            timeout,
            http_client,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Current access token, minting a new one when the cached token is stale
    pub async fn access_token(&self) -> AppResult<String> {
        let key = match &self.credentials {
            Credentials::Static(token) => return Ok(token.clone()),
            Credentials::ServiceAccount(key) => key,
        };

        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now() {
                return Ok(cached.value.clone());
            }
        }

        let fresh = self.exchange(key).await?;
        let value = fresh.value.clone();
        *cache = Some(fresh);
        Ok(value)
    }

    async fn exchange(&self, key: &ServiceAccountKey) -> AppResult<CachedToken> {
        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AppError::Configuration(format!("Invalid service-account key: {}", e)))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .map_err(|e| AppError::GoogleAuth(format!("Assertion signing failed: {}", e)))?;

        tracing::debug!("Exchanging service-account assertion for {}", key.client_email);

        let response = self
            .http_client
            .post(&self.token_uri)
            .timeout(self.timeout)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| AppError::GoogleAuth(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GoogleAuth(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::GoogleAuth(format!("Failed to parse token response: {}", e)))?;

        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}
