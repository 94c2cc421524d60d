//! External API integrations

pub mod cloud_storage;
pub mod earth_engine;
pub mod google_auth;
pub mod mailer;
pub mod text_generation;
pub mod vertex_prediction;

pub use cloud_storage::{CloudStorageClient, ObjectStore, StoredObject};
pub use earth_engine::{EarthEngineClient, RegionReducer};
pub use google_auth::GoogleTokenProvider;
pub use mailer::{MailTransport, OutgoingEmail, SmtpMailer};
pub use text_generation::TextGenerationClient;
pub use vertex_prediction::PredictionClient;

use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Connect timeout shared by every outbound HTTP client
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client used by all Google API clients; per-call timeouts are set per request
pub fn build_http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("wildfire-risk/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))
}
