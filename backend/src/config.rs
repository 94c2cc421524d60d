//! Configuration management for the Wildfire Risk service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with WFR_ prefix (e.g. `WFR__GCP__PROJECT_ID`)

use chrono::NaiveDate;
use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Session token verification
    pub jwt: JwtConfig,

    /// Google Cloud project and credentials
    pub gcp: GcpConfig,

    /// Earth Engine feature archive
    pub earth_engine: EarthEngineConfig,

    /// Hosted risk classifier
    pub prediction: PredictionConfig,

    /// Hosted text-generation model
    pub generation: GenerationConfig,

    /// Object storage for generated reports
    pub storage: StorageConfig,

    /// SMTP relay for report delivery
    pub email: EmailConfig,

    /// Feature extraction parameters
    pub features: FeatureConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Shared secret of the login layer's HS256 session tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GcpConfig {
    /// Project that owns the endpoints and bucket
    pub project_id: String,

    /// Region of the Vertex AI endpoints
    pub region: String,

    /// Path to a service-account key file
    pub credentials_file: Option<String>,

    /// Pre-minted OAuth access token; takes precedence over `credentials_file`
    pub access_token: Option<String>,

    /// OAuth token exchange endpoint
    pub token_uri: String,

    /// Token exchange timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EarthEngineConfig {
    /// Earth Engine REST API root
    pub base_url: String,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PredictionConfig {
    /// Deployed endpoint id
    pub endpoint_id: String,

    /// API root; defaults to the regional Vertex AI host
    pub base_url: Option<String>,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Publisher model id
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// API root; defaults to the regional Vertex AI host
    pub base_url: Option<String>,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Bucket that receives generated reports
    pub bucket: String,

    /// Cloud Storage JSON API root
    pub base_url: String,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    /// SMTP relay host (STARTTLS)
    pub smtp_host: String,

    /// SMTP relay port
    pub smtp_port: u16,

    /// SMTP login
    pub username: String,

    /// SMTP password or app password
    pub password: String,

    /// Sender mailbox, e.g. `Wildfire Risk <reports@example.com>`
    pub from_address: String,

    /// Subject line of report emails
    pub subject: String,

    /// Per-send timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeatureConfig {
    /// Date used when a request does not name one
    pub reference_date: NaiveDate,

    /// Spatial reduction scale for the vegetation index, in meters
    pub vegetation_scale_m: f64,

    /// Spatial reduction scale for reanalysis variables, in meters
    pub climate_scale_m: f64,

    /// Spatial reduction scale for elevation, in meters
    pub elevation_scale_m: f64,

    /// Vegetation imagery window length in days
    pub vegetation_window_days: u32,

    /// Reanalysis window length in days
    pub climate_window_days: u32,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("WFR_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("gcp.region", "us-central1")?
            .set_default("gcp.token_uri", "https://oauth2.googleapis.com/token")?
            .set_default("gcp.timeout_secs", 30)?
            .set_default("earth_engine.base_url", "https://earthengine.googleapis.com/v1")?
            .set_default("earth_engine.timeout_secs", 60)?
            .set_default("prediction.timeout_secs", 30)?
            .set_default("generation.model", "gemini-1.5-flash-002")?
            .set_default("generation.temperature", 0.7)?
            .set_default("generation.timeout_secs", 60)?
            .set_default("storage.base_url", "https://storage.googleapis.com")?
            .set_default("storage.timeout_secs", 30)?
            .set_default("email.smtp_host", "smtp.gmail.com")?
            .set_default("email.smtp_port", 587)?
            .set_default("email.subject", "Your AI Weather Report")?
            .set_default("email.timeout_secs", 30)?
            .set_default("features.reference_date", "2024-03-01")?
            .set_default("features.vegetation_scale_m", 30.0)?
            .set_default("features.climate_scale_m", 1000.0)?
            .set_default("features.elevation_scale_m", 30.0)?
            .set_default("features.vegetation_window_days", 2)?
            .set_default("features.climate_window_days", 1)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (WFR_ prefix)
            .add_source(
                Environment::with_prefix("WFR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Regional Vertex AI host, e.g. `https://us-central1-aiplatform.googleapis.com`
    pub fn vertex_base_url(&self) -> String {
        format!("https://{}-aiplatform.googleapis.com", self.gcp.region)
    }
}

/// Seconds from config to a `Duration`
pub fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            reference_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default(),
            vegetation_scale_m: 30.0,
            climate_scale_m: 1000.0,
            elevation_scale_m: 30.0,
            vegetation_window_days: 2,
            climate_window_days: 1,
        }
    }
}
