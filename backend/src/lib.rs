//! Wildfire Risk service
//!
//! Extracts environmental features for a map location, classifies wildfire
//! risk with a hosted model and delivers generated weather reports.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use crate::config::Config;

use crate::config::secs;
use crate::error::{AppError, AppResult};
use crate::external::{
    build_http_client, google_auth::ServiceAccountKey, mailer::SmtpSettings,
    vertex_prediction::EndpointRef, CloudStorageClient, EarthEngineClient, GoogleTokenProvider,
    PredictionClient, SmtpMailer, TextGenerationClient,
};
use crate::services::{
    FeatureExtractor, ReportDispatcher, RiskService, TemperatureOverlayService,
    WeatherReportService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub risk: RiskService<EarthEngineClient>,
    pub overlay: TemperatureOverlayService,
    pub reports: WeatherReportService<CloudStorageClient, SmtpMailer>,
}

impl AppState {
    /// Wire every external client from configuration
    pub fn from_config(config: Config) -> AppResult<Self> {
        let http_client = build_http_client()?;
        let tokens = token_provider(&config, http_client.clone())?;
        let vertex_base_url = config.vertex_base_url();

        let earth_engine = EarthEngineClient::new(
            http_client.clone(),
            tokens.clone(),
            config.earth_engine.base_url.clone(),
            config.gcp.project_id.clone(),
            secs(config.earth_engine.timeout_secs),
        );

        let classifier = PredictionClient::new(
            http_client.clone(),
            tokens.clone(),
            config
                .prediction
                .base_url
                .clone()
                .unwrap_or_else(|| vertex_base_url.clone()),
            EndpointRef {
                project_id: config.gcp.project_id.clone(),
                region: config.gcp.region.clone(),
                endpoint_id: config.prediction.endpoint_id.clone(),
            },
            secs(config.prediction.timeout_secs),
        );

        let generator = TextGenerationClient::new(
            http_client.clone(),
            tokens.clone(),
            config
                .generation
                .base_url
                .clone()
                .unwrap_or(vertex_base_url),
            &config.gcp.project_id,
            &config.gcp.region,
            &config.generation.model,
            secs(config.generation.timeout_secs),
        );

        let storage = CloudStorageClient::new(
            http_client,
            tokens,
            config.storage.base_url.clone(),
            config.storage.bucket.clone(),
            secs(config.storage.timeout_secs),
        );

        let mailer = SmtpMailer::new(&SmtpSettings {
            host: config.email.smtp_host.clone(),
            port: config.email.smtp_port,
            username: config.email.username.clone(),
            password: config.email.password.clone(),
            from_address: config.email.from_address.clone(),
            timeout: secs(config.email.timeout_secs),
        })?;

        let risk = RiskService::new(
            FeatureExtractor::new(earth_engine.clone(), config.features.clone()),
            classifier,
        );
        let overlay = TemperatureOverlayService::new(earth_engine);
        let reports = WeatherReportService::new(
            generator,
            config.generation.temperature,
            ReportDispatcher::new(storage, mailer, config.email.subject.clone()),
        );

        Ok(Self {
            config: Arc::new(config),
            risk,
            overlay,
            reports,
        })
    }
}

/// Static token when configured, otherwise the service-account key file
fn token_provider(config: &Config, http_client: reqwest::Client) -> AppResult<GoogleTokenProvider> {
    if let Some(token) = &config.gcp.access_token {
        return Ok(GoogleTokenProvider::with_static_token(token.clone()));
    }

    let path = config.gcp.credentials_file.as_deref().ok_or_else(|| {
        AppError::Configuration(
            "Either gcp.access_token or gcp.credentials_file must be set".to_string(),
        )
    })?;

    Ok(GoogleTokenProvider::with_service_account(
        ServiceAccountKey::from_file(path)?,
        config.gcp.token_uri.clone(),
        http_client,
        secs(config.gcp.timeout_secs),
    ))
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Wildfire Risk API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
