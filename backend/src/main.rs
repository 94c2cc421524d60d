//! Wildfire Risk service - Backend Server
//!
//! Serves feature extraction, risk prediction, temperature overlays and
//! emailed weather reports over HTTP.

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wildfire_risk_backend::{create_app, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wildfire_server=debug,wildfire_risk_backend=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Wildfire Risk Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!(
        "Project {} in {}, prediction endpoint {}",
        config.gcp.project_id,
        config.gcp.region,
        config.prediction.endpoint_id
    );

    let port = config.server.port;
    let host: std::net::IpAddr = config.server.host.parse()?;

    // Create application state
    let state = AppState::from_config(config)?;

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from((host, port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
