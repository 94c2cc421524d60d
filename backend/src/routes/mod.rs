//! Route definitions for the Wildfire Risk service

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - risk assessment
        .merge(risk_routes(state.clone()))
        // Protected routes - map overlays
        .nest("/maps", map_routes(state.clone()))
        // Protected routes - weather reports
        .nest("/reports", report_routes(state))
}

/// Feature extraction and prediction routes (protected)
fn risk_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/features", post(handlers::extract_features))
        .route("/risk/assess", post(handlers::assess_location))
        .route("/risk/manual", post(handlers::predict_manual))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Map overlay routes (protected)
fn map_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/temperature", get(handlers::get_temperature_overlay))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Weather report routes (protected)
fn report_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/locations", get(handlers::list_report_locations))
        .route("/weather", post(handlers::create_weather_report))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
