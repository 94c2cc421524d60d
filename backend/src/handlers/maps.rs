//! HTTP handlers for map overlays

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::temperature_map::TileLayer;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OverlayQuery {
    pub date: Option<NaiveDate>,
}

/// Air temperature tile layer
pub async fn get_temperature_overlay(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<OverlayQuery>,
) -> AppResult<Json<TileLayer>> {
    let date = query.date.unwrap_or(state.config.features.reference_date);
    let layer = state.overlay.temperature_layer(date).await?;
    Ok(Json(layer))
}
