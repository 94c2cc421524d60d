//! HTTP handlers for feature extraction and risk prediction

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{Coordinate, FeatureSet};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::prediction::{LocationAssessment, ManualEntryInput, ManualPrediction};
use crate::AppState;

/// A point picked on the map
#[derive(Debug, Deserialize, Validate)]
pub struct LocationInput {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Defaults to the configured reference date
    pub date: Option<NaiveDate>,
}

impl LocationInput {
    fn resolve(&self, state: &AppState) -> AppResult<(Coordinate, NaiveDate)> {
        self.validate()?;
        let location = Coordinate::new(self.latitude, self.longitude)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        let date = self.date.unwrap_or(state.config.features.reference_date);
        Ok((location, date))
    }
}

/// Extract the feature set for a location
pub async fn extract_features(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<LocationInput>,
) -> AppResult<Json<FeatureSet>> {
    let (location, date) = input.resolve(&state)?;
    let features = state
        .risk
        .extract_features(&current_user.0, location, date)
        .await?;
    Ok(Json(features))
}

/// Assess wildfire risk at a location
pub async fn assess_location(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<LocationInput>,
) -> AppResult<Json<LocationAssessment>> {
    let (location, date) = input.resolve(&state)?;
    let assessment = state
        .risk
        .assess_location(&current_user.0, location, date)
        .await?;
    Ok(Json(assessment))
}

/// Predict risk from manually entered values
pub async fn predict_manual(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ManualEntryInput>,
) -> AppResult<Json<ManualPrediction>> {
    let prediction = state.risk.predict_manual(&current_user.0, &input).await?;
    Ok(Json(prediction))
}
