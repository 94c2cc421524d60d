//! HTTP handlers for weather news reports

use axum::{extract::State, Json};
use shared::US_STATES;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::report::{WeatherReportInput, WeatherReportResponse};
use crate::AppState;

/// States a report can be requested for
pub async fn list_report_locations(_current_user: CurrentUser) -> Json<Vec<&'static str>> {
    Json(US_STATES.to_vec())
}

/// Generate a weather report and deliver it to the caller
pub async fn create_weather_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<WeatherReportInput>,
) -> AppResult<Json<WeatherReportResponse>> {
    let response = state
        .reports
        .generate_and_dispatch(&current_user.0, &input)
        .await?;
    Ok(Json(response))
}
