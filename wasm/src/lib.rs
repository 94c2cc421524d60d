//! WebAssembly module for the Wildfire Risk map client
//!
//! Provides client-side checks so the browser can reject bad input before
//! calling the API:
//! - Coordinate validation
//! - Feature completeness
//! - Prediction instance preview
//! - Risk headlines

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Check that a clicked point is a valid coordinate
#[wasm_bindgen]
pub fn validate_coordinate(latitude: f64, longitude: f64) -> bool {
    Coordinate::new(latitude, longitude).is_ok()
}

/// Names of the features that are null, as a JSON array
#[wasm_bindgen]
pub fn missing_features(features_json: &str) -> Result<String, JsValue> {
    missing_feature_names(features_json).map_err(|e| JsValue::from_str(&e))
}

/// Preview the instance that would be sent to the classifier
#[wasm_bindgen]
pub fn build_prediction_instance(features_json: &str, date: &str) -> Result<String, JsValue> {
    prediction_instance_json(features_json, date).map_err(|e| JsValue::from_str(&e))
}

/// Display headline for a classifier label
#[wasm_bindgen]
pub fn risk_headline(label: &str) -> String {
    PredictionResult::from_label(label).headline
}

/// States a weather report can be requested for
#[wasm_bindgen]
pub fn report_locations() -> js_sys::Array {
    US_STATES.iter().map(|s| JsValue::from_str(s)).collect()
}

fn parse_features(features_json: &str) -> Result<FeatureSet, String> {
    serde_json::from_str(features_json).map_err(|e| format!("Invalid features JSON: {}", e))
}

fn missing_feature_names(features_json: &str) -> Result<String, String> {
    let features = parse_features(features_json)?;
    serde_json::to_string(&features.missing()).map_err(|e| e.to_string())
}

fn prediction_instance_json(features_json: &str, date: &str) -> Result<String, String> {
    let features = parse_features(features_json)?;
    let date = NaiveDate::parse_from_str(date, INSTANCE_DATE_FORMAT)
        .map_err(|e| format!("Invalid date {}: {}", date, e))?;
    let complete = validate_features(&features).map_err(|e| e.to_string())?;
    serde_json::to_string(&PredictionInstance::new(&complete, date)).map_err(|e| e.to_string())
}
