//! Validation utilities for the Wildfire Risk service

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{CompleteFeatureSet, FeatureKey, FeatureSet};

// ============================================================================
// Feature Validations
// ============================================================================

/// A feature set lacked one or more values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing features: {}", join_keys(.0))]
pub struct MissingFeatures(pub Vec<FeatureKey>);

fn join_keys(keys: &[FeatureKey]) -> String {
    keys.iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Gate for prediction: only a set with all five values passes.
/// Missing values are reported, never filled in.
pub fn validate_features(features: &FeatureSet) -> Result<CompleteFeatureSet, MissingFeatures> {
    match (
        features.ndvi,
        features.temperature,
        features.humidity,
        features.wind_speed,
        features.elevation,
    ) {
        (Some(ndvi), Some(temperature), Some(humidity), Some(wind_speed), Some(elevation)) => {
            Ok(CompleteFeatureSet {
                ndvi,
                temperature,
                humidity,
                wind_speed,
                elevation,
            })
        }
        _ => Err(MissingFeatures(features.missing())),
    }
}

/// Parse a user-typed feature value as a plain decimal
pub fn parse_feature_value(key: FeatureKey, raw: &str) -> Result<Decimal, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", key));
    }
    Decimal::from_str(trimmed).map_err(|_| format!("{} must be a decimal number", key))
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}
