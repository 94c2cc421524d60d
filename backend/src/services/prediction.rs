//! Wildfire risk assessment: extract → validate → predict

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{
    parse_feature_value, validate_features, CompleteFeatureSet, Coordinate, FeatureKey,
    FeatureSet, PredictionInstance, PredictionResult,
};

use crate::error::{AppError, AppResult};
use crate::external::{PredictionClient, RegionReducer};
use crate::middleware::AuthUser;
use crate::services::features::FeatureExtractor;

/// What happened after features were extracted
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssessmentOutcome {
    /// All features resolved and the classifier answered
    Predicted {
        instance: PredictionInstance,
        result: PredictionResult,
    },
    /// Some provider had no coverage; nothing was submitted
    Incomplete { missing: Vec<FeatureKey> },
}

/// Result of assessing a map location
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocationAssessment {
    pub location: Coordinate,
    pub date: NaiveDate,
    pub features: FeatureSet,
    #[serde(flatten)]
    pub outcome: AssessmentOutcome,
}

/// Manually entered past data, values as typed by the user
#[derive(Debug, Clone, Deserialize)]
pub struct ManualEntryInput {
    pub date: NaiveDate,
    #[serde(rename = "NDVI")]
    pub ndvi: String,
    #[serde(rename = "Temperature")]
    pub temperature: String,
    #[serde(rename = "Humidity")]
    pub humidity: String,
    #[serde(rename = "WindSpeed")]
    pub wind_speed: String,
    #[serde(rename = "Elevation")]
    pub elevation: String,
}

impl ManualEntryInput {
    /// Parse every value as a decimal; the first bad field is reported
    pub fn to_features(&self) -> AppResult<CompleteFeatureSet> {
        let parse = |key: FeatureKey, raw: &str| {
            parse_feature_value(key, raw).map_err(|message| AppError::validation(key.as_str(), message))
        };
        Ok(CompleteFeatureSet {
            ndvi: parse(FeatureKey::Ndvi, &self.ndvi)?,
            temperature: parse(FeatureKey::Temperature, &self.temperature)?,
            humidity: parse(FeatureKey::Humidity, &self.humidity)?,
            wind_speed: parse(FeatureKey::WindSpeed, &self.wind_speed)?,
            elevation: parse(FeatureKey::Elevation, &self.elevation)?,
        })
    }
}

/// Result of a manual-entry prediction
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ManualPrediction {
    pub instance: PredictionInstance,
    pub result: PredictionResult,
}

/// Risk assessment workflows
#[derive(Clone)]
pub struct RiskService<R> {
    extractor: FeatureExtractor<R>,
    classifier: PredictionClient,
}

impl<R: RegionReducer> RiskService<R> {
    pub fn new(extractor: FeatureExtractor<R>, classifier: PredictionClient) -> Self {
        Self {
            extractor,
            classifier,
        }
    }

    /// Features only, no prediction
    pub async fn extract_features(
        &self,
        user: &AuthUser,
        location: Coordinate,
        date: NaiveDate,
    ) -> AppResult<FeatureSet> {
        tracing::debug!("User {} requested features", user.user_id);
        self.extractor.extract(location, date).await
    }

    /// Extract features for a location and classify them when complete.
    /// An incomplete set is returned to the caller and never submitted.
    pub async fn assess_location(
        &self,
        user: &AuthUser,
        location: Coordinate,
        date: NaiveDate,
    ) -> AppResult<LocationAssessment> {
        let features = self.extract_features(user, location, date).await?;

        let outcome = match validate_features(&features) {
            Ok(complete) => {
                let (instance, result) = self.classifier.predict(&complete, date).await?;
                tracing::info!(
                    "Risk at ({}, {}) on {}: {}",
                    location.latitude(),
                    location.longitude(),
                    date,
                    result.headline
                );
                AssessmentOutcome::Predicted { instance, result }
            }
            Err(missing) => {
                tracing::warn!("Skipping prediction: {}", missing);
                AssessmentOutcome::Incomplete { missing: missing.0 }
            }
        };

        Ok(LocationAssessment {
            location,
            date,
            features,
            outcome,
        })
    }
}

impl<R> RiskService<R> {
    /// Classify user-supplied values; no feature extraction happens here
    pub async fn predict_manual(
        &self,
        user: &AuthUser,
        input: &ManualEntryInput,
    ) -> AppResult<ManualPrediction> {
        let features = input.to_features()?;
        tracing::debug!("User {} submitted manual values", user.user_id);

        let (instance, result) = self.classifier.predict(&features, input.date).await?;
        Ok(ManualPrediction { instance, result })
    }
}
