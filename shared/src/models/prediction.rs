//! Prediction request and result models for the hosted risk classifier

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::features::CompleteFeatureSet;

/// Date format of the `date` field in a prediction instance
pub const INSTANCE_DATE_FORMAT: &str = "%Y-%m-%d";

/// One classifier instance. Every value is text: the hosted endpoint was
/// trained on string-typed columns and rejects native numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictionInstance {
    pub date: String,
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

impl PredictionInstance {
    pub fn new(features: &CompleteFeatureSet, date: NaiveDate) -> Self {
        Self {
            date: date.format(INSTANCE_DATE_FORMAT).to_string(),
            ndvi: decimal_text(features.ndvi),
            temperature: decimal_text(features.temperature),
            humidity: decimal_text(features.humidity),
            wind_speed: decimal_text(features.wind_speed),
            elevation: decimal_text(features.elevation),
        }
    }
}

/// Plain decimal text, never scientific notation
fn decimal_text(value: Decimal) -> String {
    value.to_string()
}

/// Wildfire risk label returned by the classifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Exact, case-sensitive match on the model's class names
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "High" => Some(RiskLevel::High),
            "Medium" => Some(RiskLevel::Medium),
            "Low" => Some(RiskLevel::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            RiskLevel::High => "High Fire Risk Detected!",
            RiskLevel::Medium => "Medium Fire Risk",
            RiskLevel::Low => "Low Fire Risk",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Headline shown when the classifier returns nothing usable
pub const NO_RISK_HEADLINE: &str = "No Fire Risk";

/// Normalized classifier answer.
///
/// `label` keeps whatever the endpoint returned; `risk` is set only when the
/// label is one of the known levels. Both absent means the endpoint returned
/// no prediction at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictionResult {
    pub risk: Option<RiskLevel>,
    pub label: Option<String>,
    pub headline: String,
}

impl PredictionResult {
    pub fn from_label(label: impl Into<String>) -> Self {
        let label = label.into();
        let risk = RiskLevel::from_label(&label);
        Self {
            risk,
            label: Some(label),
            headline: headline_for(risk).to_string(),
        }
    }

    /// Empty prediction list
    pub fn absent() -> Self {
        Self {
            risk: None,
            label: None,
            headline: NO_RISK_HEADLINE.to_string(),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.label.is_none()
    }
}

fn headline_for(risk: Option<RiskLevel>) -> &'static str {
    risk.map(|r| r.headline()).unwrap_or(NO_RISK_HEADLINE)
}
