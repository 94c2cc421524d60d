//! Environmental feature models used as classifier input

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the five classifier features, as the hosted model expects them
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKey {
    #[serde(rename = "NDVI")]
    Ndvi,
    Temperature,
    Humidity,
    WindSpeed,
    Elevation,
}

impl FeatureKey {
    /// Canonical order, also the order missing keys are reported in
    pub const ALL: [FeatureKey; 5] = [
        FeatureKey::Ndvi,
        FeatureKey::Temperature,
        FeatureKey::Humidity,
        FeatureKey::WindSpeed,
        FeatureKey::Elevation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKey::Ndvi => "NDVI",
            FeatureKey::Temperature => "Temperature",
            FeatureKey::Humidity => "Humidity",
            FeatureKey::WindSpeed => "WindSpeed",
            FeatureKey::Elevation => "Elevation",
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature values for one location and date.
///
/// A value is `None` when the data provider had no coverage for the
/// requested window (cloud cover, missing tiles, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureSet {
    #[serde(rename = "NDVI")]
    pub ndvi: Option<Decimal>,
    #[serde(rename = "Temperature")]
    pub temperature: Option<Decimal>,
    #[serde(rename = "Humidity")]
    pub humidity: Option<Decimal>,
    #[serde(rename = "WindSpeed")]
    pub wind_speed: Option<Decimal>,
    #[serde(rename = "Elevation")]
    pub elevation: Option<Decimal>,
}

/// Completeness report for a [`FeatureSet`]
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Completeness {
    pub complete: bool,
    pub missing: Vec<FeatureKey>,
}

impl FeatureSet {
    pub fn get(&self, key: FeatureKey) -> Option<Decimal> {
        match key {
            FeatureKey::Ndvi => self.ndvi,
            FeatureKey::Temperature => self.temperature,
            FeatureKey::Humidity => self.humidity,
            FeatureKey::WindSpeed => self.wind_speed,
            FeatureKey::Elevation => self.elevation,
        }
    }

    pub fn set(&mut self, key: FeatureKey, value: Option<Decimal>) {
        let slot = match key {
            FeatureKey::Ndvi => &mut self.ndvi,
            FeatureKey::Temperature => &mut self.temperature,
            FeatureKey::Humidity => &mut self.humidity,
            FeatureKey::WindSpeed => &mut self.wind_speed,
            FeatureKey::Elevation => &mut self.elevation,
        };
        *slot = value;
    }

    /// Keys with no value, in canonical order
    pub fn missing(&self) -> Vec<FeatureKey> {
        FeatureKey::ALL
            .into_iter()
            .filter(|key| self.get(*key).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        FeatureKey::ALL.iter().all(|key| self.get(*key).is_some())
    }

    pub fn completeness(&self) -> Completeness {
        let missing = self.missing();
        Completeness {
            complete: missing.is_empty(),
            missing,
        }
    }
}

/// A feature set with every value present; the only shape accepted for prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CompleteFeatureSet {
    #[serde(rename = "NDVI")]
    pub ndvi: Decimal,
    #[serde(rename = "Temperature")]
    pub temperature: Decimal,
    #[serde(rename = "Humidity")]
    pub humidity: Decimal,
    #[serde(rename = "WindSpeed")]
    pub wind_speed: Decimal,
    #[serde(rename = "Elevation")]
    pub elevation: Decimal,
}

impl From<CompleteFeatureSet> for FeatureSet {
    fn from(c: CompleteFeatureSet) -> Self {
        FeatureSet {
            ndvi: Some(c.ndvi),
            temperature: Some(c.temperature),
            humidity: Some(c.humidity),
            wind_speed: Some(c.wind_speed),
            elevation: Some(c.elevation),
        }
    }
}
