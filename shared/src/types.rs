//! Common types used across the platform

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a latitude/longitude pair is rejected
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A point on the globe, in WGS84 degrees
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside the valid ranges (NaN included)
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// GeoJSON ordering: `[longitude, latitude]`
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            latitude: f64,
            longitude: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Coordinate::new(raw.latitude, raw.longitude).map_err(serde::de::Error::custom)
    }
}

/// How far past the reference date a window extends
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "unit", content = "length")]
pub enum WindowSpan {
    Days(u32),
    Hours(u32),
    /// Static sources (e.g. elevation) have no time dimension
    Static,
}

/// Reference date plus forward offset over which measurements are averaged
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObservationWindow {
    pub reference_date: NaiveDate,
    pub span: WindowSpan,
}

impl ObservationWindow {
    pub fn days(reference_date: NaiveDate, days: u32) -> Self {
        Self {
            reference_date,
            span: WindowSpan::Days(days),
        }
    }

    pub fn hours(reference_date: NaiveDate, hours: u32) -> Self {
        Self {
            reference_date,
            span: WindowSpan::Hours(hours),
        }
    }

    pub fn fixed(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            span: WindowSpan::Static,
        }
    }

    /// Half-open `[start, end)` interval, or `None` for static sources
    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.reference_date.and_hms_opt(0, 0, 0)?;
        let end = match self.span {
            WindowSpan::Days(n) => start + Duration::days(i64::from(n)),
            WindowSpan::Hours(n) => start + Duration::hours(i64::from(n)),
            WindowSpan::Static => return None,
        };
        Some((start, end))
    }
}
