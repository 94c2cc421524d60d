//! Feature extraction: turns a coordinate and date into classifier features

use chrono::NaiveDate;
use shared::{Coordinate, FeatureKey, FeatureSet, ObservationWindow};

use crate::config::FeatureConfig;
use crate::error::AppResult;
use crate::external::earth_engine::{
    BandValues, RasterSource, RegionReduction, RegionReducer, GLDAS_NOAH_3H, SENTINEL2_SR,
    SRTM_ELEVATION,
};

const NDVI_BAND: &str = "NDVI";
const NIR_BAND: &str = "B8";
const RED_BAND: &str = "B4";
const AIR_TEMPERATURE_BAND: &str = "Tair_f_inst";
const WIND_SPEED_BAND: &str = "Wind_f_inst";
const SPECIFIC_HUMIDITY_BAND: &str = "Qair_f_inst";
const ELEVATION_BAND: &str = "elevation";

/// Builds feature sets from three independent raster reductions
#[derive(Clone)]
pub struct FeatureExtractor<R> {
    reducer: R,
    settings: FeatureConfig,
}

impl<R: RegionReducer> FeatureExtractor<R> {
    pub fn new(reducer: R, settings: FeatureConfig) -> Self {
        Self { reducer, settings }
    }

    /// Vegetation index: per-image NDVI averaged over the imagery window
    pub fn vegetation_query(&self, location: Coordinate, date: NaiveDate) -> RegionReduction {
        RegionReduction {
            source: RasterSource::NormalizedDifference {
                collection: SENTINEL2_SR.to_string(),
                band_a: NIR_BAND.to_string(),
                band_b: RED_BAND.to_string(),
                output: NDVI_BAND.to_string(),
            },
            location,
            window: ObservationWindow::days(date, self.settings.vegetation_window_days),
            scale_m: self.settings.vegetation_scale_m,
        }
    }

    /// Reanalysis grids are coarse, so they are reduced over a wider scale
    pub fn climate_query(&self, location: Coordinate, date: NaiveDate) -> RegionReduction {
        RegionReduction {
            source: RasterSource::CollectionBands {
                collection: GLDAS_NOAH_3H.to_string(),
                bands: vec![
                    AIR_TEMPERATURE_BAND.to_string(),
                    WIND_SPEED_BAND.to_string(),
                    SPECIFIC_HUMIDITY_BAND.to_string(),
                ],
            },
            location,
            window: ObservationWindow::days(date, self.settings.climate_window_days),
            scale_m: self.settings.climate_scale_m,
        }
    }

    pub fn elevation_query(&self, location: Coordinate, date: NaiveDate) -> RegionReduction {
        RegionReduction {
            source: RasterSource::StaticImage {
                image: SRTM_ELEVATION.to_string(),
                band: ELEVATION_BAND.to_string(),
            },
            location,
            window: ObservationWindow::fixed(date),
            scale_m: self.settings.elevation_scale_m,
        }
    }

    /// Extract all five features. Missing coverage yields `None` values;
    /// only provider failures return an error.
    pub async fn extract(&self, location: Coordinate, date: NaiveDate) -> AppResult<FeatureSet> {
        let vegetation = self
            .reducer
            .reduce_region(&self.vegetation_query(location, date))
            .await?;
        let climate = self
            .reducer
            .reduce_region(&self.climate_query(location, date))
            .await?;
        let terrain = self
            .reducer
            .reduce_region(&self.elevation_query(location, date))
            .await?;

        let mut features = FeatureSet::default();
        features.set(FeatureKey::Ndvi, band(&vegetation, NDVI_BAND));
        features.set(FeatureKey::Temperature, band(&climate, AIR_TEMPERATURE_BAND));
        features.set(FeatureKey::Humidity, band(&climate, SPECIFIC_HUMIDITY_BAND));
        features.set(FeatureKey::WindSpeed, band(&climate, WIND_SPEED_BAND));
        features.set(FeatureKey::Elevation, band(&terrain, ELEVATION_BAND));

        let missing = features.missing();
        if missing.is_empty() {
            tracing::info!(
                "Extracted all features at ({}, {}) for {}",
                location.latitude(),
                location.longitude(),
                date
            );
        } else {
            tracing::info!(
                "No coverage for {:?} at ({}, {}) for {}",
                missing,
                location.latitude(),
                location.longitude(),
                date
            );
        }

        Ok(features)
    }
}

fn band(values: &BandValues, name: &str) -> Option<rust_decimal::Decimal> {
    values.get(name).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::Mutex;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// Answers by source kind and records every query it receives
    struct CannedReducer {
        vegetation: BandValues,
        climate: BandValues,
        terrain: BandValues,
        fail: bool,
        seen: Mutex<Vec<RegionReduction>>,
    }

    impl CannedReducer {
        fn full() -> Self {
            Self {
                vegetation: [("NDVI".to_string(), Some(dec("0.41")))].into(),
                climate: [
                    ("Tair_f_inst".to_string(), Some(dec("291.2"))),
                    ("Qair_f_inst".to_string(), Some(dec("0.006"))),
                    ("Wind_f_inst".to_string(), Some(dec("3.8"))),
                ]
                .into(),
                terrain: [("elevation".to_string(), Some(dec("210")))].into(),
                fail: false,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[axum::async_trait]
    impl RegionReducer for CannedReducer {
        async fn reduce_region(&self, reduction: &RegionReduction) -> AppResult<BandValues> {
            self.seen.lock().unwrap().push(reduction.clone());
            if self.fail {
                return Err(AppError::EarthEngine("API returned 503".to_string()));
            }
            Ok(match reduction.source {
                RasterSource::NormalizedDifference { .. } => self.vegetation.clone(),
                RasterSource::CollectionBands { .. } => self.climate.clone(),
                RasterSource::StaticImage { .. } => self.terrain.clone(),
            })
        }
    }

    fn location() -> Coordinate {
        Coordinate::new(32.5, -97.1).unwrap()
    }

    fn march_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_extracts_all_features() {
        let extractor = FeatureExtractor::new(CannedReducer::full(), FeatureConfig::default());
        let features = extractor.extract(location(), march_first()).await.unwrap();

        assert_eq!(features.ndvi, Some(dec("0.41")));
        assert_eq!(features.temperature, Some(dec("291.2")));
        assert_eq!(features.humidity, Some(dec("0.006")));
        assert_eq!(features.wind_speed, Some(dec("3.8")));
        assert_eq!(features.elevation, Some(dec("210")));
    }

    #[tokio::test]
    async fn test_queries_use_source_specific_windows_and_scales() {
        let extractor = FeatureExtractor::new(CannedReducer::full(), FeatureConfig::default());
        extractor.extract(location(), march_first()).await.unwrap();

        let seen = extractor.reducer.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].window, ObservationWindow::days(march_first(), 2));
        assert_eq!(seen[0].scale_m, 30.0);
        assert_eq!(seen[1].window, ObservationWindow::days(march_first(), 1));
        assert_eq!(seen[1].scale_m, 1000.0);
        assert_eq!(seen[2].window, ObservationWindow::fixed(march_first()));
        assert_eq!(seen[2].scale_m, 30.0);
    }

    #[tokio::test]
    async fn test_no_coverage_is_null_not_error() {
        let mut reducer = CannedReducer::full();
        reducer.vegetation = BandValues::new();
        reducer.climate.insert("Wind_f_inst".to_string(), None);

        let extractor = FeatureExtractor::new(reducer, FeatureConfig::default());
        let features = extractor.extract(location(), march_first()).await.unwrap();

        assert_eq!(
            features.missing(),
            vec![FeatureKey::Ndvi, FeatureKey::WindSpeed]
        );
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let mut reducer = CannedReducer::full();
        reducer.fail = true;

        let extractor = FeatureExtractor::new(reducer, FeatureConfig::default());
        let err = extractor.extract(location(), march_first()).await.unwrap_err();
        assert!(err.is_transport_failure());
    }
}
