//! Air temperature overlay for the map view

use chrono::NaiveDate;
use serde::Serialize;
use shared::ObservationWindow;

use crate::error::AppResult;
use crate::external::earth_engine::{MapRequest, GLDAS_NOAH_3H};
use crate::external::EarthEngineClient;

const AIR_TEMPERATURE_BAND: &str = "Tair_f_inst";

/// Contiguous United States, `[west, south, east, north]`
pub const CONUS_BOUNDS: [f64; 4] = [-125.0, 24.0, -66.5, 49.0];

/// Kelvin range stretched over the palette
pub const TEMPERATURE_MIN_K: f64 = 250.0;
pub const TEMPERATURE_MAX_K: f64 = 320.0;

pub const TEMPERATURE_PALETTE: [&str; 6] = ["blue", "cyan", "green", "yellow", "orange", "red"];

/// A raster tile layer ready for a web map
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub min: f64,
    pub max: f64,
    pub palette: Vec<String>,
}

#[derive(Clone)]
pub struct TemperatureOverlayService {
    earth_engine: EarthEngineClient,
}

impl TemperatureOverlayService {
    pub fn new(earth_engine: EarthEngineClient) -> Self {
        Self { earth_engine }
    }

    /// Map request for the first hour of `date`
    pub fn map_request(date: NaiveDate) -> MapRequest {
        MapRequest {
            collection: GLDAS_NOAH_3H.to_string(),
            band: AIR_TEMPERATURE_BAND.to_string(),
            window: ObservationWindow::hours(date, 1),
            bounds: CONUS_BOUNDS,
            min: TEMPERATURE_MIN_K,
            max: TEMPERATURE_MAX_K,
            palette: TEMPERATURE_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub async fn temperature_layer(&self, date: NaiveDate) -> AppResult<TileLayer> {
        let request = Self::map_request(date);
        let url_template = self.earth_engine.create_map(&request).await?;
        tracing::debug!("Temperature overlay for {}: {}", date, url_template);

        Ok(TileLayer {
            url_template,
            attribution: "GLDAS Tair".to_string(),
            min: request.min,
            max: request.max,
            palette: request.palette,
        })
    }
}
