//! Business logic services for the Wildfire Risk service

pub mod features;
pub mod prediction;
pub mod report;
pub mod temperature_map;

pub use features::FeatureExtractor;
pub use prediction::RiskService;
pub use report::{ReportDispatcher, WeatherReportService};
pub use temperature_map::TemperatureOverlayService;
