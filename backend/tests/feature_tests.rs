//! Feature extraction tests against an in-process Earth Engine stand-in
//!
//! Covers full coverage, missing coverage, provider failures and the
//! temperature overlay map registration.

mod common;

use axum::http::StatusCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use shared::{Coordinate, FeatureKey};
use std::str::FromStr;
use wildfire_risk_backend::{
    config::FeatureConfig, error::AppError, services::FeatureExtractor,
    services::TemperatureOverlayService,
};

use common::{earth_engine, healthy_google, texas_reduction, MockGoogle, PROJECT_ID};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn texas() -> Coordinate {
    Coordinate::new(32.5, -97.1).unwrap()
}

fn march_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

#[tokio::test]
async fn test_full_coverage_resolves_every_feature() {
    let mock = MockGoogle::start(healthy_google("Medium")).await;
    let extractor = FeatureExtractor::new(earth_engine(&mock), FeatureConfig::default());

    let features = extractor.extract(texas(), march_first()).await.unwrap();

    assert!(features.is_complete());
    assert_eq!(features.ndvi, Some(dec("0.41")));
    assert_eq!(features.temperature, Some(dec("291.2")));
    assert_eq!(features.humidity, Some(dec("0.006")));
    assert_eq!(features.wind_speed, Some(dec("3.8")));
    assert_eq!(features.elevation, Some(dec("210")));

    let calls = mock.calls_to("value:compute");
    assert_eq!(calls.len(), 3);
    assert!(calls
        .iter()
        .all(|c| c.path == format!("/projects/{}/value:compute", PROJECT_ID)));
}

#[tokio::test]
async fn test_reduction_requests_carry_point_and_scale() {
    let mock = MockGoogle::start(healthy_google("Medium")).await;
    let extractor = FeatureExtractor::new(earth_engine(&mock), FeatureConfig::default());

    extractor.extract(texas(), march_first()).await.unwrap();

    let calls = mock.calls_to("value:compute");
    let vegetation = &calls[0].body;
    assert!(vegetation.contains("COPERNICUS/S2_SR"));
    assert!(vegetation.contains("-97.1"));
    assert!(vegetation.contains("32.5"));
    assert!(vegetation.contains("2024-03-01"));
    assert!(vegetation.contains("2024-03-03"));

    let climate = &calls[1].body;
    assert!(climate.contains("Tair_f_inst"));
    assert!(climate.contains("2024-03-02"));

    assert!(calls[2].body.contains("USGS/SRTMGL1_003"));
    for call in &calls {
        assert!(call.json()["expression"]["result"].is_string());
    }
}

#[tokio::test]
async fn test_no_vegetation_coverage_is_null() {
    let mock = MockGoogle::start(|_path: &str, body: &str| {
        if body.contains("COPERNICUS/S2_SR") {
            (StatusCode::OK, json!({ "result": { "NDVI": null } }))
        } else {
            (StatusCode::OK, json!({ "result": texas_reduction(body) }))
        }
    })
    .await;
    let extractor = FeatureExtractor::new(earth_engine(&mock), FeatureConfig::default());

    let features = extractor.extract(texas(), march_first()).await.unwrap();

    assert_eq!(features.ndvi, None);
    assert_eq!(features.missing(), vec![FeatureKey::Ndvi]);
}

#[tokio::test]
async fn test_empty_dictionary_means_no_coverage() {
    let mock = MockGoogle::start(|_path: &str, _body: &str| {
        (StatusCode::OK, json!({ "result": {} }))
    })
    .await;
    let extractor = FeatureExtractor::new(earth_engine(&mock), FeatureConfig::default());

    let features = extractor.extract(texas(), march_first()).await.unwrap();

    assert_eq!(features.missing(), FeatureKey::ALL.to_vec());
}

#[tokio::test]
async fn test_provider_error_is_transport_failure() {
    let mock = MockGoogle::start(|_path: &str, _body: &str| {
        (
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "error": { "message": "Quota exceeded" } }),
        )
    })
    .await;
    let extractor = FeatureExtractor::new(earth_engine(&mock), FeatureConfig::default());

    let err = extractor.extract(texas(), march_first()).await.unwrap_err();

    assert!(matches!(err, AppError::EarthEngine(_)));
    assert!(err.is_transport_failure());
}

#[tokio::test]
async fn test_extraction_is_repeatable() {
    let mock = MockGoogle::start(healthy_google("Medium")).await;
    let extractor = FeatureExtractor::new(earth_engine(&mock), FeatureConfig::default());

    let first = extractor.extract(texas(), march_first()).await.unwrap();
    let second = extractor.extract(texas(), march_first()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(mock.calls_to("value:compute").len(), 6);
}

#[tokio::test]
async fn test_temperature_overlay_tile_template() {
    let mock = MockGoogle::start(healthy_google("Medium")).await;
    let overlay = TemperatureOverlayService::new(earth_engine(&mock));

    let layer = overlay.temperature_layer(march_first()).await.unwrap();

    assert_eq!(
        layer.url_template,
        format!(
            "{}/projects/{}/maps/abc123/tiles/{{z}}/{{x}}/{{y}}",
            mock.base_url, PROJECT_ID
        )
    );
    assert_eq!(layer.min, 250.0);
    assert_eq!(layer.max, 320.0);

    let calls = mock.calls_to("/maps");
    assert_eq!(calls.len(), 1);
    let body = calls[0].json();
    assert_eq!(body["bandIds"], json!(["Tair_f_inst"]));
    assert_eq!(
        body["visualizationOptions"]["paletteColors"],
        json!(["blue", "cyan", "green", "yellow", "orange", "red"])
    );
}
