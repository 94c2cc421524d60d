//! Earth Engine REST client
//!
//! Builds Earth Engine expression graphs for point reductions and map tiles
//! and evaluates them through `value:compute` / `maps`.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{Coordinate, ObservationWindow};

use super::google_auth::GoogleTokenProvider;
use crate::error::{AppError, AppResult};

/// Sentinel-2 surface reflectance archive
pub const SENTINEL2_SR: &str = "COPERNICUS/S2_SR";
/// GLDAS 2.1 Noah land surface model, 3-hourly
pub const GLDAS_NOAH_3H: &str = "NASA/GLDAS/V021/NOAH/G025/T3H";
/// SRTM 1 arc-second digital elevation model
pub const SRTM_ELEVATION: &str = "USGS/SRTMGL1_003";

const TIME_START_PROPERTY: &str = "system:time_start";
const MAPPING_VAR: &str = "_MAPPING_VAR_0_0";

// ============================================================================
// Expression graph
// ============================================================================

/// One node of an Earth Engine expression graph
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ValueNode {
    ConstantValue(Value),
    ValueReference(String),
    ArgumentReference(String),
    FunctionInvocationValue(FunctionInvocation),
    FunctionDefinitionValue(FunctionDefinition),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInvocation {
    pub function_name: String,
    pub arguments: BTreeMap<String, ValueNode>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    pub argument_names: Vec<String>,
    /// Id of the body node in the enclosing expression's `values`
    pub body: String,
}

/// A complete expression: a table of nodes plus the id of the result node
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Expression {
    pub values: BTreeMap<String, ValueNode>,
    pub result: String,
}

fn constant(value: impl Into<Value>) -> ValueNode {
    ValueNode::ConstantValue(value.into())
}

fn invoke<const N: usize>(function_name: &str, arguments: [(&str, ValueNode); N]) -> ValueNode {
    ValueNode::FunctionInvocationValue(FunctionInvocation {
        function_name: function_name.to_string(),
        arguments: arguments
            .into_iter()
            .map(|(name, node)| (name.to_string(), node))
            .collect(),
    })
}

/// Accumulates named nodes for an [`Expression`]
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    values: BTreeMap<String, ValueNode>,
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its id
    pub fn define(&mut self, node: ValueNode) -> String {
        let id = self.values.len().to_string();
        self.values.insert(id.clone(), node);
        id
    }

    /// `ImageCollection.map` with a single-argument body built by `body`
    pub fn map_collection(
        &mut self,
        collection: ValueNode,
        body: impl FnOnce(ValueNode) -> ValueNode,
    ) -> ValueNode {
        let body_id = self.define(body(ValueNode::ArgumentReference(MAPPING_VAR.to_string())));
        invoke(
            "Collection.map",
            [
                ("collection", collection),
                (
                    "baseAlgorithm",
                    ValueNode::FunctionDefinitionValue(FunctionDefinition {
                        argument_names: vec![MAPPING_VAR.to_string()],
                        body: body_id,
                    }),
                ),
            ],
        )
    }

    pub fn finish(mut self, result: ValueNode) -> Expression {
        let result = self.define(result);
        Expression {
            values: self.values,
            result,
        }
    }
}

fn point(coordinate: &Coordinate) -> ValueNode {
    invoke(
        "GeometryConstructors.Point",
        [("coordinates", constant(json!(coordinate.lon_lat())))],
    )
}

/// Axis-aligned rectangle `[west, south, east, north]`
fn rectangle(bounds: [f64; 4]) -> ValueNode {
    let [west, south, east, north] = bounds;
    invoke(
        "GeometryConstructors.Rectangle",
        [(
            "coordinates",
            constant(json!([[west, south], [east, north]])),
        )],
    )
}

fn load_collection(id: &str) -> ValueNode {
    invoke("ImageCollection.load", [("id", constant(id))])
}

fn load_image(id: &str) -> ValueNode {
    invoke("Image.load", [("id", constant(id))])
}

fn filter_bounds(collection: ValueNode, geometry: ValueNode) -> ValueNode {
    invoke(
        "Collection.filter",
        [
            ("collection", collection),
            (
                "filter",
                invoke(
                    "Filter.intersects",
                    [("leftField", constant(".all")), ("rightValue", geometry)],
                ),
            ),
        ],
    )
}

/// Filter to the window; static windows leave the collection untouched
fn filter_window(collection: ValueNode, window: &ObservationWindow) -> ValueNode {
    let Some((start, end)) = window.bounds() else {
        return collection;
    };
    let date = |at: chrono::NaiveDateTime| {
        invoke(
            "Date",
            [("value", constant(at.format("%Y-%m-%dT%H:%M:%S").to_string()))],
        )
    };
    invoke(
        "Collection.filter",
        [
            ("collection", collection),
            (
                "filter",
                invoke(
                    "Filter.dateRangeContains",
                    [
                        (
                            "leftValue",
                            invoke("DateRange", [("start", date(start)), ("end", date(end))]),
                        ),
                        ("rightField", constant(TIME_START_PROPERTY)),
                    ],
                ),
            ),
        ],
    )
}

fn select_bands(image: ValueNode, bands: &[String]) -> ValueNode {
    invoke(
        "Image.select",
        [("input", image), ("bandSelectors", constant(json!(bands)))],
    )
}

fn temporal_mean(collection: ValueNode) -> ValueNode {
    invoke("reduce.mean", [("collection", collection)])
}

fn reduce_region_mean(image: ValueNode, geometry: ValueNode, scale_m: f64) -> ValueNode {
    invoke(
        "Image.reduceRegion",
        [
            ("image", image),
            ("reducer", invoke("Reducer.mean", [])),
            ("geometry", geometry),
            ("scale", constant(scale_m)),
        ],
    )
}

// ============================================================================
// Region reductions
// ============================================================================

/// What to reduce at a point
#[derive(Debug, Clone, PartialEq)]
pub enum RasterSource {
    /// Per-image normalized difference `(a - b) / (a + b)`, renamed to `output`
    NormalizedDifference {
        collection: String,
        band_a: String,
        band_b: String,
        output: String,
    },
    /// Selected bands of an image collection
    CollectionBands {
        collection: String,
        bands: Vec<String>,
    },
    /// A single static image
    StaticImage { image: String, band: String },
}

/// Mean of a source over a window, reduced over `scale_m` around a point
#[derive(Debug, Clone, PartialEq)]
pub struct RegionReduction {
    pub source: RasterSource,
    pub location: Coordinate,
    pub window: ObservationWindow,
    pub scale_m: f64,
}

impl RegionReduction {
    pub fn to_expression(&self) -> Expression {
        let mut builder = ExpressionBuilder::new();
        let geometry = point(&self.location);

        let image = match &self.source {
            RasterSource::NormalizedDifference {
                collection,
                band_a,
                band_b,
                output,
            } => {
                let filtered = filter_window(
                    filter_bounds(load_collection(collection), geometry.clone()),
                    &self.window,
                );
                let band_names = json!([band_a, band_b]);
                let output = json!([output]);
                let mapped = builder.map_collection(filtered, |img| {
                    invoke(
                        "Image.rename",
                        [
                            (
                                "input",
                                invoke(
                                    "Image.normalizedDifference",
                                    [("input", img), ("bandNames", constant(band_names))],
                                ),
                            ),
                            ("names", constant(output)),
                        ],
                    )
                });
                temporal_mean(mapped)
            }
            RasterSource::CollectionBands { collection, bands } => {
                let filtered = filter_window(
                    filter_bounds(load_collection(collection), geometry.clone()),
                    &self.window,
                );
                let selected = builder.map_collection(filtered, |img| select_bands(img, bands));
                temporal_mean(selected)
            }
            RasterSource::StaticImage { image, band } => {
                select_bands(load_image(image), std::slice::from_ref(band))
            }
        };

        builder.finish(reduce_region_mean(image, geometry, self.scale_m))
    }
}

/// Band values of a reduction; `None` marks a band with no coverage
pub type BandValues = HashMap<String, Option<Decimal>>;

/// Something that can reduce rasters at a point
#[axum::async_trait]
pub trait RegionReducer: Send + Sync {
    async fn reduce_region(&self, reduction: &RegionReduction) -> AppResult<BandValues>;
}

/// Convert a `value:compute` result dictionary into band values.
/// `null` entries and non-numeric values are treated as no coverage.
/// A number a decimal cannot hold is bad data, not a transport failure.
pub fn parse_band_values(result: &Value) -> AppResult<BandValues> {
    let object = match result {
        Value::Object(map) => map,
        Value::Null => return Ok(BandValues::new()),
        other => {
            return Err(AppError::ProviderData(format!(
                "Expected a dictionary result, got {}",
                other
            )))
        }
    };

    object
        .iter()
        .map(|(band, value)| -> AppResult<(String, Option<Decimal>)> {
            let parsed = match value.as_f64() {
                Some(v) if v.is_finite() => Some(band_decimal(band, v)?),
                _ => None,
            };
            Ok((band.clone(), parsed))
        })
        .collect()
}

fn band_decimal(band: &str, value: f64) -> AppResult<Decimal> {
    let out_of_range = || {
        AppError::ProviderData(format!(
            "Band {} value {} is outside the decimal range",
            band, value
        ))
    };
    let decimal = Decimal::from_str(&value.to_string()).map_err(|_| out_of_range())?;
    // Magnitudes below the smallest decimal step round to zero
    if decimal.is_zero() && value != 0.0 {
        return Err(out_of_range());
    }
    Ok(decimal)
}

// ============================================================================
// Map tiles
// ============================================================================

/// Visualization of a single-band map layer
#[derive(Debug, Clone, PartialEq)]
pub struct MapRequest {
    pub collection: String,
    pub band: String,
    pub window: ObservationWindow,
    /// `[west, south, east, north]`
    pub bounds: [f64; 4],
    pub min: f64,
    pub max: f64,
    pub palette: Vec<String>,
}

impl MapRequest {
    pub fn to_expression(&self) -> Expression {
        let mut builder = ExpressionBuilder::new();
        let filtered = filter_window(
            filter_bounds(load_collection(&self.collection), rectangle(self.bounds)),
            &self.window,
        );
        let band = [self.band.clone()];
        let selected = builder.map_collection(filtered, |img| select_bands(img, &band));
        builder.finish(temporal_mean(selected))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComputeValueRequest<'a> {
    expression: &'a Expression,
}

#[derive(Debug, Deserialize)]
struct ComputeValueResponse {
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateMapRequest<'a> {
    expression: &'a Expression,
    file_format: &'static str,
    band_ids: Vec<String>,
    visualization_options: VisualizationOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VisualizationOptions {
    ranges: Vec<ValueRange>,
    palette_colors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ValueRange {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct CreateMapResponse {
    name: String,
}

// ============================================================================
// Client
// ============================================================================

/// Earth Engine REST client
#[derive(Clone)]
pub struct EarthEngineClient {
    http_client: Client,
    tokens: GoogleTokenProvider,
    base_url: String,
    project_id: String,
    timeout: Duration,
}

impl EarthEngineClient {
    pub fn new(
        http_client: Client,
        tokens: GoogleTokenProvider,
        base_url: String,
        project_id: String,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            timeout,
        }
    }

    /// Evaluate an expression and return its JSON result
    pub async fn compute_value(&self, expression: &Expression) -> AppResult<Value> {
        let url = format!("{}/projects/{}/value:compute", self.base_url, self.project_id);
        let token = self.tokens.access_token().await?;

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&ComputeValueRequest { expression })
            .send()
            .await
            .map_err(|e| AppError::EarthEngine(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EarthEngine(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let data: ComputeValueResponse = response
            .json()
            .await
            .map_err(|e| AppError::EarthEngine(format!("Failed to parse response: {}", e)))?;

        Ok(data.result)
    }

    /// Register a map and return its tile URL template (`{z}/{x}/{y}`)
    pub async fn create_map(&self, request: &MapRequest) -> AppResult<String> {
        let url = format!("{}/projects/{}/maps", self.base_url, self.project_id);
        let token = self.tokens.access_token().await?;
        let expression = request.to_expression();

        let body = CreateMapRequest {
            expression: &expression,
            file_format: "AUTO_JPEG_PNG",
            band_ids: vec![request.band.clone()],
            visualization_options: VisualizationOptions {
                ranges: vec![ValueRange {
                    min: request.min,
                    max: request.max,
                }],
                palette_colors: request.palette.clone(),
            },
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::EarthEngine(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EarthEngine(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let map: CreateMapResponse = response
            .json()
            .await
            .map_err(|e| AppError::EarthEngine(format!("Failed to parse map response: {}", e)))?;

        Ok(format!("{}/{}/tiles/{{z}}/{{x}}/{{y}}", self.base_url, map.name))
    }
}

#[axum::async_trait]
impl RegionReducer for EarthEngineClient {
    async fn reduce_region(&self, reduction: &RegionReduction) -> AppResult<BandValues> {
        tracing::debug!(
            "Reducing {:?} at ({}, {}) over {} m",
            reduction.source,
            reduction.location.latitude(),
            reduction.location.longitude(),
            reduction.scale_m
        );
        let result = self.compute_value(&reduction.to_expression()).await?;
        parse_band_values(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn location() -> Coordinate {
        Coordinate::new(32.5, -97.1).unwrap()
    }

    fn march_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_value_node_wire_shape() {
        let node = invoke("Image.load", [("id", constant(SRTM_ELEVATION))]);
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "functionInvocationValue": {
                    "functionName": "Image.load",
                    "arguments": {"id": {"constantValue": "USGS/SRTMGL1_003"}}
                }
            })
        );
    }

    #[test]
    fn test_ndvi_expression_maps_over_images() {
        let reduction = RegionReduction {
            source: RasterSource::NormalizedDifference {
                collection: SENTINEL2_SR.to_string(),
                band_a: "B8".to_string(),
                band_b: "B4".to_string(),
                output: "NDVI".to_string(),
            },
            location: location(),
            window: ObservationWindow::days(march_first(), 2),
            scale_m: 30.0,
        };
        let expression = reduction.to_expression();

        // mapping body + result
        assert_eq!(expression.values.len(), 2);
        assert_eq!(expression.result, "1");

        let json = serde_json::to_string(&expression).unwrap();
        assert!(json.contains("Image.normalizedDifference"));
        assert!(json.contains("\"2024-03-03T00:00:00\""));
        assert!(json.contains("[-97.1,32.5]"));
        assert!(json.contains(MAPPING_VAR));
    }

    #[test]
    fn test_static_image_has_no_date_filter() {
        let reduction = RegionReduction {
            source: RasterSource::StaticImage {
                image: SRTM_ELEVATION.to_string(),
                band: "elevation".to_string(),
            },
            location: location(),
            window: ObservationWindow::fixed(march_first()),
            scale_m: 30.0,
        };
        let json = serde_json::to_string(&reduction.to_expression()).unwrap();
        assert!(!json.contains("dateRangeContains"));
        assert!(json.contains("Image.reduceRegion"));
    }

    #[test]
    fn test_parse_band_values() {
        let values = parse_band_values(&json!({
            "Tair_f_inst": 291.2,
            "Qair_f_inst": 0.006,
            "Wind_f_inst": null,
        }))
        .unwrap();

        assert_eq!(values["Tair_f_inst"], Some(Decimal::from_str("291.2").unwrap()));
        assert_eq!(values["Qair_f_inst"], Some(Decimal::from_str("0.006").unwrap()));
        assert_eq!(values["Wind_f_inst"], None);

        assert!(parse_band_values(&Value::Null).unwrap().is_empty());
        assert!(parse_band_values(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_integral_elevation_has_no_fraction() {
        let values = parse_band_values(&json!({"elevation": 210.0})).unwrap();
        assert_eq!(values["elevation"].unwrap().to_string(), "210");
    }

    #[test]
    fn test_unrepresentable_band_value_is_bad_data() {
        let err = parse_band_values(&json!({"x": 1e29})).unwrap_err();
        assert!(matches!(err, AppError::ProviderData(_)));
        assert!(!err.is_transport_failure());

        let err = parse_band_values(&json!({"Qair_f_inst": 1e-30})).unwrap_err();
        assert!(matches!(err, AppError::ProviderData(_)));

        let values = parse_band_values(&json!({"Qair_f_inst": 0.0})).unwrap();
        assert_eq!(values["Qair_f_inst"], Some(Decimal::ZERO));
    }
}
