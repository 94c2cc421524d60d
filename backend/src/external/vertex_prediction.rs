//! Vertex AI prediction client for the hosted wildfire risk classifier

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{CompleteFeatureSet, PredictionInstance, PredictionResult};

use super::google_auth::GoogleTokenProvider;
use crate::error::{AppError, AppResult};

/// Fully qualified endpoint identity; fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRef {
    pub project_id: String,
    pub region: String,
    pub endpoint_id: String,
}

impl EndpointRef {
    pub fn path(&self) -> String {
        format!(
            "projects/{}/locations/{}/endpoints/{}",
            self.project_id, self.region, self.endpoint_id
        )
    }
}

/// Request body of `endpoints.predict`
#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [&'a PredictionInstance; 1],
    parameters: Value,
}

/// Response body of `endpoints.predict`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Value>,
    #[serde(default)]
    deployed_model_id: Option<String>,
}

/// Client for the hosted tabular classifier
#[derive(Clone)]
pub struct PredictionClient {
    http_client: Client,
    tokens: GoogleTokenProvider,
    base_url: String,
    endpoint: EndpointRef,
    timeout: Duration,
}

impl PredictionClient {
    pub fn new(
        http_client: Client,
        tokens: GoogleTokenProvider,
        base_url: String,
        endpoint: EndpointRef,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint,
            timeout,
        }
    }

    /// Classify a complete feature set for a date. Returns the instance as
    /// submitted together with the normalized answer.
    pub async fn predict(
        &self,
        features: &CompleteFeatureSet,
        date: NaiveDate,
    ) -> AppResult<(PredictionInstance, PredictionResult)> {
        let instance = PredictionInstance::new(features, date);
        let result = self.predict_instance(&instance).await?;
        Ok((instance, result))
    }

    /// Submit one pre-built instance.
    ///
    /// An empty prediction list is not an error and yields
    /// [`PredictionResult::absent`]; transport, auth and HTTP failures are
    /// [`AppError::PredictionService`].
    pub async fn predict_instance(&self, instance: &PredictionInstance) -> AppResult<PredictionResult> {
        let url = format!("{}/v1/{}:predict", self.base_url, self.endpoint.path());
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| AppError::PredictionService(format!("Authentication failed: {}", e)))?;

        tracing::debug!("Submitting prediction instance to {}", self.endpoint.path());

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&PredictRequest {
                instances: [instance],
                parameters: Value::Object(Default::default()),
            })
            .send()
            .await
            .map_err(|e| AppError::PredictionService(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::PredictionService(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let data: PredictResponse = response
            .json()
            .await
            .map_err(|e| AppError::PredictionService(format!("Failed to parse response: {}", e)))?;

        if let Some(model) = &data.deployed_model_id {
            tracing::debug!("Prediction served by deployed model {}", model);
        }

        Ok(match data.predictions.first() {
            Some(prediction) => PredictionResult::from_label(prediction_label(prediction)),
            None => PredictionResult::absent(),
        })
    }
}

/// Label of one prediction entry.
///
/// Plain strings are labels as-is. AutoML classification objects
/// (`{"classes": [...], "scores": [...]}`) resolve to the top-scoring class.
pub fn prediction_label(prediction: &Value) -> String {
    match prediction {
        Value::String(label) => label.clone(),
        Value::Object(map) => {
            let classes = map.get("classes").and_then(Value::as_array);
            let scores = map.get("scores").and_then(Value::as_array);
            match (classes, scores) {
                (Some(classes), Some(scores)) => classes
                    .iter()
                    .zip(scores.iter().map(|s| s.as_f64().unwrap_or(f64::MIN)))
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .and_then(|(class, _)| class.as_str())
                    .unwrap_or_default()
                    .to_string(),
                _ => prediction.to_string(),
            }
        }
        other => other.to_string(),
    }
}
