//! Vertex AI `generateContent` client for free-text weather reports

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::google_auth::GoogleTokenProvider;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationParams,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationParams {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Client for a hosted generative model
#[derive(Clone)]
pub struct TextGenerationClient {
    http_client: Client,
    tokens: GoogleTokenProvider,
    base_url: String,
    model_path: String,
    timeout: Duration,
}

impl TextGenerationClient {
    pub fn new(
        http_client: Client,
        tokens: GoogleTokenProvider,
        base_url: String,
        project_id: &str,
        region: &str,
        model: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_path: format!(
                "projects/{}/locations/{}/publishers/google/models/{}",
                project_id, region, model
            ),
            timeout,
        }
    }

    /// Generate text for a prompt. An answer with no text is an error.
    pub async fn generate(&self, prompt: &str, temperature: f32) -> AppResult<String> {
        let url = format!("{}/v1/{}:generateContent", self.base_url, self.model_path);
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| AppError::TextGeneration(format!("Authentication failed: {}", e)))?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationParams { temperature },
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::TextGeneration(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::TextGeneration(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let data: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::TextGeneration(format!("Failed to parse response: {}", e)))?;

        let text = candidate_text(data);
        if text.trim().is_empty() {
            return Err(AppError::TextGeneration(
                "Model returned no content".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Concatenated text parts of the first candidate
fn candidate_text(response: GenerateContentResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}
