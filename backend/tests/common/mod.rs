//! Shared fixtures for integration tests: an in-process stand-in for the
//! Google APIs and a ready-to-use application config.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    http::{StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};
use wildfire_risk_backend::{
    config::FeatureConfig,
    external::{build_http_client, EarthEngineClient, GoogleTokenProvider},
    Config,
};

pub const PROJECT_ID: &str = "wildfire-demo";
pub const JWT_SECRET: &str = "integration-test-secret";

/// One request received by the mock server
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub query: Option<String>,
    pub body: String,
}

impl RecordedCall {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

type Responder = Arc<dyn Fn(&str, &str) -> (StatusCode, Value) + Send + Sync>;

/// Running mock server
pub struct MockGoogle {
    pub base_url: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockGoogle {
    /// Serve every path with `responder(path, body)`
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&str, &str) -> (StatusCode, Value) + Send + Sync + 'static,
    {
        let responder: Responder = Arc::new(responder);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();

        let app = Router::new().fallback(move |uri: Uri, body: String| {
            let responder = responder.clone();
            let recorded = recorded.clone();
            async move {
                recorded.lock().unwrap().push(RecordedCall {
                    path: uri.path().to_string(),
                    query: uri.query().map(str::to_string),
                    body: body.clone(),
                });
                let (status, value) = responder(uri.path(), &body);
                (status, Json(value))
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            calls,
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, suffix: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.path.ends_with(suffix))
            .collect()
    }
}

/// Earth Engine reduction results for the Texas sample point
pub fn texas_reduction(body: &str) -> Value {
    if body.contains("COPERNICUS/S2_SR") {
        json!({ "NDVI": 0.41 })
    } else if body.contains("GLDAS") {
        json!({ "Tair_f_inst": 291.2, "Qair_f_inst": 0.006, "Wind_f_inst": 3.8 })
    } else if body.contains("SRTM") {
        json!({ "elevation": 210 })
    } else {
        Value::Null
    }
}

/// Google APIs answering like a healthy project:
/// reductions with full coverage, the given classifier label, a generated
/// report and successful uploads
pub fn healthy_google(
    label: &'static str,
) -> impl Fn(&str, &str) -> (StatusCode, Value) + Send + Sync + 'static {
    move |path: &str, body: &str| {
        if path.ends_with("value:compute") {
            (StatusCode::OK, json!({ "result": texas_reduction(body) }))
        } else if path.ends_with("/maps") {
            (
                StatusCode::OK,
                json!({ "name": format!("projects/{}/maps/abc123", PROJECT_ID) }),
            )
        } else if path.ends_with(":predict") {
            (
                StatusCode::OK,
                json!({ "predictions": [label], "deployedModelId": "42" }),
            )
        } else if path.ends_with(":generateContent") {
            (
                StatusCode::OK,
                json!({
                    "candidates": [{
                        "content": { "role": "model", "parts": [{ "text": "Sunny skies over Texas." }] }
                    }]
                }),
            )
        } else if path.contains("/upload/storage/v1/b/") {
            (
                StatusCode::OK,
                json!({ "bucket": "wildfire-reports", "name": "stored" }),
            )
        } else {
            (StatusCode::NOT_FOUND, json!({ "error": "unknown path" }))
        }
    }
}

pub fn tokens() -> GoogleTokenProvider {
    GoogleTokenProvider::with_static_token("test-token")
}

pub fn earth_engine(mock: &MockGoogle) -> EarthEngineClient {
    EarthEngineClient::new(
        build_http_client().unwrap(),
        tokens(),
        mock.base_url.clone(),
        PROJECT_ID.to_string(),
        std::time::Duration::from_secs(5),
    )
}

/// A port nothing listens on
pub async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Config with every Google API pointed at `base_url` and SMTP at `smtp_port`
pub fn test_config(base_url: &str, smtp_port: u16) -> Config {
    serde_json::from_value(json!({
        "environment": "test",
        "server": { "port": 0, "host": "127.0.0.1" },
        "jwt": { "secret": JWT_SECRET },
        "gcp": {
            "project_id": PROJECT_ID,
            "region": "us-central1",
            "credentials_file": null,
            "access_token": "test-token",
            "token_uri": format!("{}/token", base_url),
            "timeout_secs": 5
        },
        "earth_engine": { "base_url": base_url, "timeout_secs": 5 },
        "prediction": { "endpoint_id": "1234", "base_url": base_url, "timeout_secs": 5 },
        "generation": {
            "model": "gemini-1.5-flash-002",
            "temperature": 0.7,
            "base_url": base_url,
            "timeout_secs": 5
        },
        "storage": { "bucket": "wildfire-reports", "base_url": base_url, "timeout_secs": 5 },
        "email": {
            "smtp_host": "127.0.0.1",
            "smtp_port": smtp_port,
            "username": "reports@example.com",
            "password": "app-password",
            "from_address": "Wildfire Risk <reports@example.com>",
            "subject": "Your AI Weather Report",
            "timeout_secs": 2
        },
        "features": default_features()
    }))
    .unwrap()
}

fn default_features() -> Value {
    let f = FeatureConfig::default();
    json!({
        "reference_date": f.reference_date.to_string(),
        "vegetation_scale_m": f.vegetation_scale_m,
        "climate_scale_m": f.climate_scale_m,
        "elevation_scale_m": f.elevation_scale_m,
        "vegetation_window_days": f.vegetation_window_days,
        "climate_window_days": f.climate_window_days
    })
}

/// Session token for a test user
pub fn session_token(email: &str) -> String {
    wildfire_risk_backend::middleware::issue_session_token(
        "user-1",
        email,
        JWT_SECRET,
        chrono::Duration::hours(1),
    )
    .unwrap()
}

/// Application wired against `mock`, with SMTP pointed at a closed port
pub async fn test_app(mock: &MockGoogle) -> Router {
    let config = test_config(&mock.base_url, closed_port().await);
    let state = wildfire_risk_backend::AppState::from_config(config).unwrap();
    wildfire_risk_backend::create_app(state)
}

/// Send one request through the router and decode the JSON response
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
