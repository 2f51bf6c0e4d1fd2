//! API client for communicating with the classification API

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

/// Route prefix the server mounts its versioned API under
pub const API_PREFIX: &str = "api/v1";

/// A non-success response from the server
#[derive(Debug, Error)]
#[error("API error ({status}): {detail}")]
pub struct ApiError {
    pub status: u16,
    pub detail: String,
}

/// API client for the classification API
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(&format!("{}/{}", API_PREFIX, path))
            .context("Invalid path")
    }

    /// Make a GET request against a versioned route
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path)?)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(self.url(path)?)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.detail)
                .unwrap_or(body);
            return Err(ApiError {
                status: status.as_u16(),
                detail,
            }
            .into());
        }

        response.json().await.context("Failed to parse response")
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub models_loaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(rename = "type")]
    pub estimator: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_estimators: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: BTreeMap<String, String>,
    pub models: BTreeMap<String, ModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub created_utc: String,
    pub dataset: String,
    pub task: String,
    pub n_samples: BTreeMap<String, u64>,
    pub n_features: usize,
    pub models: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopFeature {
    pub feature: String,
    pub value: f64,
    pub importance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionOutput {
    pub predicted_class: u8,
    pub predicted_label: String,
    pub probability_false_positive: f64,
    pub probability_confirmed: f64,
    pub confidence: f64,
    pub model_used: String,
    pub top_features: Vec<TopFeature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetResponse {
    pub page: usize,
    pub page_size: usize,
    pub total_records: usize,
    pub total_pages: usize,
    pub data: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_parses_success_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/health")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"ok","version":"1.0.0","models_loaded":true}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let health: HealthResponse = client.get("health").await.unwrap();

        assert_eq!(health.status, "ok");
        assert!(health.models_loaded);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_surfaces_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/predict")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"Unknown model type: xgboost"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .post::<PredictionOutput, _>("predict", &json!({"model_type": "xgboost"}))
            .await
            .unwrap_err();

        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_err.status, 400);
        assert_eq!(api_err.detail, "Unknown model type: xgboost");
    }

    #[tokio::test]
    async fn test_error_without_detail_keeps_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/stats")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.get::<StatsResponse>("stats").await.unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_err.status, 502);
        assert_eq!(api_err.detail, "Bad Gateway");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }

    #[test]
    fn test_model_info_type_field() {
        let info: ModelInfo = serde_json::from_value(json!({
            "type": "LGBMClassifier",
            "status": "loaded",
            "sha256": "ab",
            "n_estimators": 500
        }))
        .unwrap();
        assert_eq!(info.estimator, "LGBMClassifier");
        assert_eq!(info.n_estimators, Some(500));
    }
}
