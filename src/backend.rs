use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Readiness report from the remote model service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    pub idea: String,
    pub recommended_components: Vec<String>,
    pub delivery: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentiment {
    pub sentiment: String,
}

/// Client for the opaque remote blueprint/health/inference service.
///
/// Plain request/response JSON over HTTP; every call is fallible I/O and
/// failures never touch run state.
pub struct BackendClient {
    http: Arc<reqwest::Client>,
    base_url: String,
}

impl BackendClient {
    pub fn new(http: Arc<reqwest::Client>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<ServiceHealth> {
        let url = format!("{}/health", self.base_url);
        self.http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("backend unreachable: {url}"))?
            .error_for_status()
            .context("backend health probe returned an error status")?
            .json()
            .await
            .context("failed to parse backend health response")
    }

    pub async fn blueprint(&self, idea: &str) -> Result<Blueprint> {
        let url = format!("{}/blueprint", self.base_url);
        self.http
            .post(&url)
            .json(&json!({ "idea": idea }))
            .send()
            .await
            .with_context(|| format!("backend unreachable: {url}"))?
            .error_for_status()
            .context("blueprint request returned an error status")?
            .json()
            .await
            .context("failed to parse blueprint response")
    }

    pub async fn sentiment(&self, text: &str) -> Result<Sentiment> {
        let url = format!("{}/predict_sentiment", self.base_url);
        self.http
            .post(&url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .with_context(|| format!("backend unreachable: {url}"))?
            .error_for_status()
            .context("sentiment request returned an error status")?
            .json()
            .await
            .context("failed to parse sentiment response")
    }
}
