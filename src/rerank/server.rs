//! HTTP client for the self-hosted inference server

use anyhow::{Context, Result};
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::{CandidateModel, RankedResult, Ranking, Reranker};

/// Inference server client
pub struct EmbedServer {
    base_url: String,
    http: HttpClient,
    warmup_http: HttpClient,
}

impl EmbedServer {
    /// Create a client for the given address (host:port or full URL).
    ///
    /// `timeout` bounds each /health and /rerank call; `warmup_timeout` bounds /warmup.
    pub fn new(address: &str, timeout: Duration, warmup_timeout: Duration) -> Result<Self> {
        let base_url = normalize_url(address);

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        let warmup_http = HttpClient::builder()
            .timeout(warmup_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url,
            http,
            warmup_http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Liveness probe
    pub fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .with_context(|| {
                format!("Failed to connect to inference server at {}", self.base_url)
            })?;

        if !response.status().is_success() {
            anyhow::bail!("Inference server returned status: {}", response.status());
        }

        response
            .json::<HealthResponse>()
            .context("Failed to parse health response")
    }

    /// Loaded/supported model listing (not every server exposes it)
    pub fn models(&self) -> Result<serde_json::Value> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .with_context(|| {
                format!("Failed to connect to inference server at {}", self.base_url)
            })?;

        if !response.status().is_success() {
            anyhow::bail!("Model listing returned status: {}", response.status());
        }

        response
            .json::<serde_json::Value>()
            .context("Failed to parse model listing")
    }

    /// Pre-load models so the first timed call does not pay load cost
    pub fn warmup(&self, models: &[CandidateModel]) -> Result<Vec<WarmupOutcome>> {
        let url = format!("{}/warmup", self.base_url);
        let request = WarmupRequest {
            rerankers: models.iter().map(WarmupModel::from).collect(),
        };

        let response = self
            .warmup_http
            .post(&url)
            .json(&request)
            .send()
            .with_context(|| format!("Failed to send warmup request to {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("Warmup failed ({}): {}", status, body);
        }

        let entries = response
            .json::<HashMap<String, WarmupEntry>>()
            .context("Failed to parse warmup response")?;

        Ok(models
            .iter()
            .map(|model| {
                let key = format!("{}:{}", model.method, model.model);
                match entries.get(&key) {
                    Some(entry) => WarmupOutcome {
                        name: model.name.clone(),
                        success: entry.success,
                        load_time_ms: entry.load_time_ms,
                        error: entry.error.clone(),
                    },
                    None => WarmupOutcome {
                        name: model.name.clone(),
                        success: false,
                        load_time_ms: None,
                        error: Some(format!("server did not report {}", key)),
                    },
                }
            })
            .collect())
    }

    /// Rerank `documents` for `query` with a candidate model
    pub fn rerank(
        &self,
        model: &CandidateModel,
        query: &str,
        documents: &[String],
    ) -> Result<Ranking> {
        let url = format!("{}/rerank", self.base_url);
        let request = RerankRequest {
            method: &model.method,
            model: &model.model,
            query,
            documents,
            trust_remote_code: model.trust_remote_code,
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .with_context(|| format!("Failed to send rerank request to {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("Rerank with {} failed ({}): {}", model.model, status, body);
        }

        let parsed = response
            .json::<RerankResponse>()
            .context("Failed to parse rerank response")?;

        Ranking::from_scored(parsed.results, documents.len())
            .with_context(|| format!("Invalid ranking from {}", model.model))
    }
}

/// A candidate model bound to the server that hosts it
pub struct CandidateReranker<'a> {
    server: &'a EmbedServer,
    model: &'a CandidateModel,
}

impl<'a> CandidateReranker<'a> {
    pub fn new(server: &'a EmbedServer, model: &'a CandidateModel) -> Self {
        Self { server, model }
    }
}

impl Reranker for CandidateReranker<'_> {
    fn name(&self) -> &str {
        &self.model.name
    }

    fn rerank(&self, query: &str, documents: &[String]) -> Result<Ranking> {
        self.server.rerank(self.model, query, documents)
    }
}

fn normalize_url(address: &str) -> String {
    let trimmed = address.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// Health check response
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Server-specific fields (loaded models, service name, ...)
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// Per-model warmup result
#[derive(Debug, Clone, Serialize)]
pub struct WarmupOutcome {
    pub name: String,
    pub success: bool,
    pub load_time_ms: Option<f64>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    method: &'a str,
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    trust_remote_code: bool,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    /// Server-side `latency_ms` is ignored; latency is timed client-side
    results: Vec<RankedResult>,
}

#[derive(Debug, Serialize)]
struct WarmupRequest<'a> {
    rerankers: Vec<WarmupModel<'a>>,
}

#[derive(Debug, Serialize)]
struct WarmupModel<'a> {
    method: &'a str,
    model: &'a str,
    trust_remote_code: bool,
}

impl<'a> From<&'a CandidateModel> for WarmupModel<'a> {
    fn from(model: &'a CandidateModel) -> Self {
        Self {
            method: &model.method,
            model: &model.model,
            trust_remote_code: model.trust_remote_code,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WarmupEntry {
    success: bool,
    #[serde(default)]
    load_time_ms: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}
