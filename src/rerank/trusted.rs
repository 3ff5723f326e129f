//! Hosted reference reranker (Pinecone inference API)
//!
//! Constructed once per run and passed to whoever needs a baseline.

use anyhow::{Context, Result};
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{RankedResult, Ranking, Reranker};
use crate::config::{TrustedSection, ENV_TRUSTED_API_KEY};

pub struct TrustedProvider {
    endpoint: String,
    model: String,
    api_key: String,
    api_version: String,
    http: HttpClient,
}

impl TrustedProvider {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: &str,
        api_version: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            api_version: api_version.to_string(),
            http,
        })
    }

    /// Build from config; fails when no credential was provided
    pub fn from_config(config: &TrustedSection) -> Result<Self> {
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "{} not set: cannot call the trusted reranker",
                ENV_TRUSTED_API_KEY
            )
        })?;

        Self::new(
            &config.endpoint,
            &config.model,
            api_key,
            &config.api_version,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Reranker for TrustedProvider {
    fn name(&self) -> &str {
        &self.model
    }

    fn rerank(&self, query: &str, documents: &[String]) -> Result<Ranking> {
        let request = TrustedRequest {
            model: &self.model,
            query,
            documents: documents.iter().map(|text| TextDocument { text }).collect(),
            top_n: documents.len(),
            return_documents: false,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
            .json(&request)
            .send()
            .with_context(|| format!("Failed to reach trusted reranker at {}", self.endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("Trusted rerank failed ({}): {}", status, body);
        }

        let parsed = response
            .json::<TrustedResponse>()
            .context("Failed to parse trusted rerank response")?;

        let results = parsed
            .data
            .into_iter()
            .map(|item| RankedResult {
                index: item.index,
                score: item.score,
            })
            .collect();

        Ranking::from_scored(results, documents.len())
            .with_context(|| format!("Invalid ranking from {}", self.model))
    }
}

#[derive(Debug, Serialize)]
struct TrustedRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: Vec<TextDocument<'a>>,
    top_n: usize,
    return_documents: bool,
}

#[derive(Debug, Serialize)]
struct TextDocument<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TrustedResponse {
    data: Vec<TrustedItem>,
}

#[derive(Debug, Deserialize)]
struct TrustedItem {
    index: usize,
    #[serde(alias = "relevanceScore")]
    score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_is_error() {
        let config = TrustedSection::default();
        let err = TrustedProvider::from_config(&config).err().unwrap();
        assert!(err.to_string().contains(ENV_TRUSTED_API_KEY));
    }

    #[test]
    fn test_with_credential() {
        let config = TrustedSection {
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        let provider = TrustedProvider::from_config(&config).unwrap();
        assert_eq!(provider.model(), "bge-reranker-v2-m3");
        assert_eq!(provider.name(), "bge-reranker-v2-m3");
    }

    #[test]
    fn test_request_asks_for_every_document() {
        let documents = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let request = TrustedRequest {
            model: "bge-reranker-v2-m3",
            query: "q",
            documents: documents.iter().map(|text| TextDocument { text }).collect(),
            top_n: documents.len(),
            return_documents: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["top_n"], 3);
        assert_eq!(json["documents"][2]["text"], "three");
        assert_eq!(json["return_documents"], false);
    }

    #[test]
    fn test_response_accepts_sdk_field_name() {
        let parsed: TrustedResponse = serde_json::from_str(
            r#"{"data":[{"index":1,"relevanceScore":0.8},{"index":0,"score":0.2}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.data[0].index, 1);
        assert!((parsed.data[1].score - 0.2).abs() < 1e-12);
    }
}
