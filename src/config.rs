//! Benchmark configuration
//!
//! Handles `rerank-bench.toml` plus environment overrides.
//! Every section is optional with defaults, so an absent file is a valid config.
//!
//! Precedence: CLI flag > environment > config file > default.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;
use crate::rerank::CandidateModel;

/// Environment variable overriding the inference server URL
pub const ENV_EMBED_SERVER: &str = "EMBED_SERVER_URL";

/// Environment variable holding the trusted provider credential
pub const ENV_TRUSTED_API_KEY: &str = "PINECONE_API_KEY";

// =============================================================================
// Config Types
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub trusted: TrustedSection,
    #[serde(default)]
    pub bench: BenchSection,
    /// Candidate rerankers; empty means the built-in list
    #[serde(default)]
    pub candidates: Vec<CandidateModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Base URL of the self-hosted inference server
    #[serde(default = "default_server_url")]
    pub url: String,
    /// Deadline for a single /rerank call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Deadline for /warmup, which may load several models
    #[serde(default = "default_warmup_timeout_secs")]
    pub warmup_timeout_secs: u64,
}

fn default_server_url() -> String {
    "http://localhost:5555".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_warmup_timeout_secs() -> u64 {
    600
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_secs: default_timeout_secs(),
            warmup_timeout_secs: default_warmup_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedSection {
    /// Hosted rerank endpoint
    #[serde(default = "default_trusted_endpoint")]
    pub endpoint: String,
    /// Fixed, versioned reference model
    #[serde(default = "default_trusted_model")]
    pub model: String,
    /// API version header sent with every call
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_trusted_timeout_secs")]
    pub timeout_secs: u64,
    /// Credential, only ever read from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_trusted_endpoint() -> String {
    "https://api.pinecone.io/rerank".to_string()
}
fn default_trusted_model() -> String {
    "bge-reranker-v2-m3".to_string()
}
fn default_api_version() -> String {
    "2025-04".to_string()
}
fn default_trusted_timeout_secs() -> u64 {
    30
}

impl Default for TrustedSection {
    fn default() -> Self {
        Self {
            endpoint: default_trusted_endpoint(),
            model: default_trusted_model(),
            api_version: default_api_version(),
            timeout_secs: default_trusted_timeout_secs(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchSection {
    /// Timed passes over the query set per model
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_recall_k")]
    pub recall_k: usize,
    #[serde(default = "default_ndcg_k")]
    pub ndcg_k: usize,
    /// Baseline cache location, relative to the working directory
    #[serde(default = "paths::default_cache_path")]
    pub cache_path: PathBuf,
}

fn default_iterations() -> usize {
    3
}
fn default_recall_k() -> usize {
    3
}
fn default_ndcg_k() -> usize {
    10
}

impl Default for BenchSection {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            recall_k: default_recall_k(),
            ndcg_k: default_ndcg_k(),
            cache_path: paths::default_cache_path(),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl BenchConfig {
    /// Load config from an explicit path (must exist) or from
    /// `rerank-bench.toml` in the working directory (optional),
    /// then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = paths::config_path(Path::new("."));
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides through `lookup` (injectable for tests)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_EMBED_SERVER).filter(|u| !u.trim().is_empty()) {
            self.server.url = url;
        }
        self.trusted.api_key = lookup(ENV_TRUSTED_API_KEY).filter(|k| !k.trim().is_empty());
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.url.trim().is_empty() {
            bail!("server.url must not be empty");
        }
        if self.bench.iterations == 0 {
            bail!("bench.iterations must be at least 1");
        }
        if self.bench.recall_k == 0 || self.bench.ndcg_k == 0 {
            bail!("bench.recall_k and bench.ndcg_k must be at least 1");
        }
        if self.server.timeout_secs == 0 || self.trusted.timeout_secs == 0 {
            bail!("timeouts must be at least 1 second");
        }
        for candidate in &self.candidates {
            if candidate.name.is_empty() || candidate.model.is_empty() {
                bail!("every [[candidates]] entry needs a name and a model");
            }
        }
        Ok(())
    }

    /// Candidates to benchmark (config list, or the built-in set)
    pub fn candidates(&self) -> Vec<CandidateModel> {
        if self.candidates.is_empty() {
            CandidateModel::builtin()
        } else {
            self.candidates.clone()
        }
    }
}
