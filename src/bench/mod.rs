//! Reranker benchmark - quality against a trusted baseline, plus latency
//!
//! Public interface:
//! - `Orchestrator` - drives a full run (server check, baseline, models, report)
//! - `benchmark_model()` - time and score one reranker against the baseline
//! - `aggregate()` - per-model summary with per-category breakdown
//!
//! Calls are strictly sequential so latency samples are uncontended.

mod internal;
mod report;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::baseline::BaselineSource;
use crate::metrics::LatencyStats;

pub use internal::{aggregate, benchmark_model, Orchestrator, Phase};
pub use report::{render_json, render_text};

/// Output format for the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Options for a benchmark run
#[derive(Debug, Clone)]
pub struct BenchOptions {
    /// Timed passes over the query set per model
    pub iterations: usize,
    pub recall_k: usize,
    pub ndcg_k: usize,
    /// Ignore the cache and query the trusted provider again
    pub regenerate_baseline: bool,
    /// Ask the server to load models before timing
    pub warmup: bool,
    /// Show per-query top documents next to the expected ones
    pub verbose: bool,
    pub output: OutputFormat,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            iterations: 3,
            recall_k: 3,
            ndcg_k: 10,
            regenerate_baseline: false,
            warmup: false,
            verbose: false,
            output: OutputFormat::Text,
        }
    }
}

/// Iteration-0 quality of one model on one query
#[derive(Debug, Clone, Serialize)]
pub struct QueryQuality {
    pub query: String,
    pub category: String,
    pub recall: f64,
    pub ndcg: f64,
    pub spearman: f64,
    /// Candidate's first three document ids (1-based)
    pub top_ids: Vec<u32>,
}

/// Fixture query with the baseline's view of it
#[derive(Debug, Clone, Serialize)]
pub struct QuerySummary {
    pub text: String,
    pub category: String,
    /// Hand-annotated expectation (1-based ids), display only
    pub expected_top_k: Vec<u32>,
    /// Baseline's first three document ids (1-based); empty if not in the baseline
    pub baseline_top: Vec<u32>,
}

/// Mean quality scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QualityScores {
    pub recall: f64,
    pub ndcg: f64,
    pub spearman: f64,
}

/// Mean quality within one query category
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryQuality {
    pub recall: f64,
    pub ndcg: f64,
    pub spearman: f64,
    pub count: usize,
}

/// Everything recorded for one model during a run
#[derive(Debug, Clone, Default)]
pub struct ModelRun {
    /// Wall-clock latency of every call, all iterations
    pub latencies_ms: Vec<f64>,
    /// Iteration-0 quality per query
    pub quality: Vec<QueryQuality>,
}

/// Per-model summary
#[derive(Debug, Clone, Serialize)]
pub struct AggregateSummary {
    pub latency: LatencyStats,
    pub quality: QualityScores,
    pub by_category: BTreeMap<String, CategoryQuality>,
}

/// Outcome for one candidate model
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub name: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<AggregateSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<QueryQuality>,
}

impl ModelReport {
    pub fn unavailable(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            available: false,
            error: Some(error),
            summary: None,
            queries: Vec::new(),
        }
    }
}

/// Full run result
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub generated_at: DateTime<Utc>,
    pub iterations: usize,
    pub recall_k: usize,
    pub ndcg_k: usize,
    pub query_count: usize,
    pub corpus_count: usize,
    pub trusted_model: String,
    pub baseline_source: BaselineSource,
    pub queries: Vec<QuerySummary>,
    pub models: Vec<ModelReport>,
}

impl BenchReport {
    pub fn available_models(&self) -> impl Iterator<Item = &ModelReport> {
        self.models.iter().filter(|m| m.available)
    }

    pub fn unavailable_models(&self) -> impl Iterator<Item = &ModelReport> {
        self.models.iter().filter(|m| !m.available)
    }
}
