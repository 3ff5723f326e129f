//! Reranking clients
//!
//! Public interface:
//! - `Reranker` - anything that orders a corpus for a query
//! - `Ranking` / `RankedResult` - a validated full-corpus ordering
//! - `CandidateModel` - a model served by the self-hosted inference server
//! - `EmbedServer` - HTTP client for the inference server (candidates)
//! - `TrustedProvider` - hosted reference reranker (baseline)
//!
//! Both providers return a `Ranking` covering every input document exactly once.

mod server;
mod trusted;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub use server::{CandidateReranker, EmbedServer, HealthResponse, WarmupOutcome};
pub use trusted::TrustedProvider;

/// Orders a corpus of documents by relevance to a query.
///
/// Implementations must return a `Ranking` over all of `documents`.
pub trait Reranker {
    /// Display name used in progress output and reports
    fn name(&self) -> &str;

    fn rerank(&self, query: &str, documents: &[String]) -> Result<Ranking>;
}

/// One entry of a ranking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// 0-based position of the document in the corpus
    pub index: usize,
    pub score: f64,
}

/// Full-corpus ordering, descending by score.
///
/// Serialize-only: `from_scored` is the validated way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ranking(Vec<RankedResult>);

impl Ranking {
    /// Build a ranking from provider output.
    ///
    /// Requires a permutation of `0..corpus_len`. Sorts by descending score;
    /// equal scores keep the provider's order.
    pub fn from_scored(mut results: Vec<RankedResult>, corpus_len: usize) -> Result<Self> {
        if results.len() != corpus_len {
            bail!(
                "Ranking has {} entries, expected one per document ({})",
                results.len(),
                corpus_len
            );
        }

        let mut seen = vec![false; corpus_len];
        for result in &results {
            if result.index >= corpus_len {
                bail!(
                    "Ranking references document index {} (corpus has {})",
                    result.index,
                    corpus_len
                );
            }
            if seen[result.index] {
                bail!("Ranking lists document index {} twice", result.index);
            }
            if !result.score.is_finite() {
                bail!("Ranking has non-finite score for index {}", result.index);
            }
            seen[result.index] = true;
        }

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(Self(results))
    }

    /// Ranking in exactly the given order (scores descend with position)
    pub fn from_order(indices: &[usize]) -> Self {
        let n = indices.len();
        Self(
            indices
                .iter()
                .enumerate()
                .map(|(pos, &index)| RankedResult {
                    index,
                    score: (n - pos) as f64,
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn results(&self) -> &[RankedResult] {
        &self.0
    }

    /// Document indices in ranked order
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|r| r.index)
    }

    /// First `k` document indices (fewer if the ranking is shorter)
    pub fn top_k(&self, k: usize) -> Vec<usize> {
        self.indices().take(k).collect()
    }

    /// 0-based position of a document, if ranked
    pub fn position_of(&self, index: usize) -> Option<usize> {
        self.0.iter().position(|r| r.index == index)
    }

    /// Same documents in reverse order
    pub fn reversed(&self) -> Self {
        let mut order: Vec<usize> = self.indices().collect();
        order.reverse();
        Self::from_order(&order)
    }
}

/// A candidate reranker hosted by the inference server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateModel {
    /// Display label
    pub name: String,
    /// Server-side backend ("fastembed", "sentence-transformers")
    #[serde(default = "default_method")]
    pub method: String,
    /// Model identifier, e.g. "BAAI/bge-reranker-base"
    pub model: String,
    /// Needed by models that ship custom modelling code
    #[serde(default)]
    pub trust_remote_code: bool,
}

fn default_method() -> String {
    "sentence-transformers".to_string()
}

impl CandidateModel {
    pub fn new(name: &str, method: &str, model: &str, trust_remote_code: bool) -> Self {
        Self {
            name: name.to_string(),
            method: method.to_string(),
            model: model.to_string(),
            trust_remote_code,
        }
    }

    /// Built-in candidate set
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::new("BGE-reranker-base", "fastembed", "BAAI/bge-reranker-base", false),
            Self::new(
                "BGE-reranker-v2-m3",
                "sentence-transformers",
                "BAAI/bge-reranker-v2-m3",
                false,
            ),
            Self::new(
                "Jina-reranker-v2",
                "sentence-transformers",
                "jinaai/jina-reranker-v2-base-multilingual",
                true,
            ),
            Self::new(
                "MiniLM-L6",
                "sentence-transformers",
                "cross-encoder/ms-marco-MiniLM-L-6-v2",
                false,
            ),
        ]
    }
}
