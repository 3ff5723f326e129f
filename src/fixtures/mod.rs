//! Corpus and query fixtures
//!
//! Public interface:
//! - `Fixtures::builtin()` - the versioned contact-profile corpus
//! - `Fixtures::load()` - a custom fixture set from JSON
//!
//! Fixtures are immutable once validated.

mod builtin;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One corpus entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable id, 1..=N
    pub id: u32,
    pub text: String,
}

impl Document {
    /// Short label for humans: the text before the first " - " separator
    pub fn display_name(&self) -> &str {
        self.text
            .split(" - ")
            .next()
            .unwrap_or(&self.text)
            .trim()
    }
}

/// One benchmark query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    /// Document ids a human expects on top; display only, never scored
    #[serde(default)]
    pub expected_top_k: Vec<u32>,
    /// Aggregation tag, e.g. "role", "skill", "edge_typo"
    pub category: String,
}

/// A validated corpus + query set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixtures {
    pub documents: Vec<Document>,
    pub queries: Vec<Query>,
}

impl Fixtures {
    pub fn builtin() -> Self {
        Self {
            documents: builtin::documents(),
            queries: builtin::queries(),
        }
    }

    /// Load and validate a fixture set from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures: {}", path.display()))?;
        let fixtures: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse fixtures: {}", path.display()))?;
        fixtures
            .validate()
            .with_context(|| format!("Invalid fixtures: {}", path.display()))?;
        Ok(fixtures)
    }

    pub fn validate(&self) -> Result<()> {
        if self.documents.is_empty() {
            bail!("fixture set has no documents");
        }
        if self.queries.is_empty() {
            bail!("fixture set has no queries");
        }

        for (pos, doc) in self.documents.iter().enumerate() {
            if doc.id as usize != pos + 1 {
                bail!(
                    "document ids must run 1..={} in order; found id {} at position {}",
                    self.documents.len(),
                    doc.id,
                    pos + 1
                );
            }
        }

        let mut seen = HashSet::new();
        for query in &self.queries {
            if !seen.insert(query.text.as_str()) {
                bail!("duplicate query text: {:?}", query.text);
            }
            if query.category.trim().is_empty() {
                bail!("query {:?} has no category", query.text);
            }
            if let Some(bad) = query
                .expected_top_k
                .iter()
                .find(|&&id| id == 0 || id as usize > self.documents.len())
            {
                bail!("query {:?} expects unknown document id {}", query.text, bad);
            }
        }

        Ok(())
    }

    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    pub fn corpus_count(&self) -> usize {
        self.documents.len()
    }

    /// Document texts in corpus order, as sent to rerankers
    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.text.clone()).collect()
    }

    /// Document at a 0-based corpus index
    pub fn document(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    /// Distinct categories in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.queries
            .iter()
            .map(|q| q.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }
}
