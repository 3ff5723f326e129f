//! Baseline cache file
//!
//! Validity is a count-only fingerprint: a cache recorded with a different
//! query or corpus count is stale. Edits that keep both counts are not detected.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::Baseline;
use crate::fixtures::Fixtures;
use crate::rerank::{RankedResult, Ranking};

/// Bumped whenever the file layout changes
const CACHE_VERSION: u32 = 1;

/// On-disk shape
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheFile {
    version: u32,
    timestamp: DateTime<Utc>,
    query_count: usize,
    corpus_count: usize,
    #[serde(default)]
    trusted_model: String,
    rankings: BTreeMap<String, Vec<CachedResult>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedResult {
    index: usize,
    score: f64,
    /// For humans reading the file; ignored on load
    #[serde(default)]
    display_name: String,
}

/// Persisted baseline for one fixture set
pub struct BaselineCache {
    path: PathBuf,
    query_count: usize,
    corpus_count: usize,
    display_names: Vec<String>,
}

impl BaselineCache {
    pub fn new(path: PathBuf, fixtures: &Fixtures) -> Self {
        Self {
            path,
            query_count: fixtures.query_count(),
            corpus_count: fixtures.corpus_count(),
            display_names: fixtures
                .documents
                .iter()
                .map(|d| d.display_name().to_string())
                .collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached baseline; `None` means the caller must regenerate
    pub fn load(&self) -> Option<Baseline> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no baseline cache");
            return None;
        }

        match self.try_load() {
            Ok(baseline) => Some(baseline),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %format!("{:#}", e),
                    "ignoring baseline cache"
                );
                None
            }
        }
    }

    fn try_load(&self) -> Result<Baseline> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let file: CacheFile =
            serde_json::from_str(&content).context("Failed to parse baseline cache")?;

        if file.version != CACHE_VERSION {
            bail!("cache version {} (expected {})", file.version, CACHE_VERSION);
        }
        if file.query_count != self.query_count || file.corpus_count != self.corpus_count {
            bail!(
                "cache recorded {} queries / {} documents, fixtures have {} / {}",
                file.query_count,
                file.corpus_count,
                self.query_count,
                self.corpus_count
            );
        }
        if file.rankings.len() != file.query_count {
            bail!(
                "cache holds {} rankings for {} queries",
                file.rankings.len(),
                file.query_count
            );
        }

        let mut baseline = Baseline::new(&file.trusted_model, file.timestamp);
        for (query, entries) in file.rankings {
            let results = entries
                .into_iter()
                .map(|e| RankedResult {
                    index: e.index,
                    score: e.score,
                })
                .collect();
            let ranking = Ranking::from_scored(results, self.corpus_count)
                .with_context(|| format!("bad cached ranking for {:?}", query))?;
            baseline.insert(&query, ranking);
        }

        Ok(baseline)
    }

    /// Persist a baseline. Failures are logged and reported as `false`.
    pub fn save(&self, baseline: &Baseline) -> bool {
        match self.try_save(baseline) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %format!("{:#}", e),
                    "could not save baseline cache"
                );
                false
            }
        }
    }

    fn try_save(&self, baseline: &Baseline) -> Result<()> {
        let rankings = baseline
            .iter()
            .map(|(query, ranking)| {
                let entries = ranking
                    .results()
                    .iter()
                    .map(|r| CachedResult {
                        index: r.index,
                        score: r.score,
                        display_name: self
                            .display_names
                            .get(r.index)
                            .cloned()
                            .unwrap_or_default(),
                    })
                    .collect();
                (query.to_string(), entries)
            })
            .collect();

        let file = CacheFile {
            version: CACHE_VERSION,
            timestamp: baseline.generated_at,
            query_count: self.query_count,
            corpus_count: self.corpus_count,
            trusted_model: baseline.model.clone(),
            rankings,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Document, Query};

    fn small_fixtures(documents: usize, queries: usize) -> Fixtures {
        Fixtures {
            documents: (1..=documents as u32)
                .map(|id| Document {
                    id,
                    text: format!("Person {} - profile", id),
                })
                .collect(),
            queries: (0..queries)
                .map(|i| Query {
                    text: format!("query {}", i),
                    expected_top_k: vec![],
                    category: "role".to_string(),
                })
                .collect(),
        }
    }

    fn baseline_for(fixtures: &Fixtures) -> Baseline {
        let mut baseline = Baseline::new("trusted-v1", Utc::now());
        let n = fixtures.corpus_count();
        for (i, query) in fixtures.queries.iter().enumerate() {
            let order: Vec<usize> = (0..n).map(|p| (p + i) % n).collect();
            baseline.insert(&query.text, Ranking::from_order(&order));
        }
        baseline
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = small_fixtures(5, 3);
        let cache = BaselineCache::new(dir.path().join("nested/baseline.json"), &fixtures);
        let baseline = baseline_for(&fixtures);

        assert!(cache.save(&baseline));
        assert_eq!(cache.load(), Some(baseline));
    }

    #[test]
    fn test_round_trip_keeps_fractional_scores_exact() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = small_fixtures(20, 16);
        let cache = BaselineCache::new(dir.path().join("baseline.json"), &fixtures);

        // xorshift64: 53-bit fractions, the shape real relevance scores take
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next_score = || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed >> 11) as f64 / (1u64 << 53) as f64 * 1e-3
        };

        let mut baseline = Baseline::new("trusted-v1", Utc::now());
        for query in &fixtures.queries {
            let results = (0..fixtures.corpus_count())
                .map(|index| RankedResult {
                    index,
                    score: next_score(),
                })
                .collect();
            let ranking = Ranking::from_scored(results, fixtures.corpus_count()).unwrap();
            baseline.insert(&query.text, ranking);
        }

        assert!(cache.save(&baseline));
        let loaded = cache.load().unwrap();
        for (query, ranking) in baseline.iter() {
            let reloaded = loaded.get(query).unwrap();
            for (a, b) in ranking.results().iter().zip(reloaded.results()) {
                assert_eq!(a.index, b.index);
                assert_eq!(a.score.to_bits(), b.score.to_bits());
            }
        }
        assert_eq!(loaded, baseline);
    }

    #[test]
    fn test_file_shape() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = small_fixtures(2, 1);
        let cache = BaselineCache::new(dir.path().join("baseline.json"), &fixtures);
        assert!(cache.save(&baseline_for(&fixtures)));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(cache.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], CACHE_VERSION);
        assert_eq!(raw["queryCount"], 1);
        assert_eq!(raw["corpusCount"], 2);
        assert_eq!(raw["trustedModel"], "trusted-v1");
        assert!(raw["timestamp"].is_string());
        assert_eq!(raw["rankings"]["query 0"][0]["displayName"], "Person 1");
    }

    #[test]
    fn test_corpus_change_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        let fixtures = small_fixtures(5, 3);
        assert!(BaselineCache::new(path.clone(), &fixtures).save(&baseline_for(&fixtures)));

        let grown = small_fixtures(6, 3);
        assert!(BaselineCache::new(path, &grown).load().is_none());
    }

    #[test]
    fn test_query_change_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        let fixtures = small_fixtures(5, 3);
        assert!(BaselineCache::new(path.clone(), &fixtures).save(&baseline_for(&fixtures)));

        let fewer = small_fixtures(5, 2);
        assert!(BaselineCache::new(path, &fewer).load().is_none());
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = small_fixtures(3, 1);
        let cache = BaselineCache::new(dir.path().join("baseline.json"), &fixtures);
        assert!(cache.load().is_none());

        fs::write(cache.path(), "{not json").unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_wrong_version_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = small_fixtures(3, 1);
        let cache = BaselineCache::new(dir.path().join("baseline.json"), &fixtures);
        assert!(cache.save(&baseline_for(&fixtures)));

        let content = fs::read_to_string(cache.path()).unwrap();
        let mut raw: serde_json::Value = serde_json::from_str(&content).unwrap();
        raw["version"] = serde_json::json!(CACHE_VERSION + 1);
        fs::write(cache.path(), raw.to_string()).unwrap();

        assert!(cache.load().is_none());
    }

    #[test]
    fn test_non_permutation_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = small_fixtures(3, 1);
        let cache = BaselineCache::new(dir.path().join("baseline.json"), &fixtures);
        let mut baseline = Baseline::new("t", Utc::now());
        baseline.insert("query 0", Ranking::from_order(&[0, 0, 1]));
        assert!(cache.save(&baseline));

        assert!(cache.load().is_none());
    }

    #[test]
    fn test_save_failure_is_soft() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let fixtures = small_fixtures(3, 1);
        let cache = BaselineCache::new(blocker.join("baseline.json"), &fixtures);

        assert!(!cache.save(&baseline_for(&fixtures)));
    }
}
