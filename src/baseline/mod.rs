//! Trusted baseline rankings
//!
//! Public interface:
//! - `Baseline` - trusted ranking per query text
//! - `BaselineCache` - JSON persistence keyed by (query count, corpus count)
//! - `obtain()` - cache-or-regenerate lifecycle
//!
//! A baseline is all-or-nothing: one failed trusted call aborts generation.

mod internal;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, info};

use crate::config::ENV_TRUSTED_API_KEY;
use crate::fixtures::Fixtures;
use crate::rerank::{Ranking, Reranker};

pub use internal::BaselineCache;

/// Trusted-provider ranking for every fixture query
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub generated_at: DateTime<Utc>,
    /// Reference model that produced the rankings
    pub model: String,
    rankings: BTreeMap<String, Ranking>,
}

impl Baseline {
    pub fn new(model: &str, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            model: model.to_string(),
            rankings: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, query: &str, ranking: Ranking) {
        self.rankings.insert(query.to_string(), ranking);
    }

    pub fn get(&self, query: &str) -> Option<&Ranking> {
        self.rankings.get(query)
    }

    pub fn len(&self) -> usize {
        self.rankings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rankings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Ranking)> {
        self.rankings.iter().map(|(q, r)| (q.as_str(), r))
    }
}

/// Where the run's baseline came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineSource {
    Cache,
    Generated,
}

impl BaselineSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cache => "cached",
            Self::Generated => "generated",
        }
    }
}

/// Query the trusted provider for every fixture query.
///
/// Writes one progress dot per query to `progress`.
pub fn generate(
    trusted: &dyn Reranker,
    fixtures: &Fixtures,
    progress: &mut dyn Write,
) -> Result<Baseline> {
    let documents = fixtures.texts();
    let mut baseline = Baseline::new(trusted.name(), Utc::now());

    for query in &fixtures.queries {
        let ranking = trusted
            .rerank(&query.text, &documents)
            .with_context(|| format!("Baseline generation failed on query {:?}", query.text))?;
        debug!(query = %query.text, top = ?ranking.top_k(3), "baseline ranking");
        baseline.insert(&query.text, ranking);

        let _ = write!(progress, ".");
        let _ = progress.flush();
    }
    let _ = write!(progress, " ");

    Ok(baseline)
}

/// Load the cached baseline, or regenerate it with the trusted provider.
///
/// `trusted` is `None` when no credential is configured; that is only fatal
/// when there is no valid cache (or a regeneration was forced).
pub fn obtain(
    cache: &BaselineCache,
    trusted: Option<&dyn Reranker>,
    fixtures: &Fixtures,
    regenerate: bool,
    progress: &mut dyn Write,
) -> Result<(Baseline, BaselineSource)> {
    if !regenerate {
        if let Some(baseline) = cache.load() {
            info!(
                path = %cache.path().display(),
                queries = baseline.len(),
                "using cached baseline"
            );
            return Ok((baseline, BaselineSource::Cache));
        }
    }

    let Some(trusted) = trusted else {
        if regenerate {
            bail!(
                "Baseline regeneration requested but {} is not set",
                ENV_TRUSTED_API_KEY
            );
        }
        bail!(
            "No valid cached baseline at {} and {} is not set",
            cache.path().display(),
            ENV_TRUSTED_API_KEY
        );
    };

    info!(model = trusted.name(), queries = fixtures.query_count(), "generating baseline");
    let baseline = generate(trusted, fixtures, progress)?;

    if cache.save(&baseline) {
        info!(path = %cache.path().display(), "baseline cached");
    }

    Ok((baseline, BaselineSource::Generated))
}
