//! Internal implementation for the benchmark orchestrator
//!
//! Run phases:
//! CheckingServer -> LoadingBaseline -> [Warmup] -> BenchmarkingModel(i)
//! -> Aggregating -> Reporting -> Completed (or AbortedNoBaseline)

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{
    render_json, render_text, AggregateSummary, BenchOptions, BenchReport, CategoryQuality,
    ModelReport, ModelRun, OutputFormat, QualityScores, QueryQuality, QuerySummary,
};
use crate::baseline::{self, Baseline, BaselineCache};
use crate::fixtures::Fixtures;
use crate::metrics::{ndcg_at_k, recall_at_k, spearman, LatencyStats};
use crate::rerank::{CandidateModel, CandidateReranker, EmbedServer, Ranking, Reranker};

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    CheckingServer,
    LoadingBaseline,
    Warmup,
    BenchmarkingModel(usize),
    Aggregating,
    Reporting,
    Completed,
    AbortedNoBaseline,
}

/// Drives one benchmark run end to end
pub struct Orchestrator<'a> {
    server: &'a EmbedServer,
    candidates: &'a [CandidateModel],
    fixtures: &'a Fixtures,
    cache: &'a BaselineCache,
    trusted: Option<&'a dyn Reranker>,
    options: BenchOptions,
    phase: Phase,
}

impl<'a> Orchestrator<'a> {
    /// `trusted` is `None` when no credential is configured; the run then
    /// depends on a valid cached baseline.
    pub fn new(
        server: &'a EmbedServer,
        candidates: &'a [CandidateModel],
        fixtures: &'a Fixtures,
        cache: &'a BaselineCache,
        trusted: Option<&'a dyn Reranker>,
        options: BenchOptions,
    ) -> Self {
        Self {
            server,
            candidates,
            fixtures,
            cache,
            trusted,
            options,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "phase");
        self.phase = phase;
    }

    /// Run the benchmark and render the report to `out`.
    ///
    /// Returns `Err` only for fatal conditions (server down, no baseline).
    /// Failing candidate models are reported as unavailable.
    pub fn run(&mut self, out: &mut dyn Write) -> Result<BenchReport> {
        let report = {
            let mut sink = std::io::sink();
            let progress: &mut dyn Write = match self.options.output {
                OutputFormat::Json => &mut sink,
                OutputFormat::Text => &mut *out,
            };
            self.collect(progress)?
        };

        self.enter(Phase::Reporting);
        match self.options.output {
            OutputFormat::Text => render_text(&report, self.options.verbose, out)?,
            OutputFormat::Json => render_json(&report, out)?,
        }

        self.enter(Phase::Completed);
        Ok(report)
    }

    fn collect(&mut self, progress: &mut dyn Write) -> Result<BenchReport> {
        writeln!(progress, "🔬 Reranker Benchmark")?;

        self.enter(Phase::CheckingServer);
        let health = self
            .server
            .health()
            .with_context(|| {
                format!("Inference server unavailable at {}", self.server.base_url())
            })?;
        writeln!(progress, "   Server: {} ({})", self.server.base_url(), health.status)?;
        writeln!(
            progress,
            "   Fixtures: {} queries × {} documents",
            self.fixtures.query_count(),
            self.fixtures.corpus_count()
        )?;
        writeln!(
            progress,
            "   Models: {} × {} iteration(s)",
            self.candidates.len(),
            self.options.iterations
        )?;

        self.enter(Phase::LoadingBaseline);
        write!(progress, "   Baseline: ")?;
        progress.flush()?;
        let (baseline, source) = match baseline::obtain(
            self.cache,
            self.trusted,
            self.fixtures,
            self.options.regenerate_baseline,
            progress,
        ) {
            Ok(obtained) => obtained,
            Err(e) => {
                self.enter(Phase::AbortedNoBaseline);
                return Err(e);
            }
        };
        writeln!(
            progress,
            "{} ({}, {})",
            baseline.model,
            source.label(),
            baseline.generated_at.format("%Y-%m-%d %H:%M UTC")
        )?;

        if self.options.warmup {
            self.enter(Phase::Warmup);
            self.warmup(progress)?;
        }
        writeln!(progress)?;

        let candidates = self.candidates;
        let mut runs: Vec<(&CandidateModel, Result<ModelRun>)> = Vec::new();
        for (i, candidate) in candidates.iter().enumerate() {
            self.enter(Phase::BenchmarkingModel(i));
            write!(
                progress,
                "   [{}/{}] {} ",
                i + 1,
                candidates.len(),
                candidate.name
            )?;
            progress.flush()?;

            let reranker = CandidateReranker::new(self.server, candidate);
            let result =
                benchmark_model(&reranker, self.fixtures, &baseline, &self.options, progress);

            match &result {
                Ok(run) => {
                    let summary = aggregate(run);
                    writeln!(
                        progress,
                        " {:.0}ms avg, p95 {:.0}ms, R@{} {:.1}%, NDCG@{} {:.3}, ρ {:.3}",
                        summary.latency.avg,
                        summary.latency.p95,
                        self.options.recall_k,
                        summary.quality.recall * 100.0,
                        self.options.ndcg_k,
                        summary.quality.ndcg,
                        summary.quality.spearman
                    )?;
                }
                Err(e) => {
                    warn!(
                        model = %candidate.name,
                        error = %format!("{:#}", e),
                        "model unavailable"
                    );
                    writeln!(progress, " ✗ unavailable")?;
                }
            }
            runs.push((candidate, result));
        }

        self.enter(Phase::Aggregating);
        let models = runs
            .into_iter()
            .map(|(candidate, result)| ModelReport::from_run(&candidate.name, result))
            .collect();

        Ok(BenchReport {
            generated_at: Utc::now(),
            iterations: self.options.iterations,
            recall_k: self.options.recall_k,
            ndcg_k: self.options.ndcg_k,
            query_count: self.fixtures.query_count(),
            corpus_count: self.fixtures.corpus_count(),
            trusted_model: baseline.model.clone(),
            baseline_source: source,
            queries: query_summaries(self.fixtures, &baseline),
            models,
        })
    }

    /// Warmup failures are advisory: the timed run marks broken models itself
    fn warmup(&self, progress: &mut dyn Write) -> Result<()> {
        writeln!(progress, "   Warmup:")?;
        match self.server.warmup(self.candidates) {
            Ok(outcomes) => {
                for outcome in outcomes {
                    if outcome.success {
                        writeln!(
                            progress,
                            "     ✓ {} ({:.0}ms)",
                            outcome.name,
                            outcome.load_time_ms.unwrap_or(0.0)
                        )?;
                    } else {
                        writeln!(
                            progress,
                            "     ✗ {}: {}",
                            outcome.name,
                            outcome.error.unwrap_or_default()
                        )?;
                    }
                }
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "warmup failed");
                writeln!(progress, "     ✗ warmup request failed")?;
            }
        }
        Ok(())
    }
}

impl ModelReport {
    /// Summarize a model's run; a failed run becomes an unavailable entry
    pub fn from_run(name: &str, result: Result<ModelRun>) -> Self {
        match result {
            Ok(run) => Self {
                name: name.to_string(),
                available: true,
                error: None,
                summary: Some(aggregate(&run)),
                queries: run.quality,
            },
            Err(e) => Self::unavailable(name, format!("{:#}", e)),
        }
    }
}

/// Time `iterations × queries` calls and score iteration 0 against the baseline.
///
/// The first failing call ends the model's run.
pub fn benchmark_model(
    reranker: &dyn Reranker,
    fixtures: &Fixtures,
    baseline: &Baseline,
    options: &BenchOptions,
    progress: &mut dyn Write,
) -> Result<ModelRun> {
    let documents = fixtures.texts();
    let mut run = ModelRun {
        latencies_ms: Vec::with_capacity(options.iterations * fixtures.query_count()),
        quality: Vec::with_capacity(fixtures.query_count()),
    };

    for iteration in 0..options.iterations {
        for query in &fixtures.queries {
            let start = Instant::now();
            let ranking = reranker
                .rerank(&query.text, &documents)
                .with_context(|| {
                    format!(
                        "{} failed on {:?} (iteration {})",
                        reranker.name(),
                        query.text,
                        iteration
                    )
                })?;
            run.latencies_ms.push(start.elapsed().as_secs_f64() * 1000.0);

            if iteration > 0 {
                continue;
            }
            match baseline.get(&query.text) {
                Some(expected) => run.quality.push(QueryQuality {
                    query: query.text.clone(),
                    category: query.category.clone(),
                    recall: recall_at_k(&ranking, expected, options.recall_k),
                    ndcg: ndcg_at_k(&ranking, expected, options.ndcg_k),
                    spearman: spearman(&ranking, expected),
                    top_ids: top_ids(&ranking),
                }),
                None => warn!(query = %query.text, "no baseline ranking; quality skipped"),
            }
        }

        let _ = write!(progress, ".");
        let _ = progress.flush();
    }

    info!(
        model = reranker.name(),
        calls = run.latencies_ms.len(),
        scored = run.quality.len(),
        "model benchmarked"
    );
    Ok(run)
}

/// Summarize latency samples and iteration-0 quality
pub fn aggregate(run: &ModelRun) -> AggregateSummary {
    let mut by_category: BTreeMap<String, CategoryQuality> = BTreeMap::new();
    for q in &run.quality {
        let entry = by_category.entry(q.category.clone()).or_default();
        entry.recall += q.recall;
        entry.ndcg += q.ndcg;
        entry.spearman += q.spearman;
        entry.count += 1;
    }
    for entry in by_category.values_mut() {
        let n = entry.count as f64;
        entry.recall /= n;
        entry.ndcg /= n;
        entry.spearman /= n;
    }

    let quality = if run.quality.is_empty() {
        QualityScores::default()
    } else {
        let n = run.quality.len() as f64;
        QualityScores {
            recall: run.quality.iter().map(|q| q.recall).sum::<f64>() / n,
            ndcg: run.quality.iter().map(|q| q.ndcg).sum::<f64>() / n,
            spearman: run.quality.iter().map(|q| q.spearman).sum::<f64>() / n,
        }
    };

    AggregateSummary {
        latency: LatencyStats::from_samples(&run.latencies_ms),
        quality,
        by_category,
    }
}

fn top_ids(ranking: &Ranking) -> Vec<u32> {
    ranking
        .top_k(3)
        .into_iter()
        .map(|index| index as u32 + 1)
        .collect()
}

fn query_summaries(fixtures: &Fixtures, baseline: &Baseline) -> Vec<QuerySummary> {
    fixtures
        .queries
        .iter()
        .map(|query| QuerySummary {
            text: query.text.clone(),
            category: query.category.clone(),
            expected_top_k: query.expected_top_k.clone(),
            baseline_top: baseline.get(&query.text).map(top_ids).unwrap_or_default(),
        })
        .collect()
}
