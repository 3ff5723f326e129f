//! Default command: benchmark every candidate against the baseline

use anyhow::{bail, Result};

use super::{CommonArgs, Setup};
use rerank_bench::bench::{BenchOptions, OutputFormat};
use rerank_bench::rerank::{CandidateModel, Reranker};
use rerank_bench::Orchestrator;

pub struct RunOptions {
    pub common: CommonArgs,
    pub regenerate_baseline: bool,
    pub warmup: bool,
    /// Overrides config; `--quick` arrives here as `Some(1)`
    pub iterations: Option<usize>,
    /// Candidate name filter (empty = all)
    pub models: Vec<String>,
    pub json: bool,
    pub verbose: bool,
}

pub fn execute(options: RunOptions) -> Result<()> {
    let setup = Setup::resolve(&options.common)?;
    let candidates = select_candidates(setup.config.candidates(), &options.models)?;

    let iterations = options.iterations.unwrap_or(setup.config.bench.iterations);
    if iterations == 0 {
        bail!("--iterations must be at least 1");
    }

    let bench_options = BenchOptions {
        iterations,
        recall_k: setup.config.bench.recall_k,
        ndcg_k: setup.config.bench.ndcg_k,
        regenerate_baseline: options.regenerate_baseline,
        warmup: options.warmup,
        verbose: options.verbose,
        output: if options.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        },
    };

    let server = setup.embed_server()?;
    let cache = setup.cache();
    let trusted = setup.trusted()?;

    let mut orchestrator = Orchestrator::new(
        &server,
        &candidates,
        &setup.fixtures,
        &cache,
        trusted.as_ref().map(|t| t as &dyn Reranker),
        bench_options,
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    orchestrator.run(&mut out)?;

    Ok(())
}

/// Apply the `--model` filter (case-insensitive on display name)
fn select_candidates(all: Vec<CandidateModel>, names: &[String]) -> Result<Vec<CandidateModel>> {
    if names.is_empty() {
        return Ok(all);
    }

    let selected: Vec<CandidateModel> = all
        .iter()
        .filter(|c| names.iter().any(|n| n.eq_ignore_ascii_case(&c.name)))
        .cloned()
        .collect();

    if selected.is_empty() {
        let known: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
        bail!(
            "No candidate matches {:?}. Known: {}",
            names,
            known.join(", ")
        );
    }
    Ok(selected)
}
