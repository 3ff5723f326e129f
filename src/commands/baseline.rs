//! `baseline` command - obtain the trusted baseline without touching the inference server

use anyhow::Result;

use super::{CommonArgs, Setup};
use rerank_bench::baseline;
use rerank_bench::rerank::Reranker;

pub fn execute(common: &CommonArgs, regenerate: bool) -> Result<()> {
    let setup = Setup::resolve(common)?;
    let cache = setup.cache();
    let trusted = setup.trusted()?;
    let fixtures = &setup.fixtures;

    println!("📌 Trusted Baseline");
    println!("   Cache: {}", cache.path().display());
    print!("   Baseline: ");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let (baseline, source) = baseline::obtain(
        &cache,
        trusted.as_ref().map(|t| t as &dyn Reranker),
        fixtures,
        regenerate,
        &mut out,
    )?;
    drop(out);

    println!(
        "{} ({}, {})",
        baseline.model,
        source.label(),
        baseline.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "   Fixtures: {} queries × {} documents",
        fixtures.query_count(),
        fixtures.corpus_count()
    );
    println!();

    for query in &fixtures.queries {
        println!("   \"{}\" [{}]", query.text, query.category);
        let Some(ranking) = baseline.get(&query.text) else {
            println!("      (missing from baseline)");
            continue;
        };
        for (rank, result) in ranking.results().iter().take(3).enumerate() {
            let name = fixtures
                .document(result.index)
                .map(|d| d.display_name())
                .unwrap_or("?");
            println!(
                "      {}. #{:<3} {:<20} {:.4}",
                rank + 1,
                result.index + 1,
                name,
                result.score
            );
        }
    }

    Ok(())
}
