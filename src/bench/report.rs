//! Report rendering: comparison table, category breakdown, per-query view

use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeSet;
use std::io::{self, Write};

use super::{BenchReport, ModelReport};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const NAME_WIDTH: usize = 24;
const COLUMN_WIDTH: usize = 12;

/// Plain-text tables
pub fn render_text(report: &BenchReport, verbose: bool, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(
        out,
        "📊 Results: {} queries × {} iteration(s), baseline {} ({})",
        report.query_count,
        report.iterations,
        report.trusted_model,
        report.baseline_source.label()
    )?;
    writeln!(out, "{}", RULE)?;
    writeln!(out)?;

    write_comparison(report, out)?;
    write_unavailable(report, out)?;
    write_categories(report, out)?;
    if verbose {
        write_per_query(report, out)?;
    }

    Ok(())
}

/// Pretty JSON, for piping into other tools
pub fn render_json(report: &BenchReport, out: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

fn write_comparison(report: &BenchReport, out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "   {:<width$} {:>8} {:>8} {:>8} {:>8} {:>10} {:>9} {:>9}",
        "Model",
        "Avg ms",
        "P50",
        "P95",
        "P99",
        format!("Recall@{}", report.recall_k),
        format!("NDCG@{}", report.ndcg_k),
        "Spearman",
        width = NAME_WIDTH
    )?;

    let mut available = 0;
    for model in report.available_models() {
        let Some(summary) = &model.summary else {
            continue;
        };
        available += 1;
        writeln!(
            out,
            "   {:<width$} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>9.1}% {:>9.3} {:>9.3}",
            truncate(&model.name, NAME_WIDTH),
            summary.latency.avg,
            summary.latency.p50,
            summary.latency.p95,
            summary.latency.p99,
            summary.quality.recall * 100.0,
            summary.quality.ndcg,
            summary.quality.spearman,
            width = NAME_WIDTH
        )?;
    }

    if available == 0 {
        writeln!(out, "   (no model completed)")?;
    }
    Ok(())
}

fn write_unavailable(report: &BenchReport, out: &mut dyn Write) -> io::Result<()> {
    let unavailable: Vec<&ModelReport> = report.unavailable_models().collect();
    if unavailable.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "   Unavailable:")?;
    for model in unavailable {
        writeln!(
            out,
            "   {} {}: {}",
            "✗".red(),
            model.name,
            model.error.as_deref().unwrap_or("unknown error")
        )?;
    }
    Ok(())
}

/// One row per category, NDCG per available model
fn write_categories(report: &BenchReport, out: &mut dyn Write) -> io::Result<()> {
    let models: Vec<&ModelReport> = report
        .available_models()
        .filter(|m| m.summary.is_some())
        .collect();
    if models.is_empty() {
        return Ok(());
    }

    let categories: BTreeSet<&str> = models
        .iter()
        .filter_map(|m| m.summary.as_ref())
        .flat_map(|s| s.by_category.keys().map(String::as_str))
        .collect();

    writeln!(out)?;
    writeln!(out, "   NDCG@{} by category:", report.ndcg_k)?;
    write!(out, "   {:<18} {:>5}", "Category", "n")?;
    for model in &models {
        write!(
            out,
            " {:>width$}",
            truncate(&model.name, COLUMN_WIDTH),
            width = COLUMN_WIDTH
        )?;
    }
    writeln!(out)?;

    for category in categories {
        let count = models
            .iter()
            .filter_map(|m| m.summary.as_ref()?.by_category.get(category))
            .map(|c| c.count)
            .max()
            .unwrap_or(0);
        write!(out, "   {:<18} {:>5}", category, count)?;
        for model in &models {
            match model
                .summary
                .as_ref()
                .and_then(|s| s.by_category.get(category))
            {
                Some(c) => write!(out, " {:>width$.3}", c.ndcg, width = COLUMN_WIDTH)?,
                None => write!(out, " {:>width$}", "-", width = COLUMN_WIDTH)?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Expected vs. baseline vs. each model's top-3 ids
fn write_per_query(report: &BenchReport, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "   Per-query top-3 (document ids):")?;
    for query in &report.queries {
        writeln!(out, "      ┌─ \"{}\" [{}]", truncate(&query.text, 60), query.category)?;
        writeln!(out, "      │  Expected: {:?}", query.expected_top_k)?;
        writeln!(out, "      │  Baseline: {:?}", query.baseline_top)?;
        for model in report.available_models() {
            let Some(quality) = model.queries.iter().find(|q| q.query == query.text) else {
                continue;
            };
            let marker = if quality.top_ids == query.baseline_top {
                "✓".green()
            } else {
                " ".normal()
            };
            writeln!(
                out,
                "      │  {} {:<width$} {:?}",
                marker,
                truncate(&model.name, NAME_WIDTH),
                quality.top_ids,
                width = NAME_WIDTH
            )?;
        }
        writeln!(out, "      └─")?;
    }
    Ok(())
}

/// Truncate to `max_len` characters for table cells
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
