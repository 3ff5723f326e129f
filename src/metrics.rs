//! Ranking quality and latency metrics
//!
//! All quality metrics compare a candidate ranking against the trusted
//! baseline ranking for the same query:
//! - **Recall@K**: overlap of the two top-K sets (order-insensitive)
//! - **NDCG@K**: order-sensitive, baseline position used as graded relevance
//! - **Spearman**: global rank agreement over the whole corpus

use serde::Serialize;
use std::collections::HashSet;

use crate::rerank::Ranking;

/// Fraction of the baseline's top-k documents that also appear in the candidate's top-k.
///
/// Returns a value in [0, 1]; 0 when `k == 0` or the baseline is empty.
pub fn recall_at_k(candidate: &Ranking, baseline: &Ranking, k: usize) -> f64 {
    let expected: HashSet<usize> = baseline.top_k(k).into_iter().collect();
    if expected.is_empty() {
        return 0.0;
    }

    let found = candidate
        .top_k(k)
        .into_iter()
        .filter(|index| expected.contains(index))
        .count();

    found as f64 / expected.len() as f64
}

/// Normalized discounted cumulative gain over the first `k` positions.
///
/// Relevance of a document is `n - baseline_position` so the baseline's
/// first document carries the highest gain. Returns 0 when the ideal DCG is 0.
pub fn ndcg_at_k(candidate: &Ranking, baseline: &Ranking, k: usize) -> f64 {
    let n = baseline.len();
    let relevance = |index: usize| -> f64 {
        baseline
            .position_of(index)
            .map(|pos| (n - pos) as f64)
            .unwrap_or(0.0)
    };

    let dcg = |ranking: &Ranking| -> f64 {
        ranking
            .indices()
            .take(k)
            .enumerate()
            .map(|(pos, index)| relevance(index) / ((pos + 2) as f64).log2())
            .sum()
    };

    let ideal = dcg(baseline);
    if ideal == 0.0 {
        return 0.0;
    }

    dcg(candidate) / ideal
}

/// Spearman's rank correlation between candidate and baseline.
///
/// Documents ranked by the baseline but missing from the candidate get rank
/// `n + 1`. Returns 0 when fewer than two documents are ranked.
pub fn spearman(candidate: &Ranking, baseline: &Ranking) -> f64 {
    let n = baseline.len();
    if n < 2 {
        return 0.0;
    }

    let sum_d_squared: f64 = baseline
        .indices()
        .enumerate()
        .map(|(baseline_pos, index)| {
            let candidate_rank = candidate
                .position_of(index)
                .map(|pos| pos + 1)
                .unwrap_or(n + 1) as f64;
            let d = candidate_rank - (baseline_pos + 1) as f64;
            d * d
        })
        .sum();

    let n = n as f64;
    let rho = 1.0 - (6.0 * sum_d_squared) / (n * (n * n - 1.0));
    rho.clamp(-1.0, 1.0)
}

/// Sample at `floor(len * p)` of an ascending-sorted slice (`p` in [0, 1])
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (sorted.len() as f64 * p).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Latency distribution in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencyStats {
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub samples: usize,
}

impl LatencyStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            avg: sorted.iter().sum::<f64>() / sorted.len() as f64,
            p50: percentile(&sorted, 0.50),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
            samples: sorted.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ranking(order: &[usize]) -> Ranking {
        Ranking::from_order(order)
    }

    #[test]
    fn test_recall_self_is_perfect() {
        let r = ranking(&[4, 2, 0, 1, 3]);
        for k in 1..=5 {
            assert_relative_eq!(recall_at_k(&r, &r, k), 1.0);
        }
    }

    #[test]
    fn test_recall_ignores_order_within_top_k() {
        let baseline = ranking(&[0, 1, 2, 3, 4]);
        let candidate = ranking(&[2, 0, 1, 4, 3]);
        assert_relative_eq!(recall_at_k(&candidate, &baseline, 3), 1.0);
    }

    #[test]
    fn test_recall_partial_overlap() {
        let baseline = ranking(&[0, 1, 2, 3, 4]);
        let candidate = ranking(&[0, 3, 4, 1, 2]);
        assert_relative_eq!(recall_at_k(&candidate, &baseline, 3), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_recall_degenerate() {
        let r = ranking(&[0, 1]);
        assert_eq!(recall_at_k(&r, &r, 0), 0.0);
        assert_eq!(recall_at_k(&r, &Ranking::default(), 3), 0.0);
    }

    #[test]
    fn test_ndcg_self_is_perfect() {
        let r = ranking(&[3, 1, 4, 0, 2]);
        assert_relative_eq!(ndcg_at_k(&r, &r, 10), 1.0, epsilon = 1e-12);
        assert_relative_eq!(ndcg_at_k(&r, &r, 2), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ndcg_penalizes_swaps() {
        let baseline = ranking(&[0, 1, 2, 3, 4]);
        let swapped = ranking(&[1, 0, 2, 3, 4]);
        let score = ndcg_at_k(&swapped, &baseline, 10);
        assert!(score < 1.0);
        assert!(score > 0.9);
    }

    #[test]
    fn test_ndcg_worse_order_scores_lower() {
        let baseline = ranking(&[0, 1, 2, 3, 4]);
        let near = ranking(&[1, 0, 2, 3, 4]);
        let reversed = baseline.reversed();
        assert!(ndcg_at_k(&reversed, &baseline, 3) < ndcg_at_k(&near, &baseline, 3));
    }

    #[test]
    fn test_ndcg_degenerate() {
        let r = ranking(&[0, 1, 2]);
        assert_eq!(ndcg_at_k(&r, &r, 0), 0.0);
        assert_eq!(ndcg_at_k(&r, &Ranking::default(), 10), 0.0);
    }

    #[test]
    fn test_spearman_self_and_reverse() {
        let r = ranking(&[5, 3, 1, 0, 2, 4]);
        assert_relative_eq!(spearman(&r, &r), 1.0, epsilon = 1e-12);
        assert_relative_eq!(spearman(&r.reversed(), &r), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_spearman_single_swap() {
        // d = (1, -1) on a 5-element ranking: 1 - 6*2/(5*24) = 0.9
        let baseline = ranking(&[0, 1, 2, 3, 4]);
        let swapped = ranking(&[1, 0, 2, 3, 4]);
        assert_relative_eq!(spearman(&swapped, &baseline), 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_spearman_missing_documents_penalized() {
        let baseline = ranking(&[0, 1, 2, 3]);
        let partial = ranking(&[0, 1, 2]);
        // document 3 takes rank n + 1 = 5: d = 1, rho = 1 - 6 / (4 * 15)
        assert_relative_eq!(spearman(&partial, &baseline), 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_spearman_too_small() {
        let r = ranking(&[0]);
        assert_eq!(spearman(&r, &r), 0.0);
    }

    #[test]
    fn test_percentile_indexing() {
        let sorted: Vec<f64> = (0..15).map(|i| i as f64).collect();
        // floor(15 * 0.5) = 7
        assert_eq!(percentile(&sorted, 0.5), 7.0);
        assert_eq!(percentile(&sorted, 0.95), 14.0);
        assert_eq!(percentile(&sorted, 1.0), 14.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_latency_stats() {
        let stats = LatencyStats::from_samples(&[40.0, 10.0, 30.0, 20.0]);
        assert_relative_eq!(stats.avg, 25.0);
        assert_eq!(stats.p50, 30.0);
        assert_eq!(stats.p99, 40.0);
        assert_eq!(stats.samples, 4);
        assert_eq!(LatencyStats::from_samples(&[]), LatencyStats::default());
    }
}
