//! Retrieval metrics over ranked gallery lists: AP / mAP, plus Precision@K,
//! Recall@K and reciprocal rank as diagnostics.
//!
//! All metrics of a query are computed from its correctness sequence: entry r
//! is true when the gallery item at rank r shares the query's label.

use crate::distance::DistanceMatrix;
use crate::error::{HashEvalError, Result};
use crate::eval::matches::MatchMatrix;
use crate::eval::ranking::RankingMatrix;
use rayon::prelude::*;
use serde::Serialize;

/// Resolve the requested cutoff against the gallery size.
///
/// K <= 0 is rejected. K larger than the gallery is clamped to G rather than
/// failing, since K usually comes from configuration and does not track the
/// gallery size.
pub fn effective_top_k(k: i64, num_gallery: usize) -> Result<usize> {
    if k <= 0 {
        return Err(HashEvalError::InvalidCutoff(k));
    }
    let requested = usize::try_from(k).unwrap_or(usize::MAX);
    if requested > num_gallery {
        log::debug!("top_k {} exceeds gallery size {}, clamping", requested, num_gallery);
        return Ok(num_gallery);
    }
    Ok(requested)
}

/// Average precision of one correctness sequence.
///
/// Sum of precision-at-rank over the ranks that are hits, divided by the
/// number of hits. A sequence with no hits scores 0.
pub fn average_precision(correct: &[bool]) -> f64 {
    let mut hits = 0usize;
    let mut precision_sum = 0.0f64;
    for (idx, &is_hit) in correct.iter().enumerate() {
        if is_hit {
            hits += 1;
            precision_sum += hits as f64 / (idx + 1) as f64;
        }
    }
    if hits == 0 {
        return 0.0;
    }
    precision_sum / hits as f64
}

/// Precision at K: hits in the sequence divided by its length. Empty scores 0.
pub fn precision_at_k(correct: &[bool]) -> f64 {
    if correct.is_empty() {
        return 0.0;
    }
    correct.iter().filter(|&&c| c).count() as f64 / correct.len() as f64
}

/// Recall at K: hits in the sequence over every relevant gallery item.
/// A query with nothing relevant scores 0.
pub fn recall_at_k(correct: &[bool], relevant_total: usize) -> f64 {
    if relevant_total == 0 {
        return 0.0;
    }
    correct.iter().filter(|&&c| c).count() as f64 / relevant_total as f64
}

/// 1 / (rank of first hit), 1-indexed; 0 without a hit.
pub fn reciprocal_rank(correct: &[bool]) -> f64 {
    correct
        .iter()
        .position(|&c| c)
        .map(|idx| 1.0 / (idx + 1) as f64)
        .unwrap_or(0.0)
}

/// Arithmetic mean, accumulated left to right. Empty input scores 0.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Scores of a single query at the effective cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryScore {
    pub average_precision: f64,
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub reciprocal_rank: f64,
    /// Relevant gallery items anywhere in the gallery, not just the top K.
    pub relevant_total: usize,
}

/// Correctness of the first `top_k` ranked gallery items for query `t`.
fn correct_retrievals(
    matches: &MatchMatrix,
    ranking: &RankingMatrix,
    t: usize,
    top_k: usize,
) -> Vec<bool> {
    ranking.column(t)[..top_k]
        .iter()
        .map(|&g| matches.get(g, t))
        .collect()
}

fn check_shapes(matches: &MatchMatrix, ranking: &RankingMatrix) -> Result<()> {
    if matches.shape() != ranking.shape() {
        return Err(HashEvalError::ShapeMismatch(format!(
            "match matrix is {:?} but ranking matrix is {:?}",
            matches.shape(),
            ranking.shape()
        )));
    }
    Ok(())
}

/// Score every query. The cutoff is validated before anything else; every
/// query gets an entry, including those without any relevant gallery item.
///
/// Only the match and ranking shapes are compared here. When the distance
/// matrix the ranking came from is at hand, use [`score_ranked_distances`]
/// so its shape is checked as well.
pub fn score_queries(
    matches: &MatchMatrix,
    ranking: &RankingMatrix,
    k: i64,
    parallel: bool,
) -> Result<Vec<QueryScore>> {
    if k <= 0 {
        return Err(HashEvalError::InvalidCutoff(k));
    }
    check_shapes(matches, ranking)?;

    let (num_gallery, num_query) = ranking.shape();
    let top_k = effective_top_k(k, num_gallery)?;

    let score = |t: usize| {
        let correct = correct_retrievals(matches, ranking, t, top_k);
        let relevant_total = matches.relevant_count(t);
        QueryScore {
            average_precision: average_precision(&correct),
            precision_at_k: precision_at_k(&correct),
            recall_at_k: recall_at_k(&correct, relevant_total),
            reciprocal_rank: reciprocal_rank(&correct),
            relevant_total,
        }
    };

    // Indexed collect keeps query order, so the serial and parallel paths agree.
    let scores: Vec<QueryScore> = if parallel {
        (0..num_query).into_par_iter().map(score).collect()
    } else {
        (0..num_query).map(score).collect()
    };
    Ok(scores)
}

/// [`score_queries`] after checking that the distance matrix agrees in shape
/// with the match and ranking matrices.
pub fn score_ranked_distances(
    matches: &MatchMatrix,
    dist: &DistanceMatrix,
    ranking: &RankingMatrix,
    k: i64,
    parallel: bool,
) -> Result<Vec<QueryScore>> {
    if k <= 0 {
        return Err(HashEvalError::InvalidCutoff(k));
    }
    if dist.shape() != ranking.shape() {
        return Err(HashEvalError::ShapeMismatch(format!(
            "distance matrix is {:?} but ranking matrix is {:?}",
            dist.shape(),
            ranking.shape()
        )));
    }
    score_queries(matches, ranking, k, parallel)
}

/// Per-query average precision at cutoff `k` (length T).
pub fn per_query_average_precision(
    matches: &MatchMatrix,
    ranking: &RankingMatrix,
    k: i64,
) -> Result<Vec<f64>> {
    Ok(score_queries(matches, ranking, k, false)?
        .iter()
        .map(|s| s.average_precision)
        .collect())
}

/// Mean average precision at cutoff `k`, averaged over all T queries.
pub fn mean_average_precision(
    matches: &MatchMatrix,
    ranking: &RankingMatrix,
    k: i64,
) -> Result<f64> {
    Ok(mean(&per_query_average_precision(matches, ranking, k)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::eval::fixture::{reference_fixture, reference_map, REFERENCE_AP};

    fn fixture() -> (MatchMatrix, RankingMatrix) {
        reference_fixture().unwrap()
    }

    #[test]
    fn average_precision_all_hits() {
        assert!((average_precision(&[true, true, true]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn average_precision_mixed() {
        // hits at ranks 1 and 3: (1/1 + 2/3) / 2
        assert!((average_precision(&[true, false, true]) - 5.0 / 6.0).abs() < 1e-12);
        // hits at ranks 2 and 3: (1/2 + 2/3) / 2
        assert!((average_precision(&[false, true, true]) - 7.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn average_precision_no_hits_is_zero() {
        assert_eq!(average_precision(&[false, false, false]), 0.0);
        assert_eq!(average_precision(&[]), 0.0);
    }

    #[test]
    fn reference_fixture_per_query() {
        let (matches, ranking) = fixture();
        let ap = per_query_average_precision(&matches, &ranking, 3).unwrap();
        assert_eq!(ap.len(), 5);
        for (got, want) in ap.iter().zip(REFERENCE_AP.iter()) {
            assert!((got - want).abs() < 1e-9, "got {}, want {}", got, want);
        }
    }

    #[test]
    fn reference_fixture_mean() {
        let (matches, ranking) = fixture();
        let map = mean_average_precision(&matches, &ranking, 3).unwrap();
        assert!((map - reference_map()).abs() < 1e-9);
        assert!((map - 35.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn cutoff_larger_than_gallery_is_clamped() {
        let (matches, ranking) = fixture();
        let at_gallery = per_query_average_precision(&matches, &ranking, 5).unwrap();
        let oversized = per_query_average_precision(&matches, &ranking, 500).unwrap();
        assert_eq!(at_gallery, oversized);
    }

    #[test]
    fn non_positive_cutoff_is_rejected() {
        let (matches, ranking) = fixture();
        assert!(matches!(
            mean_average_precision(&matches, &ranking, 0),
            Err(HashEvalError::InvalidCutoff(0))
        ));
        assert!(matches!(
            mean_average_precision(&matches, &ranking, -3),
            Err(HashEvalError::InvalidCutoff(-3))
        ));
    }

    #[test]
    fn cutoff_checked_before_shapes() {
        let matches = MatchMatrix::from_labels(&[1, 2], &[1]);
        let ranking = RankingMatrix::from_rows(vec![vec![0, 1], vec![1, 0]]).unwrap();
        assert!(matches!(
            score_queries(&matches, &ranking, 0, false),
            Err(HashEvalError::InvalidCutoff(0))
        ));
        assert!(matches!(
            score_queries(&matches, &ranking, 1, false),
            Err(HashEvalError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn distance_shape_must_agree_with_ranking() {
        let (matches, ranking) = fixture();
        let narrow = DistanceMatrix::from_rows(vec![vec![0, 1, 2, 3]; 5]).unwrap();
        assert!(matches!(
            score_ranked_distances(&matches, &narrow, &ranking, 3, false),
            Err(HashEvalError::ShapeMismatch(_))
        ));
        assert!(matches!(
            score_ranked_distances(&matches, &narrow, &ranking, 0, false),
            Err(HashEvalError::InvalidCutoff(0))
        ));

        let full = DistanceMatrix::from_rows(vec![vec![0, 1, 2, 3, 4]; 5]).unwrap();
        let scores = score_ranked_distances(&matches, &full, &ranking, 3, false).unwrap();
        assert_eq!(scores, score_queries(&matches, &ranking, 3, false).unwrap());
    }

    #[test]
    fn zero_match_query_stays_in_denominator() {
        // query 0 matches gallery 0 at rank 1; query 1 has no match anywhere
        let matches = MatchMatrix::from_labels(&[7, 8], &[7, 9]);
        let ranking = RankingMatrix::from_rows(vec![vec![0, 0], vec![1, 1]]).unwrap();
        let map = mean_average_precision(&matches, &ranking, 2).unwrap();
        assert!((map - 0.5).abs() < 1e-12);
    }

    #[test]
    fn diagnostics_on_fixture() {
        let (matches, ranking) = fixture();
        let scores = score_queries(&matches, &ranking, 3, true).unwrap();
        // query 1: ranked [3, 0, 4] -> [miss, hit, miss]; relevant in gallery: 0 and 2
        assert!((scores[1].precision_at_k - 1.0 / 3.0).abs() < 1e-12);
        assert!((scores[1].recall_at_k - 0.5).abs() < 1e-12);
        assert!((scores[1].reciprocal_rank - 0.5).abs() < 1e-12);
        assert_eq!(scores[1].relevant_total, 2);
        assert_eq!(scores, score_queries(&matches, &ranking, 3, false).unwrap());
    }

    #[test]
    fn effective_top_k_bounds() {
        assert_eq!(effective_top_k(3, 10).unwrap(), 3);
        assert_eq!(effective_top_k(30, 10).unwrap(), 10);
        assert!(effective_top_k(0, 10).is_err());
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[0.25, 0.75]) - 0.5).abs() < 1e-12);
    }
}
