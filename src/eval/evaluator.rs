//! End-to-end scoring: embeddings and labels in, mAP report out.
//!
//! Stages run strictly forward (binarize → distances → ranking → scores) and
//! every stage validates its own inputs before doing any work.

use crate::codes::CodeSet;
use crate::config::{Config, EvalConfig};
use crate::distance::hamming_matrix;
use crate::error::{HashEvalError, Result};
use crate::eval::matches::MatchMatrix;
use crate::eval::metrics::{effective_top_k, mean, score_ranked_distances, QueryScore};
use crate::eval::ranking::RankingMatrix;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One side of an evaluation (gallery or query): embedding rows and their labels.
#[derive(Debug, Clone, Deserialize)]
pub struct EvalSet<L> {
    pub embeddings: Vec<Vec<f32>>,
    pub labels: Vec<L>,
}

/// Result of one evaluation call.
#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub mean_ap: f64,
    pub per_query_ap: Vec<f64>,
    /// Cutoff actually used, after clamping to the gallery size.
    pub top_k: usize,
    pub requested_top_k: i64,
    pub num_gallery: usize,
    pub num_query: usize,
    pub hash_dim: usize,
    /// Queries whose label appears nowhere in the gallery (scored 0, still averaged).
    pub zero_match_queries: usize,
    pub mean_precision_at_k: f64,
    pub mean_recall_at_k: f64,
    pub mean_reciprocal_rank: f64,
    pub evaluated_at: String,
}

/// Runs evaluations with a fixed cutoff and execution mode.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.eval.clone())
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Binarize both embedding sets and score the query set against the gallery.
    pub fn evaluate<L: PartialEq>(
        &self,
        gallery: &EvalSet<L>,
        query: &EvalSet<L>,
    ) -> Result<EvalReport> {
        self.check_cutoff()?;
        check_set("gallery", gallery.embeddings.len(), gallery.labels.len())?;
        check_set("query", query.embeddings.len(), query.labels.len())?;

        let start = Instant::now();
        let gallery_codes = CodeSet::binarize(&gallery.embeddings)?;
        let query_codes = CodeSet::binarize(&query.embeddings)?;
        log::debug!("Binarization took {:?}", start.elapsed());

        self.evaluate_codes(&gallery_codes, &gallery.labels, &query_codes, &query.labels)
    }

    /// Score pre-binarized codes.
    pub fn evaluate_codes<L: PartialEq>(
        &self,
        gallery: &CodeSet,
        gallery_labels: &[L],
        query: &CodeSet,
        query_labels: &[L],
    ) -> Result<EvalReport> {
        self.check_cutoff()?;
        check_set("gallery", gallery.len(), gallery_labels.len())?;
        check_set("query", query.len(), query_labels.len())?;
        if let Some(expected) = self.config.hash_dim {
            for (name, set) in [("gallery", gallery), ("query", query)] {
                if set.dim() != expected {
                    return Err(HashEvalError::ShapeMismatch(format!(
                        "{} codes have width {}, configured hash_dim is {}",
                        name,
                        set.dim(),
                        expected
                    )));
                }
            }
        }

        let parallel = self.config.parallel;

        let start = Instant::now();
        let dist = hamming_matrix(gallery, query, parallel)?;
        log::debug!("Distance matrix took {:?}", start.elapsed());

        let start = Instant::now();
        let ranking = RankingMatrix::from_distances(&dist, parallel);
        log::debug!("Ranking took {:?}", start.elapsed());

        let matches = MatchMatrix::from_labels(gallery_labels, query_labels);
        let scores =
            score_ranked_distances(&matches, &dist, &ranking, self.config.top_k, parallel)?;

        let zero_match_queries = scores.iter().filter(|s| s.relevant_total == 0).count();
        if zero_match_queries > 0 {
            log::warn!(
                "{} of {} queries have no matching label in the gallery; they score 0",
                zero_match_queries,
                scores.len()
            );
        }

        let report = build_report(
            &scores,
            effective_top_k(self.config.top_k, gallery.len())?,
            self.config.top_k,
            gallery.len(),
            gallery.dim(),
            zero_match_queries,
        );
        log::info!(
            "mAP@{} = {:.4} over {} queries ({} gallery items)",
            report.top_k,
            report.mean_ap,
            report.num_query,
            report.num_gallery
        );
        Ok(report)
    }

    fn check_cutoff(&self) -> Result<()> {
        if self.config.top_k <= 0 {
            return Err(HashEvalError::InvalidCutoff(self.config.top_k));
        }
        Ok(())
    }
}

fn check_set(name: &str, num_items: usize, num_labels: usize) -> Result<()> {
    if num_items == 0 {
        return Err(HashEvalError::EmptySet(format!("{} set has no items", name)));
    }
    if num_items != num_labels {
        return Err(HashEvalError::ShapeMismatch(format!(
            "{} set has {} items but {} labels",
            name, num_items, num_labels
        )));
    }
    Ok(())
}

fn build_report(
    scores: &[QueryScore],
    top_k: usize,
    requested_top_k: i64,
    num_gallery: usize,
    hash_dim: usize,
    zero_match_queries: usize,
) -> EvalReport {
    let per_query_ap: Vec<f64> = scores.iter().map(|s| s.average_precision).collect();
    let precisions: Vec<f64> = scores.iter().map(|s| s.precision_at_k).collect();
    let recalls: Vec<f64> = scores.iter().map(|s| s.recall_at_k).collect();
    let reciprocal_ranks: Vec<f64> = scores.iter().map(|s| s.reciprocal_rank).collect();

    EvalReport {
        mean_ap: mean(&per_query_ap),
        per_query_ap,
        top_k,
        requested_top_k,
        num_gallery,
        num_query: scores.len(),
        hash_dim,
        zero_match_queries,
        mean_precision_at_k: mean(&precisions),
        mean_recall_at_k: mean(&recalls),
        mean_reciprocal_rank: mean(&reciprocal_ranks),
        evaluated_at: Utc::now().to_rfc3339(),
    }
}
