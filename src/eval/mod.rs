//! Retrieval evaluation: match matrix, per-query ranking, AP/mAP and diagnostics.

pub mod evaluator;
pub mod fixture;
pub mod matches;
pub mod metrics;
pub mod ranking;

pub use evaluator::{EvalReport, EvalSet, Evaluator};
pub use matches::MatchMatrix;
pub use metrics::{
    average_precision, effective_top_k, mean_average_precision, per_query_average_precision,
    precision_at_k, recall_at_k, reciprocal_rank, score_queries, score_ranked_distances,
    QueryScore,
};
pub use ranking::RankingMatrix;
