//! The 5×5 reference fixture: a hand-checked match matrix and ranking with
//! known per-query AP at top_k = 3.

use crate::error::Result;
use crate::eval::matches::MatchMatrix;
use crate::eval::ranking::RankingMatrix;

/// Cutoff the expected values were computed at.
pub const REFERENCE_TOP_K: i64 = 3;

/// Expected per-query AP at `REFERENCE_TOP_K`.
pub const REFERENCE_AP: [f64; 5] = [5.0 / 6.0, 1.0 / 2.0, 1.0, 7.0 / 12.0, 0.0];

const MATCH_ROWS: [[u8; 5]; 5] = [
    [1, 1, 0, 1, 0],
    [1, 0, 1, 0, 1],
    [1, 1, 1, 1, 0],
    [0, 0, 0, 0, 0],
    [0, 0, 1, 0, 1],
];

const RANK_ROWS: [[usize; 5]; 5] = [
    [0, 3, 2, 1, 0],
    [4, 0, 4, 0, 2],
    [1, 4, 1, 2, 3],
    [3, 1, 0, 3, 1],
    [2, 2, 3, 4, 4],
];

/// Expected mAP: plain mean of `REFERENCE_AP` (35/60).
pub fn reference_map() -> f64 {
    REFERENCE_AP.iter().sum::<f64>() / REFERENCE_AP.len() as f64
}

/// Match matrix (gallery rows) and ranking matrix (rank rows) of the fixture.
pub fn reference_fixture() -> Result<(MatchMatrix, RankingMatrix)> {
    let matches = MatchMatrix::from_rows(
        MATCH_ROWS
            .iter()
            .map(|row| row.iter().map(|&v| v == 1).collect())
            .collect(),
    )?;
    let ranking = RankingMatrix::from_rows(RANK_ROWS.iter().map(|row| row.to_vec()).collect())?;
    Ok((matches, ranking))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_shapes() {
        let (matches, ranking) = reference_fixture().unwrap();
        assert_eq!(matches.shape(), (5, 5));
        assert_eq!(ranking.shape(), (5, 5));
        assert_eq!(matches.relevant_count(4), 2);
    }

    #[test]
    fn reference_map_is_35_over_60() {
        assert!((reference_map() - 35.0 / 60.0).abs() < 1e-12);
    }
}
