//! Per-query ranking of gallery indices by ascending distance.

use crate::distance::DistanceMatrix;
use crate::error::{HashEvalError, Result};
use rayon::prelude::*;

/// G×T ranking matrix. Column t is a permutation of gallery indices ordered
/// by non-decreasing `dist[·][t]`; equal distances keep ascending gallery index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingMatrix {
    /// Query-major: `columns[t][r]` is the gallery index at rank r for query t.
    columns: Vec<Vec<usize>>,
    num_gallery: usize,
}

impl RankingMatrix {
    /// Stable argsort of every distance column.
    pub fn from_distances(dist: &DistanceMatrix, parallel: bool) -> Self {
        let (num_gallery, num_query) = dist.shape();
        let rank_column = |t: usize| {
            let column = dist.column(t);
            let mut order: Vec<usize> = (0..num_gallery).collect();
            order.sort_by_key(|&g| column[g]);
            order
        };
        let columns: Vec<Vec<usize>> = if parallel {
            (0..num_query).into_par_iter().map(rank_column).collect()
        } else {
            (0..num_query).map(rank_column).collect()
        };
        Self {
            columns,
            num_gallery,
        }
    }

    /// Build from rank rows (`rows[r][t]`), as fixtures are usually written.
    ///
    /// Each column must be a permutation of `0..G`.
    pub fn from_rows(rows: Vec<Vec<usize>>) -> Result<Self> {
        let num_gallery = rows.len();
        let num_query = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((r, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != num_query) {
            return Err(HashEvalError::ShapeMismatch(format!(
                "ranking row {} has {} columns, expected {}",
                r,
                row.len(),
                num_query
            )));
        }

        let mut columns = Vec::with_capacity(num_query);
        for t in 0..num_query {
            let column: Vec<usize> = rows.iter().map(|row| row[t]).collect();
            let mut seen = vec![false; num_gallery];
            for &g in &column {
                if g >= num_gallery || seen[g] {
                    return Err(HashEvalError::ShapeMismatch(format!(
                        "ranking column {} is not a permutation of 0..{}",
                        t, num_gallery
                    )));
                }
                seen[g] = true;
            }
            columns.push(column);
        }
        Ok(Self {
            columns,
            num_gallery,
        })
    }

    /// (G, T)
    pub fn shape(&self) -> (usize, usize) {
        (self.num_gallery, self.columns.len())
    }

    /// Gallery index at rank `r` (0-based) for query `t`.
    pub fn get(&self, r: usize, t: usize) -> usize {
        self.columns[t][r]
    }

    /// Full ranking for query `t`, nearest first.
    pub fn column(&self, t: usize) -> &[usize] {
        &self.columns[t]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_ascending_distance() {
        let dist = DistanceMatrix::from_rows(vec![vec![5, 0], vec![1, 3], vec![3, 1]]).unwrap();
        let ranking = RankingMatrix::from_distances(&dist, false);
        assert_eq!(ranking.shape(), (3, 2));
        assert_eq!(ranking.column(0), &[1, 2, 0]);
        assert_eq!(ranking.column(1), &[0, 2, 1]);
    }

    #[test]
    fn ties_keep_gallery_order() {
        let dist =
            DistanceMatrix::from_rows(vec![vec![2], vec![1], vec![2], vec![1], vec![0]]).unwrap();
        let ranking = RankingMatrix::from_distances(&dist, true);
        assert_eq!(ranking.column(0), &[4, 1, 3, 0, 2]);
    }

    #[test]
    fn columns_are_permutations() {
        let rows: Vec<Vec<u32>> = (0..20)
            .map(|g| (0..7).map(|t| ((g * 7 + t * 3) % 5) as u32).collect())
            .collect();
        let dist = DistanceMatrix::from_rows(rows).unwrap();
        let ranking = RankingMatrix::from_distances(&dist, true);
        for t in 0..7 {
            let mut sorted = ranking.column(t).to_vec();
            for pair in ranking.column(t).windows(2) {
                assert!(dist.get(pair[0], t) <= dist.get(pair[1], t));
            }
            sorted.sort_unstable();
            assert_eq!(sorted, (0..20).collect::<Vec<_>>());
        }
        assert_eq!(ranking, RankingMatrix::from_distances(&dist, false));
    }

    #[test]
    fn from_rows_transposes() {
        let ranking = RankingMatrix::from_rows(vec![vec![0, 1], vec![1, 0]]).unwrap();
        assert_eq!(ranking.get(0, 1), 1);
        assert_eq!(ranking.column(1), &[1, 0]);
    }

    #[test]
    fn from_rows_rejects_duplicates_and_out_of_range() {
        assert!(RankingMatrix::from_rows(vec![vec![0], vec![0]]).is_err());
        assert!(RankingMatrix::from_rows(vec![vec![0], vec![2]]).is_err());
        assert!(RankingMatrix::from_rows(vec![vec![0, 1], vec![1]]).is_err());
    }
}
