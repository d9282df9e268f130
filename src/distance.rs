//! Pairwise Hamming distance between a gallery and a query code set.

use crate::codes::{BinaryCode, CodeSet};
use crate::error::{HashEvalError, Result};
use rayon::prelude::*;

/// Dense G×T distance matrix, gallery-major. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMatrix {
    data: Vec<u32>,
    num_gallery: usize,
    num_query: usize,
}

impl DistanceMatrix {
    /// Build from gallery rows (`rows[g][t]`). Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self> {
        let num_gallery = rows.len();
        let num_query = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(num_gallery * num_query);
        for (g, row) in rows.into_iter().enumerate() {
            if row.len() != num_query {
                return Err(HashEvalError::ShapeMismatch(format!(
                    "distance row {} has {} columns, expected {}",
                    g,
                    row.len(),
                    num_query
                )));
            }
            data.extend(row);
        }
        Ok(Self {
            data,
            num_gallery,
            num_query,
        })
    }

    /// (G, T)
    pub fn shape(&self) -> (usize, usize) {
        (self.num_gallery, self.num_query)
    }

    /// Distance between gallery item `g` and query item `t`.
    pub fn get(&self, g: usize, t: usize) -> u32 {
        self.data[g * self.num_query + t]
    }

    /// Distances from every gallery item to query `t`.
    pub fn column(&self, t: usize) -> Vec<u32> {
        (0..self.num_gallery).map(|g| self.get(g, t)).collect()
    }
}

/// Compute `dist[g][t] = popcount(gallery[g] XOR query[t])` for every pair.
///
/// With `parallel` set, gallery rows are filled on the rayon pool; the result
/// is identical to the serial path.
pub fn hamming_matrix(
    gallery: &CodeSet,
    query: &CodeSet,
    parallel: bool,
) -> Result<DistanceMatrix> {
    if gallery.dim() != query.dim() {
        return Err(HashEvalError::ShapeMismatch(format!(
            "gallery codes have width {}, query codes have width {}",
            gallery.dim(),
            query.dim()
        )));
    }

    let num_gallery = gallery.len();
    let num_query = query.len();
    let queries = query.as_slice();
    let mut data = vec![0u32; num_gallery * num_query];

    if num_query > 0 {
        let fill_row = |(g_code, row): (&BinaryCode, &mut [u32])| {
            for (cell, q_code) in row.iter_mut().zip(queries.iter()) {
                *cell = g_code.hamming_unchecked(q_code);
            }
        };
        if parallel {
            gallery
                .as_slice()
                .par_iter()
                .zip(data.par_chunks_mut(num_query))
                .for_each(fill_row);
        } else {
            gallery
                .as_slice()
                .iter()
                .zip(data.chunks_mut(num_query))
                .for_each(fill_row);
        }
    }

    log::debug!(
        "Distance matrix: {}x{} over {}-bit codes",
        num_gallery,
        num_query,
        gallery.dim()
    );

    Ok(DistanceMatrix {
        data,
        num_gallery,
        num_query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(rows: &[&[u8]]) -> CodeSet {
        CodeSet::new(
            rows.iter()
                .map(|r| BinaryCode::from_bits(&r.iter().map(|&b| b == 1).collect::<Vec<_>>()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn small_matrix_values() {
        let gallery = codes(&[&[0, 0, 0, 0], &[1, 1, 1, 1], &[1, 0, 1, 0]]);
        let query = codes(&[&[0, 0, 0, 0], &[1, 1, 0, 0]]);
        let dist = hamming_matrix(&gallery, &query, false).unwrap();
        assert_eq!(dist.shape(), (3, 2));
        assert_eq!(dist.column(0), vec![0, 4, 2]);
        assert_eq!(dist.column(1), vec![2, 2, 2]);
    }

    #[test]
    fn parallel_matches_serial() {
        let rows: Vec<Vec<f32>> = (0..40)
            .map(|i| (0..100).map(|j| (((i * 31 + j * 17) % 13) as f32) - 6.0).collect())
            .collect();
        let gallery = CodeSet::binarize(&rows[..25]).unwrap();
        let query = CodeSet::binarize(&rows[25..]).unwrap();
        let serial = hamming_matrix(&gallery, &query, false).unwrap();
        let parallel = hamming_matrix(&gallery, &query, true).unwrap();
        assert_eq!(serial, parallel);
        for g in 0..25 {
            for t in 0..15 {
                assert!(serial.get(g, t) <= 100);
            }
        }
    }

    #[test]
    fn self_distance_is_zero_diagonal() {
        let set = codes(&[&[1, 0, 1], &[0, 1, 1], &[1, 1, 1]]);
        let dist = hamming_matrix(&set, &set, true).unwrap();
        for i in 0..3 {
            assert_eq!(dist.get(i, i), 0);
            for j in 0..3 {
                assert_eq!(dist.get(i, j), dist.get(j, i));
            }
        }
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let gallery = codes(&[&[1, 0, 1]]);
        let query = codes(&[&[1, 0]]);
        assert!(matches!(
            hamming_matrix(&gallery, &query, false),
            Err(HashEvalError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn from_rows_rejects_ragged() {
        assert!(DistanceMatrix::from_rows(vec![vec![1, 2], vec![3]]).is_err());
        let m = DistanceMatrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
        assert_eq!(m.get(1, 0), 3);
    }
}
