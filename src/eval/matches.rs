//! Ground-truth match matrix derived from gallery and query labels.

use crate::error::{HashEvalError, Result};

/// G×T booleans: `get(g, t)` is true iff gallery item g and query item t
/// share an identity label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchMatrix {
    data: Vec<bool>,
    num_gallery: usize,
    num_query: usize,
}

impl MatchMatrix {
    /// Compare every gallery label against every query label.
    pub fn from_labels<L: PartialEq>(gallery_labels: &[L], query_labels: &[L]) -> Self {
        let mut data = Vec::with_capacity(gallery_labels.len() * query_labels.len());
        for g in gallery_labels {
            data.extend(query_labels.iter().map(|q| g == q));
        }
        Self {
            data,
            num_gallery: gallery_labels.len(),
            num_query: query_labels.len(),
        }
    }

    /// Build from explicit gallery rows (`rows[g][t]`).
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self> {
        let num_gallery = rows.len();
        let num_query = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(num_gallery * num_query);
        for (g, row) in rows.into_iter().enumerate() {
            if row.len() != num_query {
                return Err(HashEvalError::ShapeMismatch(format!(
                    "match row {} has {} columns, expected {}",
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

    pub fn get(&self, g: usize, t: usize) -> bool {
        self.data[g * self.num_query + t]
    }

    /// Number of gallery items sharing query `t`'s label, across the whole gallery.
    pub fn relevant_count(&self, t: usize) -> usize {
        (0..self.num_gallery).filter(|&g| self.get(g, t)).count()
    }
}
