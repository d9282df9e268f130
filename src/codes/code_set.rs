use crate::codes::binary::{binarize, BinaryCode};
use crate::error::{HashEvalError, Result};

/// Ordered set of codes sharing one width D (a gallery or a query set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSet {
    codes: Vec<BinaryCode>,
    dim: usize,
}

impl CodeSet {
    /// Wrap pre-built codes. Every code must have the same, non-zero width.
    pub fn new(codes: Vec<BinaryCode>) -> Result<Self> {
        let dim = codes.first().map(BinaryCode::dim).unwrap_or(0);
        check_width(codes.len(), dim)?;
        if let Some((idx, code)) = codes.iter().enumerate().find(|(_, c)| c.dim() != dim) {
            return Err(HashEvalError::ShapeMismatch(format!(
                "code {} has width {}, expected {}",
                idx,
                code.dim(),
                dim
            )));
        }
        Ok(Self { codes, dim })
    }

    /// Binarize a batch of embeddings (one row per item).
    pub fn binarize(embeddings: &[Vec<f32>]) -> Result<Self> {
        let dim = embeddings.first().map(Vec::len).unwrap_or(0);
        check_width(embeddings.len(), dim)?;
        let mut codes = Vec::with_capacity(embeddings.len());
        for (idx, row) in embeddings.iter().enumerate() {
            if row.len() != dim {
                return Err(HashEvalError::ShapeMismatch(format!(
                    "embedding {} has {} components, expected {}",
                    idx,
                    row.len(),
                    dim
                )));
            }
            codes.push(binarize(row));
        }
        Ok(Self { codes, dim })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Shared code width (0 for an empty set).
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, idx: usize) -> Option<&BinaryCode> {
        self.codes.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BinaryCode> {
        self.codes.iter()
    }

    pub(crate) fn as_slice(&self) -> &[BinaryCode] {
        &self.codes
    }
}

/// A non-empty set needs at least one bit per code.
fn check_width(num_codes: usize, dim: usize) -> Result<()> {
    if num_codes > 0 && dim == 0 {
        return Err(HashEvalError::ShapeMismatch(
            "codes must have at least one bit".to_string(),
        ));
    }
    Ok(())
}
