//! Packed binary codes (1 bit per dimension).
//!
//! Bit i of a code lives in word i / 64 at position i % 64. Tail bits past
//! `dim` are always zero so XOR + popcount over whole words is exact.

use crate::error::{HashEvalError, Result};

const WORD_BITS: usize = 64;

/// Fixed-length binary code packed into u64 words
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryCode {
    words: Vec<u64>,
    dim: usize,
}

impl BinaryCode {
    /// All-zero code of `dim` bits.
    pub fn zeros(dim: usize) -> Self {
        Self {
            words: vec![0; dim.div_ceil(WORD_BITS)],
            dim,
        }
    }

    /// Pack a boolean vector.
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut code = Self::zeros(bits.len());
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                code.words[i / WORD_BITS] |= 1u64 << (i % WORD_BITS);
            }
        }
        code
    }

    /// Number of bits (hash dimensionality D).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Packed words, least significant bit first.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Bit at `idx`. Out-of-range indices read as false.
    pub fn get(&self, idx: usize) -> bool {
        if idx >= self.dim {
            return false;
        }
        (self.words[idx / WORD_BITS] >> (idx % WORD_BITS)) & 1 == 1
    }

    /// Set bit at `idx`. Out-of-range indices are ignored so the tail stays zero.
    pub fn set(&mut self, idx: usize, value: bool) {
        if idx >= self.dim {
            return;
        }
        let mask = 1u64 << (idx % WORD_BITS);
        if value {
            self.words[idx / WORD_BITS] |= mask;
        } else {
            self.words[idx / WORD_BITS] &= !mask;
        }
    }

    /// Unpack into a boolean vector of length `dim`.
    pub fn to_bits(&self) -> Vec<bool> {
        (0..self.dim).map(|i| self.get(i)).collect()
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Hamming distance: number of bit positions that differ.
    ///
    /// Fails with `ShapeMismatch` when the two codes have different widths.
    pub fn hamming(&self, other: &BinaryCode) -> Result<u32> {
        if self.dim != other.dim {
            return Err(HashEvalError::ShapeMismatch(format!(
                "cannot compare codes of width {} and {}",
                self.dim, other.dim
            )));
        }
        Ok(self.hamming_unchecked(other))
    }

    /// XOR + popcount over packed words. Caller guarantees equal widths.
    #[inline]
    pub(crate) fn hamming_unchecked(&self, other: &BinaryCode) -> u32 {
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// Sign-threshold an embedding into a packed code: bit i is set iff value i > 0.
///
/// Zero (either sign) and NaN map to false.
pub fn binarize(values: &[f32]) -> BinaryCode {
    let mut code = BinaryCode::zeros(values.len());
    for (i, &v) in values.iter().enumerate() {
        if v > 0.0 {
            code.words[i / WORD_BITS] |= 1u64 << (i % WORD_BITS);
        }
    }
    code
}

/// Sign-threshold an embedding into a plain boolean vector.
pub fn binarize_bits(values: &[f32]) -> Vec<bool> {
    values.iter().map(|&v| v > 0.0).collect()
}
