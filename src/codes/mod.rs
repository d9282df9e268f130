//! Binary hash codes: sign binarization of embeddings and packed bit storage.

pub mod binary;
pub mod code_set;

pub use binary::{binarize, binarize_bits, BinaryCode};
pub use code_set::CodeSet;
