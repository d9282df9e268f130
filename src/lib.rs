pub mod codes;
pub mod config;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod eval;

pub use codes::{binarize, BinaryCode, CodeSet};
pub use config::Config;
pub use distance::{hamming_matrix, DistanceMatrix};
pub use error::{HashEvalError, Result};
pub use eval::{EvalReport, EvalSet, Evaluator};
