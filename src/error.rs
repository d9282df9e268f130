use thiserror::Error;

/// Main error type for hasheval
#[derive(Error, Debug)]
pub enum HashEvalError {
    /// Input dimensions disagree (code widths, label counts, matrix shapes)
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Retrieval cutoff K must be positive
    #[error("Invalid cutoff: top_k must be greater than 0, got {0}")]
    InvalidCutoff(i64),

    /// Gallery or query set with no items
    #[error("Empty set: {0}")]
    EmptySet(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient Result type using HashEvalError
pub type Result<T> = std::result::Result<T, HashEvalError>;
