//! JSON dataset files read by the CLI.
//!
//! ```json
//! {
//!   "gallery": { "embeddings": [[0.3, -1.2, ...], ...], "labels": [4, 7, ...] },
//!   "query":   { "embeddings": [[...], ...],           "labels": [4, ...] }
//! }
//! ```
//!
//! Labels may be integers or strings; an integer never equals a string.

use crate::error::Result;
use crate::eval::EvalSet;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Identity label of a gallery or query item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Id(i64),
    Name(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Id(id) => write!(f, "{}", id),
            Label::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Gallery and query embeddings with labels.
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    pub gallery: EvalSet<Label>,
    pub query: EvalSet<Label>,
}

impl Dataset {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let dataset = Self::from_json_str(&json)?;
        log::debug!(
            "Loaded dataset {}: {} gallery, {} query items",
            path.display(),
            dataset.gallery.labels.len(),
            dataset.query.labels.len()
        );
        Ok(dataset)
    }
}
