use crate::error::HashEvalError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub eval: EvalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub report: ReportConfig,
    /// File the configuration was read from; None when defaults were used.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Evaluation parameters passed into every evaluation call
#[derive(Debug, Clone, Deserialize)]
pub struct EvalConfig {
    /// Retrieval cutoff K. Values larger than the gallery are clamped at
    /// evaluation time; values <= 0 are rejected.
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    /// Expected code width. When set, every embedding must have exactly this
    /// many components.
    #[serde(default)]
    pub hash_dim: Option<usize>,
    /// Compute distance rows and per-query scores on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            hash_dim: None,
            parallel: default_parallel(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Report / CLI output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportConfig {
    /// Minimum acceptable mAP; the CLI exits non-zero below it.
    #[serde(default)]
    pub min_map: Option<f64>,
    /// Print the per-query AP table.
    #[serde(default)]
    pub per_query: bool,
}

fn default_top_k() -> i64 {
    3
}

fn default_parallel() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in HASHEVAL_CONFIG environment variable (must exist)
    /// 2. ./config.toml in current directory (defaults are used when absent)
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = match std::env::var("HASHEVAL_CONFIG") {
            Ok(path) => PathBuf::from(path),
            Err(_) => {
                let default_path = PathBuf::from("config.toml");
                if !default_path.exists() {
                    return Ok(Config::default());
                }
                default_path
            }
        };

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config = Self::from_toml_str(&config_str)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        config.source = Some(config_path);

        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.eval.top_k <= 0 {
            return Err(HashEvalError::Config(format!(
                "eval.top_k must be greater than 0, got {}",
                self.eval.top_k
            )));
        }

        if self.eval.hash_dim == Some(0) {
            return Err(HashEvalError::Config(
                "eval.hash_dim must be greater than 0".to_string(),
            ));
        }

        if let Some(min_map) = self.report.min_map {
            if !(0.0..=1.0).contains(&min_map) {
                return Err(HashEvalError::Config(format!(
                    "report.min_map must be between 0.0 and 1.0, got {}",
                    min_map
                )));
            }
        }

        Ok(())
    }
}
