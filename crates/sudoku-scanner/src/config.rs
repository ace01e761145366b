//! Scanner configuration.
//!
//! The classifier model location used to be a process-wide environment
//! variable; here it is a field on the configuration owned by each scanner.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Cell count of a standard 9x9 puzzle.
pub const DEFAULT_MAX_CELLS: usize = 81;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("max_cells must be positive")]
    ZeroMaxCells,
}

/// Settings shared by detection and extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Classifier model handed to the extractor on every call.
    pub model_path: Option<PathBuf>,
    /// Upper bound on the number of cell codes accepted from the extractor.
    pub max_cells: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl ScannerConfig {
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    /// Parse a JSON object; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cells == 0 {
            return Err(ConfigError::ZeroMaxCells);
        }
        Ok(())
    }
}
