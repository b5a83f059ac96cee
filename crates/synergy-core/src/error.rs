//! Error types for catalog loading and search runs

use std::path::PathBuf;
use thiserror::Error;

/// Result type for synergy operations
pub type Result<T> = std::result::Result<T, SynergyError>;

/// Errors that can occur while loading inputs or persisting results.
///
/// Per-candidate evaluation failures are not errors; an invalid team is the
/// expected negative outcome of the evaluator and is silently dropped.
#[derive(Debug, Error)]
pub enum SynergyError {
    /// A required input file does not exist
    #[error("input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    /// The champion catalog violates a structural constraint
    #[error("malformed champion catalog: {0}")]
    MalformedCatalog(String),

    /// The synergy threshold table violates a structural constraint
    #[error("malformed threshold table: {0}")]
    MalformedThresholds(String),

    /// Requested team size is non-positive or exceeds the catalog size
    #[error("invalid team size {size}: must be between 1 and {catalog_size}")]
    InvalidTeamSize { size: usize, catalog_size: usize },

    /// An input file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The result sink could not persist a record
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynergyError {
    pub fn malformed_catalog(message: impl Into<String>) -> Self {
        SynergyError::MalformedCatalog(message.into())
    }

    pub fn malformed_thresholds(message: impl Into<String>) -> Self {
        SynergyError::MalformedThresholds(message.into())
    }
}
