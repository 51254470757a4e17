//! Error types for catalog operations.

/// Errors produced while reading or writing the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid record {path}: {reason}")]
    InvalidRecord { path: String, reason: String },
}
