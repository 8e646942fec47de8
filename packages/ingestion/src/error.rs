//! Typed errors for the ingestion library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during ingestion operations.
#[derive(Debug, Error)]
pub enum IngestError {
    /// No stored posting matches the given external key
    #[error("job posting not found: {key}")]
    NotFound { key: String },

    /// The store could not be reached or the operation failed in transit.
    /// Propagated unmodified; retry policy belongs to the caller.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The store's per-key insert outcome could not be reconciled with the
    /// input batch. Signals a store adapter defect, not caller misuse.
    #[error("classification inconsistency: {reason}")]
    ClassificationInconsistency { reason: String },

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
