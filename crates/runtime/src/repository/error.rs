//! Error types raised by tree store implementations.

use thiserror::Error;

/// Errors surfaced by tree store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tree store lock was poisoned")]
    LockPoisoned,

    /// A batch precondition did not hold; nothing in the batch was applied.
    #[error("precondition failed at {path}: {reason}")]
    Conflict { path: String, reason: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error at {path}: {message}")]
    Json { path: String, message: String },

    #[error("corrupted snapshot: {0}")]
    CorruptedData(String),

    #[error("transaction on {0} did not run")]
    TransactionSkipped(String),
}

impl StoreError {
    pub(crate) fn json(path: &str, error: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_owned(),
            message: error.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
