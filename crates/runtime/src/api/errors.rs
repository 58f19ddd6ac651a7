//! Unified error types surfaced by the arena API.
//!
//! Wraps rule rejections, store failures and worker coordination problems so
//! callers (the HTTP layer, bots, tests) can map them consistently.
use thiserror::Error;

use duel_core::{ActionError, ErrorSeverity};

pub use crate::repository::StoreError;

pub type Result<T> = std::result::Result<T, ArenaError>;

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load content: {0}")]
    Content(String),

    #[error("arena worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl ArenaError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Action(error) => error.severity(),
            Self::InvalidRequest(_) => ErrorSeverity::Validation,
            Self::Store(_) | Self::InvalidConfig(_) | Self::Content(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Internal
            }
        }
    }

    /// Stable identifier for clients and logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Action(error) => error.error_code(),
            Self::InvalidRequest(_) => "invalid_request",
            Self::Store(_) => "store_error",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Content(_) => "content_error",
            Self::WorkerJoin(_) => "worker_join",
        }
    }

    pub fn as_action(&self) -> Option<&ActionError> {
        match self {
            Self::Action(error) => Some(error),
            _ => None,
        }
    }
}
