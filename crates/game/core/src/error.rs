//! Error infrastructure for duel-core.
//!
//! Participant-facing action failures are returned as [`ActionError`]; each
//! variant carries a severity so callers can decide whether to surface,
//! swallow or log it.

use crate::state::{MatchId, Phase, PlayerId};

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The target is gone or the request raced a transition; treat as resolved.
    Recoverable,

    /// Invalid input, should not retry without changes.
    Validation,

    /// Repeated request with no further effect.
    Duplicate,

    /// Infrastructure failure unrelated to the request's content.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Duplicate => "duplicate",
            Self::Internal => "internal",
        }
    }
}

/// Rejection of a participant action. No state is mutated when one is returned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("match {0} not found")]
    MatchNotFound(MatchId),

    #[error("player {player} is not a participant of match {match_id}")]
    InvalidParticipant { match_id: MatchId, player: PlayerId },

    #[error("action not allowed during {phase} phase")]
    InvalidPhase { phase: Phase },

    #[error("player {player} already {action} this round")]
    DuplicateAction {
        player: PlayerId,
        action: &'static str,
    },

    #[error("unknown ability {0:?}")]
    UnknownAbility(String),

    #[error("player {0} is already playing a match")]
    AlreadyInMatch(PlayerId),
}

impl ActionError {
    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MatchNotFound(_) => ErrorSeverity::Recoverable,
            Self::DuplicateAction { .. } => ErrorSeverity::Duplicate,
            Self::InvalidParticipant { .. }
            | Self::InvalidPhase { .. }
            | Self::UnknownAbility(_)
            | Self::AlreadyInMatch(_) => ErrorSeverity::Validation,
        }
    }

    /// Stable identifier for clients and metrics.
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MatchNotFound(_) => "not_found",
            Self::InvalidParticipant { .. } => "invalid_participant",
            Self::InvalidPhase { .. } => "invalid_phase",
            Self::DuplicateAction { .. } => "duplicate_action",
            Self::UnknownAbility(_) => "unknown_ability",
            Self::AlreadyInMatch(_) => "already_in_match",
        }
    }
}
