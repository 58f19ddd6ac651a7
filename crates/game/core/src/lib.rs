//! Deterministic duel rules and data types.
//!
//! `duel-core` defines the canonical match model (queue entries, matches,
//! per-player round state), the combat formulas and the phase state machine.
//! Everything is synchronous and side-effect free so the runtime can run it
//! inside store transactions and tests can drive it without a clock.
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod state;
pub mod stats;

pub use combat::{HitResult, Loadout, resolve_hit};
pub use config::{
    BotConfig, CombatConfig, DuelConfig, MatchmakingConfig, PhaseDurations, PhaseTimers,
};
pub use engine::{BattleReport, BattleRules, CardPick, EndTurn, MatchOutcome, RoleAssignment, Step};
pub use env::{AbilityBook, AbilityBookError, AbilityDefinition, AbilityKind};
pub use error::{ActionError, ErrorSeverity};
pub use state::{
    AbilityKey, CardId, Match, MatchId, ParticipantKind, Phase, PlayerId, PlayerMatchState,
    QueueEntry, Role, RoundRecord, Selection, Side, TimersKind,
};
pub use stats::{Stat, StatBlock, StatWeights};
