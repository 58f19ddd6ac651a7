//! Persisted data model: identifiers, queue entries and the match aggregate.

mod duel;
mod ids;
mod phase;
mod queue;

pub use duel::{Match, PlayerMatchState, RoundRecord, Selection, Side};
pub use ids::{AbilityKey, CardId, MatchId, PlayerId};
pub use phase::{ParticipantKind, Phase, Role, TimersKind};
pub use queue::QueueEntry;
