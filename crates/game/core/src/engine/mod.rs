//! Duel rules engine.
//!
//! Pure functions over [`Match`](crate::state::Match) and the queue:
//! pairing, participant actions, role assignment, round archival and the
//! phase state machine. The runtime wraps each call in a store transaction;
//! nothing here performs I/O or reads the clock, so `now` is always passed
//! in.

mod actions;
mod pairing;
mod recorder;
mod roles;
mod transition;

pub use actions::{CardPick, EndTurn, end_turn, forfeit, select_ability, select_card};
pub use pairing::{find_pair, pair_all, queue_order};
pub use recorder::{RecordSummary, record_round};
pub use roles::{RoleAssignment, assign_roles};
pub use transition::{
    BattleReport, BattleRules, MatchOutcome, Step, advance, begin, finish, skip_selection,
};
