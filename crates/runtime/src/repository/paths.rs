//! Path layout of the tree store.
//!
//! ```text
//! queue/{playerId}       QueueEntry
//! matches/{matchId}      Match
//! matchIndex/{matchId}   MatchIndexEntry, removed shortly after creation
//! ```
use serde::{Deserialize, Serialize};

use duel_core::{Match, MatchId, PlayerId};

pub const QUEUE: &str = "queue/";
pub const MATCHES: &str = "matches/";
pub const MATCH_INDEX: &str = "matchIndex/";

pub fn queue(player: &PlayerId) -> String {
    format!("{QUEUE}{player}")
}

pub fn match_doc(id: &MatchId) -> String {
    format!("{MATCHES}{id}")
}

pub fn match_index(id: &MatchId) -> String {
    format!("{MATCH_INDEX}{id}")
}

/// Whether `segment` can be used as a single path component.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('/') && segment.trim() == segment
}

/// Discovery pointer written next to a freshly created match so clients that
/// raced the pairing can find it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchIndexEntry {
    pub match_id: MatchId,
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub created_at: i64,
}

impl MatchIndexEntry {
    pub fn for_match(m: &Match) -> Self {
        Self {
            match_id: m.id.clone(),
            player1: m.player1.user_id.clone(),
            player2: m.player2.user_id.clone(),
            created_at: m.started_at,
        }
    }
}
