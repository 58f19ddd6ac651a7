use duel_core::{MatchId, ParticipantKind, Phase, PlayerId, TimersKind};
use serde::{Deserialize, Serialize};

/// Queue membership changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum QueueEvent {
    PlayerQueued {
        player: PlayerId,
        synergy: u32,
        kind: ParticipantKind,
    },
    PlayerLeft {
        player: PlayerId,
    },
    BotSpawned {
        bot: PlayerId,
        bot_for: PlayerId,
        synergy: u32,
    },
    /// A bot whose human left the queue was removed.
    BotRetired {
        bot: PlayerId,
    },
}

/// Match lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MatchEvent {
    Created {
        match_id: MatchId,
        player1: PlayerId,
        player2: PlayerId,
        timers_type: TimersKind,
    },
    PhaseChanged {
        match_id: MatchId,
        phase: Phase,
        round: u32,
    },
    RoundResolved {
        match_id: MatchId,
        round: u32,
        attacker: PlayerId,
        defender: PlayerId,
        damage: u32,
        defender_synergy: u32,
    },
    Finished {
        match_id: MatchId,
        winner: Option<PlayerId>,
        loser: Option<PlayerId>,
    },
    Cancelled {
        match_id: MatchId,
        winner: Option<PlayerId>,
        loser: Option<PlayerId>,
    },
    Removed {
        match_id: MatchId,
    },
}

impl MatchEvent {
    pub fn match_id(&self) -> &MatchId {
        match self {
            Self::Created { match_id, .. }
            | Self::PhaseChanged { match_id, .. }
            | Self::RoundResolved { match_id, .. }
            | Self::Finished { match_id, .. }
            | Self::Cancelled { match_id, .. }
            | Self::Removed { match_id } => match_id,
        }
    }
}
