//! The match aggregate and its per-player state.
use std::collections::BTreeMap;

use super::ids::{AbilityKey, CardId, MatchId, PlayerId};
use super::phase::{ParticipantKind, Phase, Role, TimersKind};
use super::queue::QueueEntry;
use crate::stats::StatBlock;

/// Transient choices a player made during the current round.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct Selection {
    pub card_id: Option<CardId>,
    pub stats: Option<StatBlock>,
    pub photo_ref: Option<String>,
    pub ability_selected: Option<AbilityKey>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.card_id.is_none() && self.ability_selected.is_none()
    }

    pub fn has_card(&self) -> bool {
        self.card_id.is_some()
    }
}

/// Archived choices for one finished round.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct RoundRecord {
    pub card_id: Option<CardId>,
    pub ability: Option<AbilityKey>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PlayerMatchState {
    pub user_id: PlayerId,
    pub display_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: ParticipantKind,
    /// Remaining power; only ever decreases.
    pub synergy: u32,
    pub initial_synergy: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub photo_ref: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub current_role: Option<Role>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub current_round: Selection,
    /// Append-only: round number to archived choices.
    #[cfg_attr(feature = "serde", serde(default))]
    pub previous_rounds: BTreeMap<u32, RoundRecord>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub end_flag: bool,
}

impl PlayerMatchState {
    pub fn from_entry(entry: &QueueEntry) -> Self {
        Self {
            user_id: entry.player_id.clone(),
            display_name: entry.display_name.clone(),
            kind: entry.kind,
            synergy: entry.synergy,
            initial_synergy: entry.initial_synergy,
            photo_ref: entry.photo_ref.clone(),
            current_role: None,
            current_round: Selection::default(),
            previous_rounds: BTreeMap::new(),
            end_flag: false,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.kind == ParticipantKind::Bot
    }

    /// Every card this player has already committed in earlier rounds.
    pub fn used_cards(&self) -> impl Iterator<Item = &CardId> {
        self.previous_rounds
            .values()
            .filter_map(|record| record.card_id.as_ref())
    }

    pub fn used_abilities(&self) -> impl Iterator<Item = &AbilityKey> {
        self.previous_rounds
            .values()
            .filter_map(|record| record.ability.as_ref())
    }
}

/// Slot of a participant inside a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Player1, Side::Player2];

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
        }
    }
}

/// Central aggregate: one duel between two participants.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Match {
    pub id: MatchId,
    pub phase: Phase,
    pub round: u32,
    pub max_rounds: u32,
    /// Milliseconds since the Unix epoch of the last phase transition.
    pub phase_start_time: i64,
    pub started_at: i64,
    pub player1: PlayerMatchState,
    pub player2: PlayerMatchState,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_synergy: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub winner_id: Option<PlayerId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub loser_id: Option<PlayerId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub timers_type: TimersKind,
    /// Round in which roles were last assigned; keeps assignment idempotent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub roles_round: Option<u32>,
}

impl Match {
    /// Builds a fresh match in `cooldown`, round 0.
    pub fn new(
        id: MatchId,
        first: &QueueEntry,
        second: &QueueEntry,
        max_rounds: u32,
        now: i64,
    ) -> Self {
        let timers_type = if first.tutorial || second.tutorial {
            TimersKind::Tutorial
        } else {
            TimersKind::Normal
        };

        Self {
            id,
            phase: Phase::Cooldown,
            round: 0,
            max_rounds,
            phase_start_time: now,
            started_at: now,
            player1: PlayerMatchState::from_entry(first),
            player2: PlayerMatchState::from_entry(second),
            max_synergy: None,
            winner_id: None,
            loser_id: None,
            timers_type,
            roles_round: None,
        }
    }

    pub fn side_of(&self, player: &PlayerId) -> Option<Side> {
        if &self.player1.user_id == player {
            Some(Side::Player1)
        } else if &self.player2.user_id == player {
            Some(Side::Player2)
        } else {
            None
        }
    }

    pub fn player(&self, side: Side) -> &PlayerMatchState {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    pub fn player_mut(&mut self, side: Side) -> &mut PlayerMatchState {
        match side {
            Side::Player1 => &mut self.player1,
            Side::Player2 => &mut self.player2,
        }
    }

    pub fn players(&self) -> [&PlayerMatchState; 2] {
        [&self.player1, &self.player2]
    }

    /// Side holding the attack role, if roles have been assigned.
    pub fn attacker(&self) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|&side| self.player(side).current_role == Some(Role::Attack))
    }

    pub fn both_ended(&self) -> bool {
        self.player1.end_flag && self.player2.end_flag
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Round number at which the match must finish.
    pub fn rounds_exhausted(&self) -> bool {
        self.round >= self.max_rounds
    }
}
