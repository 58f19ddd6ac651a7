//! Matchmaking queue entries.
use super::ids::PlayerId;
use super::phase::ParticipantKind;

/// A participant waiting to be paired.
///
/// Created on join, deleted on pairing. Bot entries are synthesised by the
/// matchmaking worker for humans that waited too long and remember which
/// human they were spawned for.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct QueueEntry {
    pub player_id: PlayerId,
    pub display_name: String,
    /// Current power score used for pairing.
    pub synergy: u32,
    pub initial_synergy: u32,
    /// Milliseconds since the Unix epoch.
    pub joined_at: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub photo_ref: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: ParticipantKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bot_for: Option<PlayerId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tutorial: bool,
}

impl QueueEntry {
    pub fn human(
        player_id: PlayerId,
        display_name: impl Into<String>,
        synergy: u32,
        joined_at: i64,
    ) -> Self {
        Self {
            player_id,
            display_name: display_name.into(),
            synergy,
            initial_synergy: synergy,
            joined_at,
            photo_ref: None,
            kind: ParticipantKind::Human,
            bot_for: None,
            tutorial: false,
        }
    }

    /// Synthesises a bot entry with the same synergy as `target`.
    pub fn bot_for(target: &QueueEntry, bot_id: PlayerId, display_name: String, now: i64) -> Self {
        Self {
            player_id: bot_id,
            display_name,
            synergy: target.synergy,
            initial_synergy: target.synergy,
            joined_at: now,
            photo_ref: None,
            kind: ParticipantKind::Bot,
            bot_for: Some(target.player_id.clone()),
            tutorial: false,
        }
    }

    #[must_use]
    pub fn with_photo(mut self, photo_ref: Option<String>) -> Self {
        self.photo_ref = photo_ref;
        self
    }

    #[must_use]
    pub fn with_tutorial(mut self, tutorial: bool) -> Self {
        self.tutorial = tutorial;
        self
    }

    pub fn is_bot(&self) -> bool {
        self.kind == ParticipantKind::Bot
    }

    pub fn synergy_gap(&self, other: &QueueEntry) -> u32 {
        self.synergy.abs_diff(other.synergy)
    }

    /// Whether two entries may be paired under the given tolerance.
    ///
    /// Two bots are never paired with each other.
    pub fn can_pair_with(&self, other: &QueueEntry, tolerance: u32) -> bool {
        self.player_id != other.player_id
            && !(self.is_bot() && other.is_bot())
            && self.synergy_gap(other) <= tolerance
    }

    /// Milliseconds spent waiting as of `now`.
    pub fn waited_ms(&self, now: i64) -> u64 {
        u64::try_from(now.saturating_sub(self.joined_at)).unwrap_or(0)
    }
}
