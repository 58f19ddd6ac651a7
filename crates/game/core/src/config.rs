//! Duel configuration: tunable constants with their defaults.
//!
//! Every duration is stored in milliseconds so the whole structure can be
//! loaded from TOML and persisted alongside matches.
use core::time::Duration;

use crate::state::{Phase, TimersKind};

/// Top-level tunables shared by the matchmaking, match and bot workers.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DuelConfig {
    /// Highest round index plus one; the match finishes when `round` reaches it.
    pub max_rounds: u32,
    pub matchmaking: MatchmakingConfig,
    pub timers: PhaseTimers,
    pub combat: CombatConfig,
    pub bot: BotConfig,
}

impl DuelConfig {
    pub const DEFAULT_MAX_ROUNDS: u32 = 4;

    pub fn new() -> Self {
        Self {
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
            matchmaking: MatchmakingConfig::default(),
            timers: PhaseTimers::default(),
            combat: CombatConfig::default(),
            bot: BotConfig::default(),
        }
    }
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MatchmakingConfig {
    /// Maximum synergy gap between two paired entries (inclusive).
    pub synergy_tolerance: u32,
    /// How long a human waits before a bot is spawned for them.
    pub bot_threshold_ms: u64,
    /// Interval of the bot-injection sweep.
    pub bot_tick_ms: u64,
    /// Lifetime of the `matchIndex/{id}` discovery pointer.
    pub match_index_ttl_ms: u64,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            synergy_tolerance: 50,
            bot_threshold_ms: 5_000,
            bot_tick_ms: 2_000,
            match_index_ttl_ms: 5_000,
        }
    }
}

impl MatchmakingConfig {
    pub fn bot_threshold(&self) -> Duration {
        Duration::from_millis(self.bot_threshold_ms)
    }

    pub fn bot_tick(&self) -> Duration {
        Duration::from_millis(self.bot_tick_ms.max(1))
    }

    pub fn match_index_ttl(&self) -> Duration {
        Duration::from_millis(self.match_index_ttl_ms)
    }
}

/// Durations of each phase for one timer table.
///
/// `finished` and `cancelled` are the grace periods before a terminal match
/// is deleted.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PhaseDurations {
    pub cooldown_ms: u64,
    pub selection_ms: u64,
    pub battle_ms: u64,
    pub finished_ms: u64,
    pub cancelled_ms: u64,
}

impl PhaseDurations {
    pub const fn normal() -> Self {
        Self {
            cooldown_ms: 5_000,
            selection_ms: 10_000,
            battle_ms: 5_000,
            finished_ms: 5_000,
            cancelled_ms: 10_000,
        }
    }

    pub const fn tutorial() -> Self {
        Self {
            cooldown_ms: 16_000,
            selection_ms: 22_000,
            battle_ms: 3_000,
            finished_ms: 10_000,
            cancelled_ms: 10_000,
        }
    }

    pub const fn millis(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Cooldown => self.cooldown_ms,
            Phase::Selection => self.selection_ms,
            Phase::Battle => self.battle_ms,
            Phase::Finished => self.finished_ms,
            Phase::Cancelled => self.cancelled_ms,
        }
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self::normal()
    }
}

/// Phase-duration tables keyed by [`TimersKind`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PhaseTimers {
    pub normal: PhaseDurations,
    /// Only consulted for round 0; later rounds fall back to `normal`.
    pub tutorial: PhaseDurations,
}

impl Default for PhaseTimers {
    fn default() -> Self {
        Self {
            normal: PhaseDurations::normal(),
            tutorial: PhaseDurations::tutorial(),
        }
    }
}

impl PhaseTimers {
    pub fn duration(&self, phase: Phase, round: u32, kind: TimersKind) -> Duration {
        let table = match kind {
            TimersKind::Tutorial if round == 0 => &self.tutorial,
            _ => &self.normal,
        };
        Duration::from_millis(table.millis(phase))
    }
}

/// Damage tuning for the combat resolver.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct CombatConfig {
    /// Cap as a fraction of defender synergy when the attacker used an ability.
    pub ability_cap: f64,
    /// Cap when the attacker only played a card.
    pub card_cap: f64,
    /// Defense power is divided by this before being subtracted.
    pub defense_divisor: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            ability_cap: 0.30,
            card_cap: 0.15,
            defense_divisor: 2.0,
        }
    }
}

/// Pacing of bot-controlled participants.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct BotConfig {
    pub start_delay_ms: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Pause between submitting the card and the ability.
    pub ability_delay_ms: u64,
    /// Back-off before re-reading the match when there is nothing to do.
    pub recheck_ms: u64,
    pub deck_size: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 3_000,
            min_delay_ms: 1_000,
            max_delay_ms: 3_000,
            ability_delay_ms: 500,
            recheck_ms: 1_000,
            deck_size: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tutorial_table_applies_to_round_zero_only() {
        let timers = PhaseTimers::default();
        assert_eq!(
            timers.duration(Phase::Selection, 0, TimersKind::Tutorial),
            Duration::from_secs(22)
        );
        assert_eq!(
            timers.duration(Phase::Selection, 1, TimersKind::Tutorial),
            Duration::from_secs(10)
        );
        assert_eq!(
            timers.duration(Phase::Cooldown, 0, TimersKind::Normal),
            Duration::from_secs(5)
        );
    }
}
