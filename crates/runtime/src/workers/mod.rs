//! Background tasks owned by the arena.
//!
//! - [`MatchWorker`]: one per live match, owns that match's single pending
//!   phase timer and drives the state machine.
//! - [`Matchmaker`]: watches the queue, pairs entries and injects bots.
//! - [`BotWorker`]: plays one bot participant through the public handle.
//!
//! Workers share an [`ArenaContext`]; none of them keeps state that must
//! survive a restart, since everything authoritative is in the store.

mod bot;
mod duel;
mod matchmaking;
mod registry;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use duel_core::{AbilityBook, BattleRules, DuelConfig, Match};

pub(crate) use bot::BotWorker;
pub(crate) use duel::{MatchWorker, Signal};
pub(crate) use matchmaking::{Matchmaker, expire_index};
pub(crate) use registry::MatchRegistry;

use crate::api::{ArenaHandle, Notifier};
use crate::events::EventBus;
use crate::repository::TreeStore;
use crate::utils::Clock;

/// State shared by the handle and every worker.
pub(crate) struct ArenaContext {
    pub store: Arc<dyn TreeStore>,
    pub config: DuelConfig,
    pub abilities: AbilityBook,
    pub events: EventBus,
    pub notifier: Arc<dyn Notifier>,
    pub registry: MatchRegistry,
    pub clock: Clock,
    pub cancel: CancellationToken,
    pub signal_buffer: usize,
}

impl ArenaContext {
    pub fn rules(&self) -> BattleRules<'_> {
        BattleRules {
            combat: &self.config.combat,
            abilities: &self.abilities,
        }
    }

    /// Full duration of the phase `m` is currently in.
    pub fn phase_duration(&self, m: &Match) -> Duration {
        self.config
            .timers
            .duration(m.phase, m.round, m.timers_type)
    }

    /// Time left in the current phase as of `now`, measured from
    /// `phase_start_time`.
    pub fn remaining(&self, m: &Match, now: i64) -> Duration {
        let elapsed = u64::try_from(now.saturating_sub(m.phase_start_time)).unwrap_or(0);
        self.phase_duration(m)
            .saturating_sub(Duration::from_millis(elapsed))
    }
}

/// Starts the match worker for `m` and a bot worker for each bot seat.
///
/// The first timer fires after `first_delay`. Returns `false` if a worker for
/// this match is already running.
pub(crate) fn launch_match(handle: &ArenaHandle, m: &Match, first_delay: Duration) -> bool {
    let ctx = handle.context();
    if !MatchWorker::spawn(ctx, m, first_delay) {
        return false;
    }

    if !m.is_terminal() {
        for player in m.players() {
            if player.is_bot() {
                BotWorker::spawn(handle.clone(), m.id.clone(), player.user_id.clone());
            }
        }
    }
    true
}
