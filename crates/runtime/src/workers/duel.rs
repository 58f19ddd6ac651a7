//! Per-match worker that owns the phase timer.
//!
//! Each match runs as an independent task holding exactly one deadline.
//! Timer expiry advances the state machine through a store transaction;
//! early-skip and forfeit arrive as [`Signal`]s and replace the deadline,
//! which is the only way a pending transition is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use duel_core::engine::{self, BattleReport, Step};
use duel_core::{Match, MatchId, Phase};

use super::ArenaContext;
use crate::events::MatchEvent;
use crate::repository::{StoreError, Update, get_json, paths, transact};

/// Delay before retrying after a failed phase advance.
const RETRY_AFTER: Duration = Duration::from_secs(1);

/// External triggers delivered to a match worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Signal {
    /// Both participants ended their turn during `round`'s selection phase.
    BothEnded { round: u32 },
    /// The match was forfeited; re-arm for the deletion grace period.
    Cancelled,
}

enum TimerOutcome {
    Gone,
    /// Terminal match whose grace period has not elapsed yet.
    Wait(Duration),
    Removed,
    Advanced { step: Step, snapshot: Box<Match> },
}

pub(crate) struct MatchWorker {
    ctx: Arc<ArenaContext>,
    match_id: MatchId,
    path: String,
    signals: mpsc::Receiver<Signal>,
    sender: mpsc::Sender<Signal>,
}

impl MatchWorker {
    /// Registers and spawns a worker for `m`. Returns `false` if one exists.
    pub fn spawn(ctx: &Arc<ArenaContext>, m: &Match, first_delay: Duration) -> bool {
        let (tx, rx) = mpsc::channel(ctx.signal_buffer.max(1));
        if !ctx.registry.insert(m.id.clone(), tx.clone()) {
            debug!("[Match {}] worker already running", m.id);
            return false;
        }

        let worker = Self {
            ctx: Arc::clone(ctx),
            match_id: m.id.clone(),
            path: paths::match_doc(&m.id),
            signals: rx,
            sender: tx,
        };
        debug!(
            "[Match {}] worker armed: {} round {} fires in {:?}",
            m.id, m.phase, m.round, first_delay
        );
        tokio::spawn(worker.run(first_delay));
        true
    }

    async fn run(mut self, first_delay: Duration) {
        let mut deadline = Instant::now() + first_delay;

        loop {
            tokio::select! {
                _ = self.ctx.cancel.cancelled() => {
                    debug!("[Match {}] worker stopped by shutdown", self.match_id);
                    break;
                }
                _ = sleep_until(deadline) => match self.on_timer().await {
                    Some(next) => deadline = Instant::now() + next,
                    None => break,
                },
                Some(signal) = self.signals.recv() => {
                    if let Some(next) = self.on_signal(signal).await {
                        deadline = Instant::now() + next;
                    }
                }
            }
        }

        self.ctx.registry.remove(&self.match_id, &self.sender);
    }

    /// Handles expiry of the pending timer. Returns the next delay, or `None`
    /// when the worker should stop.
    async fn on_timer(&self) -> Option<Duration> {
        let ctx = &self.ctx;
        let now = ctx.clock.now_ms();

        let outcome = transact::<Match, TimerOutcome, StoreError, _>(
            ctx.store.as_ref(),
            &self.path,
            |current| {
                let Some(mut m) = current else {
                    return Ok((Update::Keep, TimerOutcome::Gone));
                };

                if m.is_terminal() {
                    let left = ctx.remaining(&m, now);
                    if !left.is_zero() {
                        return Ok((Update::Keep, TimerOutcome::Wait(left)));
                    }
                    return Ok((Update::Delete, TimerOutcome::Removed));
                }

                let step = engine::advance(&mut m, ctx.rules(), now);
                let snapshot = Box::new(m.clone());
                Ok((Update::Set(m), TimerOutcome::Advanced { step, snapshot }))
            },
        )
        .await;

        match outcome {
            Ok(TimerOutcome::Gone) => {
                warn!("[Match {}] disappeared; stopping worker", self.match_id);
                None
            }
            Ok(TimerOutcome::Wait(left)) => Some(left),
            Ok(TimerOutcome::Removed) => {
                info!("[Match {}] -> Deleted", self.match_id);
                ctx.events.publish(MatchEvent::Removed {
                    match_id: self.match_id.clone(),
                });
                None
            }
            Ok(TimerOutcome::Advanced { step, snapshot }) => {
                self.publish_step(&step, &snapshot);
                match step {
                    Step::Expired => None,
                    Step::Entered { .. } | Step::Finished(_) => {
                        Some(ctx.phase_duration(&snapshot))
                    }
                }
            }
            Err(e) => {
                error!("[Match {}] phase advance failed: {}", self.match_id, e);
                Some(RETRY_AFTER)
            }
        }
    }

    async fn on_signal(&self, signal: Signal) -> Option<Duration> {
        match signal {
            Signal::BothEnded { round } => self.skip_selection(round).await,
            Signal::Cancelled => {
                let now = self.ctx.clock.now_ms();
                match get_json::<Match>(self.ctx.store.as_ref(), &self.path)
                    .await
                {
                    Ok(Some(m)) if m.phase == Phase::Cancelled => {
                        Some(self.ctx.remaining(&m, now))
                    }
                    Ok(Some(_)) => None,
                    Ok(None) => Some(Duration::ZERO),
                    Err(e) => {
                        error!("[Match {}] failed to read after cancel: {}", self.match_id, e);
                        Some(RETRY_AFTER)
                    }
                }
            }
        }
    }

    async fn skip_selection(&self, round: u32) -> Option<Duration> {
        let ctx = &self.ctx;
        let now = ctx.clock.now_ms();

        let outcome = transact::<Match, Option<(BattleReport, Box<Match>)>, StoreError, _>(
            ctx.store.as_ref(),
            &self.path,
            |current| {
                let Some(mut m) = current else {
                    return Ok((Update::Keep, None));
                };
                match engine::skip_selection(&mut m, round, ctx.rules(), now) {
                    Some(report) => {
                        let snapshot = Box::new(m.clone());
                        Ok((Update::Set(m), Some((report, snapshot))))
                    }
                    None => Ok((Update::Keep, None)),
                }
            },
        )
        .await;

        match outcome {
            Ok(Some((report, snapshot))) => {
                info!(
                    "[Match {}] both players ended turn; skipping to battle",
                    self.match_id
                );
                self.publish_battle(&report, &snapshot);
                Some(ctx.phase_duration(&snapshot))
            }
            Ok(None) => {
                debug!(
                    "[Match {}] stale skip signal for round {}",
                    self.match_id, round
                );
                None
            }
            Err(e) => {
                error!("[Match {}] early skip failed: {}", self.match_id, e);
                None
            }
        }
    }

    fn publish_step(&self, step: &Step, m: &Match) {
        match step {
            Step::Entered {
                battle: Some(report),
                ..
            } => self.publish_battle(report, m),
            Step::Entered { phase, round, .. } => {
                info!("[Match {}] -> {} (round {})", self.match_id, phase, round);
                self.ctx.events.publish(MatchEvent::PhaseChanged {
                    match_id: self.match_id.clone(),
                    phase: *phase,
                    round: *round,
                });
            }
            Step::Finished(outcome) => {
                match &outcome.winner {
                    Some(winner) => info!("[Match {}] finished, winner {}", self.match_id, winner),
                    None => info!("[Match {}] finished in a draw", self.match_id),
                }
                self.ctx.events.publish(MatchEvent::PhaseChanged {
                    match_id: self.match_id.clone(),
                    phase: Phase::Finished,
                    round: m.round,
                });
                self.ctx.events.publish(MatchEvent::Finished {
                    match_id: self.match_id.clone(),
                    winner: outcome.winner.clone(),
                    loser: outcome.loser.clone(),
                });
            }
            Step::Expired => {}
        }
    }

    fn publish_battle(&self, report: &BattleReport, m: &Match) {
        info!(
            "[Match {}] -> battle (round {}): {} hits {} for {} ({} -> {})",
            self.match_id,
            report.round,
            report.attacker,
            report.defender,
            report.hit.damage,
            report.hit.defender_synergy_before,
            report.hit.defender_synergy_after
        );
        self.ctx.events.publish(MatchEvent::PhaseChanged {
            match_id: self.match_id.clone(),
            phase: Phase::Battle,
            round: m.round,
        });
        self.ctx.events.publish(MatchEvent::RoundResolved {
            match_id: self.match_id.clone(),
            round: report.round,
            attacker: report.attacker.clone(),
            defender: report.defender.clone(),
            damage: report.hit.damage,
            defender_synergy: report.hit.defender_synergy_after,
        });
    }
}
