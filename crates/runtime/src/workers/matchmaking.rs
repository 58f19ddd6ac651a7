//! Queue-driven matchmaking and bot injection.
//!
//! A pass repeatedly takes the oldest queue entry, pairs it with the oldest
//! compatible one and commits the match in a single batch that also removes
//! both queue entries. A concurrent queue change makes that batch fail with
//! a conflict, in which case the queue is re-read and the pass continues.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use duel_core::engine::{self, find_pair, queue_order};
use duel_core::{Match, MatchId, PlayerId, QueueEntry, Side};

use super::{ArenaContext, launch_match};
use crate::api::{ArenaHandle, Notification, Result};
use crate::events::{MatchEvent, QueueEvent};
use crate::repository::{MatchIndexEntry, WriteBatch, list_json, paths};
use crate::utils::{bot_display_name, random_hex};

/// Consecutive commit conflicts tolerated within one pass.
const MAX_CONFLICTS: usize = 8;

pub(crate) struct Matchmaker {
    handle: ArenaHandle,
    pass_guard: Mutex<()>,
}

impl Matchmaker {
    pub fn new(handle: ArenaHandle) -> Self {
        Self {
            handle,
            pass_guard: Mutex::new(()),
        }
    }

    /// Reacts to queue changes and runs the bot sweep until shutdown.
    pub async fn run(&self) {
        let ctx = self.handle.context();
        let mut watch = ctx.store.watch(paths::QUEUE);
        let mut ticker = interval(ctx.config.matchmaking.bot_tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        info!("Matchmaker started");
        self.pass_logged().await;

        loop {
            tokio::select! {
                _ = ctx.cancel.cancelled() => break,
                change = watch.next() => {
                    if change.is_none() {
                        warn!("Queue watch closed; matchmaker stopping");
                        break;
                    }
                    watch.drain();
                    self.pass_logged().await;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.inject_bots().await {
                        error!("Bot sweep failed: {}", e);
                    }
                }
            }
        }
        info!("Matchmaker stopped");
    }

    async fn pass_logged(&self) {
        if let Err(e) = self.pairing_pass().await {
            error!("Matchmaking pass failed: {}", e);
        }
    }

    /// Pairs as many queued entries as possible.
    ///
    /// Returns the ids of the matches created. If another pass is already
    /// running this one is skipped and returns an empty list.
    pub async fn pairing_pass(&self) -> Result<Vec<MatchId>> {
        let Ok(_guard) = self.pass_guard.try_lock() else {
            debug!("Matchmaking pass already running; skipping");
            return Ok(Vec::new());
        };

        let ctx = self.handle.context();
        let tolerance = ctx.config.matchmaking.synergy_tolerance;
        let mut created = Vec::new();
        let mut conflicts = 0;

        loop {
            let mut entries: Vec<QueueEntry> = list_json(ctx.store.as_ref(), paths::QUEUE).await?;
            queue_order(&mut entries);
            let Some((i, j)) = find_pair(&entries, tolerance) else {
                break;
            };

            match self.create_match(&entries[i], &entries[j]).await? {
                Some(m) => {
                    conflicts = 0;
                    self.after_pairing(&m).await;
                    created.push(m.id);
                }
                None => {
                    conflicts += 1;
                    if conflicts >= MAX_CONFLICTS {
                        warn!("Matchmaking pass gave up after {} conflicts", conflicts);
                        break;
                    }
                }
            }
        }

        Ok(created)
    }

    /// Commits a match for the pair. `None` if the queue changed underneath.
    async fn create_match(&self, first: &QueueEntry, second: &QueueEntry) -> Result<Option<Match>> {
        let ctx = self.handle.context();
        let now = ctx.clock.now_ms();
        let id = MatchId::new(random_hex(3));

        let mut m = Match::new(id.clone(), first, second, ctx.config.max_rounds, now);
        engine::begin(&mut m);

        let batch = WriteBatch::new()
            .delete_existing(paths::queue(&first.player_id))
            .delete_existing(paths::queue(&second.player_id))
            .create_json(paths::match_doc(&id), &m)?
            .put_json(paths::match_index(&id), &MatchIndexEntry::for_match(&m))?;

        match ctx.store.commit(batch).await {
            Ok(()) => Ok(Some(m)),
            Err(e) if e.is_conflict() => {
                debug!(
                    "Pairing {} with {} lost a race: {}",
                    first.player_id, second.player_id, e
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn after_pairing(&self, m: &Match) {
        let ctx = self.handle.context();
        info!(
            "[Match {}] created: {} ({}) vs {} ({}), {} timers",
            m.id,
            m.player1.user_id,
            m.player1.synergy,
            m.player2.user_id,
            m.player2.synergy,
            m.timers_type
        );
        ctx.events.publish(MatchEvent::Created {
            match_id: m.id.clone(),
            player1: m.player1.user_id.clone(),
            player2: m.player2.user_id.clone(),
            timers_type: m.timers_type,
        });
        ctx.events.publish(MatchEvent::PhaseChanged {
            match_id: m.id.clone(),
            phase: m.phase,
            round: m.round,
        });

        launch_match(&self.handle, m, ctx.phase_duration(m));

        for side in Side::BOTH {
            let player = m.player(side);
            if !player.is_bot() {
                ctx.notifier
                    .notify(&player.user_id, Notification::match_found(m, side))
                    .await;
            }
        }

        expire_index(ctx, m.id.clone(), ctx.config.matchmaking.match_index_ttl());
    }

    /// Retires orphaned bots and spawns a bot for every human that waited
    /// past the threshold. Returns the number of bots spawned.
    pub async fn inject_bots(&self) -> Result<usize> {
        let ctx = self.handle.context();
        let now = ctx.clock.now_ms();
        let threshold = ctx.config.matchmaking.bot_threshold_ms;
        let entries: Vec<QueueEntry> = list_json(ctx.store.as_ref(), paths::QUEUE).await?;

        let humans: Vec<&QueueEntry> = entries.iter().filter(|e| !e.is_bot()).collect();
        let is_queued = |id: &PlayerId| humans.iter().any(|h| &h.player_id == id);
        let has_bot = |id: &PlayerId| {
            entries
                .iter()
                .any(|e| e.is_bot() && e.bot_for.as_ref() == Some(id))
        };

        for bot in entries.iter().filter(|e| e.is_bot()) {
            let orphaned = bot.bot_for.as_ref().is_none_or(|target| !is_queued(target));
            if !orphaned {
                continue;
            }
            let batch = WriteBatch::new().delete_existing(paths::queue(&bot.player_id));
            match ctx.store.commit(batch).await {
                Ok(()) => {
                    info!("Retired orphan bot {}", bot.player_id);
                    ctx.events.publish(QueueEvent::BotRetired {
                        bot: bot.player_id.clone(),
                    });
                }
                Err(e) if e.is_conflict() => {}
                Err(e) => return Err(e.into()),
            }
        }

        let mut spawned = 0;
        for human in humans {
            if human.waited_ms(now) < threshold || has_bot(&human.player_id) {
                continue;
            }

            let bot_id = PlayerId::new(format!("bot-{}", random_hex(4)));
            let bot = QueueEntry::bot_for(human, bot_id.clone(), bot_display_name(), now);
            let batch = WriteBatch::new().create_json(paths::queue(&bot_id), &bot)?;
            match ctx.store.commit(batch).await {
                Ok(()) => {
                    info!(
                        "Spawned bot {} for {} after {} ms (synergy {})",
                        bot_id,
                        human.player_id,
                        human.waited_ms(now),
                        bot.synergy
                    );
                    ctx.events.publish(QueueEvent::BotSpawned {
                        bot: bot_id,
                        bot_for: human.player_id.clone(),
                        synergy: bot.synergy,
                    });
                    spawned += 1;
                }
                Err(e) if e.is_conflict() => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(spawned)
    }
}

/// Deletes `matchIndex/{id}` once `ttl` has elapsed, unless shut down first.
pub(crate) fn expire_index(ctx: &Arc<ArenaContext>, id: MatchId, ttl: Duration) {
    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        tokio::select! {
            _ = ctx.cancel.cancelled() => {}
            _ = tokio::time::sleep(ttl) => {
                let batch = WriteBatch::new().delete(paths::match_index(&id));
                if let Err(e) = ctx.store.commit(batch).await {
                    warn!("[Match {}] failed to drop index entry: {}", id, e);
                }
            }
        }
    });
}
