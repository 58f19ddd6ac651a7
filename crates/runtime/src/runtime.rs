//! High-level arena orchestrator.
//!
//! The arena owns the shared context, the matchmaking task and the registry
//! of match workers, and exposes a builder-based API for embedding it in a
//! server or a test.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use duel_content::ContentFactory;
use duel_core::{AbilityBook, DuelConfig, Match, MatchId};

use crate::api::{ArenaError, ArenaHandle, Notifier, Result, TracingNotifier};
use crate::events::EventBus;
use crate::repository::{MatchIndexEntry, MemoryTreeStore, TreeStore, list_json, paths};
use crate::utils::Clock;
use crate::workers::{ArenaContext, Matchmaker, MatchRegistry, expire_index, launch_match};

/// Arena configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    pub duel: DuelConfig,
    pub event_buffer_size: usize,
    /// Capacity of each match worker's signal channel.
    pub signal_buffer_size: usize,
    /// Run the matchmaking worker in the background (default: true).
    pub enable_matchmaking: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            duel: DuelConfig::default(),
            event_buffer_size: 100,
            signal_buffer_size: 8,
            enable_matchmaking: true,
        }
    }
}

/// Running arena.
///
/// [`ArenaHandle`] provides a cloneable façade for clients; the arena itself
/// is only needed for lifecycle operations.
pub struct Arena {
    handle: ArenaHandle,
    matchmaker: Arc<Matchmaker>,
    matchmaker_task: Option<JoinHandle<()>>,
}

impl Arena {
    pub fn builder() -> ArenaBuilder {
        ArenaBuilder::new()
    }

    /// Get a cloneable handle to this arena.
    pub fn handle(&self) -> ArenaHandle {
        self.handle.clone()
    }

    /// Runs one matchmaking pass now. Returns the ids of created matches.
    pub async fn pairing_pass(&self) -> Result<Vec<MatchId>> {
        self.matchmaker.pairing_pass().await
    }

    /// Runs one bot sweep now. Returns the number of bots spawned.
    pub async fn inject_bots(&self) -> Result<usize> {
        self.matchmaker.inject_bots().await
    }

    /// Number of match workers currently running.
    pub fn live_matches(&self) -> usize {
        self.handle.context().registry.len()
    }

    /// Re-attaches workers to every persisted match.
    ///
    /// Each match's current phase is re-armed for the time it has left,
    /// measured from its `phase_start_time`; terminal matches get their
    /// deletion grace re-armed the same way. Stale discovery index entries
    /// are scheduled for removal. Returns the number of workers started.
    pub async fn resume(&self) -> Result<usize> {
        let ctx = self.handle.context();
        let now = ctx.clock.now_ms();

        let matches: Vec<Match> = list_json(ctx.store.as_ref(), paths::MATCHES).await?;
        let mut resumed = 0;
        for m in &matches {
            let left = ctx.remaining(m, now);
            if launch_match(&self.handle, m, left) {
                info!(
                    "[Match {}] resumed in {} (round {}), {:?} left",
                    m.id, m.phase, m.round, left
                );
                resumed += 1;
            }
        }

        let ttl_ms = ctx.config.matchmaking.match_index_ttl_ms;
        let index: Vec<MatchIndexEntry> = list_json(ctx.store.as_ref(), paths::MATCH_INDEX).await?;
        for entry in index {
            let age = u64::try_from(now.saturating_sub(entry.created_at)).unwrap_or(0);
            let left = std::time::Duration::from_millis(ttl_ms.saturating_sub(age));
            expire_index(ctx, entry.match_id, left);
        }

        info!("Resumed {} of {} persisted matches", resumed, matches.len());
        Ok(resumed)
    }

    /// Stops every worker. Persisted state is left as is and can be resumed.
    pub async fn shutdown(mut self) -> Result<()> {
        self.handle.context().cancel.cancel();
        if let Some(task) = self.matchmaker_task.take() {
            task.await.map_err(ArenaError::WorkerJoin)?;
        }
        info!("Arena shut down");
        Ok(())
    }
}

/// Builder for [`Arena`].
pub struct ArenaBuilder {
    config: ArenaConfig,
    store: Option<Arc<dyn TreeStore>>,
    abilities: Option<AbilityBook>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Clock>,
}

impl ArenaBuilder {
    fn new() -> Self {
        Self {
            config: ArenaConfig::default(),
            store: None,
            abilities: None,
            notifier: None,
            clock: None,
        }
    }

    /// Override arena configuration
    pub fn config(mut self, config: ArenaConfig) -> Self {
        self.config = config;
        self
    }

    /// Override only the duel rules and timers
    pub fn duel_config(mut self, duel: DuelConfig) -> Self {
        self.config.duel = duel;
        self
    }

    /// Backing store (default: a fresh [`MemoryTreeStore`])
    pub fn store(self, store: impl TreeStore + 'static) -> Self {
        self.shared_store(Arc::new(store))
    }

    pub fn shared_store(mut self, store: Arc<dyn TreeStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Ability book (default: the built-in book)
    pub fn abilities(mut self, abilities: AbilityBook) -> Self {
        self.abilities = Some(abilities);
        self
    }

    /// Loads the duel config and ability book from a content directory.
    pub fn content(mut self, factory: &ContentFactory) -> Result<Self> {
        let duel = factory
            .load_config()
            .map_err(|e| ArenaError::Content(format!("{e:#}")))?;
        let abilities = factory
            .load_abilities()
            .map_err(|e| ArenaError::Content(format!("{e:#}")))?;
        self.config.duel = duel;
        self.abilities = Some(abilities);
        Ok(self)
    }

    /// Participant notifier (default: [`TracingNotifier`])
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Clock used for persisted timestamps (default: system time)
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Enable the background matchmaking worker
    pub fn enable_matchmaking(mut self, enable: bool) -> Self {
        self.config.enable_matchmaking = enable;
        self
    }

    /// Build the arena and start its background matchmaking.
    ///
    /// Persisted matches are not picked up until [`Arena::resume`] is called.
    pub async fn build(self) -> Result<Arena> {
        let duel = self.config.duel;
        if duel.max_rounds == 0 {
            return Err(ArenaError::InvalidConfig("max_rounds must be at least 1".into()));
        }
        if duel.bot.min_delay_ms > duel.bot.max_delay_ms {
            warn!(
                "Bot min delay {} ms exceeds max delay {} ms; using the max",
                duel.bot.min_delay_ms, duel.bot.max_delay_ms
            );
        }

        let ctx = Arc::new(ArenaContext {
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryTreeStore::new())),
            config: duel,
            abilities: self.abilities.unwrap_or_else(AbilityBook::builtin),
            events: EventBus::with_capacity(self.config.event_buffer_size),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            registry: MatchRegistry::default(),
            clock: self.clock.unwrap_or_default(),
            cancel: CancellationToken::new(),
            signal_buffer: self.config.signal_buffer_size,
        });

        let handle = ArenaHandle::new(ctx);
        let matchmaker = Arc::new(Matchmaker::new(handle.clone()));

        let matchmaker_task = if self.config.enable_matchmaking {
            let worker = Arc::clone(&matchmaker);
            Some(tokio::spawn(async move {
                worker.run().await;
            }))
        } else {
            None
        };

        Ok(Arena {
            handle,
            matchmaker,
            matchmaker_task,
        })
    }
}
