//! Cloneable façade over the arena.
//!
//! [`ArenaHandle`] is the action surface used by the HTTP layer, bots and
//! tests. Every mutation of a match is a transaction on its document, so
//! validation and write happen atomically with respect to the match worker.
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use duel_core::engine::{self, queue_order};
use duel_core::{
    AbilityBook, AbilityKey, ActionError, CardPick, DuelConfig, EndTurn, Match, MatchId,
    MatchOutcome, PlayerId, QueueEntry,
};

use super::errors::{ArenaError, Result};
use crate::events::{Event, MatchEvent, QueueEvent, Topic};
use crate::repository::{Update, get_json, list_json, paths, transact};
use crate::workers::{ArenaContext, Signal};

/// Parameters of [`ArenaHandle::join_queue`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinRequest {
    pub player_id: PlayerId,
    pub display_name: String,
    pub synergy: u32,
    pub photo_ref: Option<String>,
    pub tutorial: bool,
}

impl JoinRequest {
    pub fn new(player_id: impl Into<PlayerId>, display_name: impl Into<String>, synergy: u32) -> Self {
        Self {
            player_id: player_id.into(),
            display_name: display_name.into(),
            synergy,
            photo_ref: None,
            tutorial: false,
        }
    }

    #[must_use]
    pub fn tutorial(mut self, tutorial: bool) -> Self {
        self.tutorial = tutorial;
        self
    }

    #[must_use]
    pub fn photo(mut self, photo_ref: Option<String>) -> Self {
        self.photo_ref = photo_ref;
        self
    }
}

/// Client-facing handle to the arena.
#[derive(Clone)]
pub struct ArenaHandle {
    ctx: Arc<ArenaContext>,
}

impl ArenaHandle {
    pub(crate) fn new(ctx: Arc<ArenaContext>) -> Self {
        Self { ctx }
    }

    pub(crate) fn context(&self) -> &Arc<ArenaContext> {
        &self.ctx
    }

    // ------------------------------------------------------------------
    // Queue
    // ------------------------------------------------------------------

    /// Adds or refreshes the player's queue entry.
    ///
    /// Rejoining keeps the original `joined_at` so the player does not lose
    /// their place. Fails with [`ActionError::AlreadyInMatch`] while the
    /// player is in a live match.
    pub async fn join_queue(&self, request: JoinRequest) -> Result<QueueEntry> {
        if !paths::is_valid_segment(request.player_id.as_str()) {
            return Err(ArenaError::InvalidRequest(format!(
                "invalid player id {:?}",
                request.player_id.as_str()
            )));
        }
        if request.display_name.trim().is_empty() {
            return Err(ArenaError::InvalidRequest("display name is empty".into()));
        }
        if self.find_active_match(&request.player_id).await?.is_some() {
            return Err(ActionError::AlreadyInMatch(request.player_id).into());
        }

        let now = self.ctx.clock.now_ms();
        let path = paths::queue(&request.player_id);
        let entry = transact::<QueueEntry, QueueEntry, ArenaError, _>(
            self.ctx.store.as_ref(),
            &path,
            |current| {
                let joined_at = current.map_or(now, |existing| existing.joined_at);
                let entry = QueueEntry::human(
                    request.player_id.clone(),
                    request.display_name.clone(),
                    request.synergy,
                    joined_at,
                )
                .with_photo(request.photo_ref.clone())
                .with_tutorial(request.tutorial);
                Ok((Update::Set(entry.clone()), entry))
            },
        )
        .await?;

        info!(
            "Player {} queued with synergy {}{}",
            entry.player_id,
            entry.synergy,
            if entry.tutorial { " (tutorial)" } else { "" }
        );
        self.ctx.events.publish(QueueEvent::PlayerQueued {
            player: entry.player_id.clone(),
            synergy: entry.synergy,
            kind: entry.kind,
        });
        Ok(entry)
    }

    /// Removes the player's queue entry. Returns whether one existed.
    pub async fn leave_queue(&self, player: &PlayerId) -> Result<bool> {
        let path = paths::queue(player);
        let removed = transact::<QueueEntry, bool, ArenaError, _>(
            self.ctx.store.as_ref(),
            &path,
            |current| match current {
                Some(_) => Ok((Update::Delete, true)),
                None => Ok((Update::Keep, false)),
            },
        )
        .await?;

        if removed {
            info!("Player {} left the queue", player);
            self.ctx.events.publish(QueueEvent::PlayerLeft {
                player: player.clone(),
            });
        }
        Ok(removed)
    }

    /// Current queue in pairing order.
    pub async fn queue(&self) -> Result<Vec<QueueEntry>> {
        let mut entries: Vec<QueueEntry> = list_json(self.ctx.store.as_ref(), paths::QUEUE).await?;
        queue_order(&mut entries);
        Ok(entries)
    }

    // ------------------------------------------------------------------
    // Matches
    // ------------------------------------------------------------------

    pub async fn get_match(&self, id: &MatchId) -> Result<Option<Match>> {
        Ok(get_json(self.ctx.store.as_ref(), &paths::match_doc(id)).await?)
    }

    /// Every persisted match, terminal ones included.
    pub async fn matches(&self) -> Result<Vec<Match>> {
        Ok(list_json(self.ctx.store.as_ref(), paths::MATCHES).await?)
    }

    /// Id of the non-terminal match `player` takes part in, if any.
    pub async fn find_active_match(&self, player: &PlayerId) -> Result<Option<MatchId>> {
        Ok(self
            .matches()
            .await?
            .into_iter()
            .find(|m| !m.is_terminal() && m.side_of(player).is_some())
            .map(|m| m.id))
    }

    pub async fn select_card(&self, id: &MatchId, player: &PlayerId, pick: CardPick) -> Result<()> {
        let card = pick.card_id.clone();
        self.mutate(id, |m| engine::select_card(m, player, pick))
            .await?;
        debug!("[Match {}] {} selected card {}", id, player, card);
        Ok(())
    }

    /// Stores the player's ability choice. `raw` may be a key or a display
    /// name; the canonical key is returned.
    pub async fn select_ability(&self, id: &MatchId, player: &PlayerId, raw: &str) -> Result<AbilityKey> {
        let book = &self.ctx.abilities;
        let key = self
            .mutate(id, |m| engine::select_ability(m, player, raw, book))
            .await?;
        debug!("[Match {}] {} selected ability {}", id, player, key);
        Ok(key)
    }

    /// Marks the player's turn as ended. When both players have ended, the
    /// match worker is told to skip the rest of the selection phase.
    pub async fn end_turn(&self, id: &MatchId, player: &PlayerId) -> Result<EndTurn> {
        let path = paths::match_doc(id);
        let outcome = transact::<Match, EndTurn, ArenaError, _>(
            self.ctx.store.as_ref(),
            &path,
            |current| {
                let mut m = current.ok_or_else(|| ActionError::MatchNotFound(id.clone()))?;
                let outcome = engine::end_turn(&mut m, player)?;
                let update = match outcome {
                    EndTurn::Recorded | EndTurn::BothEnded { .. } => Update::Set(m),
                    EndTurn::AlreadyEnded | EndTurn::Ignored => Update::Keep,
                };
                Ok((update, outcome))
            },
        )
        .await?;

        debug!("[Match {}] {} ended turn: {:?}", id, player, outcome);
        if let EndTurn::BothEnded { round } = outcome
            && !self.ctx.registry.signal(id, Signal::BothEnded { round })
        {
            warn!("[Match {}] no worker to receive early skip", id);
        }
        Ok(outcome)
    }

    /// Forfeits `player`. The opponent wins and the match is deleted after
    /// the cancellation grace period.
    pub async fn cancel_match(&self, id: &MatchId, player: &PlayerId) -> Result<MatchOutcome> {
        let now = self.ctx.clock.now_ms();
        let outcome = self
            .mutate(id, |m| engine::forfeit(m, player, now))
            .await?;

        info!(
            "[Match {}] cancelled by {}; winner {}",
            id,
            player,
            outcome.winner.as_ref().map_or("none", |w| w.as_str())
        );
        if !self.ctx.registry.signal(id, Signal::Cancelled) {
            warn!("[Match {}] no worker to re-arm after cancel", id);
        }
        self.ctx.events.publish(MatchEvent::Cancelled {
            match_id: id.clone(),
            winner: outcome.winner.clone(),
            loser: outcome.loser.clone(),
        });
        Ok(outcome)
    }

    /// Runs `f` on the stored match and persists it if `f` succeeds.
    async fn mutate<R, F>(&self, id: &MatchId, f: F) -> Result<R>
    where
        R: Send,
        F: FnOnce(&mut Match) -> std::result::Result<R, ActionError> + Send,
    {
        let path = paths::match_doc(id);
        transact::<Match, R, ArenaError, _>(self.ctx.store.as_ref(), &path, |current| {
            let mut m = current.ok_or_else(|| ActionError::MatchNotFound(id.clone()))?;
            let value = f(&mut m)?;
            Ok((Update::Set(m), value))
        })
        .await
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Subscribe to events from a specific topic.
    ///
    /// - `Topic::Queue` - joins, leaves and bot spawns
    /// - `Topic::Match` - match creation, phase changes, rounds and results
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.ctx.events.subscribe(topic)
    }

    pub fn config(&self) -> &DuelConfig {
        &self.ctx.config
    }

    pub fn abilities(&self) -> &AbilityBook {
        &self.ctx.abilities
    }

    /// Arena clock in epoch milliseconds.
    pub fn now_ms(&self) -> i64 {
        self.ctx.clock.now_ms()
    }
}
