//! Bot participant.
//!
//! A bot plays through the same [`ArenaHandle`] operations as a human client:
//! it polls its match and, once per selection phase, picks a card, picks an
//! ability that fits its current role and ends its turn. Every rejection is
//! logged and otherwise ignored; the match worker's timers keep the match
//! moving regardless of what the bot does.

use std::collections::HashSet;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use duel_core::{
    AbilityKey, AbilityKind, BotConfig, CardId, CardPick, Match, MatchId, Phase, PlayerId, Role,
    Stat, StatBlock,
};

use crate::api::ArenaHandle;

const STAT_RANGE: std::ops::RangeInclusive<u32> = 10..=100;

pub(crate) struct BotWorker {
    handle: ArenaHandle,
    match_id: MatchId,
    bot_id: PlayerId,
    deck: Vec<(CardId, StatBlock)>,
    rng: StdRng,
    pacing: BotConfig,
    cancel: CancellationToken,
}

impl BotWorker {
    pub fn spawn(handle: ArenaHandle, match_id: MatchId, bot_id: PlayerId) {
        let ctx = handle.context();
        let pacing = ctx.config.bot.clone();
        let cancel = ctx.cancel.clone();
        let mut rng = StdRng::from_entropy();
        let deck = random_deck(&bot_id, pacing.deck_size.max(1), &mut rng);

        let worker = Self {
            handle,
            match_id,
            bot_id,
            deck,
            rng,
            pacing,
            cancel,
        };
        tokio::spawn(worker.run());
    }

    async fn run(mut self) {
        debug!("[Match {}] bot {} joined", self.match_id, self.bot_id);
        let mut acted_round = None;

        if self.pause(Duration::from_millis(self.pacing.start_delay_ms)).await {
            loop {
                let m = match self.handle.get_match(&self.match_id).await {
                    Ok(Some(m)) => m,
                    Ok(None) => break,
                    Err(e) => {
                        debug!("[Match {}] bot read failed: {}", self.match_id, e);
                        if !self.recheck().await {
                            break;
                        }
                        continue;
                    }
                };
                if m.is_terminal() {
                    break;
                }

                if m.phase == Phase::Selection && acted_round != Some(m.round) {
                    acted_round = Some(m.round);
                    if !self.play_round(&m).await {
                        break;
                    }
                } else if !self.recheck().await {
                    break;
                }
            }
        }

        debug!("[Match {}] bot {} left", self.match_id, self.bot_id);
    }

    /// Returns `false` if shutdown interrupted the round.
    async fn play_round(&mut self, m: &Match) -> bool {
        let Some(side) = m.side_of(&self.bot_id) else {
            return false;
        };
        let me = m.player(side);

        if !self.jitter().await {
            return false;
        }
        let pick = self.pick_card(me.used_cards().cloned().collect());
        if let Err(e) = self
            .handle
            .select_card(&self.match_id, &self.bot_id, pick)
            .await
        {
            debug!("[Match {}] bot card rejected: {}", self.match_id, e);
        }

        if !self.pause(Duration::from_millis(self.pacing.ability_delay_ms)).await {
            return false;
        }
        let kind = match me.current_role {
            Some(Role::Defense) => AbilityKind::Defense,
            _ => AbilityKind::Attack,
        };
        if let Some(key) = self.pick_ability(kind, me.used_abilities().cloned().collect())
            && let Err(e) = self
                .handle
                .select_ability(&self.match_id, &self.bot_id, key.as_str())
                .await
        {
            debug!("[Match {}] bot ability rejected: {}", self.match_id, e);
        }

        if !self.jitter().await {
            return false;
        }
        if let Err(e) = self.handle.end_turn(&self.match_id, &self.bot_id).await {
            debug!("[Match {}] bot end turn rejected: {}", self.match_id, e);
        }
        true
    }

    fn pick_card(&mut self, used: HashSet<CardId>) -> CardPick {
        let fresh: Vec<&(CardId, StatBlock)> = self
            .deck
            .iter()
            .filter(|(id, _)| !used.contains(id))
            .collect();
        let chosen = fresh
            .choose(&mut self.rng)
            .copied()
            .or_else(|| self.deck.choose(&mut self.rng));

        let (card_id, stats) = chosen
            .cloned()
            .unwrap_or_else(|| (CardId::new(format!("{}-card-0", self.bot_id)), StatBlock::ZERO));
        CardPick {
            card_id,
            stats,
            photo_ref: None,
        }
    }

    /// Unused ability of `kind`, else any of `kind`, else anything.
    fn pick_ability(&mut self, kind: AbilityKind, used: HashSet<AbilityKey>) -> Option<AbilityKey> {
        let book = self.handle.abilities();
        let pool: Vec<&AbilityKey> = book.pool(kind).map(|a| &a.key).collect();
        let fresh: Vec<&AbilityKey> = pool.iter().copied().filter(|k| !used.contains(*k)).collect();

        if let Some(key) = fresh.choose(&mut self.rng) {
            return Some((*key).clone());
        }
        if let Some(key) = pool.choose(&mut self.rng) {
            return Some((*key).clone());
        }
        let all: Vec<&AbilityKey> = book.iter().map(|a| &a.key).collect();
        all.choose(&mut self.rng).map(|key| (*key).clone())
    }

    async fn jitter(&mut self) -> bool {
        let lo = self.pacing.min_delay_ms.min(self.pacing.max_delay_ms);
        let hi = self.pacing.max_delay_ms.max(lo);
        let ms = self.rng.gen_range(lo..=hi);
        self.pause(Duration::from_millis(ms)).await
    }

    async fn recheck(&self) -> bool {
        self.pause(Duration::from_millis(self.pacing.recheck_ms.max(1)))
            .await
    }

    /// Sleeps for `duration`. Returns `false` on shutdown.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

fn random_deck(bot: &PlayerId, size: usize, rng: &mut StdRng) -> Vec<(CardId, StatBlock)> {
    (0..size)
        .map(|i| {
            let stats = Stat::iter().fold(StatBlock::ZERO, |block, stat| {
                block.with(stat, rng.gen_range(STAT_RANGE))
            });
            (CardId::new(format!("{bot}-card-{i}")), stats)
        })
        .collect()
}
