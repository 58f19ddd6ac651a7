//! Outbound push notifications to participants.
//!
//! The arena only needs a `notify(player, payload)` capability; transport
//! (websocket, push service, ...) lives behind the [`Notifier`] trait.
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use duel_core::{Match, MatchId, ParticipantKind, PlayerId, Side};

/// Public view of the opponent sent with "match found".
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentSummary {
    pub user_id: PlayerId,
    pub display_name: String,
    pub synergy: u32,
    pub photo_ref: Option<String>,
    pub kind: ParticipantKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Notification {
    MatchFound {
        match_id: MatchId,
        opponent: OpponentSummary,
    },
}

impl Notification {
    /// "Match found" payload addressed to the participant on `side`.
    pub fn match_found(m: &Match, side: Side) -> Self {
        let opponent = m.player(side.other());
        Notification::MatchFound {
            match_id: m.id.clone(),
            opponent: OpponentSummary {
                user_id: opponent.user_id.clone(),
                display_name: opponent.display_name.clone(),
                synergy: opponent.synergy,
                photo_ref: opponent.photo_ref.clone(),
                kind: opponent.kind,
            },
        }
    }
}

/// Delivery capability for participant notifications.
///
/// Delivery is best effort; implementations log failures instead of
/// returning them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, player: &PlayerId, payload: Notification);
}

/// Notifier that only logs. Default when no transport is configured.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, player: &PlayerId, payload: Notification) {
        match &payload {
            Notification::MatchFound { match_id, opponent } => tracing::info!(
                "Notify {}: match {} found against {}",
                player,
                match_id,
                opponent.display_name
            ),
        }
    }
}

/// Forwards notifications into a channel.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<(PlayerId, Notification)>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(PlayerId, Notification)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, player: &PlayerId, payload: Notification) {
        if self.tx.send((player.clone(), payload)).is_err() {
            tracing::debug!("Notification receiver dropped; discarding for {}", player);
        }
    }
}
