//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{MatchEvent, QueueEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Queue membership (joins, leaves, bot spawns)
    Queue,
    /// Match lifecycle (creation, phases, rounds, results)
    Match,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Queue(QueueEvent),
    Match(MatchEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Queue(_) => Topic::Queue,
            Event::Match(_) => Topic::Match,
        }
    }
}

impl From<QueueEvent> for Event {
    fn from(event: QueueEvent) -> Self {
        Event::Queue(event)
    }
}

impl From<MatchEvent> for Event {
    fn from(event: MatchEvent) -> Self {
        Event::Match(event)
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Cloning shares the underlying channels.
#[derive(Clone)]
pub struct EventBus {
    queue: broadcast::Sender<Event>,
    matches: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: broadcast::channel(capacity).0,
            matches: broadcast::channel(capacity).0,
        }
    }

    fn channel(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Queue => &self.queue,
            Topic::Match => &self.matches,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();
        if self.channel(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channel(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_core::{MatchId, PlayerId};

    #[tokio::test]
    async fn routes_by_topic() {
        let bus = EventBus::with_capacity(4);
        let mut matches = bus.subscribe(Topic::Match);
        let mut queue = bus.subscribe(Topic::Queue);

        bus.publish(QueueEvent::PlayerLeft {
            player: PlayerId::from("p"),
        });
        bus.publish(MatchEvent::Removed {
            match_id: MatchId::from("m"),
        });

        assert_eq!(matches.recv().await.unwrap().topic(), Topic::Match);
        assert_eq!(queue.recv().await.unwrap().topic(), Topic::Queue);
        assert!(matches.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        EventBus::new().publish(MatchEvent::Removed {
            match_id: MatchId::from("m"),
        });
    }
}
