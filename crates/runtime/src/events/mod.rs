//! Topic-based event bus for arena events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need. Delivery is best effort: a topic without
//! subscribers drops its events.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{MatchEvent, QueueEvent};
