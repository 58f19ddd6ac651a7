//! Async orchestration for real-time card duels.
//!
//! This crate wires the pure rules from `duel-core` to a tree-structured
//! document store, a matchmaking worker and one worker per live match.
//! Consumers embed [`Arena`] and interact with it through [`ArenaHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the handle, notifier contract and errors
//! - [`events`] provides the topic-based event bus
//! - [`repository`] provides the tree store and its implementations
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod repository;
pub mod runtime;
pub mod utils;

mod workers;

pub use api::{
    ArenaError, ArenaHandle, ChannelNotifier, JoinRequest, Notification, Notifier,
    OpponentSummary, Result, TracingNotifier,
};
pub use events::{Event, EventBus, MatchEvent, QueueEvent, Topic};
pub use repository::{
    FileTreeStore, MatchIndexEntry, MemoryTreeStore, StoreError, TreeStore, WriteBatch,
};
pub use runtime::{Arena, ArenaBuilder, ArenaConfig};
pub use utils::Clock;
