//! Public surface of the arena: the action handle, notifier contract and
//! error types.

mod errors;
mod handle;
mod notifier;

pub use errors::{ArenaError, Result};
pub use handle::{ArenaHandle, JoinRequest};
pub use notifier::{ChannelNotifier, Notification, Notifier, OpponentSummary, TracingNotifier};
