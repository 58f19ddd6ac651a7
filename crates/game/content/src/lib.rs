//! Data-driven duel content and loaders.
//!
//! This crate reads the tunable parts of the duel from data files:
//! - Duel configuration (timers, matchmaking, combat caps) via TOML
//! - The ability book (keys, names, weight vectors) via RON
//!
//! Content is consumed by the runtime at startup and never appears in match
//! state; matches only carry ability keys.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{AbilityCatalog, AbilityLoader, ConfigLoader, ContentFactory};
