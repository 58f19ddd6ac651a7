//! Tree-structured document store.
//!
//! The store is the only state shared between the matchmaking worker, match
//! workers and the action surface. Documents are JSON values addressed by
//! slash-separated paths (see [`paths`]). Every multi-document mutation is a
//! [`WriteBatch`] applied atomically, and single-document read-modify-write
//! goes through [`TreeStore::update`].
//!
//! Implementations:
//! - [`MemoryTreeStore`] for tests and ephemeral deployments
//! - [`FileTreeStore`] which snapshots the tree to a JSON file after every commit

mod error;
mod file;
mod memory;
pub mod paths;
mod traits;
mod types;

pub use error::{Result, StoreError};
pub use file::FileTreeStore;
pub use memory::MemoryTreeStore;
pub use traits::{Document, TreeStore, UpdateFn, get_json, list_json, transact};
pub use paths::MatchIndexEntry;
pub use types::{Change, Update, Watch, WatchEvent, WriteBatch, WriteOp};
