//! Batch, change and watch types shared by store implementations.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use super::error::{Result, StoreError};

/// One mutation inside a [`WriteBatch`].
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOp {
    /// Insert or overwrite.
    Put { path: String, value: Value },
    /// Insert; fails the whole batch if the path exists.
    Create { path: String, value: Value },
    /// Remove if present.
    Delete { path: String },
    /// Remove; fails the whole batch if the path is missing.
    DeleteExisting { path: String },
}

impl WriteOp {
    pub fn path(&self) -> &str {
        match self {
            Self::Put { path, .. }
            | Self::Create { path, .. }
            | Self::Delete { path }
            | Self::DeleteExisting { path } => path,
        }
    }

    pub(crate) fn value(&self) -> Option<&Value> {
        match self {
            Self::Put { value, .. } | Self::Create { value, .. } => Some(value),
            Self::Delete { .. } | Self::DeleteExisting { .. } => None,
        }
    }
}

/// Ordered set of mutations committed all-or-nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, path: impl Into<String>, value: Value) -> Self {
        self.ops.push(WriteOp::Put {
            path: path.into(),
            value,
        });
        self
    }

    pub fn create(mut self, path: impl Into<String>, value: Value) -> Self {
        self.ops.push(WriteOp::Create {
            path: path.into(),
            value,
        });
        self
    }

    pub fn delete(mut self, path: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Delete { path: path.into() });
        self
    }

    pub fn delete_existing(mut self, path: impl Into<String>) -> Self {
        self.ops.push(WriteOp::DeleteExisting { path: path.into() });
        self
    }

    pub fn put_json<T: Serialize>(self, path: impl Into<String>, value: &T) -> Result<Self> {
        let path = path.into();
        let value = serde_json::to_value(value).map_err(|e| StoreError::json(&path, e))?;
        Ok(self.put(path, value))
    }

    pub fn create_json<T: Serialize>(self, path: impl Into<String>, value: &T) -> Result<Self> {
        let path = path.into();
        let value = serde_json::to_value(value).map_err(|e| StoreError::json(&path, e))?;
        Ok(self.create(path, value))
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// A committed mutation of one path. `value` is `None` for deletions.
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    pub path: String,
    pub value: Option<Value>,
}

/// Decision returned by a transactional update closure.
#[derive(Clone, Debug, PartialEq)]
pub enum Update<T> {
    Set(T),
    Delete,
    Keep,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WatchEvent {
    Changed(Change),
    /// The subscriber fell behind and missed `n` changes; re-read the prefix.
    Lagged(u64),
}

/// Change subscription filtered to a path prefix.
pub struct Watch {
    prefix: String,
    rx: broadcast::Receiver<Change>,
}

impl Watch {
    pub(crate) fn new(prefix: impl Into<String>, rx: broadcast::Receiver<Change>) -> Self {
        Self {
            prefix: prefix.into(),
            rx,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Waits for the next change under the prefix. `None` once the store is gone.
    pub async fn next(&mut self) -> Option<WatchEvent> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.path.starts_with(&self.prefix) => {
                    return Some(WatchEvent::Changed(change));
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    return Some(WatchEvent::Lagged(missed));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Discards changes already buffered. Returns how many matched the prefix.
    pub fn drain(&mut self) -> usize {
        let mut matched: usize = 0;
        loop {
            match self.rx.try_recv() {
                Ok(change) => {
                    if change.path.starts_with(&self.prefix) {
                        matched += 1;
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    matched = matched.saturating_add(usize::try_from(missed).unwrap_or(usize::MAX));
                }
                Err(_) => return matched,
            }
        }
    }
}
