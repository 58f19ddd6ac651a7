//! In-memory TreeStore implementation for tests and local runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::error::{Result, StoreError};
use super::traits::{Document, TreeStore, UpdateFn};
use super::types::{Change, Update, Watch, WriteBatch, WriteOp};

const CHANGE_BUFFER: usize = 256;

/// Durability hook run on a candidate tree before it becomes visible.
pub(crate) type Persist<'p> = &'p dyn Fn(&BTreeMap<String, Document>) -> Result<()>;

/// In-memory implementation of [`TreeStore`].
///
/// Documents live in an ordered map so prefix listings come back in path
/// order. Every committed mutation is broadcast to watchers after the write
/// lock is released.
pub struct MemoryTreeStore {
    docs: RwLock<BTreeMap<String, Document>>,
    changes: broadcast::Sender<Change>,
}

impl MemoryTreeStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_documents(BTreeMap::new())
    }

    /// Create a store pre-populated with `docs`.
    pub fn with_documents(docs: BTreeMap<String, Document>) -> Self {
        Self {
            docs: RwLock::new(docs),
            changes: broadcast::channel(CHANGE_BUFFER).0,
        }
    }

    /// Clone of the whole tree.
    pub fn snapshot(&self) -> Result<BTreeMap<String, Document>> {
        let docs = self.docs.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(docs.clone())
    }

    /// Validates and applies a batch. Returns the changes that took effect.
    pub(crate) fn apply_batch(&self, batch: WriteBatch) -> Result<Vec<Change>> {
        self.apply_batch_with(batch, None)
    }

    /// Like [`apply_batch`](Self::apply_batch), but a non-empty result is
    /// first built on a copy of the tree and handed to `persist`. The copy
    /// replaces the live tree only if `persist` succeeds.
    pub(crate) fn apply_batch_with(
        &self,
        batch: WriteBatch,
        persist: Option<Persist<'_>>,
    ) -> Result<Vec<Change>> {
        let changes = {
            let mut docs = self.docs.write().map_err(|_| StoreError::LockPoisoned)?;
            check_preconditions(&docs, &batch)?;

            match persist {
                None => apply_ops(&mut docs, &batch),
                Some(persist) => {
                    let mut next = (*docs).clone();
                    let changes = apply_ops(&mut next, &batch);
                    if !changes.is_empty() {
                        persist(&next)?;
                        *docs = next;
                    }
                    changes
                }
            }
        };

        self.publish(&changes);
        Ok(changes)
    }

    /// Runs `f` under the write lock. Returns the resulting document and the
    /// change, if any.
    pub(crate) fn apply_update(
        &self,
        path: &str,
        f: UpdateFn<'_>,
    ) -> Result<(Option<Document>, Option<Change>)> {
        self.apply_update_with(path, f, None)
    }

    /// Update counterpart of [`apply_batch_with`](Self::apply_batch_with).
    pub(crate) fn apply_update_with(
        &self,
        path: &str,
        f: UpdateFn<'_>,
        persist: Option<Persist<'_>>,
    ) -> Result<(Option<Document>, Option<Change>)> {
        let (result, change) = {
            let mut docs = self.docs.write().map_err(|_| StoreError::LockPoisoned)?;
            let current = docs.get(path).cloned();

            let (result, change) = match f(current.clone()) {
                Update::Set(next) => {
                    let change = Change {
                        path: path.to_owned(),
                        value: Some(next.clone()),
                    };
                    (Some(next), Some(change))
                }
                Update::Delete => {
                    let change = current.as_ref().map(|_| Change {
                        path: path.to_owned(),
                        value: None,
                    });
                    (None, change)
                }
                Update::Keep => (current, None),
            };

            if let Some(change) = &change {
                match persist {
                    None => apply_change(&mut docs, change),
                    Some(persist) => {
                        let mut next = (*docs).clone();
                        apply_change(&mut next, change);
                        persist(&next)?;
                        *docs = next;
                    }
                }
            }
            (result, change)
        };

        if let Some(change) = &change {
            self.publish(std::slice::from_ref(change));
        }
        Ok((result, change))
    }

    fn publish(&self, changes: &[Change]) {
        for change in changes {
            // No watchers is normal.
            let _ = self.changes.send(change.clone());
        }
    }
}

impl Default for MemoryTreeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_ops(docs: &mut BTreeMap<String, Document>, batch: &WriteBatch) -> Vec<Change> {
    let mut changes = Vec::with_capacity(batch.len());
    for op in batch.ops() {
        let change = Change {
            path: op.path().to_owned(),
            value: op.value().cloned(),
        };
        if change.value.is_some() || docs.contains_key(&change.path) {
            apply_change(docs, &change);
            changes.push(change);
        }
    }
    changes
}

fn apply_change(docs: &mut BTreeMap<String, Document>, change: &Change) {
    match &change.value {
        Some(value) => {
            docs.insert(change.path.clone(), value.clone());
        }
        None => {
            docs.remove(&change.path);
        }
    }
}

fn check_preconditions(docs: &BTreeMap<String, Document>, batch: &WriteBatch) -> Result<()> {
    // Existence as seen by each op, including the effect of earlier ops.
    let mut overlay: HashMap<&str, bool> = HashMap::new();

    for op in batch.ops() {
        let path = op.path();
        let exists = overlay
            .get(path)
            .copied()
            .unwrap_or_else(|| docs.contains_key(path));

        match op {
            WriteOp::Create { .. } if exists => {
                return Err(StoreError::Conflict {
                    path: path.to_owned(),
                    reason: "already exists",
                });
            }
            WriteOp::DeleteExisting { .. } if !exists => {
                return Err(StoreError::Conflict {
                    path: path.to_owned(),
                    reason: "does not exist",
                });
            }
            _ => {}
        }

        overlay.insert(path, op.value().is_some());
    }

    Ok(())
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn get(&self, path: &str) -> Result<Option<Document>> {
        let docs = self.docs.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(docs.get(path).cloned())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<(String, Document)>> {
        let docs = self.docs.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(docs
            .range(prefix.to_owned()..)
            .take_while(|(path, _)| path.starts_with(prefix))
            .map(|(path, doc)| (path.clone(), doc.clone()))
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.apply_batch(batch).map(|_| ())
    }

    async fn update<'a>(&self, path: &str, f: UpdateFn<'a>) -> Result<Option<Document>> {
        self.apply_update(path, f).map(|(doc, _)| doc)
    }

    fn watch(&self, prefix: &str) -> Watch {
        Watch::new(prefix, self.changes.subscribe())
    }
}
