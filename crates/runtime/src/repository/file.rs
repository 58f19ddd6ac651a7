//! File-backed TreeStore implementation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::error::{Result, StoreError};
use super::memory::{MemoryTreeStore, Persist};
use super::traits::{Document, TreeStore, UpdateFn};
use super::types::{Watch, WriteBatch};

/// Durable [`TreeStore`]: an in-memory tree mirrored to a JSON snapshot.
///
/// # File Format
///
/// The whole tree is stored as one JSON object mapping paths to documents.
/// Every mutation is written to a temporary file and atomically renamed over
/// the previous snapshot before it becomes visible in memory, so a crash
/// leaves either the old or the new tree on disk. A failed write leaves both
/// the file and the in-memory tree unchanged.
pub struct FileTreeStore {
    inner: MemoryTreeStore,
    path: PathBuf,
}

impl FileTreeStore {
    /// Opens the snapshot at `path`, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let docs = if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_slice::<BTreeMap<String, Document>>(&bytes)
                    .map_err(|e| StoreError::CorruptedData(format!("{}: {e}", path.display())))?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(
            "Opened tree store {} with {} documents",
            path.display(),
            docs.len()
        );

        Ok(Self {
            inner: MemoryTreeStore::with_documents(docs),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `docs` as the new snapshot. Runs under the store's write lock,
    /// so snapshots land in commit order.
    fn write_snapshot(&self, docs: &BTreeMap<String, Document>) -> Result<()> {
        let bytes = serde_json::to_vec(docs)
            .map_err(|e| StoreError::json(&self.path.display().to_string(), e))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &self.path)?;

        tracing::trace!("Flushed {} documents to {}", docs.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl TreeStore for FileTreeStore {
    async fn get(&self, path: &str) -> Result<Option<Document>> {
        self.inner.get(path).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<(String, Document)>> {
        self.inner.list(prefix).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let persist: Persist<'_> = &|docs| self.write_snapshot(docs);
        self.inner.apply_batch_with(batch, Some(persist))?;
        Ok(())
    }

    async fn update<'a>(&self, path: &str, f: UpdateFn<'a>) -> Result<Option<Document>> {
        let persist: Persist<'_> = &|docs| self.write_snapshot(docs);
        let (doc, _) = self.inner.apply_update_with(path, f, Some(persist))?;
        Ok(doc)
    }

    fn watch(&self, prefix: &str) -> Watch {
        self.inner.watch(prefix)
    }
}
