//! Tree store contract and typed helpers.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{Result, StoreError};
use super::types::{Update, Watch, WriteBatch};

/// A stored document.
pub type Document = serde_json::Value;

/// Closure run by [`TreeStore::update`] with the current document.
///
/// It runs while the store holds its write lock and must not call back into
/// the store.
pub type UpdateFn<'a> = Box<dyn FnOnce(Option<Document>) -> Update<Document> + Send + 'a>;

/// Hierarchical document store with atomic batches and change subscription.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Point read.
    async fn get(&self, path: &str) -> Result<Option<Document>>;

    /// All documents whose path starts with `prefix`, in path order.
    async fn list(&self, prefix: &str) -> Result<Vec<(String, Document)>>;

    /// Applies every op of `batch` or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Atomic read-modify-write of a single path.
    ///
    /// Returns the document stored at `path` after the call.
    async fn update<'a>(&self, path: &str, f: UpdateFn<'a>) -> Result<Option<Document>>;

    /// Subscribes to committed changes under `prefix`.
    fn watch(&self, prefix: &str) -> Watch;
}

/// Reads and decodes one document.
pub async fn get_json<T: DeserializeOwned>(store: &dyn TreeStore, path: &str) -> Result<Option<T>> {
    store
        .get(path)
        .await?
        .map(|doc| serde_json::from_value(doc).map_err(|e| StoreError::json(path, e)))
        .transpose()
}

/// Reads and decodes every document under `prefix`.
///
/// Documents that fail to decode are skipped with a warning so one corrupt
/// entry cannot stall the callers that scan a whole prefix.
pub async fn list_json<T: DeserializeOwned>(store: &dyn TreeStore, prefix: &str) -> Result<Vec<T>> {
    let docs = store.list(prefix).await?;
    let mut out = Vec::with_capacity(docs.len());
    for (path, doc) in docs {
        match serde_json::from_value(doc) {
            Ok(value) => out.push(value),
            Err(error) => tracing::warn!(%path, %error, "skipping undecodable document"),
        }
    }
    Ok(out)
}

/// Typed transactional update.
///
/// `f` receives the decoded document (or `None`) and returns what to store
/// plus a result for the caller. An `Err` from `f` leaves the document
/// untouched and is returned as is.
pub async fn transact<T, R, E, F>(store: &dyn TreeStore, path: &str, f: F) -> std::result::Result<R, E>
where
    T: Serialize + DeserializeOwned + Send,
    R: Send,
    E: From<StoreError> + Send,
    F: FnOnce(Option<T>) -> std::result::Result<(Update<T>, R), E> + Send,
{
    let mut outcome: Option<std::result::Result<R, E>> = None;
    let slot = &mut outcome;
    let owned_path = path.to_owned();

    store
        .update(
            path,
            Box::new(move |current| {
                let decoded = match current.map(serde_json::from_value::<T>).transpose() {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        *slot = Some(Err(StoreError::json(&owned_path, e).into()));
                        return Update::Keep;
                    }
                };

                match f(decoded) {
                    Ok((update, value)) => {
                        let encoded = match update {
                            Update::Set(next) => match serde_json::to_value(&next) {
                                Ok(doc) => Update::Set(doc),
                                Err(e) => {
                                    *slot = Some(Err(StoreError::json(&owned_path, e).into()));
                                    return Update::Keep;
                                }
                            },
                            Update::Delete => Update::Delete,
                            Update::Keep => Update::Keep,
                        };
                        *slot = Some(Ok(value));
                        encoded
                    }
                    Err(e) => {
                        *slot = Some(Err(e));
                        Update::Keep
                    }
                }
            }),
        )
        .await?;

    outcome.unwrap_or_else(|| Err(StoreError::TransactionSkipped(path.to_owned()).into()))
}
