//! Routing table from match id to the signal channel of its worker.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

use duel_core::MatchId;

use super::duel::Signal;

#[derive(Default)]
pub(crate) struct MatchRegistry {
    senders: Mutex<HashMap<MatchId, mpsc::Sender<Signal>>>,
}

impl MatchRegistry {
    /// Registers a worker. Fails if a live worker already owns `id`.
    pub fn insert(&self, id: MatchId, tx: mpsc::Sender<Signal>) -> bool {
        let Ok(mut senders) = self.senders.lock() else {
            return false;
        };
        if senders.get(&id).is_some_and(|existing| !existing.is_closed()) {
            return false;
        }
        senders.insert(id, tx);
        true
    }

    /// Unregisters `id` if it is still owned by `tx`.
    pub fn remove(&self, id: &MatchId, tx: &mpsc::Sender<Signal>) {
        if let Ok(mut senders) = self.senders.lock()
            && senders.get(id).is_some_and(|current| current.same_channel(tx))
        {
            senders.remove(id);
        }
    }

    /// Delivers `signal` to the worker of `id`. Returns whether it was queued.
    pub fn signal(&self, id: &MatchId, signal: Signal) -> bool {
        let tx = match self.senders.lock() {
            Ok(senders) => senders.get(id).cloned(),
            Err(_) => None,
        };
        match tx {
            Some(tx) => tx.try_send(signal).is_ok(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.senders.lock().map(|senders| senders.len()).unwrap_or(0)
    }
}
