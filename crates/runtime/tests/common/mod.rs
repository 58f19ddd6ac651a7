#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError};

use duel_core::{Phase, PlayerId, Stat, StatBlock};
use duel_runtime::repository::{Document, UpdateFn, Watch, paths};
use duel_runtime::{
    Event, MatchEvent, MemoryTreeStore, QueueEvent, StoreError, TreeStore, WriteBatch,
};

/// Upper bound on virtual time any single wait may take.
const WAIT_LIMIT: Duration = Duration::from_secs(300);

pub async fn next_match_event<F>(rx: &mut broadcast::Receiver<Event>, mut pred: F) -> MatchEvent
where
    F: FnMut(&MatchEvent) -> bool,
{
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(Event::Match(event)) if pred(&event) => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("event bus closed"),
            }
        }
    };
    tokio::time::timeout(WAIT_LIMIT, wait)
        .await
        .expect("timed out waiting for a match event")
}

pub async fn next_queue_event<F>(rx: &mut broadcast::Receiver<Event>, mut pred: F) -> QueueEvent
where
    F: FnMut(&QueueEvent) -> bool,
{
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(Event::Queue(event)) if pred(&event) => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("event bus closed"),
            }
        }
    };
    tokio::time::timeout(WAIT_LIMIT, wait)
        .await
        .expect("timed out waiting for a queue event")
}

/// Waits for the match to enter `phase` in `round`.
pub async fn phase(rx: &mut broadcast::Receiver<Event>, phase: Phase, round: u32) -> MatchEvent {
    next_match_event(rx, |e| {
        matches!(e, MatchEvent::PhaseChanged { phase: p, round: r, .. } if *p == phase && *r == round)
    })
    .await
}

pub fn card(attack: u32, armor: u32) -> StatBlock {
    StatBlock::ZERO
        .with(Stat::Attack, attack)
        .with(Stat::Armor, armor)
}

pub fn pid(id: &str) -> PlayerId {
    PlayerId::from(id)
}

/// In-memory store that can be told to fail one update of a match document.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryTreeStore,
    /// Match updates still allowed to succeed before the armed failure.
    armed: Mutex<Option<usize>>,
}

impl FailingStore {
    /// Lets `successes` match updates through, then fails the next one.
    pub fn fail_match_update_after(&self, successes: usize) {
        *self.armed.lock().unwrap() = Some(successes);
    }

    fn take_failure(&self, path: &str) -> bool {
        if !path.starts_with(paths::MATCHES) {
            return false;
        }
        let mut armed = self.armed.lock().unwrap();
        match *armed {
            Some(0) => {
                *armed = None;
                true
            }
            Some(left) => {
                *armed = Some(left - 1);
                false
            }
            None => false,
        }
    }
}

#[async_trait]
impl TreeStore for FailingStore {
    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(path).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<(String, Document)>, StoreError> {
        self.inner.list(prefix).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.inner.commit(batch).await
    }

    async fn update<'a>(
        &self,
        path: &str,
        f: UpdateFn<'a>,
    ) -> Result<Option<Document>, StoreError> {
        if self.take_failure(path) {
            return Err(StoreError::Io(std::io::Error::other("disk unavailable")));
        }
        self.inner.update(path, f).await
    }

    fn watch(&self, prefix: &str) -> Watch {
        self.inner.watch(prefix)
    }
}
