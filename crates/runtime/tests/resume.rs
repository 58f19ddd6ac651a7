//! Restart behaviour: persisted matches are picked up by a new arena.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use duel_core::{Match, MatchId, Phase, QueueEntry};
use duel_runtime::repository::paths;
use duel_runtime::{
    Arena, Clock, FileTreeStore, JoinRequest, MatchEvent, MatchIndexEntry, MemoryTreeStore, Topic,
    TreeStore,
};

use common::{next_match_event, phase, pid};

const EPOCH: i64 = 1_700_000_000_000;

/// A match persisted by one arena continues in the next one with only the
/// remaining part of its phase left.
#[tokio::test(start_paused = true)]
async fn file_store_match_resumes_with_remaining_time() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("arena.json");

    let first = Arena::builder()
        .store(FileTreeStore::open(&path).expect("open store"))
        .clock(Clock::starting_at(EPOCH))
        .build()
        .await
        .expect("first arena");
    let handle = first.handle();
    let mut events = handle.subscribe(Topic::Match);
    handle
        .join_queue(JoinRequest::new("u1", "Ann", 500))
        .await
        .expect("join");
    handle
        .join_queue(JoinRequest::new("u2", "Bo", 510))
        .await
        .expect("join");
    let created = next_match_event(&mut events, |e| matches!(e, MatchEvent::Created { .. })).await;
    let id = created.match_id().clone();
    first.shutdown().await.expect("shutdown");

    tokio::time::advance(Duration::from_secs(2)).await;

    let second = Arena::builder()
        .store(FileTreeStore::open(&path).expect("reopen store"))
        .clock(Clock::starting_at(EPOCH + 2_000))
        .build()
        .await
        .expect("second arena");
    let handle = second.handle();
    let mut events = handle.subscribe(Topic::Match);

    let m = handle.get_match(&id).await.expect("read").expect("persisted");
    assert_eq!(m.phase, Phase::Cooldown);

    let resumed_at = Instant::now();
    assert_eq!(second.resume().await.expect("resume"), 1);
    assert_eq!(second.live_matches(), 1);
    // Resuming twice does not start a second worker.
    assert_eq!(second.resume().await.expect("resume"), 0);

    phase(&mut events, Phase::Selection, 0).await;
    let left = resumed_at.elapsed();
    assert!(left >= Duration::from_secs(3) && left < Duration::from_secs(4), "{left:?}");

    second.shutdown().await.expect("shutdown");
}

/// Terminal matches get their deletion grace re-armed from
/// `phase_start_time`, and stale discovery entries are dropped.
#[tokio::test(start_paused = true)]
async fn resumed_terminal_match_is_deleted_after_rest_of_grace() {
    let a = QueueEntry::human(pid("a"), "A", 100, EPOCH);
    let b = QueueEntry::human(pid("b"), "B", 100, EPOCH);
    let id = MatchId::from("c0ffee");
    let mut m = Match::new(id.clone(), &a, &b, 4, EPOCH);
    m.phase = Phase::Cancelled;
    m.phase_start_time = EPOCH;
    m.winner_id = Some(pid("a"));
    m.loser_id = Some(pid("b"));

    let mut docs = BTreeMap::new();
    docs.insert(
        paths::match_doc(&id),
        serde_json::to_value(&m).expect("encode"),
    );
    docs.insert(
        paths::match_index(&id),
        serde_json::to_value(MatchIndexEntry::for_match(&m)).expect("encode"),
    );
    let store: Arc<dyn TreeStore> = Arc::new(MemoryTreeStore::with_documents(docs));

    // Restarted 4 s into a 10 s grace period.
    let arena = Arena::builder()
        .shared_store(Arc::clone(&store))
        .clock(Clock::starting_at(EPOCH + 4_000))
        .enable_matchmaking(false)
        .build()
        .await
        .expect("arena");
    let handle = arena.handle();
    let mut events = handle.subscribe(Topic::Match);

    let resumed_at = Instant::now();
    assert_eq!(arena.resume().await.expect("resume"), 1);

    next_match_event(&mut events, |e| matches!(e, MatchEvent::Removed { .. })).await;
    let left = resumed_at.elapsed();
    assert!(left >= Duration::from_secs(6) && left < Duration::from_secs(7), "{left:?}");
    assert!(handle.get_match(&id).await.expect("read").is_none());
    assert!(
        store
            .get(&paths::match_index(&id))
            .await
            .expect("read")
            .is_none()
    );

    arena.shutdown().await.expect("shutdown");
}
