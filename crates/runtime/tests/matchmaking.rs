//! Queue, pairing and bot injection scenarios.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use duel_core::{ParticipantKind, Phase, QueueEntry, TimersKind};
use duel_runtime::repository::paths;
use duel_runtime::{
    Arena, ChannelNotifier, JoinRequest, MatchEvent, MemoryTreeStore, Notification, QueueEvent,
    Topic, TreeStore,
};

use common::{next_match_event, next_queue_event, pid};

/// Two humans within the synergy tolerance are paired immediately, removed
/// from the queue and both notified.
#[tokio::test(start_paused = true)]
async fn players_within_tolerance_are_paired() {
    let (notifier, mut notes) = ChannelNotifier::new();
    let arena = Arena::builder()
        .notifier(notifier)
        .build()
        .await
        .expect("arena should build");
    let handle = arena.handle();
    let mut events = handle.subscribe(Topic::Match);

    handle
        .join_queue(JoinRequest::new("u1", "Ann", 500))
        .await
        .expect("u1 joins");
    handle
        .join_queue(JoinRequest::new("u2", "Bo", 540))
        .await
        .expect("u2 joins");

    let created = next_match_event(&mut events, |e| matches!(e, MatchEvent::Created { .. })).await;
    let MatchEvent::Created {
        match_id,
        player1,
        player2,
        timers_type,
    } = created
    else {
        unreachable!()
    };
    assert_eq!((player1, player2), (pid("u1"), pid("u2")));
    assert_eq!(timers_type, TimersKind::Normal);
    assert_eq!(match_id.as_str().len(), 6);

    assert!(handle.queue().await.expect("queue").is_empty());

    let m = handle
        .get_match(&match_id)
        .await
        .expect("read")
        .expect("match exists");
    assert_eq!(m.phase, Phase::Cooldown);
    assert_eq!(m.round, 0);
    assert_eq!(m.max_synergy, Some(540));
    assert_eq!(handle.find_active_match(&pid("u2")).await.expect("read"), Some(match_id.clone()));

    let mut notified = Vec::new();
    for _ in 0..2 {
        let (player, Notification::MatchFound { match_id: id, opponent }) =
            notes.recv().await.expect("notification");
        assert_eq!(id, match_id);
        assert_ne!(opponent.user_id, player);
        notified.push(player);
    }
    notified.sort();
    assert_eq!(notified, vec![pid("u1"), pid("u2")]);

    arena.shutdown().await.expect("shutdown");
}

/// Entries further apart than the tolerance wait; once a compatible player
/// arrives the oldest compatible pair is formed.
#[tokio::test(start_paused = true)]
async fn distant_synergies_wait_for_a_closer_opponent() {
    let arena = Arena::builder()
        .enable_matchmaking(false)
        .build()
        .await
        .expect("arena should build");
    let handle = arena.handle();

    handle.join_queue(JoinRequest::new("a", "A", 100)).await.expect("join");
    handle.join_queue(JoinRequest::new("b", "B", 400)).await.expect("join");
    assert!(arena.pairing_pass().await.expect("pass").is_empty());

    handle.join_queue(JoinRequest::new("c", "C", 420)).await.expect("join");
    let created = arena.pairing_pass().await.expect("pass");
    assert_eq!(created.len(), 1);

    let m = handle
        .get_match(&created[0])
        .await
        .expect("read")
        .expect("match exists");
    assert_eq!((m.player1.user_id.clone(), m.player2.user_id.clone()), (pid("b"), pid("c")));

    let queue = handle.queue().await.expect("queue");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].player_id, pid("a"));

    arena.shutdown().await.expect("shutdown");
}

/// Rejoining keeps the original join time; a player in a live match cannot
/// queue again.
#[tokio::test(start_paused = true)]
async fn rejoin_keeps_place_and_live_players_are_rejected() {
    let arena = Arena::builder()
        .enable_matchmaking(false)
        .build()
        .await
        .expect("arena should build");
    let handle = arena.handle();

    let first = handle.join_queue(JoinRequest::new("a", "A", 100)).await.expect("join");
    tokio::time::advance(Duration::from_secs(3)).await;
    let again = handle.join_queue(JoinRequest::new("a", "A2", 120)).await.expect("rejoin");
    assert_eq!(again.joined_at, first.joined_at);
    assert_eq!(again.synergy, 120);
    assert_eq!(again.display_name, "A2");

    handle.join_queue(JoinRequest::new("b", "B", 130)).await.expect("join");
    arena.pairing_pass().await.expect("pass");

    let err = handle
        .join_queue(JoinRequest::new("a", "A", 100))
        .await
        .expect_err("already playing");
    assert_eq!(err.error_code(), "already_in_match");

    let err = handle
        .join_queue(JoinRequest::new("x/y", "bad", 100))
        .await
        .expect_err("invalid id");
    assert_eq!(err.error_code(), "invalid_request");

    assert!(!handle.leave_queue(&pid("nobody")).await.expect("leave"));

    arena.shutdown().await.expect("shutdown");
}

/// A lone human gets a bot opponent with the same synergy once the wait
/// threshold has passed, and the two are paired.
#[tokio::test(start_paused = true)]
async fn bot_is_spawned_after_threshold() {
    let arena = Arena::builder().build().await.expect("arena should build");
    let handle = arena.handle();
    let mut queue_events = handle.subscribe(Topic::Queue);
    let mut match_events = handle.subscribe(Topic::Match);

    let started = Instant::now();
    handle
        .join_queue(JoinRequest::new("solo", "Solo", 300))
        .await
        .expect("join");

    let spawned =
        next_queue_event(&mut queue_events, |e| matches!(e, QueueEvent::BotSpawned { .. })).await;
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(5), "bot spawned after {waited:?}");
    assert!(waited <= Duration::from_secs(7), "bot spawned after {waited:?}");

    let QueueEvent::BotSpawned {
        bot,
        bot_for,
        synergy,
    } = spawned
    else {
        unreachable!()
    };
    assert_eq!(bot_for, pid("solo"));
    assert_eq!(synergy, 300);
    assert!(bot.as_str().starts_with("bot-"));

    let created =
        next_match_event(&mut match_events, |e| matches!(e, MatchEvent::Created { .. })).await;
    let m = handle
        .get_match(created.match_id())
        .await
        .expect("read")
        .expect("match exists");
    let bot_side = m
        .players()
        .into_iter()
        .find(|p| p.user_id == bot)
        .expect("bot takes part");
    assert_eq!(bot_side.kind, ParticipantKind::Bot);
    assert!(handle.queue().await.expect("queue").is_empty());

    arena.shutdown().await.expect("shutdown");
}

/// Bots are never paired with each other, and a bot whose human left is
/// retired on the next sweep.
#[tokio::test(start_paused = true)]
async fn orphan_bots_are_retired_and_never_paired() {
    let human = QueueEntry::human(pid("gone"), "Gone", 200, 0);
    let bot_a = QueueEntry::bot_for(&human, pid("bot-a"), "A (bot)".into(), 0);
    let bot_b = QueueEntry::bot_for(&human, pid("bot-b"), "B (bot)".into(), 0);
    let mut docs = BTreeMap::new();
    for bot in [&bot_a, &bot_b] {
        docs.insert(
            paths::queue(&bot.player_id),
            serde_json::to_value(bot).expect("encode"),
        );
    }
    let store: Arc<dyn TreeStore> = Arc::new(MemoryTreeStore::with_documents(docs));

    let arena = Arena::builder()
        .shared_store(store)
        .enable_matchmaking(false)
        .build()
        .await
        .expect("arena should build");
    let handle = arena.handle();
    let mut queue_events = handle.subscribe(Topic::Queue);

    assert!(arena.pairing_pass().await.expect("pass").is_empty());
    assert_eq!(handle.queue().await.expect("queue").len(), 2);

    assert_eq!(arena.inject_bots().await.expect("sweep"), 0);
    let mut retired = Vec::new();
    for _ in 0..2 {
        if let QueueEvent::BotRetired { bot } =
            next_queue_event(&mut queue_events, |e| matches!(e, QueueEvent::BotRetired { .. })).await
        {
            retired.push(bot);
        }
    }
    retired.sort();
    assert_eq!(retired, vec![pid("bot-a"), pid("bot-b")]);
    assert!(handle.queue().await.expect("queue").is_empty());

    arena.shutdown().await.expect("shutdown");
}

/// The tutorial flag of either participant selects the tutorial timers.
#[tokio::test(start_paused = true)]
async fn tutorial_flag_selects_tutorial_timers() {
    let arena = Arena::builder().build().await.expect("arena should build");
    let handle = arena.handle();
    let mut events = handle.subscribe(Topic::Match);

    let started = Instant::now();
    handle
        .join_queue(JoinRequest::new("t1", "New", 100).tutorial(true))
        .await
        .expect("join");
    handle
        .join_queue(JoinRequest::new("t2", "Old", 100))
        .await
        .expect("join");

    let created = next_match_event(&mut events, |e| matches!(e, MatchEvent::Created { .. })).await;
    assert!(matches!(
        created,
        MatchEvent::Created {
            timers_type: TimersKind::Tutorial,
            ..
        }
    ));

    common::phase(&mut events, Phase::Selection, 0).await;
    let cooldown = started.elapsed();
    assert!(cooldown >= Duration::from_secs(16) && cooldown < Duration::from_secs(17));

    arena.shutdown().await.expect("shutdown");
}
