//! Phase timers, player actions and match termination.

mod common;

use std::time::Duration;

use tokio::time::Instant;

use duel_core::{AbilityKey, CardId, CardPick, EndTurn, MatchId, Phase, Side};
use duel_runtime::{Arena, ArenaHandle, JoinRequest, MatchEvent, Topic};

use common::{card, next_match_event, phase, pid};

/// Queues two humans and returns the id of the match they were put in.
async fn start_match(handle: &ArenaHandle, s1: u32, s2: u32) -> MatchId {
    let mut events = handle.subscribe(Topic::Match);
    handle
        .join_queue(JoinRequest::new("u1", "Ann", s1))
        .await
        .expect("u1 joins");
    handle
        .join_queue(JoinRequest::new("u2", "Bo", s2))
        .await
        .expect("u2 joins");
    let created = next_match_event(&mut events, |e| matches!(e, MatchEvent::Created { .. })).await;
    created.match_id().clone()
}

fn pick(id: &str, attack: u32, armor: u32) -> CardPick {
    CardPick {
        card_id: CardId::from(id),
        stats: card(attack, armor),
        photo_ref: None,
    }
}

/// Without any input the match walks every phase on its timers and ends in a
/// draw after the last round, then disappears after the grace period.
#[tokio::test(start_paused = true)]
async fn idle_match_finishes_after_max_rounds() {
    let arena = Arena::builder().build().await.expect("arena should build");
    let handle = arena.handle();
    let mut events = handle.subscribe(Topic::Match);
    let started = Instant::now();
    let id = start_match(&handle, 500, 500).await;

    let finished =
        next_match_event(&mut events, |e| matches!(e, MatchEvent::Finished { .. })).await;
    // cooldown 5 s + 4 × (selection 10 s + battle 5 s)
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(65) && elapsed < Duration::from_secs(66));
    assert!(matches!(
        finished,
        MatchEvent::Finished {
            winner: None,
            loser: None,
            ..
        }
    ));

    let m = handle.get_match(&id).await.expect("read").expect("still stored");
    assert_eq!(m.phase, Phase::Finished);
    assert_eq!(m.round, 4);
    assert_eq!(m.player1.synergy, 500);
    assert!(m.player1.previous_rounds.is_empty());

    next_match_event(&mut events, |e| matches!(e, MatchEvent::Removed { .. })).await;
    assert!(handle.get_match(&id).await.expect("read").is_none());
    assert!(started.elapsed() >= Duration::from_secs(70));

    arena.shutdown().await.expect("shutdown");
}

/// When both players end their turn the battle starts at once, the pending
/// selection timer is dropped and the round is resolved exactly once.
#[tokio::test(start_paused = true)]
async fn both_ending_turn_skips_selection_once() {
    let arena = Arena::builder().build().await.expect("arena should build");
    let handle = arena.handle();
    let mut events = handle.subscribe(Topic::Match);
    let id = start_match(&handle, 500, 500).await;
    let (u1, u2) = (pid("u1"), pid("u2"));

    phase(&mut events, Phase::Selection, 0).await;
    let selection_started = Instant::now();

    handle
        .select_card(&id, &u1, pick("u1-c1", 100, 0))
        .await
        .expect("u1 card");
    handle
        .select_card(&id, &u2, pick("u2-c1", 0, 40))
        .await
        .expect("u2 card");
    assert_eq!(handle.end_turn(&id, &u1).await.expect("end"), EndTurn::Recorded);
    assert_eq!(
        handle.end_turn(&id, &u2).await.expect("end"),
        EndTurn::BothEnded { round: 0 }
    );

    let resolved =
        next_match_event(&mut events, |e| matches!(e, MatchEvent::RoundResolved { .. })).await;
    assert!(selection_started.elapsed() < Duration::from_secs(1));
    let MatchEvent::RoundResolved {
        round,
        attacker,
        defender,
        damage,
        defender_synergy,
        ..
    } = resolved
    else {
        unreachable!()
    };
    // 100 attack against 40 armor / 2, capped at 15 % of 500.
    assert_eq!((round, attacker, defender), (0, u1.clone(), u2.clone()));
    assert_eq!(damage, 75);
    assert_eq!(defender_synergy, 425);

    let m = handle.get_match(&id).await.expect("read").expect("exists");
    assert_eq!(m.phase, Phase::Battle);
    assert!(!m.player1.end_flag && !m.player2.end_flag);
    assert!(m.player1.current_round.is_empty());
    assert_eq!(
        m.player2.previous_rounds[&0].card_id,
        Some(CardId::from("u2-c1"))
    );

    // A late end turn during battle changes nothing.
    assert_eq!(handle.end_turn(&id, &u1).await.expect("end"), EndTurn::Ignored);

    let battle_started = Instant::now();
    let next = next_match_event(&mut events, |e| {
        matches!(
            e,
            MatchEvent::PhaseChanged { .. } | MatchEvent::RoundResolved { .. }
        )
    })
    .await;
    assert!(matches!(
        next,
        MatchEvent::PhaseChanged {
            phase: Phase::Selection,
            round: 1,
            ..
        }
    ));
    let battle = battle_started.elapsed();
    assert!(battle >= Duration::from_secs(5) && battle < Duration::from_secs(6));

    // Roles flipped for the new round.
    let m = handle.get_match(&id).await.expect("read").expect("exists");
    assert_eq!(m.attacker(), Some(Side::Player2));

    arena.shutdown().await.expect("shutdown");
}

/// Repeated or misplaced actions are rejected or ignored without side effects.
#[tokio::test(start_paused = true)]
async fn actions_are_validated() {
    let arena = Arena::builder().build().await.expect("arena should build");
    let handle = arena.handle();
    let mut events = handle.subscribe(Topic::Match);
    let id = start_match(&handle, 500, 480).await;
    let (u1, u2) = (pid("u1"), pid("u2"));

    // Still in cooldown.
    let err = handle
        .select_card(&id, &u1, pick("c", 1, 1))
        .await
        .expect_err("cooldown");
    assert_eq!(err.error_code(), "invalid_phase");
    assert_eq!(handle.end_turn(&id, &u1).await.expect("end"), EndTurn::Ignored);

    phase(&mut events, Phase::Selection, 0).await;

    handle
        .select_card(&id, &u1, pick("c1", 10, 10))
        .await
        .expect("first card");
    let err = handle
        .select_card(&id, &u1, pick("c2", 90, 90))
        .await
        .expect_err("second card");
    assert_eq!(err.error_code(), "duplicate_action");

    let key = handle
        .select_ability(&id, &u2, "Guardian's Bulwark")
        .await
        .expect("by name");
    assert_eq!(key, AbilityKey::from("guardians_bulwark"));
    let err = handle
        .select_ability(&id, &u2, "not-an-ability")
        .await
        .expect_err("unknown");
    assert_eq!(err.error_code(), "unknown_ability");

    let err = handle
        .end_turn(&id, &pid("stranger"))
        .await
        .expect_err("not a participant");
    assert_eq!(err.error_code(), "invalid_participant");

    assert_eq!(handle.end_turn(&id, &u1).await.expect("end"), EndTurn::Recorded);
    assert_eq!(handle.end_turn(&id, &u1).await.expect("end"), EndTurn::AlreadyEnded);

    let err = handle
        .end_turn(&MatchId::from("missing"), &u1)
        .await
        .expect_err("missing match");
    assert_eq!(err.error_code(), "not_found");

    let m = handle.get_match(&id).await.expect("read").expect("exists");
    assert_eq!(m.phase, Phase::Selection);
    assert_eq!(m.player1.current_round.card_id, Some(CardId::from("c1")));
    assert!(m.player1.end_flag);
    assert!(!m.player2.end_flag);

    arena.shutdown().await.expect("shutdown");
}

/// Forfeiting gives the win to the opponent and the match is deleted after
/// the cancellation grace period.
#[tokio::test(start_paused = true)]
async fn cancel_names_winner_and_removes_match() {
    let arena = Arena::builder().build().await.expect("arena should build");
    let handle = arena.handle();
    let mut events = handle.subscribe(Topic::Match);
    let id = start_match(&handle, 500, 500).await;

    let outcome = handle
        .cancel_match(&id, &pid("u2"))
        .await
        .expect("cancel");
    let cancelled_at = Instant::now();
    assert_eq!(outcome.winner, Some(pid("u1")));
    assert_eq!(outcome.loser, Some(pid("u2")));

    let m = handle.get_match(&id).await.expect("read").expect("exists");
    assert_eq!(m.phase, Phase::Cancelled);
    assert_eq!(m.winner_id, Some(pid("u1")));

    let err = handle
        .cancel_match(&id, &pid("u1"))
        .await
        .expect_err("already over");
    assert_eq!(err.error_code(), "invalid_phase");

    // The original cooldown timer must not advance a cancelled match.
    let next = next_match_event(&mut events, |e| {
        matches!(
            e,
            MatchEvent::PhaseChanged { .. } | MatchEvent::Removed { .. }
        ) && e.match_id() == &id
            && !matches!(
                e,
                MatchEvent::PhaseChanged {
                    phase: Phase::Cooldown,
                    ..
                }
            )
    })
    .await;
    assert!(matches!(next, MatchEvent::Removed { .. }));
    let grace = cancelled_at.elapsed();
    assert!(grace >= Duration::from_secs(10) && grace < Duration::from_secs(11));
    assert!(handle.get_match(&id).await.expect("read").is_none());

    // Free to queue again.
    handle
        .join_queue(JoinRequest::new("u1", "Ann", 500))
        .await
        .expect("rejoin after cancel");

    arena.shutdown().await.expect("shutdown");
}

/// A full match where only the higher-synergy player plays cards: they hit
/// in rounds 0 and 2 and win on synergy.
#[tokio::test(start_paused = true)]
async fn active_player_wins_on_synergy() {
    let arena = Arena::builder().build().await.expect("arena should build");
    let handle = arena.handle();
    let mut events = handle.subscribe(Topic::Match);
    let id = start_match(&handle, 600, 580).await;
    let u1 = pid("u1");

    for round in 0..4 {
        phase(&mut events, Phase::Selection, round).await;
        let m = handle.get_match(&id).await.expect("read").expect("exists");
        if m.attacker() == Some(Side::Player1) {
            handle
                .select_card(&id, &u1, pick(&format!("u1-c{round}"), 100, 0))
                .await
                .expect("card");
            handle
                .select_ability(&id, &u1, "titan_strike")
                .await
                .expect("ability");
        }
    }

    let finished =
        next_match_event(&mut events, |e| matches!(e, MatchEvent::Finished { .. })).await;
    assert!(matches!(
        finished,
        MatchEvent::Finished {
            winner: Some(ref w),
            loser: Some(ref l),
            ..
        } if w == &pid("u1") && l == &pid("u2")
    ));

    // 580 - 174 (30 % cap) = 406, then 406 - 122 = 284.
    let m = handle.get_match(&id).await.expect("read").expect("exists");
    assert_eq!(m.player1.synergy, 600);
    assert_eq!(m.player2.synergy, 284);
    assert_eq!(m.player1.previous_rounds.len(), 2);
    assert_eq!(
        m.player1.previous_rounds[&2].ability,
        Some(AbilityKey::from("titan_strike"))
    );

    arena.shutdown().await.expect("shutdown");
}
