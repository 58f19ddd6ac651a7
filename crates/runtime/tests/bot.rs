//! A bot opponent plays its rounds through the public handle.

mod common;

use std::time::Duration;

use tokio::time::Instant;

use duel_core::{AbilityKind, Phase, Role};
use duel_runtime::{Arena, JoinRequest, MatchEvent, Topic};

use common::{next_match_event, phase, pid};

#[tokio::test(start_paused = true)]
async fn bot_selects_and_ends_turn_before_timer() {
    let arena = Arena::builder().build().await.expect("arena should build");
    let handle = arena.handle();
    let mut events = handle.subscribe(Topic::Match);
    let human = pid("human");

    handle
        .join_queue(JoinRequest::new("human", "Hugo", 400))
        .await
        .expect("join");

    let created = next_match_event(&mut events, |e| matches!(e, MatchEvent::Created { .. })).await;
    let id = created.match_id().clone();

    phase(&mut events, Phase::Selection, 0).await;
    let selection_started = Instant::now();
    handle.end_turn(&id, &human).await.expect("human ends turn");

    let resolved =
        next_match_event(&mut events, |e| matches!(e, MatchEvent::RoundResolved { .. })).await;
    assert!(
        selection_started.elapsed() < Duration::from_secs(10),
        "round should resolve before the selection timer"
    );
    assert!(matches!(resolved, MatchEvent::RoundResolved { round: 0, .. }));

    let m = handle.get_match(&id).await.expect("read").expect("exists");
    let bot = m
        .players()
        .into_iter()
        .find(|p| p.is_bot())
        .expect("bot seat");
    let record = &bot.previous_rounds[&0];
    let card = record.card_id.as_ref().expect("bot played a card");
    assert!(card.as_str().starts_with(bot.user_id.as_str()));

    // The human joined first with equal synergy, so the bot defended.
    assert_eq!(bot.current_role, Some(Role::Defense));
    let ability = record.ability.as_ref().expect("bot chose an ability");
    let kind = handle.abilities().get(ability).expect("known ability").kind;
    assert_eq!(kind, AbilityKind::Defense);

    arena.shutdown().await.expect("shutdown");
}
