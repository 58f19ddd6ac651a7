//! Participant actions against a match.
//!
//! Every function validates first and mutates only on success, so a returned
//! [`ActionError`] guarantees the match is unchanged.

use super::transition::MatchOutcome;
use crate::env::AbilityBook;
use crate::error::ActionError;
use crate::state::{AbilityKey, CardId, Match, Phase, PlayerId, Side};
use crate::stats::StatBlock;

/// A card a player commits for the current round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardPick {
    pub card_id: CardId,
    pub stats: StatBlock,
    pub photo_ref: Option<String>,
}

/// Outcome of [`end_turn`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndTurn {
    /// Flag set; waiting for the opponent.
    Recorded,
    /// Flag was already set this round.
    AlreadyEnded,
    /// This call completed the pair; the selection phase may be skipped.
    BothEnded { round: u32 },
    /// Not in selection; nothing to end.
    Ignored,
}

fn participant(m: &Match, player: &PlayerId) -> Result<Side, ActionError> {
    m.side_of(player)
        .ok_or_else(|| ActionError::InvalidParticipant {
            match_id: m.id.clone(),
            player: player.clone(),
        })
}

fn require_selection(m: &Match) -> Result<(), ActionError> {
    if m.phase == Phase::Selection {
        Ok(())
    } else {
        Err(ActionError::InvalidPhase { phase: m.phase })
    }
}

/// Stores `pick` as the player's card for this round.
pub fn select_card(m: &mut Match, player: &PlayerId, pick: CardPick) -> Result<(), ActionError> {
    require_selection(m)?;
    let side = participant(m, player)?;

    let selection = &mut m.player_mut(side).current_round;
    if selection.has_card() {
        return Err(ActionError::DuplicateAction {
            player: player.clone(),
            action: "selected a card",
        });
    }

    selection.card_id = Some(pick.card_id);
    selection.stats = Some(pick.stats);
    selection.photo_ref = pick.photo_ref;
    Ok(())
}

/// Stores an ability choice, resolving `raw` by key or display name.
///
/// A later call in the same round replaces the earlier choice. Returns the
/// canonical key that was stored.
pub fn select_ability(
    m: &mut Match,
    player: &PlayerId,
    raw: &str,
    book: &AbilityBook,
) -> Result<AbilityKey, ActionError> {
    require_selection(m)?;
    let side = participant(m, player)?;
    let key = book
        .resolve(raw)
        .map(|ability| ability.key.clone())
        .ok_or_else(|| ActionError::UnknownAbility(raw.to_owned()))?;

    m.player_mut(side).current_round.ability_selected = Some(key.clone());
    Ok(key)
}

/// Marks the player as done with the current selection phase.
pub fn end_turn(m: &mut Match, player: &PlayerId) -> Result<EndTurn, ActionError> {
    let side = participant(m, player)?;
    if m.phase != Phase::Selection {
        return Ok(EndTurn::Ignored);
    }

    let state = m.player_mut(side);
    if state.end_flag {
        return Ok(EndTurn::AlreadyEnded);
    }
    state.end_flag = true;

    if m.both_ended() {
        Ok(EndTurn::BothEnded { round: m.round })
    } else {
        Ok(EndTurn::Recorded)
    }
}

/// Forfeits `player`: the match moves straight to `cancelled` and the
/// opponent is recorded as winner.
pub fn forfeit(m: &mut Match, player: &PlayerId, now: i64) -> Result<MatchOutcome, ActionError> {
    let side = participant(m, player)?;
    if m.is_terminal() {
        return Err(ActionError::InvalidPhase { phase: m.phase });
    }

    let outcome = MatchOutcome {
        winner: Some(m.player(side.other()).user_id.clone()),
        loser: Some(player.clone()),
    };
    m.phase = Phase::Cancelled;
    m.phase_start_time = now;
    m.player1.end_flag = false;
    m.player2.end_flag = false;
    m.winner_id = outcome.winner.clone();
    m.loser_id = outcome.loser.clone();
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MatchId, QueueEntry};
    use crate::stats::Stat;

    fn selecting() -> Match {
        let a = QueueEntry::human(PlayerId::from("a"), "A", 500, 0);
        let b = QueueEntry::human(PlayerId::from("b"), "B", 480, 0);
        let mut m = Match::new(MatchId::from("m1"), &a, &b, 4, 0);
        m.phase = Phase::Selection;
        m
    }

    fn pick(id: &str) -> CardPick {
        CardPick {
            card_id: CardId::from(id),
            stats: StatBlock::ZERO.with(Stat::Attack, 40),
            photo_ref: None,
        }
    }

    #[test]
    fn select_card_rejects_wrong_phase_stranger_and_duplicate() {
        let mut m = selecting();
        let a = PlayerId::from("a");

        m.phase = Phase::Battle;
        assert_eq!(
            select_card(&mut m, &a, pick("c1")),
            Err(ActionError::InvalidPhase {
                phase: Phase::Battle
            })
        );

        m.phase = Phase::Selection;
        let err = select_card(&mut m, &PlayerId::from("z"), pick("c1")).unwrap_err();
        assert_eq!(err.error_code(), "invalid_participant");

        select_card(&mut m, &a, pick("c1")).unwrap();
        let before = m.clone();
        let err = select_card(&mut m, &a, pick("c2")).unwrap_err();
        assert_eq!(err.error_code(), "duplicate_action");
        assert_eq!(m, before);
        assert_eq!(m.player1.current_round.card_id, Some(CardId::from("c1")));
    }

    #[test]
    fn select_ability_accepts_name_and_overwrites() {
        let book = AbilityBook::builtin();
        let mut m = selecting();
        let b = PlayerId::from("b");

        let key = select_ability(&mut m, &b, "Aegis Ward", &book).unwrap();
        assert_eq!(key, AbilityKey::from("aegis_ward"));
        select_ability(&mut m, &b, "GUARDIANS_BULWARK", &book).unwrap();
        assert_eq!(
            m.player2.current_round.ability_selected,
            Some(AbilityKey::from("guardians_bulwark"))
        );

        assert_eq!(
            select_ability(&mut m, &b, "fireball", &book),
            Err(ActionError::UnknownAbility("fireball".into()))
        );
    }

    #[test]
    fn end_turn_is_idempotent_and_reports_pair() {
        let mut m = selecting();
        let a = PlayerId::from("a");
        let b = PlayerId::from("b");

        assert_eq!(end_turn(&mut m, &a), Ok(EndTurn::Recorded));
        assert_eq!(end_turn(&mut m, &a), Ok(EndTurn::AlreadyEnded));
        assert_eq!(end_turn(&mut m, &b), Ok(EndTurn::BothEnded { round: 0 }));

        m.phase = Phase::Battle;
        assert_eq!(end_turn(&mut m, &a), Ok(EndTurn::Ignored));
    }

    #[test]
    fn forfeit_names_opponent_winner() {
        let mut m = selecting();
        let outcome = forfeit(&mut m, &PlayerId::from("b"), 9).unwrap();
        assert_eq!(outcome.winner, Some(PlayerId::from("a")));
        assert_eq!(m.phase, Phase::Cancelled);
        assert_eq!(m.loser_id, Some(PlayerId::from("b")));

        assert!(forfeit(&mut m, &PlayerId::from("a"), 10).is_err());
    }
}
