//! Round history archival.
use crate::state::{Match, RoundRecord, Selection, Side};

/// Which sides had something archived for the round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordSummary {
    pub player1: bool,
    pub player2: bool,
}

/// Archives each player's `{card, ability}` for `m.round` into
/// `previous_rounds` and clears `current_round` for both players.
///
/// A player who selected nothing gets no entry. Clearing is unconditional.
pub fn record_round(m: &mut Match) -> RecordSummary {
    let round = m.round;
    let mut summary = RecordSummary::default();

    for side in Side::BOTH {
        let player = m.player_mut(side);
        let selection = std::mem::take(&mut player.current_round);
        let recorded = archive(&mut player.previous_rounds, round, selection);
        match side {
            Side::Player1 => summary.player1 = recorded,
            Side::Player2 => summary.player2 = recorded,
        }
    }

    summary
}

fn archive(
    history: &mut std::collections::BTreeMap<u32, RoundRecord>,
    round: u32,
    selection: Selection,
) -> bool {
    if selection.is_empty() {
        return false;
    }
    // previous_rounds is append-only; a round already archived stays as is.
    history.entry(round).or_insert(RoundRecord {
        card_id: selection.card_id,
        ability: selection.ability_selected,
    });
    true
}
