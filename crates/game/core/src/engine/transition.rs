//! Phase transitions of a single match.
//!
//! The runtime's match worker calls [`advance`] whenever the current phase's
//! timer expires and [`skip_selection`] when both players ended their turn
//! early. Each function mutates the match in place; persisting the result is
//! the caller's job.

use super::recorder::{RecordSummary, record_round};
use super::roles::{RoleAssignment, assign_roles};
use crate::combat::{HitResult, Loadout, resolve_hit};
use crate::config::CombatConfig;
use crate::env::AbilityBook;
use crate::state::{Match, Phase, PlayerId, Side};

/// Rule inputs needed to resolve a battle.
#[derive(Clone, Copy, Debug)]
pub struct BattleRules<'a> {
    pub combat: &'a CombatConfig,
    pub abilities: &'a AbilityBook,
}

/// Result of one battle phase: damage first, then history.
#[derive(Clone, Debug, PartialEq)]
pub struct BattleReport {
    pub round: u32,
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub hit: HitResult,
    pub recorded: RecordSummary,
}

/// Final result of a match. Both ids are `None` on a draw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
}

impl MatchOutcome {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

/// What a call to [`advance`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// Entered `phase` for `round`.
    Entered {
        phase: Phase,
        round: u32,
        roles: Option<RoleAssignment>,
        battle: Option<BattleReport>,
    },
    /// The match reached `finished`.
    Finished(MatchOutcome),
    /// The grace period of a terminal match elapsed; delete it.
    Expired,
}

/// Cooldown bookkeeping for a freshly created match: fixes `max_synergy`
/// and assigns the initial roles.
pub fn begin(m: &mut Match) -> RoleAssignment {
    fix_max_synergy(m);
    assign_roles(m)
}

/// Moves the match out of its current phase after the phase timer expired.
pub fn advance(m: &mut Match, rules: BattleRules<'_>, now: i64) -> Step {
    if m.is_terminal() {
        return Step::Expired;
    }
    if m.rounds_exhausted() {
        return Step::Finished(finish(m, now));
    }

    match m.phase {
        Phase::Cooldown => enter_selection(m, now),
        Phase::Selection => {
            let report = enter_battle(m, rules, now);
            Step::Entered {
                phase: Phase::Battle,
                round: m.round,
                roles: None,
                battle: Some(report),
            }
        }
        Phase::Battle => {
            m.round += 1;
            if m.rounds_exhausted() {
                Step::Finished(finish(m, now))
            } else {
                enter_selection(m, now)
            }
        }
        Phase::Finished | Phase::Cancelled => Step::Expired,
    }
}

/// Early selection → battle transition.
///
/// Applies only while `m` is still in the selection phase of
/// `expected_round` with both end flags set; otherwise returns `None` and
/// leaves the match untouched.
pub fn skip_selection(
    m: &mut Match,
    expected_round: u32,
    rules: BattleRules<'_>,
    now: i64,
) -> Option<BattleReport> {
    if m.phase != Phase::Selection || m.round != expected_round || !m.both_ended() {
        return None;
    }
    Some(enter_battle(m, rules, now))
}

/// Ends the match by synergy comparison.
pub fn finish(m: &mut Match, now: i64) -> MatchOutcome {
    let outcome = match m.player1.synergy.cmp(&m.player2.synergy) {
        core::cmp::Ordering::Greater => MatchOutcome {
            winner: Some(m.player1.user_id.clone()),
            loser: Some(m.player2.user_id.clone()),
        },
        core::cmp::Ordering::Less => MatchOutcome {
            winner: Some(m.player2.user_id.clone()),
            loser: Some(m.player1.user_id.clone()),
        },
        core::cmp::Ordering::Equal => MatchOutcome::default(),
    };

    m.phase = Phase::Finished;
    m.phase_start_time = now;
    m.round = m.round.min(m.max_rounds);
    m.winner_id = outcome.winner.clone();
    m.loser_id = outcome.loser.clone();
    outcome
}

fn enter_selection(m: &mut Match, now: i64) -> Step {
    m.phase = Phase::Selection;
    m.phase_start_time = now;
    fix_max_synergy(m);
    let roles = assign_roles(m);

    Step::Entered {
        phase: Phase::Selection,
        round: m.round,
        roles: Some(roles),
        battle: None,
    }
}

fn enter_battle(m: &mut Match, rules: BattleRules<'_>, now: i64) -> BattleReport {
    m.phase = Phase::Battle;
    m.phase_start_time = now;
    m.player1.end_flag = false;
    m.player2.end_flag = false;

    // Damage lands before the selections are archived and cleared.
    let (attacker, hit) = resolve_round(m, rules);
    let recorded = record_round(m);

    BattleReport {
        round: m.round,
        attacker: m.player(attacker).user_id.clone(),
        defender: m.player(attacker.other()).user_id.clone(),
        hit,
        recorded,
    }
}

fn resolve_round(m: &mut Match, rules: BattleRules<'_>) -> (Side, HitResult) {
    if m.attacker().is_none() {
        assign_roles(m);
    }
    let attacker = m.attacker().unwrap_or(Side::Player1);
    let defender = attacker.other();

    let hit = {
        let offense = &m.player(attacker).current_round;
        let defense = &m.player(defender).current_round;
        let offense_weights = offense
            .ability_selected
            .as_ref()
            .and_then(|key| rules.abilities.weights(key));
        let defense_weights = defense
            .ability_selected
            .as_ref()
            .and_then(|key| rules.abilities.weights(key));

        resolve_hit(
            Loadout::new(offense.stats.as_ref(), offense_weights),
            Loadout::new(defense.stats.as_ref(), defense_weights),
            m.player(defender).synergy,
            rules.combat,
        )
    };

    m.player_mut(defender).synergy = hit.defender_synergy_after;
    (attacker, hit)
}

fn fix_max_synergy(m: &mut Match) {
    if m.max_synergy.is_none() {
        m.max_synergy = Some(m.player1.initial_synergy.max(m.player2.initial_synergy));
    }
}
