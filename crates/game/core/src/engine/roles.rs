//! Attacker/defender assignment.
use crate::state::{Match, Role, Side};

/// What [`assign_roles`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleAssignment {
    /// First assignment of the match; `attacker` had the higher synergy.
    Initial { attacker: Side },
    /// Both roles flipped for a new round.
    Inverted { attacker: Side },
    /// Roles were already set for this round.
    Unchanged,
}

/// Assigns roles for `m.round`.
///
/// The first assignment gives attack to the side with the higher current
/// synergy; on equal synergy player1 attacks. Every later assignment swaps
/// both roles. Calling it again within the same round has no effect.
pub fn assign_roles(m: &mut Match) -> RoleAssignment {
    if m.roles_round == Some(m.round) && m.attacker().is_some() {
        return RoleAssignment::Unchanged;
    }

    let result = match m.attacker() {
        None => {
            let attacker = if m.player1.synergy >= m.player2.synergy {
                Side::Player1
            } else {
                Side::Player2
            };
            set_attacker(m, attacker);
            RoleAssignment::Initial { attacker }
        }
        Some(previous) => {
            let attacker = previous.other();
            set_attacker(m, attacker);
            RoleAssignment::Inverted { attacker }
        }
    };

    m.roles_round = Some(m.round);
    result
}

fn set_attacker(m: &mut Match, attacker: Side) {
    m.player_mut(attacker).current_role = Some(Role::Attack);
    m.player_mut(attacker.other()).current_role = Some(Role::Defense);
}
