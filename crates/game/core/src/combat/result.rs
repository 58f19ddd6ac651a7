//! Single-direction hit resolution.
use super::power::Loadout;
use crate::config::CombatConfig;

/// Full breakdown of one attacker → defender exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct HitResult {
    pub attack_power: f64,
    pub defense_power: f64,
    /// `attack_power - defense_power / divisor`, floored at 0.
    pub raw_damage: f64,
    /// Upper bound for this hit in synergy points.
    pub cap: f64,
    /// Rounded damage actually applied.
    pub damage: u32,
    pub defender_synergy_before: u32,
    pub defender_synergy_after: u32,
}

/// Resolves one hit.
///
/// # Formula
///
/// ```text
/// if attacker has no card: damage = 0
/// raw   = max(attack_power - (defender has card ? defense_power / divisor : 0), 0)
/// cap   = defender_synergy × (attacker used ability ? ability_cap : card_cap)
/// damage = round(min(raw, cap))
/// ```
///
/// The defender takes the damage, floored at zero. The attacker is never
/// damaged in the same step.
pub fn resolve_hit(
    attacker: Loadout<'_>,
    defender: Loadout<'_>,
    defender_synergy: u32,
    params: &CombatConfig,
) -> HitResult {
    if !attacker.has_card() {
        return HitResult {
            defender_synergy_before: defender_synergy,
            defender_synergy_after: defender_synergy,
            ..HitResult::default()
        };
    }

    let attack_power = attacker.power();
    let defense_power = defender.power();
    let mitigation = if defender.has_card() && params.defense_divisor > 0.0 {
        defense_power / params.defense_divisor
    } else {
        0.0
    };
    let raw_damage = (attack_power - mitigation).max(0.0);

    let cap_ratio = if attacker.has_ability() {
        params.ability_cap
    } else {
        params.card_cap
    };
    let cap = f64::from(defender_synergy) * cap_ratio.max(0.0);

    let damage = round_damage(raw_damage.min(cap));

    HitResult {
        attack_power,
        defense_power,
        raw_damage,
        cap,
        damage,
        defender_synergy_before: defender_synergy,
        defender_synergy_after: apply_damage(defender_synergy, damage),
    }
}

/// Subtracts damage from synergy, clamped at zero.
pub const fn apply_damage(synergy: u32, damage: u32) -> u32 {
    synergy.saturating_sub(damage)
}

fn round_damage(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    // Saturating float-to-int cast; the cap keeps values far below u32::MAX.
    value.round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Stat, StatBlock, StatWeights};

    fn params() -> CombatConfig {
        CombatConfig::default()
    }

    #[test]
    fn ability_attack_into_empty_defender() {
        let stats = StatBlock::ZERO.with(Stat::Attack, 100);
        let weights = StatWeights::NONE.with(Stat::Attack, 1.0);

        let hit = resolve_hit(
            Loadout::new(Some(&stats), Some(&weights)),
            Loadout::EMPTY,
            1000,
            &params(),
        );

        assert_eq!(hit.attack_power, 200.0);
        assert_eq!(hit.defense_power, 0.0);
        assert_eq!(hit.raw_damage, 200.0);
        assert_eq!(hit.cap, 300.0);
        assert_eq!(hit.damage, 200);
        assert_eq!(hit.defender_synergy_after, 800);
    }

    #[test]
    fn defender_card_halves_its_power_into_mitigation() {
        let stats = StatBlock::ZERO.with(Stat::Attack, 100);
        let weights = StatWeights::NONE.with(Stat::Attack, 1.0);
        let guard = StatBlock::ZERO.with(Stat::Armor, 100).with(Stat::Vitality, 50);

        let hit = resolve_hit(
            Loadout::new(Some(&stats), Some(&weights)),
            Loadout::new(Some(&guard), None),
            1000,
            &params(),
        );

        assert_eq!(hit.defense_power, 150.0);
        assert_eq!(hit.raw_damage, 125.0);
        assert_eq!(hit.damage, 125);
    }

    #[test]
    fn card_only_attack_uses_the_smaller_cap() {
        let stats = StatBlock::ZERO.with(Stat::Attack, 500);
        let hit = resolve_hit(Loadout::new(Some(&stats), None), Loadout::EMPTY, 1000, &params());
        assert_eq!(hit.cap, 150.0);
        assert_eq!(hit.damage, 150);

        let weights = StatWeights::NONE;
        let hit = resolve_hit(
            Loadout::new(Some(&stats), Some(&weights)),
            Loadout::EMPTY,
            1000,
            &params(),
        );
        assert_eq!(hit.damage, 300);
    }

    #[test]
    fn no_card_means_no_damage() {
        let weights = StatWeights::NONE.with(Stat::Attack, 1.0);
        let hit = resolve_hit(Loadout::new(None, Some(&weights)), Loadout::EMPTY, 900, &params());
        assert_eq!(hit.damage, 0);
        assert_eq!(hit.defender_synergy_after, 900);
    }

    #[test]
    fn overwhelming_defense_floors_at_zero() {
        let stats = StatBlock::ZERO.with(Stat::Attack, 10);
        let wall = StatBlock::ZERO.with(Stat::Armor, 1000);
        let hit = resolve_hit(
            Loadout::new(Some(&stats), None),
            Loadout::new(Some(&wall), None),
            500,
            &params(),
        );
        assert_eq!(hit.raw_damage, 0.0);
        assert_eq!(hit.damage, 0);
    }

    #[test]
    fn damage_is_rounded_and_never_exceeds_rounded_cap() {
        let stats = StatBlock::ZERO.with(Stat::Attack, 1000);
        let hit = resolve_hit(Loadout::new(Some(&stats), None), Loadout::EMPTY, 333, &params());
        // 333 × 0.15 = 49.95
        assert_eq!(hit.damage, 50);
        assert!(f64::from(hit.damage) <= (333.0 * 0.15f64).round());
    }

    #[test]
    fn synergy_clamps_at_zero() {
        assert_eq!(apply_damage(10, 25), 0);
        assert_eq!(apply_damage(10, 3), 7);
    }
}
