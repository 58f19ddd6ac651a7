//! Power computation from a card's stats and an optional ability.
use strum::IntoEnumIterator;

use crate::stats::{Stat, StatBlock, StatWeights};

/// What one side brought to the exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Loadout<'a> {
    pub stats: Option<&'a StatBlock>,
    pub ability: Option<&'a StatWeights>,
}

impl<'a> Loadout<'a> {
    pub const EMPTY: Loadout<'static> = Loadout {
        stats: None,
        ability: None,
    };

    pub const fn new(stats: Option<&'a StatBlock>, ability: Option<&'a StatWeights>) -> Self {
        Self { stats, ability }
    }

    pub const fn has_card(&self) -> bool {
        self.stats.is_some()
    }

    pub const fn has_ability(&self) -> bool {
        self.ability.is_some()
    }

    /// Power contributed by this loadout; zero without a card.
    pub fn power(&self) -> f64 {
        self.stats
            .map(|stats| power(stats, self.ability))
            .unwrap_or(0.0)
    }
}

/// ```text
/// power = Σ stat × (1 + weight[stat])   with an ability
/// power = Σ stat                        without
/// ```
pub fn power(stats: &StatBlock, ability: Option<&StatWeights>) -> f64 {
    Stat::iter()
        .map(|stat| {
            let value = f64::from(stats.get(stat));
            match ability {
                Some(weights) => value * (1.0 + weights.get(stat)),
                None => value,
            }
        })
        .sum()
}
