//! Card stat blocks and per-stat ability weights.
use strum::IntoEnumIterator;

/// The six card statistics that feed combat power.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Stat {
    Attack,
    Armor,
    Agility,
    Intelligence,
    Powers,
    Vitality,
}

/// Stats printed on a selected card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct StatBlock {
    pub attack: u32,
    pub armor: u32,
    pub agility: u32,
    pub intelligence: u32,
    pub powers: u32,
    pub vitality: u32,
}

impl StatBlock {
    pub const ZERO: Self = Self {
        attack: 0,
        armor: 0,
        agility: 0,
        intelligence: 0,
        powers: 0,
        vitality: 0,
    };

    pub const fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Attack => self.attack,
            Stat::Armor => self.armor,
            Stat::Agility => self.agility,
            Stat::Intelligence => self.intelligence,
            Stat::Powers => self.powers,
            Stat::Vitality => self.vitality,
        }
    }

    /// Builder-style setter used by tests and deck generation.
    #[must_use]
    pub const fn with(mut self, stat: Stat, value: u32) -> Self {
        match stat {
            Stat::Attack => self.attack = value,
            Stat::Armor => self.armor = value,
            Stat::Agility => self.agility = value,
            Stat::Intelligence => self.intelligence = value,
            Stat::Powers => self.powers = value,
            Stat::Vitality => self.vitality = value,
        }
        self
    }

    /// Unweighted sum of all stats.
    pub fn total(&self) -> u64 {
        Stat::iter().map(|stat| u64::from(self.get(stat))).sum()
    }
}

/// Per-stat multiplier vector attached to an ability. Every weight lies in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct StatWeights {
    pub attack: f64,
    pub armor: f64,
    pub agility: f64,
    pub intelligence: f64,
    pub powers: f64,
    pub vitality: f64,
}

impl StatWeights {
    pub const NONE: Self = Self {
        attack: 0.0,
        armor: 0.0,
        agility: 0.0,
        intelligence: 0.0,
        powers: 0.0,
        vitality: 0.0,
    };

    pub const fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Attack => self.attack,
            Stat::Armor => self.armor,
            Stat::Agility => self.agility,
            Stat::Intelligence => self.intelligence,
            Stat::Powers => self.powers,
            Stat::Vitality => self.vitality,
        }
    }

    #[must_use]
    pub const fn with(mut self, stat: Stat, weight: f64) -> Self {
        match stat {
            Stat::Attack => self.attack = weight,
            Stat::Armor => self.armor = weight,
            Stat::Agility => self.agility = weight,
            Stat::Intelligence => self.intelligence = weight,
            Stat::Powers => self.powers = weight,
            Stat::Vitality => self.vitality = weight,
        }
        self
    }

    /// Returns the first stat whose weight is outside `[0, 1]` (or not finite).
    pub fn out_of_range(&self) -> Option<Stat> {
        Stat::iter().find(|&stat| {
            let weight = self.get(stat);
            !weight.is_finite() || !(0.0..=1.0).contains(&weight)
        })
    }
}
