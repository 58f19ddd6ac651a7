//! Ability catalogue: keys, display names, kinds and weight vectors.
use crate::state::AbilityKey;
use crate::stats::{Stat, StatWeights};

/// Whether an ability is meant for the attacking or defending side.
///
/// The kind only steers bot choices; the resolver applies any selected
/// ability's weights regardless of role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum AbilityKind {
    Attack,
    Defense,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityDefinition {
    pub key: AbilityKey,
    pub name: String,
    pub kind: AbilityKind,
    pub weights: StatWeights,
}

impl AbilityDefinition {
    pub fn new(key: &str, name: &str, kind: AbilityKind, weights: StatWeights) -> Self {
        Self {
            key: AbilityKey::from(key),
            name: name.to_owned(),
            kind,
            weights,
        }
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AbilityBookError {
    #[error("ability {0} is defined more than once")]
    DuplicateKey(AbilityKey),

    #[error("ability {key} has weight {weight} for {stat}, expected a value in [0, 1]")]
    WeightOutOfRange {
        key: AbilityKey,
        stat: Stat,
        weight: f64,
    },

    #[error("ability book is empty")]
    Empty,
}

/// Validated, ordered set of ability definitions.
#[derive(Clone, Debug, PartialEq)]
pub struct AbilityBook {
    entries: Vec<AbilityDefinition>,
}

impl AbilityBook {
    pub fn new(entries: Vec<AbilityDefinition>) -> Result<Self, AbilityBookError> {
        if entries.is_empty() {
            return Err(AbilityBookError::Empty);
        }

        for (index, entry) in entries.iter().enumerate() {
            if entries[..index].iter().any(|prev| prev.key == entry.key) {
                return Err(AbilityBookError::DuplicateKey(entry.key.clone()));
            }
            if let Some(stat) = entry.weights.out_of_range() {
                return Err(AbilityBookError::WeightOutOfRange {
                    key: entry.key.clone(),
                    stat,
                    weight: entry.weights.get(stat),
                });
            }
        }

        Ok(Self { entries })
    }

    /// The ten stock abilities.
    pub fn builtin() -> Self {
        use AbilityKind::{Attack, Defense};
        let w = StatWeights::NONE;

        let entries = vec![
            AbilityDefinition::new(
                "titan_strike",
                "Titan's Strike",
                Attack,
                w.with(Stat::Attack, 1.0).with(Stat::Powers, 0.3),
            ),
            AbilityDefinition::new(
                "berserkers_fury",
                "Berserkers Fury",
                Attack,
                w.with(Stat::Attack, 0.5).with(Stat::Powers, 1.0),
            ),
            AbilityDefinition::new(
                "mind_wrap",
                "Mind Wrap",
                Attack,
                w.with(Stat::Intelligence, 1.0),
            ),
            AbilityDefinition::new(
                "twin_strike",
                "Twin Strike",
                Attack,
                w.with(Stat::Attack, 0.8).with(Stat::Agility, 0.3),
            ),
            AbilityDefinition::new(
                "soul_leech",
                "Soul Leech",
                Attack,
                w.with(Stat::Intelligence, 0.7).with(Stat::Powers, 0.3),
            ),
            AbilityDefinition::new(
                "fury_unleashed",
                "Fury Unleashed",
                Attack,
                w.with(Stat::Attack, 0.7).with(Stat::Vitality, 0.3),
            ),
            AbilityDefinition::new(
                "aegis_ward",
                "Aegis Ward",
                Defense,
                w.with(Stat::Armor, 0.7).with(Stat::Vitality, 0.3),
            ),
            AbilityDefinition::new(
                "celestial_rejuvenation",
                "Celestial Rejuvenation",
                Defense,
                w.with(Stat::Agility, 0.4).with(Stat::Vitality, 0.6),
            ),
            AbilityDefinition::new(
                "guardians_bulwark",
                "Guardian's Bulwark",
                Defense,
                w.with(Stat::Armor, 1.0),
            ),
            AbilityDefinition::new(
                "arcane_overcharge",
                "Arcane Overcharge",
                Defense,
                w.with(Stat::Intelligence, 0.7).with(Stat::Vitality, 0.3),
            ),
        ];

        Self { entries }
    }

    pub fn get(&self, key: &AbilityKey) -> Option<&AbilityDefinition> {
        self.entries.iter().find(|entry| &entry.key == key)
    }

    /// Looks an ability up by canonical key or by display name.
    ///
    /// Keys compare case-insensitively; display names must match exactly
    /// after trimming.
    pub fn resolve(&self, raw: &str) -> Option<&AbilityDefinition> {
        let raw = raw.trim();
        self.entries
            .iter()
            .find(|entry| entry.key.as_str().eq_ignore_ascii_case(raw) || entry.name == raw)
    }

    pub fn weights(&self, key: &AbilityKey) -> Option<&StatWeights> {
        self.get(key).map(|entry| &entry.weights)
    }

    pub fn pool(&self, kind: AbilityKind) -> impl Iterator<Item = &AbilityDefinition> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbilityDefinition> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AbilityBook {
    fn default() -> Self {
        Self::builtin()
    }
}
