//! Ability book loader.

use std::path::Path;

use duel_core::{AbilityBook, AbilityDefinition};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Ability catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityCatalog {
    pub abilities: Vec<AbilityDefinition>,
}

/// Loader for the ability book from RON files.
pub struct AbilityLoader;

impl AbilityLoader {
    /// Load and validate an ability book from a RON file.
    pub fn load(path: &Path) -> LoadResult<AbilityBook> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<AbilityBook> {
        let catalog: AbilityCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse ability catalog RON: {}", e))?;

        AbilityBook::new(catalog.abilities)
            .map_err(|e| anyhow::anyhow!("Invalid ability catalog: {}", e))
    }
}
