//! Content factory for loading all duel content from a data directory.

use std::path::{Path, PathBuf};

use duel_core::{AbilityBook, DuelConfig};

use crate::loaders::{AbilityLoader, ConfigLoader, LoadResult};

/// Content factory that loads duel content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// └── abilities.ron
/// ```
///
/// Either file may be absent, in which case the built-in defaults are used.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load duel configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<DuelConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            return Ok(DuelConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load the ability book from `abilities.ron`.
    pub fn load_abilities(&self) -> LoadResult<AbilityBook> {
        let path = self.data_dir.join("abilities.ron");
        if !path.exists() {
            return Ok(AbilityBook::builtin());
        }
        AbilityLoader::load(&path)
    }
}
