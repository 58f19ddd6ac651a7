//! Server configuration from the environment.
//!
//! Sources, lowest precedence first: built-in defaults, an optional content
//! directory and TOML/RON files, then individual environment overrides.
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use duel_content::{AbilityLoader, ConfigLoader, ContentFactory};
use duel_core::{AbilityBook, DuelConfig};

const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Where the tree store lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreLocation,
    /// Directory holding `config.toml` and `abilities.ron`.
    pub data_dir: Option<PathBuf>,
    pub duel_config_path: Option<PathBuf>,
    pub abilities_path: Option<PathBuf>,
    /// Daily-rolling log files are written here when set.
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let bind = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND.to_owned());
        let bind_addr = bind
            .parse()
            .with_context(|| format!("Invalid BIND_ADDR {bind:?}"))?;

        let store = match env::var("STORE_PATH") {
            Ok(value) if value.eq_ignore_ascii_case("memory") => StoreLocation::Memory,
            Ok(value) => StoreLocation::File(PathBuf::from(value)),
            Err(_) => default_store_path().map_or(StoreLocation::Memory, StoreLocation::File),
        };

        Ok(Self {
            bind_addr,
            store,
            data_dir: read_path("DATA_DIR"),
            duel_config_path: read_path("DUEL_CONFIG_PATH"),
            abilities_path: read_path("ABILITIES_PATH"),
            log_dir: read_path("LOG_DIR"),
        })
    }

    /// Duel rules: data dir, then `DUEL_CONFIG_PATH`, then env overrides.
    pub fn duel_config(&self) -> Result<DuelConfig> {
        let mut config = match (&self.duel_config_path, &self.data_dir) {
            (Some(path), _) => ConfigLoader::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            (None, Some(dir)) => ContentFactory::new(dir).load_config()?,
            (None, None) => DuelConfig::default(),
        };
        apply_overrides(&mut config);
        Ok(config)
    }

    pub fn abilities(&self) -> Result<AbilityBook> {
        match (&self.abilities_path, &self.data_dir) {
            (Some(path), _) => AbilityLoader::load(path)
                .with_context(|| format!("Failed to load {}", path.display())),
            (None, Some(dir)) => ContentFactory::new(dir).load_abilities(),
            (None, None) => Ok(AbilityBook::builtin()),
        }
    }
}

fn apply_overrides(config: &mut DuelConfig) {
    if let Some(tolerance) = read_env::<u32>("SYNERGY_TOLERANCE") {
        config.matchmaking.synergy_tolerance = tolerance;
    }
    if let Some(ms) = read_env::<u64>("BOT_THRESHOLD_MS") {
        config.matchmaking.bot_threshold_ms = ms;
    }
    if let Some(ms) = read_env::<u64>("BOT_TICK_MS") {
        config.matchmaking.bot_tick_ms = ms;
    }
    if let Some(ms) = read_env::<u64>("MATCH_INDEX_TTL_MS") {
        config.matchmaking.match_index_ttl_ms = ms;
    }
    if let Some(rounds) = read_env::<u32>("MAX_ROUNDS") {
        config.max_rounds = rounds;
    }
    if let Some(size) = read_env::<usize>("BOT_DECK_SIZE") {
        config.bot.deck_size = size;
    }
}

fn default_store_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "duel-arena")
        .map(|dirs| dirs.data_dir().join("arena.json"))
}

fn read_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

impl std::fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

