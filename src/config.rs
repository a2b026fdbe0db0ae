//! Runtime configuration: environment overrides and battle files.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::combat::{Build, SimulationOptions};
use crate::data::DEFAULT_DATABASE_PATH;
use crate::error::{Result, SimError};

pub const DATABASE_ENV: &str = "HEIC_DATABASE";
pub const SEED_ENV: &str = "HEIC_SEED";
pub const MAX_TURNS_ENV: &str = "HEIC_MAX_TURNS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub database_path: PathBuf,
    pub seed: Option<u64>,
    pub max_turns: Option<u32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            seed: None,
            max_turns: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Unparseable numbers are
    /// ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup(DATABASE_ENV).filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }
        config.seed = parse_var(&lookup, SEED_ENV);
        config.max_turns = parse_var(&lookup, MAX_TURNS_ENV);
        config
    }

    /// Options used when a battle file carries no `options` block.
    pub fn default_options(&self) -> SimulationOptions {
        let mut options = SimulationOptions::default();
        if let Some(seed) = self.seed {
            options.seed = seed;
        }
        if let Some(max_turns) = self.max_turns {
            options.max_turns = max_turns;
        }
        options
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring unparseable value");
            None
        }
    }
}

/// A matchup on disk: two builds and optional simulation options.
#[derive(Debug, Clone, Deserialize)]
pub struct BattleFile {
    pub left: Build,
    pub right: Build,
    #[serde(default)]
    pub options: Option<SimulationOptions>,
}

impl BattleFile {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// File options if present, otherwise the runtime defaults.
    pub fn resolved_options(&self, config: &RuntimeConfig) -> SimulationOptions {
        self.options.unwrap_or_else(|| config.default_options())
    }
}

/// Loads a battle file, YAML when the extension is `.yaml`/`.yml`, JSON otherwise.
pub fn load_battle_file(path: impl AsRef<Path>) -> Result<BattleFile> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => BattleFile::from_yaml_str(&raw),
        Some("json") | None => BattleFile::from_json_str(&raw),
        Some(other) => Err(SimError::InvalidConfig(format!(
            "unsupported battle file extension '.{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = RuntimeConfig::from_lookup(lookup(&[]));
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.database_path, PathBuf::from("data/details.json"));
        assert_eq!(config.default_options(), SimulationOptions::default());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            (DATABASE_ENV, "/tmp/db.yaml"),
            (SEED_ENV, "42"),
            (MAX_TURNS_ENV, "15"),
        ]));
        assert_eq!(config.database_path, PathBuf::from("/tmp/db.yaml"));
        let options = config.default_options();
        assert_eq!((options.seed, options.max_turns), (42, 15));
    }

    #[test]
    fn bad_numbers_are_ignored() {
        let config = RuntimeConfig::from_lookup(lookup(&[(SEED_ENV, "seven")]));
        assert_eq!(config.seed, None);
    }

    #[test]
    fn battle_file_options_win_over_runtime_defaults() {
        let file = BattleFile::from_yaml_str(
            "left:\n  name: A\n  items: [items/ruby_ring]\nright:\n  weaponEdge: upgrades/edge\noptions:\n  seed: 3\n",
        )
        .unwrap();
        let config = RuntimeConfig {
            seed: Some(99),
            ..RuntimeConfig::default()
        };
        assert_eq!(file.left.slugs(), vec!["items/ruby_ring"]);
        assert_eq!(file.right.slugs(), vec!["upgrades/edge"]);
        assert_eq!(file.resolved_options(&config).seed, 3);

        let bare = BattleFile::from_json_str(r#"{"left": {}, "right": {}}"#).unwrap();
        assert_eq!(bare.resolved_options(&config).seed, 99);
    }
}
