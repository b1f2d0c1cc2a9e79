use crate::core::proof_of_work::check_difficulty;
use crate::core::DEFAULT_DIFFICULTY;
use crate::error::{BlockchainError, Result};
use log::LevelFilter;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

static DEFAULT_DB_PATH: &str = "./data/ledger";
static DEFAULT_LOG_LEVEL: &str = "info";

const CONFIG_FILE_KEY: &str = "LEDGER_CONFIG";
const DB_PATH_KEY: &str = "LEDGER_DB_PATH";
const DIFFICULTY_KEY: &str = "LEDGER_DIFFICULTY";
const LOG_LEVEL_KEY: &str = "LEDGER_LOG_LEVEL";

/// Settings for one ledger process. Missing TOML keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub db_path: PathBuf,
    pub difficulty: u32,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            difficulty: DEFAULT_DIFFICULTY,
            log_level: String::from(DEFAULT_LOG_LEVEL),
        }
    }
}

impl Config {
    /// Defaults, then the file named by `LEDGER_CONFIG`, then `LEDGER_*` variables.
    pub fn load() -> Result<Config> {
        let mut config = match env::var(CONFIG_FILE_KEY) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Config::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path).map_err(|e| {
            BlockchainError::Config(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Config> {
        Ok(toml::from_str(contents)?)
    }

    /// Replace any setting `lookup` has a value for. Keys are the `LEDGER_*` names.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DB_PATH_KEY) {
            self.db_path = PathBuf::from(path);
        }
        if let Some(difficulty) = lookup(DIFFICULTY_KEY) {
            self.difficulty = difficulty.trim().parse().map_err(|_| {
                BlockchainError::Config(format!(
                    "{DIFFICULTY_KEY} must be a whole number, got '{difficulty}'"
                ))
            })?;
        }
        if let Some(level) = lookup(LOG_LEVEL_KEY) {
            self.log_level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        check_difficulty(self.difficulty)?;
        if self.db_path.as_os_str().is_empty() {
            return Err(BlockchainError::Config(
                "Ledger path must not be empty".to_string(),
            ));
        }
        self.get_log_level()?;
        Ok(())
    }

    pub fn get_log_level(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level).map_err(|_| {
            BlockchainError::Config(format!("Unknown log level '{}'", self.log_level))
        })
    }
}
