// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration loading (§4.11, §6): the options table from a TOML file,
//! with `SUPVISORS_*` environment overrides taking precedence over the
//! file, the way the teacher's `env.rs` treats `OJ_STATE_DIR` as the
//! highest-precedence source.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use supvisors_strategy::{ConciliationStrategy, StartingStrategy};
use thiserror::Error;

/// Errors raised while loading or validating configuration (§7
/// Configuration failures: fails fast, reported as `SUPVISORS_CONF_ERROR`).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

/// On-disk shape of the options table (§6), deserialized directly from
/// TOML before environment overrides and validation are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    address_list: Option<Vec<String>>,
    rules_file: Option<PathBuf>,
    internal_port: Option<u16>,
    event_port: Option<u16>,
    auto_fence: Option<bool>,
    synchro_timeout: Option<u64>,
    conciliation_strategy: Option<ConciliationStrategy>,
    starting_strategy: Option<StartingStrategy>,
    stats_periods: Option<Vec<u32>>,
    stats_histo: Option<u32>,
}

/// The fully-resolved, validated configuration driving one node (§6).
#[derive(Debug, Clone)]
pub struct Config {
    pub address_list: Vec<String>,
    pub rules_file: Option<PathBuf>,
    pub internal_port: u16,
    pub event_port: u16,
    pub auto_fence: bool,
    pub synchro_timeout: u64,
    pub conciliation_strategy: ConciliationStrategy,
    pub starting_strategy: StartingStrategy,
    pub stats_periods: Vec<u32>,
    pub stats_histo: u32,
}

impl Config {
    /// Load from `path` (if it exists), apply `SUPVISORS_*` environment
    /// overrides, then validate. A missing file is not an error: every
    /// option has a spec-defined default and `address_list` may be supplied
    /// entirely via `SUPVISORS_ADDRESS_LIST`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = if path.exists() {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&text)?
        } else {
            ConfigFile::default()
        };

        let config = Self::from_file(file).apply_env();
        config.validate()?;
        Ok(config)
    }

    fn from_file(file: ConfigFile) -> Self {
        Self {
            address_list: file.address_list.unwrap_or_default(),
            rules_file: file.rules_file,
            internal_port: file.internal_port.unwrap_or(65_001),
            event_port: file.event_port.unwrap_or(65_002),
            auto_fence: file.auto_fence.unwrap_or(false),
            synchro_timeout: file.synchro_timeout.unwrap_or(15),
            conciliation_strategy: file.conciliation_strategy.unwrap_or(ConciliationStrategy::User),
            starting_strategy: file.starting_strategy.unwrap_or(StartingStrategy::Config),
            stats_periods: file.stats_periods.unwrap_or_else(|| vec![10]),
            stats_histo: file.stats_histo.unwrap_or(200),
        }
    }

    fn apply_env(mut self) -> Self {
        if let Ok(list) = std::env::var("SUPVISORS_ADDRESS_LIST") {
            self.address_list = list.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(path) = std::env::var("SUPVISORS_RULES_FILE") {
            self.rules_file = Some(PathBuf::from(path));
        }
        if let Some(port) = env_parse("SUPVISORS_INTERNAL_PORT") {
            self.internal_port = port;
        }
        if let Some(port) = env_parse("SUPVISORS_EVENT_PORT") {
            self.event_port = port;
        }
        if let Some(flag) = env_parse("SUPVISORS_AUTO_FENCE") {
            self.auto_fence = flag;
        }
        if let Some(timeout) = env_parse("SUPVISORS_SYNCHRO_TIMEOUT") {
            self.synchro_timeout = timeout;
        }
        self
    }

    /// Range checks per §6/§4.11: `synchro_timeout` 1-1000, `stats_histo`
    /// 10-1500, `stats_periods` 1-3 values each 5-3600 and a multiple of 5.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1000).contains(&self.synchro_timeout) {
            return Err(ConfigError::Invalid(format!(
                "synchro_timeout must be 1-1000, got {}",
                self.synchro_timeout
            )));
        }
        if !(10..=1500).contains(&self.stats_histo) {
            return Err(ConfigError::Invalid(format!("stats_histo must be 10-1500, got {}", self.stats_histo)));
        }
        if self.stats_periods.is_empty() || self.stats_periods.len() > 3 {
            return Err(ConfigError::Invalid(format!(
                "stats_periods must have 1-3 values, got {}",
                self.stats_periods.len()
            )));
        }
        for period in &self.stats_periods {
            if !(5..=3600).contains(period) || period % 5 != 0 {
                return Err(ConfigError::Invalid(format!(
                    "stats_periods values must be 5-3600 and a multiple of 5, got {period}"
                )));
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
