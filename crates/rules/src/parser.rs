// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use supvisors_core::{ApplicationRules, ProcessRules, RunningFailureStrategy, StartingFailureStrategy};
use thiserror::Error;

/// Errors raised while loading a rules file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read rules file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProcessRulesDef {
    #[serde(default)]
    addresses: Vec<String>,
    #[serde(default)]
    start_sequence: i32,
    #[serde(default)]
    stop_sequence: i32,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    wait_exit: bool,
    #[serde(default)]
    expected_loading: u8,
    #[serde(default)]
    starting_failure_strategy: StartingFailureStrategy,
    #[serde(default)]
    running_failure_strategy: RunningFailureStrategy,
}

impl From<ProcessRulesDef> for ProcessRules {
    fn from(def: ProcessRulesDef) -> Self {
        ProcessRules {
            addresses: def.addresses,
            start_sequence: def.start_sequence,
            stop_sequence: def.stop_sequence,
            required: def.required,
            wait_exit: def.wait_exit,
            expected_loading: def.expected_loading,
            starting_failure_strategy: def.starting_failure_strategy,
            running_failure_strategy: def.running_failure_strategy,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApplicationRulesDef {
    #[serde(default)]
    start_sequence: i32,
    #[serde(default)]
    stop_sequence: i32,
    #[serde(default)]
    starting_failure_strategy: StartingFailureStrategy,
    #[serde(default)]
    running_failure_strategy: RunningFailureStrategy,
    #[serde(default)]
    processes: IndexMap<String, ProcessRulesDef>,
}

/// Top-level `[applications.<name>]` / `[applications.<name>.processes.<name>]`
/// rules file shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesFile {
    #[serde(default)]
    applications: IndexMap<String, ApplicationRulesDef>,
}

impl RulesFile {
    /// Convert into the in-memory shape the core consumes: one
    /// [`ApplicationRules`] per declared application, each carrying its
    /// processes' [`ProcessRules`].
    pub fn into_application_rules(self) -> IndexMap<String, ApplicationRules> {
        self.applications
            .into_iter()
            .map(|(name, def)| {
                let processes = def
                    .processes
                    .into_iter()
                    .map(|(proc_name, proc_def)| (proc_name, ProcessRules::from(proc_def)))
                    .collect();

                let rules = ApplicationRules {
                    application_name: name.clone(),
                    start_sequence: def.start_sequence,
                    stop_sequence: def.stop_sequence,
                    starting_failure_strategy: def.starting_failure_strategy,
                    running_failure_strategy: def.running_failure_strategy,
                    processes,
                };
                (name, rules)
            })
            .collect()
    }
}

/// Parse rules-file TOML text.
pub fn parse(text: &str) -> Result<RulesFile, ParseError> {
    Ok(toml::from_str(text)?)
}

/// Load and parse a rules file from disk.
pub fn load(path: &Path) -> Result<RulesFile, ParseError> {
    let text = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse(&text)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
