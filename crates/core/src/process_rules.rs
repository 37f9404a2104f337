// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declared per-process and per-application policy.

use serde::{Deserialize, Serialize};

/// What the Commander does when a required process fails while the
/// application is starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StartingFailureStrategy {
    /// Drop the application from the current start plan.
    Abort,
    /// Drop it, and additionally invoke the Stopper on the application.
    Stop,
    /// Log and keep going.
    #[default]
    Continue,
}

/// What happens when a running process unexpectedly fails or exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunningFailureStrategy {
    #[default]
    Continue,
    RestartProcess,
    StopApplication,
    RestartApplication,
}

/// Declared placement and failure policy for one process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRules {
    /// Allowed placement set. Empty means "any configured address".
    #[serde(default)]
    pub addresses: Vec<String>,
    /// 0 means the process is not auto-started by `start_applications`.
    #[serde(default)]
    pub start_sequence: i32,
    #[serde(default)]
    pub stop_sequence: i32,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub wait_exit: bool,
    #[serde(default)]
    pub expected_loading: u8,
    #[serde(default)]
    pub starting_failure_strategy: StartingFailureStrategy,
    #[serde(default)]
    pub running_failure_strategy: RunningFailureStrategy,
}

impl Default for ProcessRules {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            start_sequence: 0,
            stop_sequence: 0,
            required: false,
            wait_exit: false,
            expected_loading: 0,
            starting_failure_strategy: StartingFailureStrategy::default(),
            running_failure_strategy: RunningFailureStrategy::default(),
        }
    }
}

impl ProcessRules {
    /// `start_sequence == 0` means "not auto-started".
    pub fn is_auto_started(&self) -> bool {
        self.start_sequence > 0
    }

    /// Empty `addresses` means any configured address is eligible.
    pub fn allows(&self, address: &str) -> bool {
        self.addresses.is_empty() || self.addresses.iter().any(|a| a == address)
    }
}

/// Application-level policy and the named processes it governs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRules {
    pub application_name: String,
    #[serde(default)]
    pub start_sequence: i32,
    #[serde(default)]
    pub stop_sequence: i32,
    #[serde(default)]
    pub starting_failure_strategy: StartingFailureStrategy,
    #[serde(default)]
    pub running_failure_strategy: RunningFailureStrategy,
    /// Declaration order is preserved (`IndexMap`, not `HashMap`): within a
    /// `start_sequence`/`stop_sequence` bucket, processes tie-break on file
    /// order.
    #[serde(default)]
    pub processes: indexmap::IndexMap<String, ProcessRules>,
}

#[cfg(test)]
#[path = "process_rules_tests.rs"]
mod tests;
