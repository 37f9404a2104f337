// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Derived application state: aggregates over its processes.

use crate::id::Namespec;
use crate::process::ProcessStatus;
use crate::process_rules::{ApplicationRules, RunningFailureStrategy, StartingFailureStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Derived lifecycle state of one application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl ApplicationState {
    pub fn label(self) -> &'static str {
        match self {
            ApplicationState::Stopped => "STOPPED",
            ApplicationState::Starting => "STARTING",
            ApplicationState::Running => "RUNNING",
            ApplicationState::Stopping => "STOPPING",
        }
    }
}

impl std::fmt::Display for ApplicationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Ordered collection of processes sharing an application name, plus the
/// derived state computed from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStatus {
    pub application_name: String,
    pub state: ApplicationState,
    pub major_failure: bool,
    pub minor_failure: bool,
    pub start_sequence: BTreeMap<i32, Vec<Namespec>>,
    pub stop_sequence: BTreeMap<i32, Vec<Namespec>>,
    /// Application-level start order, as declared in the rules file. Groups
    /// applications into tiers in the Commander's `planned_sequence`;
    /// distinct from the per-process `start_sequence` map above.
    pub app_start_sequence: i32,
    pub app_stop_sequence: i32,
    pub starting_failure_strategy: StartingFailureStrategy,
    pub running_failure_strategy: RunningFailureStrategy,
}

impl ApplicationStatus {
    pub fn new(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            state: ApplicationState::Stopped,
            major_failure: false,
            minor_failure: false,
            start_sequence: BTreeMap::new(),
            stop_sequence: BTreeMap::new(),
            app_start_sequence: 0,
            app_stop_sequence: 0,
            starting_failure_strategy: StartingFailureStrategy::default(),
            running_failure_strategy: RunningFailureStrategy::default(),
        }
    }

    pub fn apply_rules(&mut self, rules: &ApplicationRules) {
        self.app_start_sequence = rules.start_sequence;
        self.app_stop_sequence = rules.stop_sequence;
        self.starting_failure_strategy = rules.starting_failure_strategy;
        self.running_failure_strategy = rules.running_failure_strategy;
    }

    pub fn running(&self) -> bool {
        !matches!(self.state, ApplicationState::Stopped)
    }

    pub fn stopped(&self) -> bool {
        matches!(self.state, ApplicationState::Stopped)
    }

    /// Recompute `state`, `major_failure`, `minor_failure`, and the
    /// ordered start/stop sequence groupings from the current process
    /// snapshot. Called by `Context` after any mutation touching one of
    /// this application's processes.
    ///
    /// Sequence bucket 0 is never auto-started and is dropped from
    /// `start_sequence`; if that leaves a single non-auto process as the
    /// application's only member, the result is an empty start_sequence
    /// and the application is simply skipped by the Starter.
    pub fn refresh(&mut self, processes: &[&ProcessStatus]) {
        self.start_sequence.clear();
        self.stop_sequence.clear();

        for p in processes {
            if p.rules.is_auto_started() {
                self.start_sequence
                    .entry(p.rules.start_sequence)
                    .or_default()
                    .push(p.namespec());
            }
            if p.rules.stop_sequence > 0 {
                self.stop_sequence
                    .entry(p.rules.stop_sequence)
                    .or_default()
                    .push(p.namespec());
            }
        }

        self.state = Self::compute_state(processes);
        self.major_failure = processes
            .iter()
            .any(|p| p.rules.required && (p.crashed() || p.stopped()) && processes.iter().any(|o| o.running()));
        self.minor_failure = processes
            .iter()
            .any(|p| !p.rules.required && (p.crashed() || p.stopped()) && processes.iter().any(|o| o.running()));
    }

    fn compute_state(processes: &[&ProcessStatus]) -> ApplicationState {
        if processes.iter().any(|p| matches!(p.state, crate::process::ProcessState::Stopping)) {
            return ApplicationState::Stopping;
        }
        if processes
            .iter()
            .any(|p| matches!(p.state, crate::process::ProcessState::Starting | crate::process::ProcessState::Backoff))
        {
            return ApplicationState::Starting;
        }
        let required_all_running = processes
            .iter()
            .filter(|p| p.rules.required)
            .all(|p| p.running());
        if required_all_running && processes.iter().any(|p| p.rules.required) {
            return ApplicationState::Running;
        }
        if processes.iter().all(|p| p.stopped()) {
            return ApplicationState::Stopped;
        }
        // Mixed case: e.g. a required process crashed while another still
        // runs. Treat as RUNNING, consistent with `running()` meaning "any
        // process is running"; `major_failure` carries the degraded signal.
        ApplicationState::Running
    }
}

#[cfg(test)]
#[path = "application_tests.rs"]
mod tests;
