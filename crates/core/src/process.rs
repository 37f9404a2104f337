// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-process aggregation across addresses, and conflict detection.

use crate::id::{AddressName, Namespec};
use crate::process_rules::ProcessRules;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// State of one process instance, mirroring the underlying local
/// supervisor's process-event schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessState {
    Starting,
    Running,
    Backoff,
    Stopping,
    Stopped,
    Exited,
    Fatal,
    Unknown,
}

impl ProcessState {
    /// Running-like states keep the process counted in `addresses`.
    pub fn is_running_like(self) -> bool {
        matches!(
            self,
            ProcessState::Starting
                | ProcessState::Backoff
                | ProcessState::Running
                | ProcessState::Stopping
        )
    }

    /// Ranking used to pick the "most advanced" state among addresses
    /// that are all running-like: RUNNING > STARTING > BACKOFF > STOPPING.
    fn running_rank(self) -> u8 {
        match self {
            ProcessState::Running => 3,
            ProcessState::Starting => 2,
            ProcessState::Backoff => 1,
            ProcessState::Stopping => 0,
            _ => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProcessState::Starting => "STARTING",
            ProcessState::Running => "RUNNING",
            ProcessState::Backoff => "BACKOFF",
            ProcessState::Stopping => "STOPPING",
            ProcessState::Stopped => "STOPPED",
            ProcessState::Exited => "EXITED",
            ProcessState::Fatal => "FATAL",
            ProcessState::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Last reported process info from one address, matching the wire schema
/// `{name, group, state, start, stop, now, pid, description, spawnerr,
/// expected}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub state: ProcessState,
    pub start: u64,
    pub stop: u64,
    pub now: u64,
    pub pid: u32,
    pub description: String,
    pub spawnerr: String,
    pub expected: bool,
}

/// One configured program instance, aggregated across every address that
/// has reported it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStatus {
    pub application_name: String,
    pub process_name: String,
    pub rules: ProcessRules,
    /// Per-address last reported info.
    info_map: BTreeMap<AddressName, ProcessInfo>,
    /// Addresses currently reporting this process RUNNING-like.
    addresses: BTreeSet<AddressName>,
    /// Aggregated logical state (§4.3 aggregation rule).
    pub state: ProcessState,
    pub expected_exit: bool,
    pub request_time: u64,
    pub last_event_time: u64,
    pub extra_args: String,
    /// Set when a single-process start bypasses `planned_sequence`, so the
    /// Commander does not block the caller on `wait_exit`.
    pub ignore_wait_exit: bool,
    /// Human-readable reason for the last synthetic (Commander-forced)
    /// state change, e.g. "no resource available" or "Still stopped 5
    /// seconds after start request". Empty unless `force_state` was used.
    pub last_reason: String,
}

impl ProcessStatus {
    pub fn new(application_name: impl Into<String>, process_name: impl Into<String>, rules: ProcessRules) -> Self {
        Self {
            application_name: application_name.into(),
            process_name: process_name.into(),
            rules,
            info_map: BTreeMap::new(),
            addresses: BTreeSet::new(),
            state: ProcessState::Unknown,
            expected_exit: true,
            request_time: 0,
            last_event_time: 0,
            extra_args: String::new(),
            ignore_wait_exit: false,
            last_reason: String::new(),
        }
    }

    pub fn namespec(&self) -> Namespec {
        Namespec::from_parts(&self.application_name, &self.process_name)
    }

    /// Addresses currently reporting this process running-like.
    pub fn addresses(&self) -> &BTreeSet<AddressName> {
        &self.addresses
    }

    /// Last reported info from `address`, if any. Conciliation uses
    /// `info(addr).start` to pick the oldest/newest surviving instance.
    pub fn info(&self, address: &AddressName) -> Option<&ProcessInfo> {
        self.info_map.get(address)
    }

    pub fn running(&self) -> bool {
        matches!(self.state, ProcessState::Running)
    }

    /// True for any terminal (non-running-like) state: STOPPED, EXITED,
    /// FATAL, or UNKNOWN.
    pub fn stopped(&self) -> bool {
        !self.state.is_running_like()
    }

    /// FATAL, or EXITED when the exit was not expected.
    pub fn crashed(&self) -> bool {
        match self.state {
            ProcessState::Fatal => true,
            ProcessState::Exited => !self.expected_exit,
            _ => false,
        }
    }

    /// A process is in conflict iff it is reported RUNNING-like on more
    /// than one address simultaneously (§8 invariant 1).
    pub fn conflicting(&self) -> bool {
        self.addresses.len() > 1
    }

    /// Record the first-ever sighting of this process from `address`.
    pub fn add_info(&mut self, address: AddressName, info: ProcessInfo) {
        self.update_info(address, info);
    }

    /// Apply a new process event from `address` and recompute the
    /// aggregated state. Idempotent: applying the same event twice leaves
    /// the aggregate unchanged (§5 ordering guarantee).
    pub fn update_info(&mut self, address: AddressName, info: ProcessInfo) {
        self.last_event_time = self.last_event_time.max(info.now);
        self.expected_exit = info.expected;

        if info.state.is_running_like() {
            self.addresses.insert(address.clone());
        } else {
            self.addresses.remove(&address);
        }
        self.info_map.insert(address, info);
        self.recompute_state();
    }

    /// Drop an address that went silent. May cause the aggregated state
    /// to fall back to STOPPED if no addresses remain reporting it.
    pub fn invalidate_address(&mut self, address: &AddressName) {
        self.info_map.remove(address);
        self.addresses.remove(address);
        self.recompute_state();
    }

    /// Force the aggregated state directly, bypassing per-address reports.
    /// Used by the Commander for synthetic outcomes that no peer will ever
    /// report: no eligible placement address (§7 Placement), or a
    /// bounded-time start/stop timeout (§7 Timeout). Clears every
    /// per-address report, since after a forced state no address is
    /// considered to be running this process.
    pub fn force_state(&mut self, state: ProcessState, reason: impl Into<String>, now: u64) {
        self.info_map.clear();
        self.addresses.clear();
        self.state = state;
        self.last_event_time = now;
        self.last_reason = reason.into();
    }

    fn recompute_state(&mut self) {
        let running_like: Vec<&ProcessInfo> = self
            .addresses
            .iter()
            .filter_map(|a| self.info_map.get(a))
            .collect();

        if !running_like.is_empty() {
            self.state = running_like
                .iter()
                .map(|i| i.state)
                .max_by_key(|s| s.running_rank())
                .unwrap_or(ProcessState::Running);
            return;
        }

        // No running-like address: aggregate state is the most recent
        // terminal state by event time. If no address has reported at
        // all, the process is UNKNOWN.
        self.state = self
            .info_map
            .values()
            .max_by_key(|i| i.now)
            .map(|i| i.state)
            .unwrap_or(ProcessState::Unknown);
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
