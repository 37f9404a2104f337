// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Address identity resolution and per-peer liveness tracking.

use crate::id::AddressName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of one peer address.
///
/// Forms the DAG `Unknown -> Checking -> Running`, `Running -> Silent` on
/// missed heartbeats, `Silent -> Isolating -> Isolated` when auto-fence is
/// on, otherwise `Silent -> Checking` on recovery. `Isolated` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressState {
    Unknown,
    Checking,
    Running,
    Silent,
    Isolating,
    Isolated,
}

impl AddressState {
    pub fn label(self) -> &'static str {
        match self {
            AddressState::Unknown => "UNKNOWN",
            AddressState::Checking => "CHECKING",
            AddressState::Running => "RUNNING",
            AddressState::Silent => "SILENT",
            AddressState::Isolating => "ISOLATING",
            AddressState::Isolated => "ISOLATED",
        }
    }
}

impl std::fmt::Display for AddressState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Liveness and loading state for one peer node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressStatus {
    pub name: AddressName,
    pub state: AddressState,
    /// Epoch ms reported by the peer in its last heartbeat.
    pub remote_time: u64,
    /// Epoch ms (local clock) at which that heartbeat was received.
    pub local_time: u64,
    /// Sum of `expected_loading` of processes currently RUNNING on this
    /// address, 0-100.
    pub loading: u8,
    /// Whether the initial `check_address` handshake has completed.
    pub checked: bool,
}

impl AddressStatus {
    pub fn new(name: AddressName) -> Self {
        Self {
            name,
            state: AddressState::Unknown,
            remote_time: 0,
            local_time: 0,
            loading: 0,
            checked: false,
        }
    }

    /// Construct the status for the local node, which is always RUNNING
    /// once the node has initialized.
    pub fn new_local(name: AddressName, now_ms: u64) -> Self {
        Self {
            name,
            state: AddressState::Running,
            remote_time: now_ms,
            local_time: now_ms,
            loading: 0,
            checked: true,
        }
    }

    /// Record a heartbeat. Transitions CHECKING -> RUNNING and refreshes
    /// timestamps. A SILENT address that starts ticking again also
    /// recovers to RUNNING directly (the spec routes SILENT -> CHECKING
    /// on recovery only when auto-fence observed it go silent first; ticks
    /// arriving mean the peer never actually stopped sending, so there is
    /// nothing to re-check).
    pub fn update_remote_time(&mut self, remote_time: u64, local_time: u64) {
        match self.state {
            AddressState::Checking | AddressState::Silent => {
                self.state = AddressState::Running;
            }
            AddressState::Unknown => {
                self.state = AddressState::Checking;
            }
            _ => {}
        }
        self.remote_time = remote_time;
        self.local_time = local_time;
    }

    /// True for ISOLATING or ISOLATED.
    pub fn in_isolation(&self) -> bool {
        matches!(self.state, AddressState::Isolating | AddressState::Isolated)
    }

    pub fn is_running(&self) -> bool {
        self.state == AddressState::Running
    }

    pub fn state_string(&self) -> &'static str {
        self.state.label()
    }

    /// Mark silent after a missed-heartbeat timeout. No-op for addresses
    /// already isolated (terminal) or already silent/isolating.
    pub fn mark_silent(&mut self) {
        if matches!(
            self.state,
            AddressState::Running | AddressState::Checking | AddressState::Unknown
        ) {
            self.state = AddressState::Silent;
        }
    }

    /// Advance SILENT -> ISOLATING -> ISOLATED, one FSM tick at a time.
    /// Returns true if the state changed.
    pub fn advance_isolation(&mut self) -> bool {
        match self.state {
            AddressState::Silent => {
                self.state = AddressState::Isolating;
                true
            }
            AddressState::Isolating => {
                self.state = AddressState::Isolated;
                true
            }
            _ => false,
        }
    }

    /// Remaining capacity under the 100-unit loading ceiling.
    pub fn remaining_capacity(&self) -> u8 {
        100u8.saturating_sub(self.loading)
    }
}

/// Errors raised while resolving the local node's identity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapperError {
    #[error("host identity {candidates:?} matches no entry in address_list {address_list:?}")]
    LocalAddressNotFound {
        candidates: Vec<String>,
        address_list: Vec<String>,
    },
}

/// Resolves the local node's name against the configured, ordered address
/// list by trying the host's FQDN, short name, and configured aliases.
///
/// Address ordering in `address_list` drives master election (§8 invariant
/// 6: the master is the RUNNING address with the smallest index).
#[derive(Debug, Clone)]
pub struct AddressMapper {
    address_list: Vec<AddressName>,
    local: AddressName,
}

impl AddressMapper {
    /// Resolve `candidates` (e.g. `[fqdn, short_name, ...aliases]`, in
    /// preference order) against `address_list`. Fatal at init if none
    /// match: the caller is expected to report this to the FSM and abort
    /// startup rather than run headless.
    pub fn new(address_list: Vec<String>, candidates: &[String]) -> Result<Self, MapperError> {
        let address_list: Vec<AddressName> = address_list.into_iter().map(AddressName::new).collect();

        let local = candidates
            .iter()
            .find(|c| address_list.iter().any(|a| a.as_str() == c.as_str()))
            .map(|c| AddressName::new(c.clone()));

        match local {
            Some(local) => Ok(Self { address_list, local }),
            None => Err(MapperError::LocalAddressNotFound {
                candidates: candidates.to_vec(),
                address_list: address_list.iter().map(|a| a.as_str().to_string()).collect(),
            }),
        }
    }

    /// The full configured address list, in master-election order.
    pub fn address_list(&self) -> &[AddressName] {
        &self.address_list
    }

    /// The resolved local address name.
    pub fn local_address(&self) -> &AddressName {
        &self.local
    }

    /// Zero-based rank of `name` in `address_list`, if present.
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.address_list.iter().position(|a| a.as_str() == name)
    }

    /// True if `name` is one of the configured addresses.
    pub fn valid(&self, name: &str) -> bool {
        self.address_list.iter().any(|a| a.as_str() == name)
    }

    /// Keep only the candidates that are configured addresses, preserving
    /// `address_list` order (not input order) since downstream consumers
    /// (master election, ordered broadcast) rely on that ordering.
    pub fn filter(&self, candidates: &[String]) -> Vec<AddressName> {
        self.address_list
            .iter()
            .filter(|a| candidates.iter().any(|c| c == a.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "address_tests.rs"]
mod tests;
