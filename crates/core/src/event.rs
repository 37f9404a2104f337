// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound events ingested by [`crate::context::Context`], and the
//! published [`ModelEvent`]s the context emits after applying them.

use crate::address::AddressState;
use crate::application::ApplicationState;
use crate::id::{AddressName, Namespec};
use crate::process::ProcessState;
use serde::{Deserialize, Serialize};

/// Periodic heartbeat from a remote node's local supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvent {
    pub address: AddressName,
    pub remote_time: u64,
    pub loading: u8,
}

/// A process state change reported by one node's local supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEvent {
    pub address: AddressName,
    pub application_name: String,
    pub process_name: String,
    pub state: ProcessState,
    pub start: u64,
    pub stop: u64,
    pub now: u64,
    pub pid: u32,
    pub description: String,
    pub spawnerr: String,
    pub expected: bool,
}

/// Result of a peer's handshake/authorization check during synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationEvent {
    pub address: AddressName,
    pub authorized: bool,
}

/// Events published by [`crate::context::Context`] after an inbound event
/// has been applied, for the FSM and any introspection listener to react
/// to.
///
/// Serializes with `{"type": "event:name", ...fields}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ModelEvent {
    #[serde(rename = "address:state_changed")]
    AddressStateChanged {
        address: AddressName,
        state: AddressState,
    },

    #[serde(rename = "process:state_changed")]
    ProcessStateChanged {
        namespec: Namespec,
        state: ProcessState,
    },

    #[serde(rename = "process:conflict")]
    ProcessConflict { namespec: Namespec },

    #[serde(rename = "application:state_changed")]
    ApplicationStateChanged {
        application_name: String,
        state: ApplicationState,
    },
}

impl ModelEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ModelEvent::AddressStateChanged { .. } => "address:state_changed",
            ModelEvent::ProcessStateChanged { .. } => "process:state_changed",
            ModelEvent::ProcessConflict { .. } => "process:conflict",
            ModelEvent::ApplicationStateChanged { .. } => "application:state_changed",
        }
    }

    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            ModelEvent::AddressStateChanged { address, state } => {
                format!("{t} address={address} state={state}")
            }
            ModelEvent::ProcessStateChanged { namespec, state } => {
                format!("{t} namespec={namespec} state={state}")
            }
            ModelEvent::ProcessConflict { namespec } => format!("{t} namespec={namespec}"),
            ModelEvent::ApplicationStateChanged {
                application_name,
                state,
            } => format!("{t} application={application_name} state={state}"),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
