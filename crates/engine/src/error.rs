// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the engine: placement/strategy failures and the
//! fleet-level state guard, wrapping the four domain fault codes (§6/§7).

use supvisors_core::{FaultCode, Namespec, SupvisorsFault};
use thiserror::Error;

/// Errors the engine raises at its own boundary (Commander/FSM entry
/// points), distinct from the domain faults an RPC caller sees — those are
/// carried in [`EngineError::Fault`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// An operation was requested in an FSM state that forbids it (§7
    /// State-guard), e.g. `start_application` outside OPERATION/DEPLOYMENT.
    #[error("{0}")]
    Fault(#[from] SupvisorsFault),

    /// No RUNNING address had enough remaining capacity for `namespec`
    /// (§7 Placement). The caller force-marks the process FATAL and
    /// applies its `starting_failure_strategy`.
    #[error("no resource available for {namespec}")]
    NoResourceAvailable { namespec: Namespec },

    /// `namespec` is not a process this node knows about.
    #[error("unknown process: {0}")]
    UnknownProcess(Namespec),
}

impl EngineError {
    pub fn bad_state(expected: &str, actual: &str) -> Self {
        SupvisorsFault::bad_state(expected, actual).into()
    }

    pub fn bad_strategy(name: &str) -> Self {
        SupvisorsFault::bad_strategy(name).into()
    }

    pub fn fault_code(&self) -> Option<FaultCode> {
        match self {
            EngineError::Fault(f) => Some(f.code),
            _ => None,
        }
    }
}
