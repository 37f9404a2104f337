// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain fault codes surfaced at the RPC boundary.
//!
//! The transport embeds these in the host supervisor's numeric fault space
//! by adding a fixed offset (see [`FaultCode::rpc_code`]); the core itself
//! only ever deals in the symbolic variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Offset added to a [`FaultCode`]'s base value when embedding it in the
/// host supervisor's numeric fault space (faults 1-14 are reserved there).
pub const RPC_FAULT_OFFSET: i32 = 100;

/// Symbolic fault codes the core distinguishes at its RPC boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultCode {
    SupvisorsConfError,
    BadSupvisorsState,
    BadAddress,
    BadStrategy,
}

impl FaultCode {
    /// Base numeric value before the transport's offset is applied.
    pub fn base_code(self) -> i32 {
        match self {
            FaultCode::SupvisorsConfError => 1,
            FaultCode::BadSupvisorsState => 2,
            FaultCode::BadAddress => 3,
            FaultCode::BadStrategy => 4,
        }
    }

    /// Numeric code as it appears on the wire, offset into the host
    /// supervisor's fault space.
    pub fn rpc_code(self) -> i32 {
        RPC_FAULT_OFFSET + self.base_code()
    }
}

impl std::fmt::Display for FaultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FaultCode::SupvisorsConfError => "SUPVISORS_CONF_ERROR",
            FaultCode::BadSupvisorsState => "BAD_SUPVISORS_STATE",
            FaultCode::BadAddress => "BAD_ADDRESS",
            FaultCode::BadStrategy => "BAD_STRATEGY",
        };
        write!(f, "{label}")
    }
}

/// A fault surfaced to an RPC caller: code plus a human-readable reason.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct SupvisorsFault {
    pub code: FaultCode,
    pub message: String,
}

impl SupvisorsFault {
    pub fn new(code: FaultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_address(address: &str) -> Self {
        Self::new(FaultCode::BadAddress, format!("unknown address: {address}"))
    }

    pub fn bad_strategy(name: &str) -> Self {
        Self::new(FaultCode::BadStrategy, format!("unknown strategy: {name}"))
    }

    pub fn bad_state(expected: &str, actual: &str) -> Self {
        Self::new(
            FaultCode::BadSupvisorsState,
            format!("operation requires {expected}, fleet is in {actual}"),
        )
    }
}

#[cfg(test)]
#[path = "fault_tests.rs"]
mod tests;
