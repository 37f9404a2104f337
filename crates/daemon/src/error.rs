// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level daemon error, unifying the failure modes a node can hit at
//! startup or while serving RPCs (§7).

use supvisors_core::{FaultCode, MapperError, SupvisorsFault};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("rules file error: {0}")]
    Rules(#[from] supvisors_rules::ParseError),

    #[error("could not resolve local node identity: {0}")]
    Address(#[from] MapperError),

    #[error("failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DaemonError {
    /// The symbolic fault this error maps to at the RPC boundary (§6).
    pub fn fault_code(&self) -> FaultCode {
        match self {
            DaemonError::Config(_) => FaultCode::SupvisorsConfError,
            DaemonError::Rules(_) => FaultCode::SupvisorsConfError,
            DaemonError::Address(_) => FaultCode::BadAddress,
            DaemonError::Bind { .. } => FaultCode::SupvisorsConfError,
            DaemonError::Io(_) => FaultCode::SupvisorsConfError,
        }
    }

    pub fn as_fault(&self) -> SupvisorsFault {
        SupvisorsFault::new(self.fault_code(), self.to_string())
    }
}
