// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Failures from the peer transport: connection, framing, or a peer that
/// rejected the call outright.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer {0} unreachable")]
    Unreachable(String),
    #[error("frame of {size} bytes exceeds the {max}-byte ceiling")]
    FrameTooLarge { size: usize, max: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed frame: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("peer {address} rejected call: {message}")]
    Rejected { address: String, message: String },
}
