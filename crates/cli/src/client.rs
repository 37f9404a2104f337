// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin client for one node's RPC port (§6). The CLI is explicitly an
//! external collaborator to the fleet coordinator (out of scope per §1):
//! it never touches `Context`/`Fsm`/`Commander` directly, only the same
//! wire types a peer node would use.

use std::time::Duration;

use supvisors_transport::wire::{read_frame, write_frame};
use supvisors_transport::{RpcRequest, RpcResponse};
use thiserror::Error;
use tokio::net::TcpStream;

/// How long a single RPC round-trip may take before giving up, mirroring
/// the peer-to-peer `CALL_TIMEOUT` in `supvisors-transport`.
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request to {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },
    #[error("transport error: {0}")]
    Transport(#[from] supvisors_transport::TransportError),
}

/// One node's RPC endpoint, addressed as `host:port`.
pub struct RpcClient {
    address: String,
}

impl RpcClient {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into() }
    }

    /// Connect, send `request`, and wait for the matching response frame.
    pub async fn call(&self, request: RpcRequest) -> Result<RpcResponse, ClientError> {
        tokio::time::timeout(CALL_TIMEOUT, self.call_inner(request))
            .await
            .map_err(|_| ClientError::Timeout {
                address: self.address.clone(),
                timeout: CALL_TIMEOUT,
            })?
    }

    async fn call_inner(&self, request: RpcRequest) -> Result<RpcResponse, ClientError> {
        let mut stream = TcpStream::connect(&self.address).await.map_err(|source| ClientError::Connect {
            address: self.address.clone(),
            source,
        })?;
        write_frame(&mut stream, &request).await?;
        let response = read_frame(&mut stream).await?;
        Ok(response)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
