// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP realization of [`PeerTransport`]: one connection per call, framed
//! with [`crate::wire::write_frame`]/[`read_frame`].

use crate::peer::PeerTransport;
use crate::wire::{read_frame, write_frame, PubSubMessage, RpcRequest, RpcResponse};
use crate::TransportError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use supvisors_core::AddressName;
use tokio::net::TcpStream;

/// RPC calls are abandoned after this long (§5: 5 s per-operation budget,
/// mirrored here so a dead peer cannot wedge the engine's main loop).
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Peer transport backed by plain TCP sockets.
///
/// `peers` maps each configured address to its `host:internal_port` pub/sub
/// endpoint and `host:event_port` RPC endpoint.
pub struct TcpPeerTransport {
    pubsub_endpoints: HashMap<AddressName, String>,
    rpc_endpoints: HashMap<AddressName, String>,
}

impl TcpPeerTransport {
    pub fn new(pubsub_endpoints: HashMap<AddressName, String>, rpc_endpoints: HashMap<AddressName, String>) -> Self {
        Self {
            pubsub_endpoints,
            rpc_endpoints,
        }
    }

    async fn send_to(&self, endpoint: &str, message: &PubSubMessage) -> Result<(), TransportError> {
        let mut stream = TcpStream::connect(endpoint).await?;
        write_frame(&mut stream, message).await
    }
}

#[async_trait]
impl PeerTransport for TcpPeerTransport {
    async fn publish(&self, message: PubSubMessage) -> Result<(), TransportError> {
        for endpoint in self.pubsub_endpoints.values() {
            if let Err(err) = self.send_to(endpoint, &message).await {
                tracing::warn!(%endpoint, %err, "publish to peer failed");
            }
        }
        Ok(())
    }

    async fn call(&self, address: &AddressName, request: RpcRequest) -> Result<RpcResponse, TransportError> {
        let endpoint = self
            .rpc_endpoints
            .get(address)
            .ok_or_else(|| TransportError::Unreachable(address.as_str().to_string()))?;

        tokio::time::timeout(CALL_TIMEOUT, async {
            let mut stream = TcpStream::connect(endpoint).await?;
            write_frame(&mut stream, &request).await?;
            read_frame(&mut stream).await
        })
        .await
        .map_err(|_| TransportError::Unreachable(address.as_str().to_string()))?
    }
}

#[cfg(test)]
#[path = "tcp_tests.rs"]
mod tests;
