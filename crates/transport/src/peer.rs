// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The peer transport seam: everything the engine needs from the network
//! without depending on a concrete socket implementation.

use crate::wire::{PubSubMessage, RpcRequest, RpcResponse};
use crate::TransportError;
use async_trait::async_trait;
use supvisors_core::AddressName;

/// Internal pub/sub publish plus RPC call/response, as described in §6.
/// Implementations own connection lifecycle and retry; the engine only
/// ever sees these two operations.
#[async_trait]
pub trait PeerTransport: Send + Sync + 'static {
    /// Broadcast `message` to every peer in `address_list` (§6.1: TICK,
    /// PROCESS, STATISTICS all travel this channel).
    async fn publish(&self, message: PubSubMessage) -> Result<(), TransportError>;

    /// Send `request` to `address` and wait for its response.
    async fn call(&self, address: &AddressName, request: RpcRequest) -> Result<RpcResponse, TransportError>;
}
