// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! The peer transport seam: pub/sub broadcast and RPC call/response
//! between fleet nodes, kept behind a trait so the engine never depends
//! on a concrete socket implementation (§6 External interfaces).

mod error;
pub mod ingress;
pub mod peer;
pub mod tcp;
pub mod wire;

pub use error::TransportError;
pub use ingress::{serve_pubsub, serve_rpc, RpcCall};
pub use peer::PeerTransport;
pub use tcp::TcpPeerTransport;
pub use wire::{AddressInfo, PubSubMessage, RpcRequest, RpcResponse};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePeerTransport, TransportCall};
