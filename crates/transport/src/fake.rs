// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory peer transport for tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::peer::PeerTransport;
use crate::wire::{PubSubMessage, RpcRequest, RpcResponse};
use crate::TransportError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use supvisors_core::AddressName;

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Publish(PubSubMessage),
    Call { address: AddressName, request: RpcRequest },
}

struct FakeTransportState {
    calls: Vec<TransportCall>,
    responses: HashMap<AddressName, Vec<RpcResponse>>,
    unreachable: Vec<AddressName>,
}

/// Records every publish/call and returns pre-scripted RPC responses.
#[derive(Clone)]
pub struct FakePeerTransport {
    inner: Arc<Mutex<FakeTransportState>>,
}

impl Default for FakePeerTransport {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeTransportState {
                calls: Vec::new(),
                responses: HashMap::new(),
                unreachable: Vec::new(),
            })),
        }
    }
}

impl FakePeerTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.inner.lock().calls.clone()
    }

    /// Queue `response` to be returned by the next `call` to `address`.
    pub fn queue_response(&self, address: &AddressName, response: RpcResponse) {
        self.inner.lock().responses.entry(address.clone()).or_default().push(response);
    }

    /// Make every future `call` to `address` fail as unreachable.
    pub fn mark_unreachable(&self, address: &AddressName) {
        self.inner.lock().unreachable.push(address.clone());
    }
}

#[async_trait]
impl PeerTransport for FakePeerTransport {
    async fn publish(&self, message: PubSubMessage) -> Result<(), TransportError> {
        self.inner.lock().calls.push(TransportCall::Publish(message));
        Ok(())
    }

    async fn call(&self, address: &AddressName, request: RpcRequest) -> Result<RpcResponse, TransportError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TransportCall::Call {
            address: address.clone(),
            request,
        });

        if inner.unreachable.contains(address) {
            return Err(TransportError::Unreachable(address.as_str().to_string()));
        }

        match inner.responses.get_mut(address).and_then(|q| if q.is_empty() { None } else { Some(q.remove(0)) }) {
            Some(response) => Ok(response),
            None => Ok(RpcResponse::Ack),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
