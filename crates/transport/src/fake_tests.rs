// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn publish_is_recorded() {
    let transport = FakePeerTransport::new();
    let tick = PubSubMessage::Tick(supvisors_core::TickEvent {
        address: AddressName::new("a"),
        remote_time: 1,
        loading: 0,
    });
    transport.publish(tick.clone()).await.unwrap();

    assert_eq!(transport.calls(), vec![TransportCall::Publish(tick)]);
}

#[tokio::test]
async fn queued_response_is_returned_once() {
    let transport = FakePeerTransport::new();
    let addr = AddressName::new("b");
    transport.queue_response(&addr, RpcResponse::Authorized { authorized: true });

    let first = transport.call(&addr, RpcRequest::CheckAddress).await.unwrap();
    assert_eq!(first, RpcResponse::Authorized { authorized: true });

    let second = transport.call(&addr, RpcRequest::CheckAddress).await.unwrap();
    assert_eq!(second, RpcResponse::Ack);
}

#[tokio::test]
async fn marked_unreachable_address_fails_every_call() {
    let transport = FakePeerTransport::new();
    let addr = AddressName::new("c");
    transport.mark_unreachable(&addr);

    let result = transport.call(&addr, RpcRequest::GetMasterAddress).await;
    assert!(matches!(result, Err(TransportError::Unreachable(_))));
}
