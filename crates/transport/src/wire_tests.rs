// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Cursor;

#[tokio::test]
async fn write_then_read_frame_round_trips() {
    let msg = PubSubMessage::Tick(supvisors_core::TickEvent {
        address: supvisors_core::AddressName::new("a"),
        remote_time: 7,
        loading: 3,
    });

    let mut buf = Vec::new();
    write_frame(&mut buf, &msg).await.unwrap();

    let mut cursor = Cursor::new(buf);
    let decoded: PubSubMessage = read_frame(&mut cursor).await.unwrap();
    assert_eq!(decoded, msg);
}

#[tokio::test]
async fn frame_is_length_prefixed_with_four_big_endian_bytes() {
    let msg = RpcResponse::Ack;
    let mut buf = Vec::new();
    write_frame(&mut buf, &msg).await.unwrap();

    let payload = serde_json::to_vec(&msg).unwrap();
    assert_eq!(&buf[..4], &(payload.len() as u32).to_be_bytes());
    assert_eq!(&buf[4..], &payload[..]);
}

#[tokio::test]
async fn read_frame_errors_on_truncated_stream() {
    let mut cursor = Cursor::new(vec![0u8, 0, 0, 10]);
    let result: Result<RpcResponse, TransportError> = read_frame(&mut cursor).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn read_frame_rejects_length_prefix_over_the_ceiling_without_allocating() {
    let over_ceiling = (MAX_MESSAGE_SIZE + 1) as u32;
    let mut cursor = Cursor::new(over_ceiling.to_be_bytes().to_vec());
    let result: Result<RpcResponse, TransportError> = read_frame(&mut cursor).await;
    assert!(matches!(result, Err(TransportError::FrameTooLarge { size, max }) if size == over_ceiling as usize && max == MAX_MESSAGE_SIZE));
}
