// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire framing shared by the pub/sub and RPC channels: a 4-byte
//! big-endian length prefix followed by a JSON payload.

use crate::TransportError;
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Messages published on the internal pub/sub channel, tagged by kind
/// (§6: TICK, PROCESS, STATISTICS).
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(tag = "kind")]
pub enum PubSubMessage {
    Tick(supvisors_core::TickEvent),
    Process(supvisors_core::ProcessEvent),
    /// Opaque to the core; carried for completeness of the channel.
    Statistics(serde_json::Value),
}

/// RPC requests a node may send a peer.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(tag = "op")]
pub enum RpcRequest {
    GetAllAddressesInfo,
    GetMasterAddress,
    StartProcess {
        namespec: supvisors_core::Namespec,
        extra_args: String,
    },
    StopProcess {
        namespec: supvisors_core::Namespec,
    },
    Restart,
    Shutdown,
    CheckAddress,
}

/// One address's liveness summary, as returned by `GetAllAddressesInfo`
/// (§6 read-only introspection of applications/processes).
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct AddressInfo {
    pub name: supvisors_core::AddressName,
    pub state: String,
    pub loading: u8,
}

/// RPC responses. `Fault` surfaces one of the four domain faults with the
/// transport's RPC offset already applied (§6 Fault codes).
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(tag = "result")]
pub enum RpcResponse {
    Ack,
    MasterAddress { address: Option<supvisors_core::AddressName> },
    AddressesInfo { addresses: Vec<AddressInfo> },
    Authorized { authorized: bool },
    Fault { code: i32, message: String },
}

/// Ceiling on one frame's payload, checked before allocating on the read
/// path and before sending on the write path. Matches the teacher's
/// `protocol_wire::MAX_MESSAGE_SIZE` (200 MB over the same 4-byte
/// length-prefixed framing).
pub const MAX_MESSAGE_SIZE: usize = 200 * 1024 * 1024;

/// Write `value` as a length-prefixed JSON frame.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), TransportError>
where
    W: tokio::io::AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = serde_json::to_vec(value)?;
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(TransportError::FrameTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let len = u32::try_from(payload.len()).map_err(|_| TransportError::FrameTooLarge {
        size: payload.len(),
        max: MAX_MESSAGE_SIZE,
    })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed JSON frame. The length prefix is checked
/// against [`MAX_MESSAGE_SIZE`] before the payload buffer is allocated, so
/// a peer cannot drive an unbounded allocation with a forged 4-byte prefix.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, TransportError>
where
    R: tokio::io::AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(TransportError::FrameTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(serde_json::from_slice(&payload)?)
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
