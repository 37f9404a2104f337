// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server side of the peer transport: the "event ingress" and "RPC
//! ingress" actors (§5) that accept inbound connections off the main
//! loop's task and hand decoded messages to it over a channel.
//!
//! Each accepted connection is handled on its own spawned task so one slow
//! or malformed peer cannot stall acceptance of the next. Nothing here
//! touches `Context`; the main loop drains the channels and applies every
//! message itself, preserving the single-writer model (§5).

use crate::wire::{read_frame, write_frame, PubSubMessage, RpcRequest, RpcResponse};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

/// An inbound RPC paired with the channel to deliver its response on,
/// since the socket that received it is owned by a different task than
/// the main loop that computes the answer.
pub struct RpcCall {
    pub request: RpcRequest,
    pub respond_to: oneshot::Sender<RpcResponse>,
}

/// Bind `addr` and forward every framed [`PubSubMessage`] received to
/// `tx`. Runs until the listener errors (e.g. the socket is closed).
pub async fn serve_pubsub(addr: SocketAddr, tx: mpsc::Sender<PubSubMessage>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "pub/sub ingress listening");
    loop {
        let (mut stream, peer) = listener.accept().await?;
        let tx = tx.clone();
        tokio::spawn(async move {
            match read_frame::<_, PubSubMessage>(&mut stream).await {
                Ok(message) => {
                    if tx.send(message).await.is_err() {
                        tracing::warn!(%peer, "pub/sub ingress channel closed, dropping message");
                    }
                }
                Err(err) => tracing::warn!(%peer, %err, "failed to decode pub/sub frame"),
            }
        });
    }
}

/// Bind `addr` and forward every framed [`RpcRequest`] received to `tx` as
/// an [`RpcCall`], then write back whatever response arrives on its
/// `respond_to` channel. Runs until the listener errors.
pub async fn serve_rpc(addr: SocketAddr, tx: mpsc::Sender<RpcCall>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "RPC ingress listening");
    loop {
        let (mut stream, peer) = listener.accept().await?;
        let tx = tx.clone();
        tokio::spawn(async move {
            let request = match read_frame::<_, RpcRequest>(&mut stream).await {
                Ok(request) => request,
                Err(err) => {
                    tracing::warn!(%peer, %err, "failed to decode RPC frame");
                    return;
                }
            };

            let (respond_to, response_rx) = oneshot::channel();
            if tx.send(RpcCall { request, respond_to }).await.is_err() {
                tracing::warn!(%peer, "RPC ingress channel closed, dropping call");
                return;
            }

            match response_rx.await {
                Ok(response) => {
                    if let Err(err) = write_frame(&mut stream, &response).await {
                        tracing::warn!(%peer, %err, "failed to write RPC response");
                    }
                }
                Err(_) => tracing::warn!(%peer, "main loop dropped RPC call without responding"),
            }
        });
    }
}

#[cfg(test)]
#[path = "ingress_tests.rs"]
mod tests;
