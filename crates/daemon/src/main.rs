// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! supvisorsd: the fleet coordinator daemon.
//!
//! One process per address. Owns the single-threaded cooperative event
//! loop (§5): a tick interval drives the FSM/Commander, while a pub/sub
//! ingress task and an RPC ingress task (spawned below) decode inbound
//! peer traffic off the main task and hand it over on bounded channels.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use supvisors_core::{AddressMapper, AddressName, Clock, SystemClock};
use supvisors_daemon::{local_candidates, Config, DaemonError, Node, NullSupervisor};
use supvisors_transport::{serve_pubsub, serve_rpc, PeerTransport, PubSubMessage, RpcCall, TcpPeerTransport};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Heartbeat cadence: how often this node publishes its own TICK (§6:
/// ticks carry implicit liveness, default inactivity window is 10s of
/// missed ticks so ticking every 2s gives several chances to be seen).
const TICK_INTERVAL: Duration = Duration::from_secs(2);

/// FSM scheduler resolution: how often `Node::tick` runs regardless of
/// inbound traffic, so timeouts and liveness are still checked when the
/// fleet is otherwise quiet.
const SCHEDULER_INTERVAL: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("supvisorsd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: supvisorsd [--help | --version] [--config PATH]");
                std::process::exit(1);
            }
        }
    }

    setup_logging();

    let config_path = config_path_from_args();
    if let Err(err) = run(config_path).await {
        error!(%err, "supvisorsd exiting on fatal error");
        return Err(err.into());
    }
    Ok(())
}

async fn run(config_path: PathBuf) -> Result<(), DaemonError> {
    let config = Config::load(&config_path)?;

    let rules = match &config.rules_file {
        Some(path) => supvisors_rules::load(path)?.into_application_rules(),
        None => indexmap::IndexMap::new(),
    };

    let candidates = local_candidates(&[]);
    let mapper = AddressMapper::new(config.address_list.clone(), &candidates)?;
    info!(local = %mapper.local_address(), "resolved local node identity");

    let pubsub_endpoints = endpoint_map(&config, config.internal_port);
    let rpc_endpoints = endpoint_map(&config, config.event_port);
    let transport = Arc::new(TcpPeerTransport::new(pubsub_endpoints, rpc_endpoints));

    // The actual process manager on this host is out of scope (§1
    // Non-goals); every namespec reports absent until a real one is wired
    // in, which surfaces as a synthetic UNKNOWN event rather than a fault.
    let supervisor = Arc::new(NullSupervisor);

    let now_ms = SystemClock.epoch_ms();
    let mut node = Node::new(&mapper, &config, transport.clone(), supervisor, SystemClock, now_ms);
    node.apply_rules(&rules);

    let (pubsub_tx, mut pubsub_rx) = mpsc::channel::<PubSubMessage>(256);
    let (rpc_tx, mut rpc_rx) = mpsc::channel::<RpcCall>(64);

    let pubsub_addr: SocketAddr = format!("0.0.0.0:{}", config.internal_port)
        .parse()
        .map_err(|_| DaemonError::Bind {
            endpoint: format!("0.0.0.0:{}", config.internal_port),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "bad internal_port"),
        })?;
    let rpc_addr: SocketAddr = format!("0.0.0.0:{}", config.event_port)
        .parse()
        .map_err(|_| DaemonError::Bind {
            endpoint: format!("0.0.0.0:{}", config.event_port),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "bad event_port"),
        })?;

    tokio::spawn(async move {
        if let Err(err) = serve_pubsub(pubsub_addr, pubsub_tx).await {
            error!(%err, "pub/sub ingress task exited");
        }
    });
    tokio::spawn(async move {
        if let Err(err) = serve_rpc(rpc_addr, rpc_tx).await {
            error!(%err, "RPC ingress task exited");
        }
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let mut scheduler = tokio::time::interval(SCHEDULER_INTERVAL);
    let mut tick_timer = tokio::time::interval(TICK_INTERVAL);
    let local = mapper.local_address().clone();

    info!(state = %node.state(), "supvisorsd ready");
    println!("READY");

    loop {
        tokio::select! {
            message = pubsub_rx.recv() => {
                match message {
                    Some(message) => node.handle_pubsub(message, now_epoch_ms()).await,
                    None => { warn!("pub/sub ingress channel closed"); }
                }
            }

            call = rpc_rx.recv() => {
                match call {
                    Some(RpcCall { request, respond_to }) => {
                        let response = node.handle_rpc(request, now_epoch_ms()).await;
                        let _ = respond_to.send(response);
                    }
                    None => { warn!("RPC ingress channel closed"); }
                }
            }

            _ = scheduler.tick() => {
                node.tick().await;
            }

            _ = tick_timer.tick() => {
                publish_local_tick(&transport, &local).await;
            }

            _ = sigterm.recv() => {
                info!("received SIGTERM, requesting shutdown");
                node.request_shutdown();
            }

            _ = sigint.recv() => {
                info!("received SIGINT, requesting shutdown");
                node.request_shutdown();
            }
        }

        if node.state() == supvisors_engine::FsmState::Shutdown {
            info!("all applications stopped, exiting");
            break;
        }
    }

    Ok(())
}

async fn publish_local_tick(transport: &Arc<TcpPeerTransport>, local: &AddressName) {
    let tick = supvisors_core::TickEvent {
        address: local.clone(),
        remote_time: now_epoch_ms(),
        loading: 0,
    };
    if let Err(err) = transport.publish(PubSubMessage::Tick(tick)).await {
        warn!(%err, "failed to publish local tick");
    }
}

fn now_epoch_ms() -> u64 {
    SystemClock.epoch_ms()
}

fn endpoint_map(config: &Config, port: u16) -> HashMap<AddressName, String> {
    config
        .address_list
        .iter()
        .map(|name| (AddressName::new(name.clone()), format!("{name}:{port}")))
        .collect()
}

fn config_path_from_args() -> PathBuf {
    std::env::var("SUPVISORS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/supvisors/supvisors.toml"))
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn print_help() {
    println!("supvisorsd {}", env!("CARGO_PKG_VERSION"));
    println!("Fleet coordinator daemon — one process per address.");
    println!();
    println!("USAGE:");
    println!("    supvisorsd [--help | --version]");
    println!();
    println!("Configuration is read from $SUPVISORS_CONFIG (default");
    println!("/etc/supvisors/supvisors.toml); every option may also be set via a");
    println!("SUPVISORS_* environment variable (see supvisors-daemon::config).");
}
