// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! supvisorsctl - read-only introspection and manual operations against a
//! running `supvisorsd` node's RPC port (§6). An external collaborator,
//! not a participant in the fleet's event loop: every command here is one
//! request/response round-trip over the same wire the nodes use to talk
//! to each other.

mod client;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client::RpcClient;
use supvisors_core::Namespec;
use supvisors_transport::{RpcRequest, RpcResponse};

/// Default RPC port, matching `supvisors-daemon::Config::event_port`'s
/// default.
const DEFAULT_RPC_PORT: u16 = 65_002;

#[derive(Parser)]
#[command(name = "supvisorsctl", version, about = "Manual introspection and control for a Supvisors node")]
struct Cli {
    /// Node to talk to, as `host[:port]`. Falls back to
    /// `SUPVISORS_RPC_ADDR`, then `127.0.0.1:65002`.
    #[arg(short = 'a', long = "address", global = true)]
    address: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every configured address with its liveness state and loading
    Status,
    /// Print the currently elected master address, if any
    Master,
    /// Start a process by namespec (`application:process`)
    Start {
        namespec: String,
        /// Extra command-line arguments passed through to the process
        #[arg(long, default_value = "")]
        extra_args: String,
    },
    /// Stop a process by namespec (`application:process`)
    Stop { namespec: String },
    /// Ask this node to restart the fleet coordinator
    Restart,
    /// Ask this node to shut down
    Shutdown,
    /// Check whether this node answers as a peer
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let address = resolve_address(cli.address);
    let rpc = RpcClient::new(address);

    let request = match cli.command {
        Command::Status => RpcRequest::GetAllAddressesInfo,
        Command::Master => RpcRequest::GetMasterAddress,
        Command::Start { namespec, extra_args } => RpcRequest::StartProcess {
            namespec: parse_namespec(&namespec)?,
            extra_args,
        },
        Command::Stop { namespec } => RpcRequest::StopProcess {
            namespec: parse_namespec(&namespec)?,
        },
        Command::Restart => RpcRequest::Restart,
        Command::Shutdown => RpcRequest::Shutdown,
        Command::Check => RpcRequest::CheckAddress,
    };

    let response = rpc.call(request).await?;
    print_response(response)
}

fn resolve_address(flag: Option<String>) -> String {
    let address = flag
        .or_else(|| std::env::var("SUPVISORS_RPC_ADDR").ok())
        .unwrap_or_else(|| format!("127.0.0.1:{DEFAULT_RPC_PORT}"));
    if address.contains(':') {
        address
    } else {
        format!("{address}:{DEFAULT_RPC_PORT}")
    }
}

/// `application:process` (§ GLOSSARY: namespec), the way the wire types
/// expect it split.
fn parse_namespec(raw: &str) -> Result<Namespec> {
    match raw.split_once(':') {
        Some((application, process)) if !application.is_empty() && !process.is_empty() => {
            Ok(Namespec::from_parts(application, process))
        }
        _ => bail!("namespec must be in `application:process` form, got {raw:?}"),
    }
}

fn print_response(response: RpcResponse) -> Result<()> {
    match response {
        RpcResponse::Ack => println!("OK"),
        RpcResponse::MasterAddress { address } => match address {
            Some(address) => println!("{address}"),
            None => println!("(no master elected)"),
        },
        RpcResponse::AddressesInfo { addresses } => {
            for info in addresses {
                println!("{:<20} {:<10} loading={}", info.name.to_string(), info.state, info.loading);
            }
        }
        RpcResponse::Authorized { authorized } => println!("authorized={authorized}"),
        RpcResponse::Fault { code, message } => {
            bail!("fault {code}: {message}");
        }
    }
    Ok(())
}
