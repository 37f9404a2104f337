// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One node's runtime state: the authoritative [`Context`], the fleet
//! [`Fsm`], and the [`Commander`] that drives ordered start/stop. Wires
//! inbound pub/sub and RPC traffic into the single-threaded model the rest
//! of the engine assumes (§5).

use std::sync::Arc;

use supvisors_core::{AddressMapper, Clock, Context, Namespec, ProcessEvent, ProcessState, SupvisorsFault};
use supvisors_engine::{Commander, Fsm, FsmState};
use supvisors_transport::{AddressInfo, PeerTransport, PubSubMessage, RpcRequest, RpcResponse};

use crate::config::Config;
use crate::supervisor::LocalSupervisor;

/// Owns the mutable fleet model for one node. Every method here runs on the
/// single main-loop task; nothing outside this type ever touches [`Context`]
/// directly (§5 concurrency model).
pub struct Node<C: Clock> {
    ctx: Context,
    fsm: Fsm<C>,
    commander: Commander,
    local: supvisors_core::AddressName,
    transport: Arc<dyn PeerTransport>,
    supervisor: Arc<dyn LocalSupervisor>,
}

impl<C: Clock> Node<C> {
    pub fn new(
        mapper: &AddressMapper,
        config: &Config,
        transport: Arc<dyn PeerTransport>,
        supervisor: Arc<dyn LocalSupervisor>,
        clock: C,
        now_ms: u64,
    ) -> Self {
        let address_list = mapper.address_list().to_vec();
        let local = mapper.local_address().clone();

        let ctx = Context::new(&address_list, &local, now_ms);
        let fsm = Fsm::new(
            local.clone(),
            address_list.clone(),
            config.synchro_timeout * 1000,
            DEFAULT_INACTIVITY_MS,
            config.auto_fence,
            config.conciliation_strategy,
            clock,
            now_ms,
        );
        let commander = Commander::new(address_list, config.starting_strategy, transport.clone());

        Self {
            ctx,
            fsm,
            commander,
            local,
            transport,
            supervisor,
        }
    }

    pub fn state(&self) -> FsmState {
        self.fsm.state()
    }

    /// Load declared application/process rules (§6) before synchronization
    /// starts, the way the rules file is parsed once at startup.
    pub fn apply_rules(&mut self, rules: &indexmap::IndexMap<String, supvisors_core::ApplicationRules>) {
        for application_rules in rules.values() {
            self.ctx.apply_application_rules(application_rules);
        }
    }

    /// Drive one scheduler tick and log every model event it produced.
    pub async fn tick(&mut self) {
        self.fsm.tick(&mut self.ctx, &mut self.commander).await;
        for event in self.ctx.take_events() {
            tracing::debug!(event = %event.log_summary(), "model event");
        }
    }

    pub fn request_restart(&mut self) {
        self.fsm.request_restart();
    }

    pub fn request_shutdown(&mut self) {
        self.fsm.request_shutdown();
    }

    /// Apply an inbound pub/sub broadcast from a peer's local supervisor
    /// (§6.1: TICK and PROCESS messages). A PROCESS message is also routed
    /// to the Commander so an in-flight start/stop plan advances on the
    /// same event that updated the model (§4.7 point 4).
    pub async fn handle_pubsub(&mut self, message: PubSubMessage, now_ms: u64) {
        let namespec = match message {
            PubSubMessage::Tick(event) => {
                self.ctx.on_tick_event(event, now_ms);
                None
            }
            PubSubMessage::Process(event) => {
                let namespec = Namespec::from_parts(&event.application_name, &event.process_name);
                self.ctx.on_process_event(event);
                Some(namespec)
            }
            PubSubMessage::Statistics(_) => {
                // Statistics are opaque to the core (§2); nothing to apply.
                None
            }
        };
        if let Some(namespec) = namespec {
            self.commander.on_event(&mut self.ctx, &namespec, now_ms).await;
        }
        for event in self.ctx.take_events() {
            tracing::debug!(event = %event.log_summary(), "model event");
        }
    }

    /// Serve one inbound RPC (§6). Read-only requests are answered directly
    /// from `ctx`; `StartProcess`/`StopProcess` run against this address's
    /// local supervisor (see [`Self::execute_start`]) and are rejected only
    /// while still in INITIALIZATION (§7 state-guard taxonomy).
    pub async fn handle_rpc(&mut self, request: RpcRequest, now_ms: u64) -> RpcResponse {
        match request {
            RpcRequest::GetAllAddressesInfo => {
                let addresses = self
                    .ctx
                    .addresses()
                    .values()
                    .map(|status| AddressInfo {
                        name: status.name.clone(),
                        state: status.state_string().to_string(),
                        loading: status.loading,
                    })
                    .collect();
                RpcResponse::AddressesInfo { addresses }
            }
            RpcRequest::GetMasterAddress => RpcResponse::MasterAddress {
                address: self.ctx.master_address().cloned(),
            },
            RpcRequest::CheckAddress => RpcResponse::Authorized { authorized: true },
            RpcRequest::StartProcess { namespec, extra_args } => match self.guard_accepting_commands() {
                Ok(()) => {
                    self.record_request(&namespec, now_ms);
                    self.execute_start(&namespec, &extra_args, now_ms).await;
                    RpcResponse::Ack
                }
                Err(fault) => to_response(fault),
            },
            RpcRequest::StopProcess { namespec } => match self.guard_accepting_commands() {
                Ok(()) => {
                    self.execute_stop(&namespec, now_ms).await;
                    RpcResponse::Ack
                }
                Err(fault) => to_response(fault),
            },
            RpcRequest::Restart => {
                self.fsm.request_restart();
                RpcResponse::Ack
            }
            RpcRequest::Shutdown => {
                self.fsm.request_shutdown();
                RpcResponse::Ack
            }
        }
    }

    /// Start/stop commands only make sense once the fleet has a model to
    /// act on; INITIALIZATION is the one state that rejects them outright
    /// (§7: "start_application during INITIALIZATION" fails with
    /// `BAD_SUPVISORS_STATE`). Every other state is an address that may
    /// legitimately be told by the master to start or stop a locally-owned
    /// process (this handler executes on the *receiving* address, not the
    /// master — see [`Self::execute_start`]).
    fn guard_accepting_commands(&self) -> Result<(), SupvisorsFault> {
        if self.fsm.state() == FsmState::Initialization {
            return Err(SupvisorsFault::new(
                supvisors_core::FaultCode::BadSupvisorsState,
                format!("fleet is still in {}, not ready to start or stop processes", self.fsm.state().label()),
            ));
        }
        Ok(())
    }

    /// Record the request time so the process shows up in `current_jobs`
    /// bookkeeping even before the peer's first PROCESS event arrives.
    fn record_request(&mut self, namespec: &Namespec, now_ms: u64) {
        if let Some(process) = self.ctx.process_mut(namespec) {
            process.request_time = now_ms;
        }
    }

    /// Execute a start the master dispatched to this address (§6: RPC
    /// `start_process(address, namespec, extra_args)` targets the address
    /// that must actually run the process). Out-of-scope local supervisors
    /// report `None` for a namespec they don't manage; that is not a fault,
    /// it is surfaced as a synthetic UNKNOWN event so every peer observes
    /// the same outcome (§9).
    async fn execute_start(&mut self, namespec: &Namespec, extra_args: &str, now_ms: u64) {
        let report = self.supervisor.start(namespec, extra_args).await;
        self.apply_local_report(namespec, report, now_ms).await;
    }

    /// Mirror of [`Self::execute_start`] for stops.
    async fn execute_stop(&mut self, namespec: &Namespec, now_ms: u64) {
        let report = self.supervisor.stop(namespec).await;
        self.apply_local_report(namespec, report, now_ms).await;
    }

    async fn apply_local_report(&mut self, namespec: &Namespec, report: Option<crate::supervisor::LocalProcessReport>, now_ms: u64) {
        let (application_name, process_name) = namespec.split();
        let event = match report {
            Some(report) => ProcessEvent {
                address: self.local.clone(),
                application_name: application_name.to_string(),
                process_name: process_name.to_string(),
                state: report.state,
                start: now_ms,
                stop: 0,
                now: now_ms,
                pid: report.pid,
                description: report.description,
                spawnerr: report.spawnerr,
                expected: report.expected,
            },
            None => ProcessEvent {
                address: self.local.clone(),
                application_name: application_name.to_string(),
                process_name: process_name.to_string(),
                state: ProcessState::Unknown,
                start: 0,
                stop: 0,
                now: now_ms,
                pid: 0,
                description: String::new(),
                spawnerr: "not locally configured".to_string(),
                expected: true,
            },
        };

        self.ctx.on_process_event(event.clone());
        self.commander.on_event(&mut self.ctx, namespec, now_ms).await;
        if let Err(err) = self.transport.publish(PubSubMessage::Process(event)).await {
            tracing::warn!(%err, "failed to publish local process event");
        }
    }
}

/// Default SILENT threshold (§3 Address: "default 10 s").
const DEFAULT_INACTIVITY_MS: u64 = 10_000;

fn to_response(fault: SupvisorsFault) -> RpcResponse {
    RpcResponse::Fault {
        code: fault.code.rpc_code(),
        message: fault.message,
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
