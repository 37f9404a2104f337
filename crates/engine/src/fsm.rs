// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fleet-level state machine (§4.8): synchronization, master election,
//! deployment, steady-state operation, conciliation, and shutdown.

use crate::commander::Commander;
use supvisors_core::{AddressName, AddressState, Clock, Context};
use supvisors_strategy::ConciliationStrategy;

/// States and transitions per §4.8. Every node runs this machine so
/// failover on master loss is immediate; only the master's `Commander`
/// calls are active, non-masters observe the same transitions passively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmState {
    Initialization,
    Deployment,
    Operation,
    Conciliation,
    Restarting,
    ShuttingDown,
    Shutdown,
}

impl FsmState {
    pub fn label(self) -> &'static str {
        match self {
            FsmState::Initialization => "INITIALIZATION",
            FsmState::Deployment => "DEPLOYMENT",
            FsmState::Operation => "OPERATION",
            FsmState::Conciliation => "CONCILIATION",
            FsmState::Restarting => "RESTARTING",
            FsmState::ShuttingDown => "SHUTTING_DOWN",
            FsmState::Shutdown => "SHUTDOWN",
        }
    }
}

impl std::fmt::Display for FsmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// What should happen to the supervisor process once every application is
/// stopped in RESTARTING/SHUTTING_DOWN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TerminalIntent {
    Restart,
    Shutdown,
}

/// Fleet-level coordinator. Wraps one [`Commander`] and tracks
/// synchronization deadlines and the local node's own identity.
pub struct Fsm<C: Clock> {
    state: FsmState,
    local: AddressName,
    address_list: Vec<AddressName>,
    synchro_timeout_ms: u64,
    synchro_deadline_ms: u64,
    inactivity_ms: u64,
    auto_fence: bool,
    conciliation_strategy: ConciliationStrategy,
    terminal_intent: Option<TerminalIntent>,
    clock: C,
}

impl<C: Clock> Fsm<C> {
    /// `synchro_timeout_ms`/`inactivity_ms` come from the loaded
    /// configuration (§6); `now_ms` is the epoch at which INITIALIZATION
    /// begins, used to compute the absolute synchro deadline.
    pub fn new(
        local: AddressName,
        address_list: Vec<AddressName>,
        synchro_timeout_ms: u64,
        inactivity_ms: u64,
        auto_fence: bool,
        conciliation_strategy: ConciliationStrategy,
        clock: C,
        now_ms: u64,
    ) -> Self {
        Self {
            state: FsmState::Initialization,
            local,
            address_list,
            synchro_timeout_ms,
            synchro_deadline_ms: now_ms + synchro_timeout_ms,
            inactivity_ms,
            auto_fence,
            conciliation_strategy,
            terminal_intent: None,
            clock,
        }
    }

    pub fn state(&self) -> FsmState {
        self.state
    }

    /// The RUNNING address with the smallest `address_list` rank, or none
    /// (§8 invariant 6).
    fn elect_master(&self, ctx: &Context) -> Option<AddressName> {
        self.address_list
            .iter()
            .find(|a| ctx.addresses().get(*a).map(|s| s.state == AddressState::Running).unwrap_or(false))
            .cloned()
    }

    fn is_master(&self, ctx: &Context) -> bool {
        ctx.master_address() == Some(&self.local)
    }

    /// Drive one scheduler tick. Applies liveness checks unconditionally,
    /// then dispatches to the current state's handler. `commander` is only
    /// actually driven when the local node is master; every node still
    /// re-elects and observes conflicts so failover is immediate.
    pub async fn tick(&mut self, ctx: &mut Context, commander: &mut Commander) {
        let now_ms = self.clock.epoch_ms();
        ctx.check_liveness(now_ms, self.inactivity_ms, self.auto_fence, &self.local);

        match self.state {
            FsmState::Initialization => self.tick_initialization(ctx, now_ms),
            FsmState::Deployment => self.tick_deployment(ctx, commander, now_ms).await,
            FsmState::Operation => self.tick_operation(ctx, commander, now_ms).await,
            FsmState::Conciliation => self.tick_conciliation(ctx, commander, now_ms).await,
            FsmState::Restarting | FsmState::ShuttingDown => self.tick_terminal(ctx, commander, now_ms).await,
            FsmState::Shutdown => {}
        }
    }

    /// Request a fleet-wide restart or shutdown once every application has
    /// stopped (§4.8 RESTARTING/SHUTTING_DOWN). Idempotent; re-requesting a
    /// shutdown while already restarting does not downgrade it.
    pub fn request_restart(&mut self) {
        if self.state != FsmState::Shutdown {
            self.terminal_intent = Some(TerminalIntent::Restart);
            self.state = FsmState::Restarting;
        }
    }

    pub fn request_shutdown(&mut self) {
        if self.state != FsmState::Shutdown {
            self.terminal_intent = Some(TerminalIntent::Shutdown);
            self.state = FsmState::ShuttingDown;
        }
    }

    fn tick_initialization(&mut self, ctx: &mut Context, now_ms: u64) {
        let all_running = self
            .address_list
            .iter()
            .all(|a| ctx.addresses().get(a).map(|s| s.state == AddressState::Running).unwrap_or(false));

        if all_running || now_ms >= self.synchro_deadline_ms {
            if !all_running {
                ctx.end_synchro();
            }
            if let Some(master) = self.elect_master(ctx) {
                tracing::info!(%master, "master elected, entering DEPLOYMENT");
                ctx.set_master_address(Some(master));
                self.state = FsmState::Deployment;
            }
            // No RUNNING address at all: stay in INITIALIZATION and retry
            // next tick (e.g. the local node itself is still coming up).
        }
    }

    async fn tick_deployment(&mut self, ctx: &mut Context, commander: &mut Commander, now_ms: u64) {
        if self.is_master(ctx) && !commander.in_progress() {
            commander.start_applications(ctx, now_ms).await;
        }
        if !commander.in_progress() {
            tracing::info!("deployment complete, entering OPERATION");
            self.state = FsmState::Operation;
        }
    }

    async fn tick_operation(&mut self, ctx: &mut Context, commander: &mut Commander, now_ms: u64) {
        if self.is_master(ctx) {
            commander.check_timeouts(ctx, now_ms).await;
        }

        let master_lost = match ctx.master_address() {
            Some(master) => !ctx.address_status(master).map(|s| s.is_running()).unwrap_or(false),
            None => false,
        };
        if master_lost {
            tracing::warn!("master lost, returning to INITIALIZATION");
            ctx.set_master_address(None);
            self.state = FsmState::Initialization;
            self.synchro_deadline_ms = now_ms + self.synchro_timeout_ms;
            return;
        }

        if !ctx.conflicts().is_empty() {
            tracing::info!(count = ctx.conflicts().len(), "conflicts detected, entering CONCILIATION");
            self.state = FsmState::Conciliation;
        }
    }

    async fn tick_conciliation(&mut self, ctx: &mut Context, commander: &mut Commander, now_ms: u64) {
        if self.is_master(ctx) {
            commander.conciliate(ctx, self.conciliation_strategy, now_ms).await;
        }
        if ctx.conflicts().is_empty() {
            tracing::info!("conflicts resolved, returning to OPERATION");
            self.state = FsmState::Operation;
        }
    }

    async fn tick_terminal(&mut self, ctx: &mut Context, commander: &mut Commander, now_ms: u64) {
        if self.is_master(ctx) && !commander.in_progress() {
            commander.stop_applications(ctx, now_ms).await;
        }
        if commander.in_progress() {
            return;
        }

        match self.terminal_intent {
            Some(TerminalIntent::Restart) => tracing::info!("all applications stopped, restart requested"),
            Some(TerminalIntent::Shutdown) => tracing::info!("all applications stopped, shutdown requested"),
            None => {}
        }
        self.state = FsmState::Shutdown;
    }
}

#[cfg(test)]
#[path = "fsm_tests.rs"]
mod tests;
