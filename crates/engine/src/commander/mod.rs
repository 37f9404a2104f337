// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Commander facade (§4.7): owns the Starter and Stopper plans, the
//! conciliator's follow-up bookkeeping, and the single `Arc<dyn
//! PeerTransport>` handle both need. The FSM only ever talks to this type.

mod starter;
mod stopper;
mod types;

pub use starter::{Starter, OPERATION_TIMEOUT_MS};
pub use stopper::Stopper;
pub use types::{CurrentJobs, FailureAction, FailureOutcome, PlannedJobs, PlannedSequence};

use std::collections::HashSet;
use std::sync::Arc;
use supvisors_core::{AddressName, Context, Namespec, RunningFailureStrategy};
use supvisors_strategy::{conciliate, ConciliationOutcome, ConciliationStrategy, StartingStrategy};
use supvisors_transport::PeerTransport;

/// Drives ordered application start/stop and conflict resolution for one
/// node. Only the elected master ever calls the mutating methods; every
/// node may call `in_progress`/inspect state.
pub struct Commander {
    starter: Starter,
    stopper: Stopper,
    address_list: Vec<AddressName>,
    starting_strategy: StartingStrategy,
    transport: Arc<dyn PeerTransport>,
    /// Namespecs mid-conciliation RESTART, or whose running_failure_strategy
    /// was RESTART_PROCESS: re-started once the Stopper reports them fully
    /// down (§4.6 RESTART, §3 running_failure_strategy).
    pending_process_restarts: HashSet<Namespec>,
    /// Application names mid RESTART_APPLICATION, re-started once the
    /// Stopper reports the application fully down.
    pending_application_restarts: HashSet<String>,
}

impl Commander {
    pub fn new(address_list: Vec<AddressName>, starting_strategy: StartingStrategy, transport: Arc<dyn PeerTransport>) -> Self {
        Self {
            starter: Starter::new(),
            stopper: Stopper::new(),
            address_list,
            starting_strategy,
            transport,
            pending_process_restarts: HashSet::new(),
            pending_application_restarts: HashSet::new(),
        }
    }

    /// §8 invariant 4.
    pub fn in_progress(&self) -> bool {
        self.starter.in_progress() || self.stopper.in_progress()
    }

    pub async fn start_applications(&mut self, ctx: &mut Context, now_ms: u64) {
        self.starter
            .start_applications(ctx, &self.address_list, self.starting_strategy, &self.transport, now_ms)
            .await;
    }

    pub async fn start_process(&mut self, ctx: &mut Context, namespec: &Namespec, now_ms: u64) {
        self.starter
            .start_process(ctx, namespec, &self.address_list, self.starting_strategy, &self.transport, now_ms)
            .await;
    }

    pub async fn stop_applications(&mut self, ctx: &mut Context, now_ms: u64) {
        self.stopper.stop_applications(ctx, &self.transport, now_ms).await;
    }

    pub async fn stop_application(&mut self, ctx: &mut Context, application_name: &str, now_ms: u64) {
        self.stopper.stop_application(ctx, application_name, &self.transport, now_ms).await;
    }

    pub async fn stop_process(&mut self, ctx: &Context, namespec: &Namespec) {
        self.stopper.stop_process(ctx, namespec, &self.transport).await;
    }

    /// Dispatch a terminal/intermediate process event to whichever plan is
    /// tracking `namespec`, then apply any follow-up action the starting
    /// failure strategy or a pending restart requires.
    pub async fn on_event(&mut self, ctx: &mut Context, namespec: &Namespec, now_ms: u64) {
        if let Some((app_name, action)) = self
            .starter
            .on_event(ctx, namespec, &self.address_list, self.starting_strategy, &self.transport, now_ms)
            .await
        {
            if action == FailureAction::Stop {
                self.stopper.stop_application(ctx, &app_name, &self.transport, now_ms).await;
            }
        }

        self.stopper.on_event(ctx, namespec, &self.transport, now_ms).await;

        self.maybe_restart(ctx, namespec, now_ms).await;
    }

    /// Periodic bounded-time check for both plans (§4.7, §5).
    pub async fn check_timeouts(&mut self, ctx: &mut Context, now_ms: u64) {
        let timed_out = self
            .starter
            .check_starting(ctx, &self.address_list, self.starting_strategy, &self.transport, now_ms)
            .await;
        for (app_name, action) in timed_out {
            if action == FailureAction::Stop {
                self.stopper.stop_application(ctx, &app_name, &self.transport, now_ms).await;
            }
        }
        self.stopper.check_stopping(ctx, &self.transport, now_ms).await;
    }

    /// Apply `strategy` to every conflicting process (§4.6, CONCILIATION
    /// phase). Returns once every conflict has an outcome dispatched;
    /// actual convergence (conflicts dropping to zero) is observed by the
    /// FSM on the next `Context::conflicts()` check.
    pub async fn conciliate(&mut self, ctx: &mut Context, strategy: ConciliationStrategy, now_ms: u64) {
        let conflicting: Vec<Namespec> = ctx.conflicts().iter().map(|p| p.namespec()).collect();

        for namespec in conflicting {
            let Some(process) = ctx.process(&namespec) else { continue };
            let outcome = conciliate(strategy, process, |addr| process.info(addr).map(|i| i.start).unwrap_or(0));

            match outcome {
                ConciliationOutcome::AwaitUser => {
                    tracing::info!(%namespec, "conciliation strategy USER: awaiting manual resolution");
                }
                ConciliationOutcome::StopAddresses(addresses) => {
                    self.stopper.stop_process_on(&namespec, &addresses, &self.transport).await;
                }
                ConciliationOutcome::StopThenRestart(addresses) => {
                    self.stopper.stop_process_on(&namespec, &addresses, &self.transport).await;
                    self.pending_process_restarts.insert(namespec);
                }
                ConciliationOutcome::Fail { addresses, strategy } => {
                    self.stopper.stop_process_on(&namespec, &addresses, &self.transport).await;
                    self.apply_running_failure(ctx, &namespec, strategy, now_ms).await;
                }
            }
        }
    }

    async fn apply_running_failure(&mut self, ctx: &mut Context, namespec: &Namespec, strategy: RunningFailureStrategy, now_ms: u64) {
        match strategy {
            RunningFailureStrategy::Continue => {
                tracing::warn!(%namespec, "running process failed (CONTINUE)");
            }
            RunningFailureStrategy::RestartProcess => {
                self.pending_process_restarts.insert(namespec.clone());
            }
            RunningFailureStrategy::StopApplication => {
                self.stopper.stop_application(ctx, namespec.application_name(), &self.transport, now_ms).await;
            }
            RunningFailureStrategy::RestartApplication => {
                self.stopper.stop_application(ctx, namespec.application_name(), &self.transport, now_ms).await;
                self.pending_application_restarts.insert(namespec.application_name().to_string());
            }
        }
    }

    /// Once the Stopper has fully released a process/application pending a
    /// restart, re-issue its start.
    async fn maybe_restart(&mut self, ctx: &mut Context, namespec: &Namespec, now_ms: u64) {
        let app_name = namespec.application_name().to_string();

        if self.pending_process_restarts.contains(namespec) {
            let fully_stopped = ctx.process(namespec).map(|p| p.stopped()).unwrap_or(true);
            if fully_stopped {
                self.pending_process_restarts.remove(namespec);
                self.starter
                    .start_process(ctx, namespec, &self.address_list, self.starting_strategy, &self.transport, now_ms)
                    .await;
            }
        }

        if self.pending_application_restarts.contains(&app_name) && !self.stopper.is_tracking_application(&app_name) {
            self.pending_application_restarts.remove(&app_name);
            self.starter
                .start_application(ctx, &app_name, &self.address_list, self.starting_strategy, &self.transport, now_ms)
                .await;
        }
    }
}

#[cfg(test)]
#[path = "commander_tests.rs"]
mod tests;
