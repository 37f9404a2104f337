// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered multi-phase application stop (§4.7), the mirror image of
//! [`super::starter::Starter`]: same nested-plan shape, reverse ordering
//! (stop_sequence, not start_sequence), no placement decision (every
//! currently-running address gets a `StopProcess` call), and no failure
//! strategy consultation (a process refusing to stop is simply forced).

use super::types::{CurrentJobs, PlannedJobs, PlannedSequence};
use std::sync::Arc;
use supvisors_core::{AddressName, Context, Namespec, ProcessState};
use supvisors_transport::{PeerTransport, RpcRequest};

pub use super::starter::OPERATION_TIMEOUT_MS;

/// Drives `planned_sequence` -> `planned_jobs` -> `current_jobs` for
/// application stops.
#[derive(Debug, Default)]
pub struct Stopper {
    planned_sequence: PlannedSequence,
    planned_jobs: PlannedJobs,
    current_jobs: CurrentJobs,
}

impl Stopper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_progress(&self) -> bool {
        !self.planned_sequence.is_empty() || !self.planned_jobs.is_empty() || !self.current_jobs.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn current_jobs(&self) -> &CurrentJobs {
        &self.current_jobs
    }

    /// True while `application_name` still has a tier queued, a group in
    /// flight, or jobs awaiting a terminal event.
    pub fn is_tracking_application(&self, application_name: &str) -> bool {
        self.current_jobs.contains_key(application_name)
            || self.planned_jobs.contains_key(application_name)
            || self.planned_sequence.values().any(|tier| tier.contains_key(application_name))
    }

    /// Build `planned_sequence` from every RUNNING application's
    /// `stop_sequence`, grouped by `app_stop_sequence`, and kick off the
    /// first tier. Applications already STOPPED produce an empty
    /// `stop_sequence` and are skipped.
    pub async fn stop_applications(&mut self, ctx: &mut Context, transport: &Arc<dyn PeerTransport>, now_ms: u64) {
        self.planned_sequence.clear();
        self.planned_jobs.clear();
        self.current_jobs.clear();

        for app in ctx.applications().values() {
            if app.stop_sequence.is_empty() {
                continue;
            }
            self.planned_sequence
                .entry(app.app_stop_sequence)
                .or_default()
                .insert(app.application_name.clone(), app.stop_sequence.clone());
        }

        self.advance(ctx, transport, now_ms).await;
    }

    /// Stop every currently planned application, one process group at a
    /// time, without waiting for the corresponding start plan to finish
    /// (used by the Commander's STOP/RESTART failure follow-up and by
    /// conciliation).
    pub async fn stop_application(&mut self, ctx: &mut Context, application_name: &str, transport: &Arc<dyn PeerTransport>, now_ms: u64) {
        let Some(app) = ctx.application(application_name) else {
            return;
        };
        if app.stop_sequence.is_empty() {
            return;
        }
        self.planned_sequence
            .entry(app.app_stop_sequence)
            .or_default()
            .insert(application_name.to_string(), app.stop_sequence.clone());

        if !self.current_jobs.contains_key(application_name) {
            self.dispatch_next_group(application_name, ctx, transport, now_ms).await;
        }
    }

    /// Stop a single process outright, bypassing the plan entirely (used
    /// for manual operator stop requests and conciliation's per-address
    /// `StopAddresses`).
    pub async fn stop_process(&mut self, ctx: &Context, namespec: &Namespec, transport: &Arc<dyn PeerTransport>) {
        let Some(process) = ctx.process(namespec) else {
            return;
        };
        for address in process.addresses().clone() {
            self.issue_stop(&address, namespec, transport).await;
        }
    }

    /// Stop `namespec` on exactly the given addresses (conciliation's
    /// `StopAddresses`/`Fail` outcomes, which may target a subset).
    pub async fn stop_process_on(&mut self, namespec: &Namespec, addresses: &[AddressName], transport: &Arc<dyn PeerTransport>) {
        for address in addresses {
            self.issue_stop(address, namespec, transport).await;
        }
    }

    /// Per-process sub-state machine, mirroring
    /// [`super::starter::Starter::on_event`]: any terminal state completes
    /// the job and advances the plan.
    pub async fn on_event(&mut self, ctx: &mut Context, namespec: &Namespec, transport: &Arc<dyn PeerTransport>, now_ms: u64) {
        let app_name = namespec.application_name().to_string();
        let in_current = self
            .current_jobs
            .get(&app_name)
            .map(|jobs| jobs.contains(namespec))
            .unwrap_or(false);
        if !in_current {
            return;
        }

        let Some(process) = ctx.process(namespec) else {
            return;
        };
        if process.stopped() {
            self.remove_from_current(&app_name, namespec);
            self.maybe_advance_app(&app_name, ctx, transport, now_ms).await;
        }
    }

    /// §4.7 Bounded-time check: any process in `current_jobs` still
    /// running 5s after `request_time` is force-marked STOPPED.
    pub async fn check_stopping(&mut self, ctx: &mut Context, transport: &Arc<dyn PeerTransport>, now_ms: u64) {
        let mut timed_out = Vec::new();
        for jobs in self.current_jobs.values() {
            for namespec in jobs {
                if let Some(process) = ctx.process(namespec) {
                    if process.request_time > 0 && now_ms.saturating_sub(process.request_time) >= OPERATION_TIMEOUT_MS {
                        timed_out.push(namespec.clone());
                    }
                }
            }
        }

        for namespec in timed_out {
            ctx.force_process_state(
                &namespec,
                ProcessState::Stopped,
                "Still running 5 seconds after stop request",
                now_ms,
            );
            self.on_event(ctx, &namespec, transport, now_ms).await;
        }
    }

    async fn dispatch_next_group(&mut self, app_name: &str, ctx: &mut Context, transport: &Arc<dyn PeerTransport>, now_ms: u64) -> bool {
        loop {
            let group = {
                let Some(groups) = self.planned_jobs.get_mut(app_name) else {
                    return false;
                };
                let Some(order) = groups.keys().next().copied() else {
                    self.planned_jobs.remove(app_name);
                    return false;
                };
                let group = groups.remove(&order).unwrap_or_default();
                if groups.is_empty() {
                    self.planned_jobs.remove(app_name);
                }
                group
            };

            let mut in_flight = Vec::new();
            for namespec in &group {
                if self.dispatch_job(ctx, namespec, transport, now_ms).await {
                    in_flight.push(namespec.clone());
                }
            }
            if !in_flight.is_empty() {
                self.current_jobs.insert(app_name.to_string(), in_flight);
                return true;
            }
            if !self.planned_jobs.contains_key(app_name) {
                return false;
            }
        }
    }

    async fn advance(&mut self, ctx: &mut Context, transport: &Arc<dyn PeerTransport>, now_ms: u64) {
        loop {
            if self.planned_jobs.is_empty() {
                let Some(order) = self.planned_sequence.keys().next().copied() else {
                    return;
                };
                self.planned_jobs = self.planned_sequence.remove(&order).unwrap_or_default();
            }

            let app_names: Vec<String> = self.planned_jobs.keys().cloned().collect();
            let mut any_dispatched = false;
            for app_name in app_names {
                if self.current_jobs.contains_key(&app_name) {
                    continue;
                }
                if self.dispatch_next_group(&app_name, ctx, transport, now_ms).await {
                    any_dispatched = true;
                }
            }

            if any_dispatched || !self.planned_jobs.is_empty() {
                return;
            }
        }
    }

    async fn maybe_advance_app(&mut self, app_name: &str, ctx: &mut Context, transport: &Arc<dyn PeerTransport>, now_ms: u64) {
        let current_empty = self.current_jobs.get(app_name).map(|v| v.is_empty()).unwrap_or(true);
        if !current_empty {
            return;
        }
        self.current_jobs.remove(app_name);

        if self.planned_jobs.contains_key(app_name) {
            self.dispatch_next_group(app_name, ctx, transport, now_ms).await;
            return;
        }

        if self.planned_jobs.is_empty() {
            self.advance(ctx, transport, now_ms).await;
        }
    }

    fn remove_from_current(&mut self, app_name: &str, namespec: &Namespec) {
        if let Some(jobs) = self.current_jobs.get_mut(app_name) {
            jobs.retain(|n| n != namespec);
        }
    }

    /// A process with no address currently reporting it is already
    /// stopped; nothing to dispatch and the job is vacuously "done" for
    /// this group's purposes (the caller's in_flight check treats an empty
    /// dispatch as "nothing to wait for").
    async fn dispatch_job(&mut self, ctx: &mut Context, namespec: &Namespec, transport: &Arc<dyn PeerTransport>, now_ms: u64) -> bool {
        let Some(process) = ctx.process(namespec) else {
            return false;
        };
        let addresses: Vec<AddressName> = process.addresses().iter().cloned().collect();
        if addresses.is_empty() {
            return false;
        }

        if let Some(process) = ctx.process_mut(namespec) {
            process.request_time = now_ms;
        }
        for address in &addresses {
            self.issue_stop(address, namespec, transport).await;
        }
        true
    }

    async fn issue_stop(&self, address: &AddressName, namespec: &Namespec, transport: &Arc<dyn PeerTransport>) {
        let request = RpcRequest::StopProcess { namespec: namespec.clone() };
        if let Err(err) = transport.call(address, request).await {
            tracing::warn!(%namespec, %address, %err, "stop_process RPC failed");
        }
    }
}

#[cfg(test)]
#[path = "stopper_tests.rs"]
mod tests;
