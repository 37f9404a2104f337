// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered multi-phase application start (§4.7).

use super::types::{CurrentJobs, FailureAction, FailureOutcome, PlannedJobs, PlannedSequence};
use std::sync::Arc;
use supvisors_core::{AddressName, Context, Namespec, ProcessState, StartingFailureStrategy};
use supvisors_strategy::{choose_address, StartingStrategy};
use supvisors_transport::{PeerTransport, RpcRequest};

/// Bounded-time budget for a single start/stop operation (§5: 5s after
/// `request_time`).
pub const OPERATION_TIMEOUT_MS: u64 = 5_000;

/// Drives `planned_sequence` -> `planned_jobs` -> `current_jobs` for
/// application starts. Holds no reference to `Context`/transport/clock;
/// every method takes what it needs so the struct itself stays trivially
/// testable with a `FakeClock`/`FakePeerTransport`.
#[derive(Debug, Default)]
pub struct Starter {
    planned_sequence: PlannedSequence,
    planned_jobs: PlannedJobs,
    current_jobs: CurrentJobs,
}

impl Starter {
    pub fn new() -> Self {
        Self::default()
    }

    /// §8 invariant 4: empty iff nothing is in progress.
    pub fn in_progress(&self) -> bool {
        !self.planned_sequence.is_empty() || !self.planned_jobs.is_empty() || !self.current_jobs.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn current_jobs(&self) -> &CurrentJobs {
        &self.current_jobs
    }

    #[cfg(test)]
    pub(crate) fn planned_jobs(&self) -> &PlannedJobs {
        &self.planned_jobs
    }

    /// Build `planned_sequence` from every application with a non-empty
    /// per-process `start_sequence`, grouped by the application's own
    /// `app_start_sequence`, then kick off the first tier. Applications
    /// whose only auto-started process sits in bucket 0 produce an empty
    /// `start_sequence` and are silently skipped (§9 Open Question,
    /// preserved from the source).
    pub async fn start_applications(
        &mut self,
        ctx: &mut Context,
        address_list: &[AddressName],
        strategy: StartingStrategy,
        transport: &Arc<dyn PeerTransport>,
        now_ms: u64,
    ) {
        self.planned_sequence.clear();
        self.planned_jobs.clear();
        self.current_jobs.clear();

        for app in ctx.applications().values() {
            if app.start_sequence.is_empty() {
                continue;
            }
            self.planned_sequence
                .entry(app.app_start_sequence)
                .or_default()
                .insert(app.application_name.clone(), app.start_sequence.clone());
        }

        self.advance(ctx, address_list, strategy, transport, now_ms).await;
    }

    /// Single-process start: bypasses `planned_sequence`, goes straight to
    /// `current_jobs`, and sets `ignore_wait_exit` so the caller isn't
    /// held by `wait_exit` (§4.7).
    pub async fn start_process(
        &mut self,
        ctx: &mut Context,
        namespec: &Namespec,
        address_list: &[AddressName],
        strategy: StartingStrategy,
        transport: &Arc<dyn PeerTransport>,
        now_ms: u64,
    ) {
        if let Some(process) = ctx.process_mut(namespec) {
            process.ignore_wait_exit = true;
        }
        let app_name = namespec.application_name().to_string();
        if self.dispatch_job(ctx, namespec, address_list, strategy, transport, now_ms).await {
            self.current_jobs.entry(app_name).or_default().push(namespec.clone());
        }
    }

    /// Per-process sub-state machine (§4.7 point 4), driven by a terminal
    /// or intermediate process event. Returns a [`FailureOutcome`] when a
    /// required-process failure needs the Commander facade to invoke the
    /// Stopper (ABORT/STOP/CONTINUE, §4.7 Failure handling).
    pub async fn on_event(
        &mut self,
        ctx: &mut Context,
        namespec: &Namespec,
        address_list: &[AddressName],
        strategy: StartingStrategy,
        transport: &Arc<dyn PeerTransport>,
        now_ms: u64,
    ) -> Option<FailureOutcome> {
        let app_name = namespec.application_name().to_string();
        let in_current = self
            .current_jobs
            .get(&app_name)
            .map(|jobs| jobs.contains(namespec))
            .unwrap_or(false);

        if !in_current {
            // A namespec absent from current_jobs but whose application
            // still has remaining planned_jobs indicates a late-sequence
            // crash: propagate the failure strategy anyway.
            if self.planned_jobs.contains_key(&app_name) {
                let late_failure = ctx.process(namespec).map(|p| p.crashed() || p.stopped()).unwrap_or(false);
                if late_failure {
                    let outcome = self.process_failure(ctx, namespec, &app_name);
                    self.maybe_advance_app(&app_name, ctx, address_list, strategy, transport, now_ms).await;
                    return outcome;
                }
            }
            return None;
        }

        let Some(process) = ctx.process(namespec) else {
            return None;
        };
        let state = process.state;
        let wait_exit = process.rules.wait_exit && !process.ignore_wait_exit;
        let expected_exit = process.expected_exit;

        let (done, failure_outcome) = match state {
            ProcessState::Starting => (false, None),
            ProcessState::Running => (!wait_exit, None),
            ProcessState::Exited if wait_exit && expected_exit => (true, None),
            ProcessState::Backoff => {
                tracing::warn!(%namespec, "process in BACKOFF while starting");
                (false, None)
            }
            _ => {
                let outcome = self.process_failure(ctx, namespec, &app_name);
                (true, outcome)
            }
        };

        if done {
            self.remove_from_current(&app_name, namespec);
            self.maybe_advance_app(&app_name, ctx, address_list, strategy, transport, now_ms).await;
        }
        failure_outcome
    }

    /// Start one application's planned sequence without touching the rest
    /// of the plan (used by the Commander facade's RESTART_APPLICATION
    /// running-failure follow-up).
    pub async fn start_application(
        &mut self,
        ctx: &mut Context,
        application_name: &str,
        address_list: &[AddressName],
        strategy: StartingStrategy,
        transport: &Arc<dyn PeerTransport>,
        now_ms: u64,
    ) {
        let Some(app) = ctx.application(application_name) else {
            return;
        };
        if app.start_sequence.is_empty() {
            return;
        }
        self.planned_sequence
            .entry(app.app_start_sequence)
            .or_default()
            .insert(application_name.to_string(), app.start_sequence.clone());

        if !self.current_jobs.contains_key(application_name) {
            self.dispatch_next_group(application_name, ctx, address_list, strategy, transport, now_ms).await;
        }
    }

    /// §4.7 Bounded-time check: any process in `current_jobs` still
    /// stopped 5s after `request_time` is force-marked FATAL via a
    /// synthetic event so the sequencer is never blocked.
    pub async fn check_starting(
        &mut self,
        ctx: &mut Context,
        address_list: &[AddressName],
        strategy: StartingStrategy,
        transport: &Arc<dyn PeerTransport>,
        now_ms: u64,
    ) -> Vec<FailureOutcome> {
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

        let mut outcomes = Vec::new();
        for namespec in timed_out {
            ctx.force_process_state(
                &namespec,
                ProcessState::Fatal,
                "Still stopped 5 seconds after start request",
                now_ms,
            );
            if let Some(outcome) = self.on_event(ctx, &namespec, address_list, strategy, transport, now_ms).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Pop and dispatch process-order groups for `app_name`, skipping
    /// groups that fail placement entirely, until one group yields at
    /// least one in-flight job or the application's groups are exhausted
    /// (§4.7 point 3). Returns whether a group ended up in-flight.
    async fn dispatch_next_group(
        &mut self,
        app_name: &str,
        ctx: &mut Context,
        address_list: &[AddressName],
        strategy: StartingStrategy,
        transport: &Arc<dyn PeerTransport>,
        now_ms: u64,
    ) -> bool {
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
                if self.dispatch_job(ctx, namespec, address_list, strategy, transport, now_ms).await {
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

    /// Advance the plan: pop tiers until at least one application in the
    /// tier ends up with an in-flight group, or the whole plan drains.
    async fn advance(
        &mut self,
        ctx: &mut Context,
        address_list: &[AddressName],
        strategy: StartingStrategy,
        transport: &Arc<dyn PeerTransport>,
        now_ms: u64,
    ) {
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
                if self.dispatch_next_group(&app_name, ctx, address_list, strategy, transport, now_ms).await {
                    any_dispatched = true;
                }
            }

            if any_dispatched || !self.planned_jobs.is_empty() {
                return;
            }
            // Every application in this tier failed placement entirely;
            // loop around to the next tier.
        }
    }

    /// Called once an in-flight job for `app_name` completes (success or
    /// failure). Continues the application's remaining process-order
    /// groups, or advances the whole plan to the next tier once every
    /// application in the current tier is done.
    async fn maybe_advance_app(
        &mut self,
        app_name: &str,
        ctx: &mut Context,
        address_list: &[AddressName],
        strategy: StartingStrategy,
        transport: &Arc<dyn PeerTransport>,
        now_ms: u64,
    ) {
        let current_empty = self.current_jobs.get(app_name).map(|v| v.is_empty()).unwrap_or(true);
        if !current_empty {
            return;
        }
        self.current_jobs.remove(app_name);

        if self.planned_jobs.contains_key(app_name) {
            self.dispatch_next_group(app_name, ctx, address_list, strategy, transport, now_ms).await;
            return;
        }

        if self.planned_jobs.is_empty() {
            self.advance(ctx, address_list, strategy, transport, now_ms).await;
        }
    }

    fn remove_from_current(&mut self, app_name: &str, namespec: &Namespec) {
        if let Some(jobs) = self.current_jobs.get_mut(app_name) {
            jobs.retain(|n| n != namespec);
        }
    }

    /// Select an address via the configured strategy and issue
    /// `start_process`; on placement failure, force the process FATAL and
    /// apply its failure strategy immediately. Returns whether the process
    /// is now in flight.
    async fn dispatch_job(
        &mut self,
        ctx: &mut Context,
        namespec: &Namespec,
        address_list: &[AddressName],
        strategy: StartingStrategy,
        transport: &Arc<dyn PeerTransport>,
        now_ms: u64,
    ) -> bool {
        let Some(process) = ctx.process(namespec) else {
            return false;
        };
        let allowed = process.rules.addresses.clone();
        let expected_loading = process.rules.expected_loading;
        let extra_args = process.extra_args.clone();

        let chosen = choose_address(strategy, address_list, |a| ctx.address_status(a), &allowed, expected_loading);

        match chosen {
            Some(address) => {
                if let Some(process) = ctx.process_mut(namespec) {
                    process.request_time = now_ms;
                }
                let request = RpcRequest::StartProcess {
                    namespec: namespec.clone(),
                    extra_args,
                };
                if let Err(err) = transport.call(&address, request).await {
                    tracing::warn!(%namespec, %address, %err, "start_process RPC failed");
                }
                true
            }
            None => {
                ctx.force_process_state(namespec, ProcessState::Fatal, "no resource available", now_ms);
                self.process_failure(ctx, namespec, namespec.application_name());
                false
            }
        }
    }

    /// §4.7 Failure handling: optional processes always CONTINUE; required
    /// processes consult the application's `starting_failure_strategy`.
    fn process_failure(&mut self, ctx: &Context, namespec: &Namespec, app_name: &str) -> Option<FailureOutcome> {
        let process = ctx.process(namespec)?;
        let app = ctx.application(app_name)?;

        if !process.rules.required {
            tracing::info!(%namespec, "optional process failed while starting, continuing");
            return None;
        }

        match app.starting_failure_strategy {
            StartingFailureStrategy::Continue => {
                tracing::warn!(%namespec, "required process failed while starting (CONTINUE)");
                None
            }
            StartingFailureStrategy::Abort => {
                tracing::warn!(%namespec, application = app_name, "required process failed, aborting application start (ABORT)");
                self.abort_application(app_name);
                Some((app_name.to_string(), FailureAction::Abort))
            }
            StartingFailureStrategy::Stop => {
                tracing::warn!(%namespec, application = app_name, "required process failed, stopping application (STOP)");
                self.abort_application(app_name);
                Some((app_name.to_string(), FailureAction::Stop))
            }
        }
    }

    /// Drop every remaining planned group for `app_name` from both
    /// `planned_jobs` and every tier of `planned_sequence`.
    fn abort_application(&mut self, app_name: &str) {
        self.planned_jobs.remove(app_name);
        for tier in self.planned_sequence.values_mut() {
            tier.remove(app_name);
        }
        self.planned_sequence.retain(|_, tier| !tier.is_empty());
    }
}

#[cfg(test)]
#[path = "starter_tests.rs"]
mod tests;
