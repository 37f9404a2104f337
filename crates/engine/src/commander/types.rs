// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shapes shared by [`crate::starter::Starter`] and
//! [`crate::stopper::Stopper`]: the three nested plan structures from
//! spec §4.7, and the failure-strategy outcome the Starter reports back to
//! the [`crate::commander::Commander`] facade.

use std::collections::BTreeMap;
use supvisors_core::Namespec;

/// `{app_order: {app_name: {proc_order: [process]}}}` — applications
/// grouped by their application-level order, processes within an
/// application grouped by their process-level order.
pub type PlannedSequence = BTreeMap<i32, BTreeMap<String, BTreeMap<i32, Vec<Namespec>>>>;

/// `{app_name: {proc_order: [process]}}` — the tier currently being
/// processed.
pub type PlannedJobs = BTreeMap<String, BTreeMap<i32, Vec<Namespec>>>;

/// `{app_name: [process]}` — requests in flight awaiting a terminal event.
pub type CurrentJobs = BTreeMap<String, Vec<Namespec>>;

/// What the Commander must do after a required process fails while its
/// application is starting (§4.7 Failure handling). `None` means the
/// Starter already logged and continued; the other two name a follow-up
/// action for the Commander facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// `CONTINUE`: logged, no further action.
    None,
    /// `ABORT`: the application was dropped from the plan; no further
    /// action beyond that.
    Abort,
    /// `STOP`: the application was dropped from the plan, and the
    /// Commander must additionally invoke the Stopper on it.
    Stop,
}

/// `(application_name, action)` returned when a failure requires the
/// Commander facade to act.
pub type FailureOutcome = (String, FailureAction);
