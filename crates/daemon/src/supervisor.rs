// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The local process supervisor seam (§9: "broadcast via synthetic fake
//! events when the local supervisor lacks a process"). Managing actual
//! child processes on this host is out of scope (§1 Non-goals); this trait
//! is the explicit boundary a real supervisor would implement, and the
//! stub below reports everything as absent so the rest of the node can be
//! exercised without one.

use async_trait::async_trait;
use supvisors_core::{Namespec, ProcessState};

/// What a real local supervisor would report back for one managed process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalProcessReport {
    pub state: ProcessState,
    pub pid: u32,
    pub description: String,
    pub spawnerr: String,
    pub expected: bool,
}

/// Host-local process control, kept behind a trait so `supvisors-daemon`
/// never hardcodes one process manager. A namespec absent from the local
/// supervisor is not an error (§7 "unknown process"): the caller publishes
/// a synthetic state event instead of failing the request.
#[async_trait]
pub trait LocalSupervisor: Send + Sync + 'static {
    /// Ask the local supervisor to start `namespec` with `extra_args`.
    /// Returns `None` when the namespec is not locally configured.
    async fn start(&self, namespec: &Namespec, extra_args: &str) -> Option<LocalProcessReport>;

    /// Ask the local supervisor to stop `namespec`.
    /// Returns `None` when the namespec is not locally configured.
    async fn stop(&self, namespec: &Namespec) -> Option<LocalProcessReport>;

    /// Current report for `namespec`, if locally configured.
    async fn status(&self, namespec: &Namespec) -> Option<LocalProcessReport>;
}

/// Minimal supervisor with no managed processes of its own: every call
/// reports the namespec absent, so callers always fall back to the
/// synthetic-event path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSupervisor;

#[async_trait]
impl LocalSupervisor for NullSupervisor {
    async fn start(&self, _namespec: &Namespec, _extra_args: &str) -> Option<LocalProcessReport> {
        None
    }

    async fn stop(&self, _namespec: &Namespec) -> Option<LocalProcessReport> {
        None
    }

    async fn status(&self, _namespec: &Namespec) -> Option<LocalProcessReport> {
        None
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
