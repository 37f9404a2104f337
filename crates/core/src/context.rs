// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The authoritative in-memory fleet model: addresses, applications, and
//! processes, mutated only through the event-ingest entry points below.

use crate::address::{AddressState, AddressStatus};
use crate::application::ApplicationStatus;
use crate::event::{AuthorizationEvent, ModelEvent, ProcessEvent, TickEvent};
use crate::id::{AddressName, Namespec};
use crate::process::{ProcessInfo, ProcessStatus};
use crate::process_rules::ApplicationRules;
use std::collections::BTreeMap;

/// Single source of truth for one node's view of the fleet.
///
/// Owns no I/O. Every mutation flows through `on_tick_event`,
/// `on_process_event`, `on_authorization`, or `invalidate`; each call
/// appends to an internal event buffer drained with [`Context::take_events`]
/// so the FSM and any view layer can react without polling.
pub struct Context {
    addresses: BTreeMap<AddressName, AddressStatus>,
    applications: BTreeMap<String, ApplicationStatus>,
    processes: BTreeMap<Namespec, ProcessStatus>,
    master_address: Option<AddressName>,
    events: Vec<ModelEvent>,
}

impl Context {
    /// Build the initial model from the configured address list. The local
    /// address starts RUNNING; every peer starts UNKNOWN.
    pub fn new(address_list: &[AddressName], local: &AddressName, now_ms: u64) -> Self {
        let mut addresses = BTreeMap::new();
        for name in address_list {
            let status = if name == local {
                AddressStatus::new_local(name.clone(), now_ms)
            } else {
                AddressStatus::new(name.clone())
            };
            addresses.insert(name.clone(), status);
        }

        Self {
            addresses,
            applications: BTreeMap::new(),
            processes: BTreeMap::new(),
            master_address: None,
            events: Vec::new(),
        }
    }

    pub fn addresses(&self) -> &BTreeMap<AddressName, AddressStatus> {
        &self.addresses
    }

    pub fn applications(&self) -> &BTreeMap<String, ApplicationStatus> {
        &self.applications
    }

    pub fn processes(&self) -> &BTreeMap<Namespec, ProcessStatus> {
        &self.processes
    }

    pub fn process(&self, namespec: &Namespec) -> Option<&ProcessStatus> {
        self.processes.get(namespec)
    }

    pub fn process_mut(&mut self, namespec: &Namespec) -> Option<&mut ProcessStatus> {
        self.processes.get_mut(namespec)
    }

    pub fn application(&self, name: &str) -> Option<&ApplicationStatus> {
        self.applications.get(name)
    }

    pub fn address_status(&self, name: &AddressName) -> Option<&AddressStatus> {
        self.addresses.get(name)
    }

    pub fn master_address(&self) -> Option<&AddressName> {
        self.master_address.as_ref()
    }

    pub fn set_master_address(&mut self, address: Option<AddressName>) {
        self.master_address = address;
    }

    /// Every process currently observed RUNNING-like on more than one
    /// address (invariant 1).
    pub fn conflicts(&self) -> Vec<&ProcessStatus> {
        self.processes.values().filter(|p| p.conflicting()).collect()
    }

    /// Drain the events published by entity mutations since the last call.
    pub fn take_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.events)
    }

    /// Record a heartbeat from `event.address`.
    pub fn on_tick_event(&mut self, event: TickEvent, local_time: u64) {
        let Some(status) = self.addresses.get_mut(&event.address) else {
            return;
        };
        let before = status.state;
        status.update_remote_time(event.remote_time, local_time);
        status.loading = event.loading;
        if status.state != before {
            self.events.push(ModelEvent::AddressStateChanged {
                address: event.address,
                state: status.state,
            });
        }
    }

    /// Apply a process-state report from one address, creating the
    /// Process/Application entities lazily on first sighting.
    pub fn on_process_event(&mut self, event: ProcessEvent) {
        let namespec = Namespec::from_parts(&event.application_name, &event.process_name);
        let process = self.processes.entry(namespec.clone()).or_insert_with(|| {
            ProcessStatus::new(event.application_name.clone(), event.process_name.clone(), Default::default())
        });

        let state_before = process.state;
        let was_conflicting = process.conflicting();

        process.update_info(
            event.address,
            ProcessInfo {
                state: event.state,
                start: event.start,
                stop: event.stop,
                now: event.now,
                pid: event.pid,
                description: event.description,
                spawnerr: event.spawnerr,
                expected: event.expected,
            },
        );

        if process.state != state_before {
            self.events.push(ModelEvent::ProcessStateChanged {
                namespec: namespec.clone(),
                state: process.state,
            });
        }
        if process.conflicting() && !was_conflicting {
            self.events.push(ModelEvent::ProcessConflict { namespec: namespec.clone() });
        }

        self.refresh_application(&event.application_name);
    }

    /// Apply the outcome of a `check_address` handshake. An unauthorized
    /// peer is isolated immediately rather than allowed to keep ticking.
    pub fn on_authorization(&mut self, event: AuthorizationEvent) {
        let Some(status) = self.addresses.get_mut(&event.address) else {
            return;
        };
        if event.authorized {
            status.checked = true;
            return;
        }
        if status.state != AddressState::Isolated {
            status.mark_silent();
            while status.advance_isolation() {}
        }
        self.events.push(ModelEvent::AddressStateChanged {
            address: event.address,
            state: status.state,
        });
    }

    /// Drop `address` from every process that reports it, recomputing the
    /// affected applications. Used when an address goes SILENT/ISOLATED.
    pub fn invalidate(&mut self, address: &AddressName) {
        let mut touched_applications = Vec::new();
        for process in self.processes.values_mut() {
            if process.addresses().contains(address) {
                process.invalidate_address(address);
                touched_applications.push(process.application_name.clone());
            }
        }
        touched_applications.sort();
        touched_applications.dedup();
        for app in touched_applications {
            self.refresh_application(&app);
        }
    }

    /// Force a process to a terminal state directly, bypassing per-address
    /// reports, and refresh its application. Used by the Commander's
    /// bounded-time checks and placement failures (§7): the process is
    /// force-marked FATAL/UNKNOWN via a synthetic outcome so the sequencer
    /// is never blocked waiting on an event that will never arrive.
    pub fn force_process_state(&mut self, namespec: &Namespec, state: crate::process::ProcessState, reason: &str, now: u64) {
        let Some(process) = self.processes.get_mut(namespec) else {
            return;
        };
        let application_name = process.application_name.clone();
        process.force_state(state, reason, now);
        self.events.push(ModelEvent::ProcessStateChanged {
            namespec: namespec.clone(),
            state,
        });
        self.refresh_application(&application_name);
    }

    /// Apply declared rules for one application and its processes, parsed
    /// from the rules file at startup (§6). Creates the Process/Application
    /// entities lazily, the same way a process event would, so the
    /// Commander sees the declared `start_sequence`/`stop_sequence` even
    /// before any peer has reported the process running.
    pub fn apply_application_rules(&mut self, rules: &ApplicationRules) {
        for (process_name, proc_rules) in &rules.processes {
            let namespec = Namespec::from_parts(&rules.application_name, process_name);
            let process = self.processes.entry(namespec).or_insert_with(|| {
                ProcessStatus::new(rules.application_name.clone(), process_name.clone(), proc_rules.clone())
            });
            process.rules = proc_rules.clone();
        }

        let app = self
            .applications
            .entry(rules.application_name.clone())
            .or_insert_with(|| ApplicationStatus::new(&rules.application_name));
        app.apply_rules(rules);

        self.refresh_application(&rules.application_name);
    }

    /// Advance per-peer liveness one FSM tick: RUNNING/CHECKING addresses
    /// whose last heartbeat is older than `inactivity_ms` go SILENT; when
    /// `auto_fence` is on, SILENT/ISOLATING addresses advance one step
    /// toward ISOLATED (§4.2). Any address whose state changes has every
    /// process it was reporting invalidated. `local` is never evaluated:
    /// the local node's own liveness isn't driven by heartbeats it sends
    /// itself.
    pub fn check_liveness(&mut self, now_ms: u64, inactivity_ms: u64, auto_fence: bool, local: &AddressName) {
        let mut changed = Vec::new();
        for status in self.addresses.values_mut() {
            if &status.name == local {
                continue;
            }
            let before = status.state;
            if matches!(before, AddressState::Running | AddressState::Checking)
                && now_ms.saturating_sub(status.local_time) > inactivity_ms
            {
                status.mark_silent();
            } else if auto_fence {
                status.advance_isolation();
            }
            if status.state != before {
                changed.push(status.name.clone());
                self.events.push(ModelEvent::AddressStateChanged {
                    address: status.name.clone(),
                    state: status.state,
                });
            }
        }
        for address in changed {
            self.invalidate(&address);
        }
    }

    /// At the end of the synchronization window, any address still UNKNOWN
    /// is considered unreachable.
    pub fn end_synchro(&mut self) {
        for status in self.addresses.values_mut() {
            if status.state == AddressState::Unknown {
                status.mark_silent();
                self.events.push(ModelEvent::AddressStateChanged {
                    address: status.name.clone(),
                    state: status.state,
                });
            }
        }
    }

    fn refresh_application(&mut self, application_name: &str) {
        let process_refs: Vec<&ProcessStatus> = self
            .processes
            .values()
            .filter(|p| p.application_name == application_name)
            .collect();

        let app = self
            .applications
            .entry(application_name.to_string())
            .or_insert_with(|| ApplicationStatus::new(application_name));
        let state_before = app.state;
        app.refresh(&process_refs);
        if app.state != state_before {
            self.events.push(ModelEvent::ApplicationStateChanged {
                application_name: application_name.to_string(),
                state: app.state,
            });
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
