// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::process_rules::ProcessRules;

fn info(state: ProcessState, now: u64, expected: bool) -> ProcessInfo {
    ProcessInfo {
        state,
        start: now,
        stop: 0,
        now,
        pid: 1234,
        description: String::new(),
        spawnerr: String::new(),
        expected,
    }
}

fn addr(name: &str) -> AddressName {
    AddressName::new(name)
}

#[test]
fn single_running_address_is_running_and_not_conflicting() {
    let mut p = ProcessStatus::new("web", "nginx", ProcessRules::default());
    p.update_info(addr("a"), info(ProcessState::Running, 10, true));
    assert!(p.running());
    assert!(!p.conflicting());
    assert_eq!(p.addresses().len(), 1);
}

#[test]
fn two_running_addresses_conflict() {
    let mut p = ProcessStatus::new("web", "nginx", ProcessRules::default());
    p.update_info(addr("a"), info(ProcessState::Running, 10, true));
    p.update_info(addr("b"), info(ProcessState::Running, 11, true));
    assert!(p.conflicting());
    assert_eq!(p.addresses().len(), 2);
}

#[test]
fn running_outranks_starting_when_aggregating() {
    let mut p = ProcessStatus::new("web", "nginx", ProcessRules::default());
    p.update_info(addr("a"), info(ProcessState::Starting, 10, true));
    p.update_info(addr("b"), info(ProcessState::Running, 11, true));
    assert_eq!(p.state, ProcessState::Running);
}

#[test]
fn terminal_state_picks_most_recent_by_event_time() {
    let mut p = ProcessStatus::new("web", "nginx", ProcessRules::default());
    p.update_info(addr("a"), info(ProcessState::Stopped, 10, true));
    p.update_info(addr("b"), info(ProcessState::Fatal, 20, false));
    assert_eq!(p.state, ProcessState::Fatal);
    assert!(p.crashed());
    assert!(p.stopped());
}

#[test]
fn unexpected_exit_is_crashed_expected_exit_is_not() {
    let mut p = ProcessStatus::new("web", "nginx", ProcessRules::default());
    p.update_info(addr("a"), info(ProcessState::Exited, 10, false));
    assert!(p.crashed());

    let mut p2 = ProcessStatus::new("web", "nginx", ProcessRules::default());
    p2.update_info(addr("a"), info(ProcessState::Exited, 10, true));
    assert!(!p2.crashed());
}

#[test]
fn invalidate_address_drops_it_from_conflict_and_may_fall_back_to_stopped() {
    let mut p = ProcessStatus::new("web", "nginx", ProcessRules::default());
    p.update_info(addr("a"), info(ProcessState::Running, 10, true));
    p.update_info(addr("b"), info(ProcessState::Running, 11, true));
    assert!(p.conflicting());

    p.invalidate_address(&addr("a"));
    assert!(!p.conflicting());
    assert!(p.running());

    p.invalidate_address(&addr("b"));
    assert!(p.stopped());
    assert!(p.addresses().is_empty());
}

#[test]
fn update_info_is_idempotent_for_duplicate_events() {
    let mut p = ProcessStatus::new("web", "nginx", ProcessRules::default());
    let evt = info(ProcessState::Running, 10, true);
    p.update_info(addr("a"), evt.clone());
    let state_after_first = p.state;
    p.update_info(addr("a"), evt);
    assert_eq!(p.state, state_after_first);
    assert_eq!(p.addresses().len(), 1);
}

#[test]
fn force_state_clears_all_addresses_and_records_reason() {
    let mut p = ProcessStatus::new("web", "nginx", ProcessRules::default());
    p.update_info(addr("a"), info(ProcessState::Running, 10, true));
    p.update_info(addr("b"), info(ProcessState::Running, 11, true));
    assert!(p.conflicting());

    p.force_state(ProcessState::Fatal, "no resource available", 20);
    assert_eq!(p.state, ProcessState::Fatal);
    assert!(p.addresses().is_empty());
    assert!(!p.conflicting());
    assert_eq!(p.last_reason, "no resource available");
}

#[test]
fn namespec_combines_application_and_process_name() {
    let p = ProcessStatus::new("web", "nginx", ProcessRules::default());
    assert_eq!(p.namespec().as_str(), "web:nginx");
}
