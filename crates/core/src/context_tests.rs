// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::address::AddressState;
use crate::process::ProcessState;

fn three_node_context() -> Context {
    let addrs = vec![AddressName::new("a"), AddressName::new("b"), AddressName::new("c")];
    Context::new(&addrs, &AddressName::new("a"), 1_000)
}

fn tick(address: &str, remote_time: u64) -> TickEvent {
    TickEvent {
        address: AddressName::new(address),
        remote_time,
        loading: 0,
    }
}

fn process_event(address: &str, app: &str, proc: &str, state: ProcessState, now: u64, expected: bool) -> ProcessEvent {
    ProcessEvent {
        address: AddressName::new(address),
        application_name: app.into(),
        process_name: proc.into(),
        state,
        start: now,
        stop: 0,
        now,
        pid: 1,
        description: String::new(),
        spawnerr: String::new(),
        expected,
    }
}

#[test]
fn local_address_starts_running_peers_start_unknown() {
    let ctx = three_node_context();
    assert_eq!(ctx.addresses()[&AddressName::new("a")].state, AddressState::Running);
    assert_eq!(ctx.addresses()[&AddressName::new("b")].state, AddressState::Unknown);
}

#[test]
fn tick_event_transitions_peer_to_running_and_emits_event() {
    let mut ctx = three_node_context();
    ctx.on_tick_event(tick("b", 500), 1_500);
    assert_eq!(ctx.addresses()[&AddressName::new("b")].state, AddressState::Checking);

    ctx.on_tick_event(tick("b", 600), 1_600);
    assert_eq!(ctx.addresses()[&AddressName::new("b")].state, AddressState::Running);

    let events = ctx.take_events();
    assert_eq!(events.len(), 2);
}

#[test]
fn process_event_creates_process_and_application_lazily() {
    let mut ctx = three_node_context();
    ctx.on_process_event(process_event("a", "web", "nginx", ProcessState::Running, 10, true));

    let namespec = Namespec::from_parts("web", "nginx");
    assert!(ctx.processes().contains_key(&namespec));
    assert!(ctx.applications().contains_key("web"));
    assert!(ctx.applications()["web"].running());
}

#[test]
fn conflicts_lists_processes_seen_running_on_two_addresses() {
    let mut ctx = three_node_context();
    ctx.on_process_event(process_event("a", "web", "nginx", ProcessState::Running, 10, true));
    ctx.on_process_event(process_event("b", "web", "nginx", ProcessState::Running, 11, true));

    let conflicts = ctx.conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].namespec().as_str(), "web:nginx");
}

#[test]
fn invalidate_drops_address_from_conflicting_process_and_refreshes_application() {
    let mut ctx = three_node_context();
    ctx.on_process_event(process_event("a", "web", "nginx", ProcessState::Running, 10, true));
    ctx.on_process_event(process_event("b", "web", "nginx", ProcessState::Running, 11, true));
    assert_eq!(ctx.conflicts().len(), 1);

    ctx.invalidate(&AddressName::new("a"));
    assert!(ctx.conflicts().is_empty());
    assert!(ctx.applications()["web"].running());
}

#[test]
fn end_synchro_marks_unknown_addresses_silent() {
    let mut ctx = three_node_context();
    ctx.on_tick_event(tick("b", 500), 1_500);
    ctx.take_events();

    ctx.end_synchro();
    assert_eq!(ctx.addresses()[&AddressName::new("c")].state, AddressState::Silent);
    // b had already left UNKNOWN via its tick, so it is untouched.
    assert_eq!(ctx.addresses()[&AddressName::new("b")].state, AddressState::Checking);
}

#[test]
fn unauthorized_peer_is_isolated_immediately() {
    let mut ctx = three_node_context();
    ctx.on_authorization(AuthorizationEvent {
        address: AddressName::new("b"),
        authorized: false,
    });
    assert_eq!(ctx.addresses()[&AddressName::new("b")].state, AddressState::Isolated);
}

#[test]
fn apply_application_rules_creates_process_and_sets_app_level_sequence() {
    use crate::process_rules::ProcessRules;
    use std::collections::HashMap;

    let mut ctx = three_node_context();
    let mut processes = HashMap::new();
    processes.insert(
        "nginx".to_string(),
        ProcessRules {
            start_sequence: 1,
            required: true,
            ..Default::default()
        },
    );
    ctx.apply_application_rules(&crate::process_rules::ApplicationRules {
        application_name: "web".into(),
        start_sequence: 2,
        stop_sequence: 3,
        starting_failure_strategy: Default::default(),
        running_failure_strategy: Default::default(),
        processes,
    });

    let namespec = Namespec::from_parts("web", "nginx");
    assert!(ctx.processes().contains_key(&namespec));
    assert_eq!(ctx.applications()["web"].app_start_sequence, 2);
    assert_eq!(ctx.applications()["web"].app_stop_sequence, 3);
    assert!(ctx.processes()[&namespec].rules.required);
}

#[test]
fn check_liveness_marks_silent_and_invalidates_processes() {
    let mut ctx = three_node_context();
    ctx.on_tick_event(tick("b", 500), 1_500);
    ctx.on_process_event(process_event("b", "web", "nginx", ProcessState::Running, 10, true));
    ctx.take_events();

    // b's last local_time was 1_500; 1_500 + 10_000 (inactivity) < now.
    ctx.check_liveness(20_000, 10_000, false, &AddressName::new("a"));

    assert_eq!(ctx.addresses()[&AddressName::new("b")].state, AddressState::Silent);
    assert!(ctx.processes()[&Namespec::from_parts("web", "nginx")].addresses().is_empty());
}

#[test]
fn check_liveness_auto_fence_advances_to_isolated_over_two_ticks() {
    let mut ctx = three_node_context();
    ctx.on_tick_event(tick("b", 500), 1_500);
    ctx.take_events();

    ctx.check_liveness(20_000, 10_000, true, &AddressName::new("a"));
    assert_eq!(ctx.addresses()[&AddressName::new("b")].state, AddressState::Silent);

    ctx.check_liveness(20_001, 10_000, true, &AddressName::new("a"));
    assert_eq!(ctx.addresses()[&AddressName::new("b")].state, AddressState::Isolating);

    ctx.check_liveness(20_002, 10_000, true, &AddressName::new("a"));
    assert_eq!(ctx.addresses()[&AddressName::new("b")].state, AddressState::Isolated);
}

#[test]
fn force_process_state_clears_addresses_and_refreshes_application() {
    let mut ctx = three_node_context();
    ctx.on_process_event(process_event("a", "web", "nginx", ProcessState::Starting, 10, true));
    ctx.take_events();

    ctx.force_process_state(
        &Namespec::from_parts("web", "nginx"),
        ProcessState::Fatal,
        "no resource available",
        20,
    );

    let process = ctx.process(&Namespec::from_parts("web", "nginx")).unwrap();
    assert_eq!(process.state, ProcessState::Fatal);
    assert!(process.addresses().is_empty());
    assert_eq!(process.last_reason, "no resource available");
    assert!(ctx.applications()["web"].stopped());
}

#[test]
fn master_address_getter_setter_round_trips() {
    let mut ctx = three_node_context();
    assert!(ctx.master_address().is_none());
    ctx.set_master_address(Some(AddressName::new("a")));
    assert_eq!(ctx.master_address(), Some(&AddressName::new("a")));
}
