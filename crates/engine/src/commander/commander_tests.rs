// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;
use supvisors_core::{AddressName, ApplicationRules, Context, ProcessRules, StartingFailureStrategy};
use supvisors_strategy::ConciliationStrategy;
use supvisors_transport::FakePeerTransport;

fn three_node_ctx() -> Context {
    let addrs = vec![AddressName::new("a"), AddressName::new("b"), AddressName::new("c")];
    let mut ctx = Context::new(&addrs, &AddressName::new("a"), 0);
    for addr in ["a", "b", "c"] {
        ctx.on_tick_event(
            supvisors_core::TickEvent {
                address: AddressName::new(addr),
                remote_time: 0,
                loading: 0,
            },
            0,
        );
        ctx.on_tick_event(
            supvisors_core::TickEvent {
                address: AddressName::new(addr),
                remote_time: 1,
                loading: 0,
            },
            0,
        );
    }
    ctx.take_events();
    ctx
}

fn commander_with(transport: FakePeerTransport) -> Commander {
    Commander::new(
        vec![AddressName::new("a"), AddressName::new("b"), AddressName::new("c")],
        StartingStrategy::Config,
        Arc::new(transport),
    )
}

fn process_event(address: &str, app: &str, proc: &str, state: supvisors_core::ProcessState, start: u64, now: u64) -> supvisors_core::ProcessEvent {
    supvisors_core::ProcessEvent {
        address: AddressName::new(address),
        application_name: app.into(),
        process_name: proc.into(),
        state,
        start,
        stop: 0,
        now,
        pid: 1,
        description: String::new(),
        spawnerr: String::new(),
        expected: true,
    }
}

#[tokio::test]
async fn starting_failure_stop_strategy_invokes_stopper_through_commander() {
    let mut ctx = three_node_ctx();
    let mut processes = HashMap::new();
    processes.insert(
        "nginx".to_string(),
        ProcessRules {
            start_sequence: 1,
            required: true,
            ..Default::default()
        },
    );
    ctx.apply_application_rules(&ApplicationRules {
        application_name: "web".into(),
        start_sequence: 1,
        stop_sequence: 1,
        starting_failure_strategy: StartingFailureStrategy::Stop,
        running_failure_strategy: Default::default(),
        processes,
    });

    let mut commander = commander_with(FakePeerTransport::new());
    commander.start_applications(&mut ctx, 1_000).await;

    let namespec = Namespec::from_parts("web", "nginx");
    ctx.force_process_state(&namespec, supvisors_core::ProcessState::Fatal, "crashed", 1_100);
    commander.on_event(&mut ctx, &namespec, 1_100).await;

    assert!(!commander.in_progress());
}

#[tokio::test]
async fn conciliation_senicide_keeps_oldest_and_stops_the_rest() {
    let mut ctx = three_node_ctx();
    ctx.on_process_event(process_event("b", "web", "nginx", supvisors_core::ProcessState::Running, 10, 10));
    ctx.on_process_event(process_event("c", "web", "nginx", supvisors_core::ProcessState::Running, 20, 20));
    ctx.take_events();
    assert_eq!(ctx.conflicts().len(), 1);

    let fake = FakePeerTransport::new();
    let mut commander = commander_with(fake.clone());
    commander.conciliate(&mut ctx, ConciliationStrategy::Senicide, 1_000).await;

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        &calls[0],
        supvisors_transport::TransportCall::Call { address, .. } if address == &AddressName::new("c")
    ));
}

#[tokio::test]
async fn restart_process_running_failure_restarts_once_fully_stopped() {
    let mut ctx = three_node_ctx();
    let mut processes = HashMap::new();
    processes.insert(
        "nginx".to_string(),
        ProcessRules {
            running_failure_strategy: supvisors_core::RunningFailureStrategy::RestartProcess,
            required: true,
            ..Default::default()
        },
    );
    ctx.apply_application_rules(&ApplicationRules {
        application_name: "web".into(),
        start_sequence: 0,
        stop_sequence: 0,
        starting_failure_strategy: Default::default(),
        running_failure_strategy: Default::default(),
        processes,
    });
    ctx.on_process_event(process_event("b", "web", "nginx", supvisors_core::ProcessState::Running, 10, 10));
    ctx.on_process_event(process_event("c", "web", "nginx", supvisors_core::ProcessState::Running, 20, 20));
    ctx.take_events();

    let fake = FakePeerTransport::new();
    let mut commander = commander_with(fake.clone());
    commander.conciliate(&mut ctx, ConciliationStrategy::Failure, 1_000).await;

    let namespec = Namespec::from_parts("web", "nginx");
    // Both addresses report STOPPED in response to the conciliator's stop.
    ctx.on_process_event(process_event("b", "web", "nginx", supvisors_core::ProcessState::Stopped, 10, 1_001));
    ctx.take_events();
    commander.on_event(&mut ctx, &namespec, 1_001).await;

    ctx.on_process_event(process_event("c", "web", "nginx", supvisors_core::ProcessState::Stopped, 20, 1_002));
    ctx.take_events();
    commander.on_event(&mut ctx, &namespec, 1_002).await;

    let calls = fake.calls();
    assert!(calls.iter().any(|c| matches!(
        c,
        supvisors_transport::TransportCall::Call { request: supvisors_transport::RpcRequest::StartProcess { .. }, .. }
    )));
}

#[tokio::test]
async fn check_timeouts_force_fatals_stalled_start_through_commander() {
    let mut ctx = three_node_ctx();
    let mut processes = HashMap::new();
    processes.insert(
        "nginx".to_string(),
        ProcessRules {
            start_sequence: 1,
            required: true,
            ..Default::default()
        },
    );
    ctx.apply_application_rules(&ApplicationRules {
        application_name: "web".into(),
        start_sequence: 1,
        stop_sequence: 1,
        starting_failure_strategy: Default::default(),
        running_failure_strategy: Default::default(),
        processes,
    });

    let mut commander = commander_with(FakePeerTransport::new());
    commander.start_applications(&mut ctx, 1_000).await;

    commander.check_timeouts(&mut ctx, 1_000 + OPERATION_TIMEOUT_MS).await;

    let namespec = Namespec::from_parts("web", "nginx");
    assert_eq!(ctx.process(&namespec).unwrap().state, supvisors_core::ProcessState::Fatal);
    assert!(!commander.in_progress());
}
