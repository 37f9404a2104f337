// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::commander::Commander;
use std::sync::Arc;
use supvisors_core::{Context, FakeClock};
use supvisors_strategy::StartingStrategy;
use supvisors_transport::FakePeerTransport;

fn addrs() -> Vec<AddressName> {
    vec![AddressName::new("a"), AddressName::new("b"), AddressName::new("c")]
}

fn fsm_and_commander(local: &str) -> (Fsm<FakeClock>, Commander, Context) {
    let clock = FakeClock::new(0);
    let ctx = Context::new(&addrs(), &AddressName::new(local), 0);
    let fsm = Fsm::new(
        AddressName::new(local),
        addrs(),
        15_000,
        10_000,
        false,
        ConciliationStrategy::Senicide,
        clock.clone(),
        0,
    );
    let commander = Commander::new(addrs(), StartingStrategy::Config, Arc::new(FakePeerTransport::new()));
    (fsm, commander, ctx)
}

fn tick_peer(ctx: &mut Context, addr: &str, remote_time: u64, local_time: u64) {
    ctx.on_tick_event(
        supvisors_core::TickEvent {
            address: AddressName::new(addr),
            remote_time,
            loading: 0,
        },
        local_time,
    );
}

#[tokio::test]
async fn three_node_sync_elects_lowest_ranked_address_as_master() {
    let (mut fsm, mut commander, mut ctx) = fsm_and_commander("a");
    tick_peer(&mut ctx, "b", 1, 1);
    tick_peer(&mut ctx, "b", 2, 2);
    tick_peer(&mut ctx, "c", 1, 1);
    tick_peer(&mut ctx, "c", 2, 2);
    ctx.take_events();

    fsm.tick(&mut ctx, &mut commander).await;

    assert_eq!(fsm.state(), FsmState::Deployment);
    assert_eq!(ctx.master_address(), Some(&AddressName::new("a")));
}

#[tokio::test]
async fn deployment_starts_applications_then_advances_to_operation_once_idle() {
    let (mut fsm, mut commander, mut ctx) = fsm_and_commander("a");
    tick_peer(&mut ctx, "b", 1, 1);
    tick_peer(&mut ctx, "b", 2, 2);
    tick_peer(&mut ctx, "c", 1, 1);
    tick_peer(&mut ctx, "c", 2, 2);
    ctx.take_events();
    fsm.tick(&mut ctx, &mut commander).await;
    assert_eq!(fsm.state(), FsmState::Deployment);

    // No declared applications: the Starter has nothing to do, so a second
    // tick finds it idle immediately.
    fsm.tick(&mut ctx, &mut commander).await;
    assert_eq!(fsm.state(), FsmState::Operation);
}

#[tokio::test]
async fn operation_detects_conflict_and_enters_conciliation() {
    let (mut fsm, mut commander, mut ctx) = fsm_and_commander("a");
    tick_peer(&mut ctx, "b", 1, 1);
    tick_peer(&mut ctx, "b", 2, 2);
    tick_peer(&mut ctx, "c", 1, 1);
    tick_peer(&mut ctx, "c", 2, 2);
    ctx.take_events();
    fsm.tick(&mut ctx, &mut commander).await;
    fsm.tick(&mut ctx, &mut commander).await;
    assert_eq!(fsm.state(), FsmState::Operation);

    ctx.on_process_event(supvisors_core::ProcessEvent {
        address: AddressName::new("b"),
        application_name: "web".into(),
        process_name: "nginx".into(),
        state: supvisors_core::ProcessState::Running,
        start: 10,
        stop: 0,
        now: 10,
        pid: 1,
        description: String::new(),
        spawnerr: String::new(),
        expected: true,
    });
    ctx.on_process_event(supvisors_core::ProcessEvent {
        address: AddressName::new("c"),
        application_name: "web".into(),
        process_name: "nginx".into(),
        state: supvisors_core::ProcessState::Running,
        start: 20,
        stop: 0,
        now: 20,
        pid: 1,
        description: String::new(),
        spawnerr: String::new(),
        expected: true,
    });
    ctx.take_events();

    fsm.tick(&mut ctx, &mut commander).await;
    assert_eq!(fsm.state(), FsmState::Conciliation);
}

#[tokio::test]
async fn auto_fence_promotes_master_loss_back_to_initialization() {
    let clock = FakeClock::new(0);
    let mut ctx = Context::new(&addrs(), &AddressName::new("b"), 0);
    tick_peer(&mut ctx, "a", 1, 1);
    tick_peer(&mut ctx, "a", 2, 2);
    ctx.take_events();

    let mut fsm = Fsm::new(AddressName::new("b"), addrs(), 15_000, 10_000, true, ConciliationStrategy::Senicide, clock.clone(), 0);
    let mut commander = Commander::new(addrs(), StartingStrategy::Config, Arc::new(FakePeerTransport::new()));

    fsm.tick(&mut ctx, &mut commander).await;
    assert_eq!(ctx.master_address(), Some(&AddressName::new("a")));
    assert_eq!(fsm.state(), FsmState::Deployment);
    fsm.tick(&mut ctx, &mut commander).await;
    assert_eq!(fsm.state(), FsmState::Operation);

    // A stops ticking; advance well past inactivity + auto-fence.
    clock.advance(std::time::Duration::from_millis(11_000));
    fsm.tick(&mut ctx, &mut commander).await;
    assert_eq!(fsm.state(), FsmState::Initialization);
    assert_eq!(ctx.master_address(), None);
}

#[tokio::test]
async fn request_shutdown_stops_applications_then_reaches_shutdown() {
    let (mut fsm, mut commander, mut ctx) = fsm_and_commander("a");
    tick_peer(&mut ctx, "b", 1, 1);
    tick_peer(&mut ctx, "b", 2, 2);
    tick_peer(&mut ctx, "c", 1, 1);
    tick_peer(&mut ctx, "c", 2, 2);
    ctx.take_events();
    fsm.tick(&mut ctx, &mut commander).await;
    fsm.tick(&mut ctx, &mut commander).await;
    assert_eq!(fsm.state(), FsmState::Operation);

    fsm.request_shutdown();
    assert_eq!(fsm.state(), FsmState::ShuttingDown);
    fsm.tick(&mut ctx, &mut commander).await;
    assert_eq!(fsm.state(), FsmState::Shutdown);
}
