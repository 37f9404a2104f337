// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn addrs() -> Vec<String> {
    vec!["a".into(), "b".into(), "c".into()]
}

#[test]
fn mapper_resolves_via_first_matching_candidate() {
    let mapper = AddressMapper::new(addrs(), &["unknown-host".into(), "b".into()]).unwrap();
    assert_eq!(mapper.local_address().as_str(), "b");
    assert_eq!(mapper.rank_of("b"), Some(1));
}

#[test]
fn mapper_fails_fatally_when_host_not_configured() {
    let err = AddressMapper::new(addrs(), &["nowhere".into()]).unwrap_err();
    assert!(matches!(err, MapperError::LocalAddressNotFound { .. }));
}

#[test]
fn mapper_filter_preserves_configured_order_not_input_order() {
    let mapper = AddressMapper::new(addrs(), &["a".into()]).unwrap();
    let filtered = mapper.filter(&["c".into(), "a".into()]);
    assert_eq!(
        filtered.iter().map(|a| a.as_str()).collect::<Vec<_>>(),
        vec!["a", "c"]
    );
}

#[test]
fn local_address_status_is_running_from_construction() {
    let status = AddressStatus::new_local(AddressName::new("a"), 1000);
    assert!(status.is_running());
    assert!(status.checked);
}

#[yare::parameterized(
    unknown_to_checking = { AddressState::Unknown, AddressState::Checking },
    checking_to_running  = { AddressState::Checking, AddressState::Running },
    silent_to_running    = { AddressState::Silent, AddressState::Running },
)]
fn update_remote_time_transitions(start: AddressState, expected: AddressState) {
    let mut status = AddressStatus::new(AddressName::new("a"));
    status.state = start;
    status.update_remote_time(5, 5);
    assert_eq!(status.state, expected);
}

#[test]
fn running_address_unaffected_by_heartbeat_state_wise() {
    let mut status = AddressStatus::new(AddressName::new("a"));
    status.state = AddressState::Running;
    status.update_remote_time(10, 10);
    assert_eq!(status.state, AddressState::Running);
    assert_eq!(status.remote_time, 10);
}

#[test]
fn isolation_is_terminal_and_advances_one_step_per_call() {
    let mut status = AddressStatus::new(AddressName::new("a"));
    status.state = AddressState::Silent;
    assert!(status.advance_isolation());
    assert_eq!(status.state, AddressState::Isolating);
    assert!(status.in_isolation());

    assert!(status.advance_isolation());
    assert_eq!(status.state, AddressState::Isolated);

    // Terminal: further advances are no-ops.
    assert!(!status.advance_isolation());
    assert_eq!(status.state, AddressState::Isolated);
}

#[test]
fn mark_silent_is_noop_once_isolated() {
    let mut status = AddressStatus::new(AddressName::new("a"));
    status.state = AddressState::Isolated;
    status.mark_silent();
    assert_eq!(status.state, AddressState::Isolated);
}

#[test]
fn remaining_capacity_saturates_at_zero() {
    let mut status = AddressStatus::new(AddressName::new("a"));
    status.loading = 100;
    assert_eq!(status.remaining_capacity(), 0);
}
