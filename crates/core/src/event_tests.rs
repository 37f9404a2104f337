// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn model_event_serializes_with_tagged_type_field() {
    let evt = ModelEvent::ProcessStateChanged {
        namespec: Namespec::from_parts("web", "nginx"),
        state: ProcessState::Running,
    };
    let json = serde_json::to_value(&evt).unwrap();
    assert_eq!(json["type"], "process:state_changed");
    assert_eq!(json["state"], "RUNNING");
}

#[test]
fn log_summary_names_the_affected_entity() {
    let evt = ModelEvent::ProcessConflict {
        namespec: Namespec::from_parts("web", "nginx"),
    };
    assert_eq!(evt.log_summary(), "process:conflict namespec=web:nginx");
}

#[test]
fn tick_event_round_trips_through_json() {
    let tick = TickEvent {
        address: AddressName::new("node-a"),
        remote_time: 42,
        loading: 10,
    };
    let json = serde_json::to_string(&tick).unwrap();
    let back: TickEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(tick, back);
}
