// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::BTreeMap;
use supvisors_core::AddressState;

fn running(name: &str, loading: u8) -> (AddressName, AddressStatus) {
    let mut s = AddressStatus::new(AddressName::new(name));
    s.state = AddressState::Running;
    s.loading = loading;
    (AddressName::new(name), s)
}

#[test]
fn less_loaded_picks_lowest_loading_with_capacity() {
    let list = vec![AddressName::new("a"), AddressName::new("b")];
    let map: BTreeMap<AddressName, AddressStatus> = vec![running("a", 60), running("b", 30)].into_iter().collect();

    let picked = choose_address(StartingStrategy::LessLoaded, &list, |n| map.get(n), &[], 20);
    assert_eq!(picked, Some(AddressName::new("b")));
}

#[test]
fn config_picks_first_in_declared_order() {
    let list = vec![AddressName::new("a"), AddressName::new("b")];
    let map: BTreeMap<AddressName, AddressStatus> = vec![running("a", 10), running("b", 5)].into_iter().collect();

    let picked = choose_address(StartingStrategy::Config, &list, |n| map.get(n), &[], 20);
    assert_eq!(picked, Some(AddressName::new("a")));
}

#[test]
fn no_candidate_with_enough_capacity_returns_none() {
    let list = vec![AddressName::new("a")];
    let map: BTreeMap<AddressName, AddressStatus> = vec![running("a", 95)].into_iter().collect();

    let picked = choose_address(StartingStrategy::Config, &list, |n| map.get(n), &[], 20);
    assert!(picked.is_none());
}

#[test]
fn allowed_list_restricts_placement() {
    let list = vec![AddressName::new("a"), AddressName::new("b")];
    let map: BTreeMap<AddressName, AddressStatus> = vec![running("a", 10), running("b", 10)].into_iter().collect();

    let picked = choose_address(StartingStrategy::Config, &list, |n| map.get(n), &["b".to_string()], 20);
    assert_eq!(picked, Some(AddressName::new("b")));
}

#[test]
fn most_loaded_packs_onto_fullest_address_with_room() {
    let list = vec![AddressName::new("a"), AddressName::new("b")];
    let map: BTreeMap<AddressName, AddressStatus> = vec![running("a", 40), running("b", 70)].into_iter().collect();

    let picked = choose_address(StartingStrategy::MostLoaded, &list, |n| map.get(n), &[], 20);
    assert_eq!(picked, Some(AddressName::new("b")));
}
