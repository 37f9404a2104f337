// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn namespec_round_trips_through_parts() {
    let ns = Namespec::from_parts("web", "nginx");
    assert_eq!(ns.as_str(), "web:nginx");
    assert_eq!(ns.application_name(), "web");
    assert_eq!(ns.process_name(), "nginx");
}

#[test]
fn address_name_compares_as_str() {
    let a = AddressName::new("node-a");
    assert_eq!(a, "node-a");
    assert_eq!(a, *"node-a");
}

#[test]
fn namespec_without_separator_falls_back_instead_of_panicking() {
    let ns: Namespec = "not-a-namespec".into();
    assert_eq!(ns.application_name(), "not-a-namespec");
    assert_eq!(ns.process_name(), "");
}

#[test]
fn address_name_usable_as_hashmap_key_by_borrow() {
    use std::collections::HashMap;
    let mut map: HashMap<AddressName, u32> = HashMap::new();
    map.insert(AddressName::new("node-a"), 1);
    assert_eq!(map.get("node-a"), Some(&1));
}
