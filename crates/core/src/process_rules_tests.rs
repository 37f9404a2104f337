// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_rules_are_not_auto_started() {
    let rules = ProcessRules::default();
    assert!(!rules.is_auto_started());
}

#[test]
fn empty_addresses_allows_any_placement() {
    let rules = ProcessRules::default();
    assert!(rules.allows("anywhere"));
}

#[test]
fn nonempty_addresses_restricts_placement() {
    let rules = ProcessRules {
        addresses: vec!["a".into(), "b".into()],
        ..Default::default()
    };
    assert!(rules.allows("a"));
    assert!(!rules.allows("c"));
}

#[test]
fn positive_start_sequence_is_auto_started() {
    let rules = ProcessRules {
        start_sequence: 1,
        ..Default::default()
    };
    assert!(rules.is_auto_started());
}
