// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Address selection for starting a process under a placement strategy.

use serde::{Deserialize, Serialize};
use supvisors_core::{AddressName, AddressStatus};

/// Placement policy, configured per-fleet and applied by the Starter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartingStrategy {
    /// First RUNNING address in declared order with enough capacity.
    Config,
    /// RUNNING address with the lowest current loading that still fits.
    LessLoaded,
    /// RUNNING address with the highest loading that still fits.
    MostLoaded,
}

/// Pick an address for a process with `expected_loading`, restricted to
/// `allowed` names (empty means "any configured address"), in
/// `address_list` order. Returns `None` if no RUNNING address has enough
/// remaining capacity; the caller must then force the process FATAL.
pub fn choose_address<'a>(
    strategy: StartingStrategy,
    address_list: &[AddressName],
    statuses: impl Fn(&AddressName) -> Option<&'a AddressStatus>,
    allowed: &[String],
    expected_loading: u8,
) -> Option<AddressName> {
    let candidates: Vec<&AddressStatus> = address_list
        .iter()
        .filter(|a| allowed.is_empty() || allowed.iter().any(|n| n == a.as_str()))
        .filter_map(&statuses)
        .filter(|s| s.is_running() && s.remaining_capacity() >= expected_loading)
        .collect();

    match strategy {
        StartingStrategy::Config => candidates.first().map(|s| s.name.clone()),
        StartingStrategy::LessLoaded => candidates.into_iter().min_by_key(|s| s.loading).map(|s| s.name.clone()),
        StartingStrategy::MostLoaded => candidates.into_iter().max_by_key(|s| s.loading).map(|s| s.name.clone()),
    }
}

#[cfg(test)]
#[path = "starting_tests.rs"]
mod tests;
