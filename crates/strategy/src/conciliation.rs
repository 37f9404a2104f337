// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolution policy for processes observed RUNNING on more than one
//! address simultaneously.

use serde::{Deserialize, Serialize};
use supvisors_core::{AddressName, ProcessStatus, RunningFailureStrategy};

/// Policy applied to every conflicting [`ProcessStatus`] while the fleet is
/// in the CONCILIATION state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConciliationStrategy {
    /// Keep the oldest instance, stop the others.
    Senicide,
    /// Keep the newest instance, stop the others.
    Infanticide,
    /// Do nothing; await manual intervention.
    User,
    /// Stop every instance.
    Stop,
    /// Stop every instance, then schedule a fresh start.
    Restart,
    /// Mark the process failed and apply its running_failure_strategy.
    Failure,
}

/// Decision produced by [`conciliate`] for one conflicting process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConciliationOutcome {
    /// Send `stop_process` to these addresses, keeping the rest running.
    StopAddresses(Vec<AddressName>),
    /// Stop every address, then re-issue a fresh start once all are down.
    StopThenRestart(Vec<AddressName>),
    /// No action; the operator must resolve this manually.
    AwaitUser,
    /// Stop every address and apply the process's running failure policy.
    Fail {
        addresses: Vec<AddressName>,
        strategy: RunningFailureStrategy,
    },
}

/// Apply `strategy` to one conflicting process. `started_at` maps an
/// address to the local time its instance was first observed running, used
/// by SENICIDE/INFANTICIDE to pick which instance survives.
pub fn conciliate(
    strategy: ConciliationStrategy,
    process: &ProcessStatus,
    started_at: impl Fn(&AddressName) -> u64,
) -> ConciliationOutcome {
    let addresses: Vec<AddressName> = process.addresses().iter().cloned().collect();

    match strategy {
        ConciliationStrategy::User => ConciliationOutcome::AwaitUser,
        ConciliationStrategy::Stop => ConciliationOutcome::StopAddresses(addresses),
        ConciliationStrategy::Restart => ConciliationOutcome::StopThenRestart(addresses),
        ConciliationStrategy::Failure => ConciliationOutcome::Fail {
            addresses,
            strategy: process.rules.running_failure_strategy,
        },
        ConciliationStrategy::Senicide => {
            ConciliationOutcome::StopAddresses(keep_one(addresses, &started_at, true))
        }
        ConciliationStrategy::Infanticide => {
            ConciliationOutcome::StopAddresses(keep_one(addresses, &started_at, false))
        }
    }
}

/// Drop the surviving address from `addresses`, returning the rest to stop.
/// `keep_oldest` selects SENICIDE (lowest `started_at`) vs INFANTICIDE
/// (highest).
fn keep_one(mut addresses: Vec<AddressName>, started_at: &impl Fn(&AddressName) -> u64, keep_oldest: bool) -> Vec<AddressName> {
    let survivor = addresses
        .iter()
        .cloned()
        .min_by_key(|a| {
            let t = started_at(a);
            if keep_oldest {
                t
            } else {
                u64::MAX - t
            }
        });
    if let Some(survivor) = survivor {
        addresses.retain(|a| a != &survivor);
    }
    addresses
}

#[cfg(test)]
#[path = "conciliation_tests.rs"]
mod tests;
