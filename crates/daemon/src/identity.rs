// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Candidate host identities fed to [`supvisors_core::AddressMapper`]
//! (§4.1): the `SUPVISORS_NODE_NAME` override, the OS-reported hostname,
//! and any configured aliases, tried in that order.

/// Build the ordered candidate list `AddressMapper::new` resolves against
/// `address_list`. `aliases` are extra names this host is also known by
/// (e.g. a container's service name), lowest priority.
pub fn local_candidates(aliases: &[String]) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Ok(name) = std::env::var("SUPVISORS_NODE_NAME") {
        if !name.is_empty() {
            candidates.push(name);
        }
    }

    if let Ok(hostname) = hostname::get() {
        if let Some(name) = hostname.to_str() {
            candidates.push(name.to_string());
            let lower = name.to_lowercase();
            if lower != name {
                candidates.push(lower);
            }
        }
    }

    candidates.extend(aliases.iter().cloned());
    candidates
}
