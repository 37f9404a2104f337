// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances_epoch_and_instant_together() {
    let clock = FakeClock::new(1_000);
    let t0 = clock.now();
    assert_eq!(clock.epoch_ms(), 1_000);

    clock.advance(Duration::from_secs(5));

    assert_eq!(clock.epoch_ms(), 6_000);
    assert_eq!(clock.now() - t0, Duration::from_secs(5));
}

#[test]
fn fake_clock_clones_share_state() {
    let clock = FakeClock::new(0);
    let clone = clock.clone();
    clock.advance(Duration::from_secs(1));
    assert_eq!(clone.epoch_ms(), 1_000);
}
