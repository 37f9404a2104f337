// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so liveness/timeout scenarios are deterministic in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of time for the fleet engine.
///
/// The FSM and Commander only ever read time through this trait, never
/// `Instant::now()`/`SystemTime::now()` directly, so that the 5s/10s/15s
/// timeouts in the spec can be driven by a [`FakeClock`] in tests.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant, used for timeout/deadline arithmetic.
    fn now(&self) -> Instant;

    /// Wall-clock epoch milliseconds, used for tick/heartbeat timestamps
    /// that are exchanged with peers (and so cannot be `Instant`, which is
    /// not comparable across processes).
    fn epoch_ms(&self) -> u64;
}

/// Production clock backed by the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Deterministic, advanceable clock for tests.
///
/// `now()` and `epoch_ms()` are derived from the same internal offset, so
/// advancing the clock moves both in lockstep.
#[derive(Debug, Clone)]
pub struct FakeClock {
    epoch: std::sync::Arc<AtomicU64>,
    base: Instant,
}

impl FakeClock {
    /// Start the fake clock at the given epoch milliseconds.
    pub fn new(start_epoch_ms: u64) -> Self {
        Self {
            epoch: std::sync::Arc::new(AtomicU64::new(start_epoch_ms)),
            base: Instant::now(),
        }
    }

    /// Advance the clock by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.epoch
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        let elapsed_ms = self.epoch.load(Ordering::SeqCst);
        self.base + Duration::from_millis(elapsed_ms)
    }

    fn epoch_ms(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
