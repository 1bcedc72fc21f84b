// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use super::Clock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Clock that only moves when told to.
///
/// Shared between a connector and simulated endpoints (behind an `Arc`) it
/// makes extrapolation and echo-grace expiry fully deterministic.
pub struct ManualClock {
    now_ns: AtomicI64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Duration::ZERO)
    }

    pub fn starting_at(start: Duration) -> Self {
        Self {
            now_ns: AtomicI64::new(start.as_nanos() as i64),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ns
            .fetch_add(by.as_nanos() as i64, Ordering::SeqCst);
    }

    /// Move to an absolute time. Attempts to go backwards are ignored.
    pub fn set(&self, to: Duration) {
        self.now_ns
            .fetch_max(to.as_nanos() as i64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> i64 {
        self.now_ns.load(Ordering::SeqCst)
    }

    fn description(&self) -> &str {
        "Manual Clock"
    }
}
