// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Clock trait - Passive real-time reference for vector extrapolation
//!
//! The connector never owns a wall clock of its own. Every "now" it needs
//! (extrapolating a timing vector, stamping a vector derived from the player,
//! expiring echo expectations) comes from an injected [`Clock`].

use std::time::Duration;

/// Passive clock interface for timing-object synchronization
///
/// ## Design
///
/// - **Passive**: the clock provides `now()`, the connector decides what to do
/// - **No callbacks**: the clock never calls into the connector
/// - **Thread-safe**: all methods can be called from any thread
///
/// ## Implementations
///
/// - `SoftwareClock`: system timestamps
/// - `ManualClock`: explicitly advanced, for tests and simulations
///
/// The timing object must stamp its vectors against the same time base as the
/// clock handed to the connector, otherwise extrapolation is meaningless.
pub trait Clock: Send + Sync {
    /// Current time in nanoseconds.
    ///
    /// Returns time since some arbitrary epoch. Guaranteed to be
    /// monotonically non-decreasing.
    fn now_ns(&self) -> i64;

    /// Current time as Duration (convenience)
    fn now(&self) -> Duration {
        Duration::from_nanos(self.now_ns().max(0) as u64)
    }

    /// Current time in seconds, the unit vectors are stamped in.
    fn now_secs(&self) -> f64 {
        self.now_ns() as f64 / 1_000_000_000.0
    }

    /// Human-readable clock description
    ///
    /// Used for debugging and logging.
    fn description(&self) -> &str;
}
