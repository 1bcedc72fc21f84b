// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use super::Clock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Real-time clock driven by the monotonic `Instant`.
///
/// Readings are `origin + elapsed`, so they never go backwards even if the
/// system time is adjusted. The origin is either the Unix time at
/// construction ([`new`](Self::new)), matching timing objects that stamp
/// vectors in epoch seconds, or zero ([`relative`](Self::relative)), matching
/// page-relative timestamps.
pub struct SoftwareClock {
    anchor: Instant,
    origin_ns: i64,
    description: String,
}

impl SoftwareClock {
    pub fn new() -> Self {
        Self::with_description("Software Clock".to_string())
    }

    pub fn with_description(description: String) -> Self {
        Self {
            anchor: Instant::now(),
            origin_ns: epoch_nanos(),
            description,
        }
    }

    /// Clock reading zero at construction.
    pub fn relative() -> Self {
        Self {
            anchor: Instant::now(),
            origin_ns: 0,
            description: "Relative Software Clock".to_string(),
        }
    }
}

fn epoch_nanos() -> i64 {
    // A system clock set before 1970 anchors at zero.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

impl Default for SoftwareClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SoftwareClock {
    fn now_ns(&self) -> i64 {
        self.origin_ns + self.anchor.elapsed().as_nanos() as i64
    }

    fn description(&self) -> &str {
        &self.description
    }
}
