// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! In-process endpoints driven by a [`Clock`](crate::core::clocks::Clock).
//!
//! Both dispatch events synchronously from inside their mutators, the way a
//! browser media element or a local timing object does, and both support
//! failure injection so the connector's error paths can be exercised.

mod listeners;
mod player;
mod timing_object;

pub use player::SimPlayer;
pub use timing_object::SimTimingObject;
