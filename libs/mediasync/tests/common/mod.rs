// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// Shared fixtures for the connector integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use mediasync::{
    ConnectorConfig, Diagnostic, EndpointResult, ManualClock, ReadyState, Role, SimPlayer,
    SimTimingObject, SubscriptionId, TimingConnector, TimingEvent, TimingObject, Vector,
    VectorUpdate,
};
use mediasync::core::TimingListener;
use parking_lot::Mutex;

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub player: Arc<SimPlayer>,
    pub timing: Arc<SimTimingObject>,
    pub diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl Harness {
    /// Paused player at 0; timing object with the given motion, open or not.
    pub fn new(position: f64, velocity: f64, open: bool) -> Self {
        let clock = Arc::new(ManualClock::new());
        let timing = SimTimingObject::new(clock.clone()).with_motion(position, velocity);
        let timing = if open { timing.opened() } else { timing };

        Self {
            player: Arc::new(SimPlayer::new(clock.clone())),
            timing: Arc::new(timing),
            clock,
            diagnostics: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn connect(&self, config: ConnectorConfig) -> mediasync::Result<TimingConnector> {
        self.connect_to(self.timing.clone(), config)
    }

    pub fn connect_to(
        &self,
        timing: Arc<dyn TimingObject>,
        config: ConnectorConfig,
    ) -> mediasync::Result<TimingConnector> {
        let diagnostics = self.diagnostics.clone();
        TimingConnector::builder(self.player.clone(), timing)
            .config(config)
            .clock(self.clock.clone())
            .on_diagnostic(move |d| diagnostics.lock().push(d.clone()))
            .connect()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    pub fn failures(&self) -> Vec<Diagnostic> {
        self.diagnostics()
            .into_iter()
            .filter(Diagnostic::is_failure)
            .collect()
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}

/// Role config with periodic drift correction off, so only events drive
/// reconciliation.
pub fn config(role: Role) -> ConnectorConfig {
    ConnectorConfig {
        role,
        drift_correction: false,
        ..ConnectorConfig::default()
    }
}

/// Let the reconciliation task drain its queue.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

/// Timing object wrapper that records every update it is asked to apply.
pub struct RecordingTiming {
    pub inner: Arc<SimTimingObject>,
    pub updates: Mutex<Vec<VectorUpdate>>,
}

impl RecordingTiming {
    pub fn new(inner: Arc<SimTimingObject>) -> Self {
        Self {
            inner,
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn updates(&self) -> Vec<VectorUpdate> {
        self.updates.lock().clone()
    }
}

impl TimingObject for RecordingTiming {
    fn query(&self) -> Vector {
        self.inner.query()
    }

    fn ready_state(&self) -> ReadyState {
        self.inner.ready_state()
    }

    fn update(&self, update: VectorUpdate) -> BoxFuture<'static, EndpointResult<()>> {
        self.updates.lock().push(update);
        self.inner.update(update)
    }

    fn subscribe(
        &self,
        event: TimingEvent,
        listener: TimingListener,
    ) -> EndpointResult<SubscriptionId> {
        self.inner.subscribe(event, listener)
    }

    fn unsubscribe(&self, event: TimingEvent, id: SubscriptionId) {
        self.inner.unsubscribe(event, id)
    }
}
