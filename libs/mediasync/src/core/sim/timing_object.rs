// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;

use super::listeners::Listeners;
use crate::core::clocks::Clock;
use crate::core::endpoints::{
    EndpointError, EndpointResult, SubscriptionId, TimingEvent, TimingListener, TimingObject,
};
use crate::core::sync::{ReadyState, Vector, VectorUpdate};

#[derive(Debug, Default)]
struct Faults {
    update_error: Option<EndpointError>,
    reject_subscribe: Option<TimingEvent>,
}

/// Local timing object whose vector timestamps come from `clock`.
///
/// Starts closed with a stopped vector at position 0.
pub struct SimTimingObject {
    clock: Arc<dyn Clock>,
    vector: Mutex<Vector>,
    ready_state: Mutex<ReadyState>,
    faults: Mutex<Faults>,
    listeners: Listeners<TimingEvent>,
}

impl SimTimingObject {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_secs();
        Self {
            clock,
            vector: Mutex::new(Vector::new(0.0, 0.0, now)),
            ready_state: Mutex::new(ReadyState::Closed),
            faults: Mutex::new(Faults::default()),
            listeners: Listeners::new(),
        }
    }

    /// Start with `position`/`velocity` sampled now.
    pub fn with_motion(self, position: f64, velocity: f64) -> Self {
        let now = self.clock.now_secs();
        *self.vector.lock() = Vector::new(position, velocity, now);
        self
    }

    /// Start open, without emitting `readystatechange`.
    pub fn opened(self) -> Self {
        *self.ready_state.lock() = ReadyState::Open;
        self
    }

    pub fn open(&self) {
        self.set_ready_state(ReadyState::Open);
    }

    pub fn close(&self) {
        self.set_ready_state(ReadyState::Closed);
    }

    /// Transition to `state`, emitting `readystatechange` if it differs.
    pub fn set_ready_state(&self, state: ReadyState) {
        let changed = {
            let mut current = self.ready_state.lock();
            let changed = *current != state;
            *current = state;
            changed
        };
        if changed {
            self.listeners.emit(TimingEvent::ReadyStateChange);
        }
    }

    /// Replace the vector verbatim (no validation) and emit `change`.
    pub fn set_vector(&self, vector: Vector) {
        *self.vector.lock() = vector;
        self.listeners.emit(TimingEvent::Change);
    }

    /// Position extrapolated to the clock's now.
    pub fn position(&self) -> f64 {
        self.vector.lock().extrapolate(self.clock.now_secs())
    }

    pub fn velocity(&self) -> f64 {
        self.vector.lock().velocity
    }

    pub fn listener_count(&self, event: TimingEvent) -> usize {
        self.listeners.count(event)
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.total()
    }

    /// Make `update` fail with `error` until cleared.
    pub fn fail_updates(&self, error: Option<EndpointError>) {
        self.faults.lock().update_error = error;
    }

    /// Refuse subscriptions to `event`.
    pub fn reject_subscriptions(&self, event: Option<TimingEvent>) {
        self.faults.lock().reject_subscribe = event;
    }
}

impl TimingObject for SimTimingObject {
    fn query(&self) -> Vector {
        *self.vector.lock()
    }

    fn ready_state(&self) -> ReadyState {
        *self.ready_state.lock()
    }

    fn update(&self, update: VectorUpdate) -> BoxFuture<'static, EndpointResult<()>> {
        if let Some(error) = self.faults.lock().update_error.clone() {
            return future::ready(Err(error)).boxed();
        }
        if !self.ready_state().is_open() {
            return future::ready(Err(EndpointError::Unavailable(
                "timing object is not open".to_string(),
            )))
            .boxed();
        }

        let now = self.clock.now_secs();
        {
            let mut vector = self.vector.lock();
            let next = update.apply_to(&vector, now);
            *vector = next;
        }
        self.listeners.emit(TimingEvent::Change);
        future::ready(Ok(())).boxed()
    }

    fn subscribe(
        &self,
        event: TimingEvent,
        listener: TimingListener,
    ) -> EndpointResult<SubscriptionId> {
        if self.faults.lock().reject_subscribe == Some(event) {
            return Err(EndpointError::Subscribe(format!(
                "{} listeners not accepted",
                event.name()
            )));
        }
        Ok(self.listeners.add(event, listener))
    }

    fn unsubscribe(&self, event: TimingEvent, id: SubscriptionId) {
        self.listeners.remove(event, id);
    }
}
