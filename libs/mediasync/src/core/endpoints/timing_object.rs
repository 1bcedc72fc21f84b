// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::{EndpointResult, SubscriptionId};
use crate::core::sync::{ReadyState, Vector, VectorUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingEvent {
    /// The vector was updated.
    Change,
    /// The readiness state transitioned.
    ReadyStateChange,
}

impl TimingEvent {
    pub const fn name(self) -> &'static str {
        match self {
            TimingEvent::Change => "change",
            TimingEvent::ReadyStateChange => "readystatechange",
        }
    }
}

pub type TimingListener = Arc<dyn Fn(TimingEvent) + Send + Sync>;

/// Authoritative timing source.
pub trait TimingObject: Send + Sync {
    /// Current vector, as last sampled.
    fn query(&self) -> Vector;

    fn ready_state(&self) -> ReadyState;

    /// Merge `update` into the vector and republish it (emits `Change`).
    fn update(&self, update: VectorUpdate) -> BoxFuture<'static, EndpointResult<()>>;

    fn subscribe(&self, event: TimingEvent, listener: TimingListener)
    -> EndpointResult<SubscriptionId>;
    fn unsubscribe(&self, event: TimingEvent, id: SubscriptionId);
}
