// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Player, PlayerEvent, TimingEvent, TimingObject};

/// Unique identifier for a listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// Generate a new unique subscription ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

enum Target {
    Player(Arc<dyn Player>, PlayerEvent),
    Timing(Arc<dyn TimingObject>, TimingEvent),
}

/// A live listener registration on one endpoint.
///
/// Cancelling consumes the handle, so a registration is removed at most once.
pub struct Subscription {
    id: SubscriptionId,
    target: Target,
}

impl Subscription {
    pub(crate) fn player(player: Arc<dyn Player>, event: PlayerEvent, id: SubscriptionId) -> Self {
        Self {
            id,
            target: Target::Player(player, event),
        }
    }

    pub(crate) fn timing(
        timing: Arc<dyn TimingObject>,
        event: TimingEvent,
        id: SubscriptionId,
    ) -> Self {
        Self {
            id,
            target: Target::Timing(timing, event),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn event_name(&self) -> &'static str {
        match &self.target {
            Target::Player(_, event) => event.name(),
            Target::Timing(_, event) => event.name(),
        }
    }

    pub fn cancel(self) {
        match self.target {
            Target::Player(player, event) => player.unsubscribe(event, self.id),
            Target::Timing(timing, event) => timing.unsubscribe(event, self.id),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event", &self.event_name())
            .finish()
    }
}

/// Cancel every subscription, newest first.
pub(crate) fn cancel_all(subscriptions: Vec<Subscription>) {
    for subscription in subscriptions.into_iter().rev() {
        tracing::trace!(event = subscription.event_name(), id = ?subscription.id(), "unsubscribing");
        subscription.cancel();
    }
}
