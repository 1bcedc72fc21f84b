// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::endpoints::SubscriptionId;

type Listener<E> = Arc<dyn Fn(E) + Send + Sync>;

struct Entry<E> {
    event: E,
    id: SubscriptionId,
    listener: Listener<E>,
}

/// Listener registry keyed by event kind.
pub(super) struct Listeners<E> {
    entries: Mutex<Vec<Entry<E>>>,
}

impl<E: Copy + Eq + 'static> Listeners<E> {
    pub(super) fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn add(&self, event: E, listener: Listener<E>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.entries.lock().push(Entry {
            event,
            id,
            listener,
        });
        id
    }

    pub(super) fn remove(&self, event: E, id: SubscriptionId) {
        self.entries
            .lock()
            .retain(|entry| !(entry.event == event && entry.id == id));
    }

    pub(super) fn count(&self, event: E) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.event == event)
            .count()
    }

    pub(super) fn total(&self) -> usize {
        self.entries.lock().len()
    }

    /// Call every listener registered for `event`. The registry is
    /// snapshotted first, so listeners may subscribe or unsubscribe freely.
    pub(super) fn emit(&self, event: E) {
        let snapshot: Vec<Listener<E>> = self
            .entries
            .lock()
            .iter()
            .filter(|entry| entry.event == event)
            .map(|entry| entry.listener.clone())
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }
}
