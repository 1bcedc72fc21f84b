// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Echo suppression for writes the connector makes to a sink.
//!
//! Writing to an endpoint usually makes it emit the very event the connector
//! listens for (seeking emits `seeked`, updating a timing object emits
//! `change`). Before each write the guard records which events the write is
//! expected to echo, tagged with a generation token and a deadline. An
//! incoming event of an expected kind consumes the oldest live expectation
//! and is reported as an echo; expectations that are never matched lapse
//! after the grace period so genuine external events are not ignored
//! indefinitely.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::clocks::Clock;

/// Default window during which an unmatched echo expectation stays live.
pub const DEFAULT_ECHO_GRACE: Duration = Duration::from_millis(250);

/// Generation token identifying one guarded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EchoToken(u64);

#[derive(Debug)]
struct PendingEcho<K> {
    token: u64,
    kind: K,
    deadline_ns: i64,
}

pub struct FeedbackGuard<K> {
    clock: Arc<dyn Clock>,
    grace_ns: i64,
    next_token: AtomicU64,
    pending: Mutex<Vec<PendingEcho<K>>>,
    absorbed: AtomicU64,
}

impl<K> FeedbackGuard<K>
where
    K: Copy + Eq + fmt::Debug,
{
    pub fn new(clock: Arc<dyn Clock>, grace: Duration) -> Self {
        Self {
            clock,
            grace_ns: i64::try_from(grace.as_nanos()).unwrap_or(i64::MAX),
            next_token: AtomicU64::new(1),
            pending: Mutex::new(Vec::new()),
            absorbed: AtomicU64::new(0),
        }
    }

    /// Expect one echo of each kind in `kinds`.
    pub fn arm(&self, kinds: &[K]) -> EchoToken {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let now = self.clock.now_ns();
        let deadline_ns = now.saturating_add(self.grace_ns);

        // Sinks that stay quiet never reach `absorb`, so lapsed entries are
        // dropped here too.
        let mut pending = self.pending.lock();
        pending.retain(|p| p.deadline_ns >= now);
        pending.extend(kinds.iter().map(|&kind| PendingEcho {
            token,
            kind,
            deadline_ns,
        }));
        EchoToken(token)
    }

    /// Drop whatever is still expected from the write behind `token`.
    pub fn disarm(&self, token: EchoToken) {
        self.pending.lock().retain(|p| p.token != token.0);
    }

    /// Returns `true` if `kind` is the echo of a guarded write and must be
    /// ignored. Consumes the matching expectation.
    pub fn absorb(&self, kind: K) -> bool {
        let now = self.clock.now_ns();
        let mut pending = self.pending.lock();
        pending.retain(|p| p.deadline_ns >= now);

        match pending.iter().position(|p| p.kind == kind) {
            Some(index) => {
                pending.remove(index);
                self.absorbed.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(?kind, "echo suppressed");
                true
            }
            None => false,
        }
    }

    /// Run `write` as a self-originated write expected to echo `kinds`.
    ///
    /// The expectation is armed before `write` is invoked, so an echo the sink
    /// emits synchronously from inside the call is already covered. A failed
    /// write produces no echo, so its expectation is dropped immediately.
    pub async fn wrap<F, Fut, T, E>(&self, kinds: &[K], write: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let token = self.arm(kinds);
        let result = write().await;
        if result.is_err() {
            self.disarm(token);
        }
        result
    }

    /// Number of live (unexpired, unmatched) expectations.
    pub fn pending(&self) -> usize {
        let now = self.clock.now_ns();
        self.pending
            .lock()
            .iter()
            .filter(|p| p.deadline_ns >= now)
            .count()
    }

    /// Total echoes suppressed so far.
    pub fn absorbed(&self) -> u64 {
        self.absorbed.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.pending.lock().clear();
    }
}
