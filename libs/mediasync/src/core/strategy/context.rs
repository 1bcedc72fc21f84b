// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures_util::future::BoxFuture;

use crate::core::clocks::Clock;
use crate::core::config::{ConnectorConfig, Role};
use crate::core::diagnostics::{self, Diagnostic, DiagnosticSink};
use crate::core::endpoints::{EndpointError, EndpointResult, Player, PlayerEvent, TimingEvent, TimingObject};
use crate::core::guard::FeedbackGuard;
use crate::core::sync::{PlayerSnapshot, Vector, VectorUpdate};

/// Counters describing what a connector has done so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectorStats {
    /// Reconciliation passes run (including drift checks).
    pub passes: u64,
    /// Writes issued to the sink.
    pub writes: u64,
    /// Writes the sink rejected.
    pub write_failures: u64,
    /// Sink events recognised as echoes of the connector's own writes.
    pub echoes_suppressed: u64,
}

/// Everything a strategy needs to run a pass: both endpoints, the clock,
/// the echo guards and the diagnostic channel.
pub struct SyncContext {
    pub(crate) config: ConnectorConfig,
    pub(crate) player: Arc<dyn Player>,
    pub(crate) timing: Arc<dyn TimingObject>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) player_guard: FeedbackGuard<PlayerEvent>,
    pub(crate) timing_guard: FeedbackGuard<TimingEvent>,
    diagnostics: Option<DiagnosticSink>,
    /// Set while the connector is inactive or disconnected. No new write is
    /// issued while set; writes already issued are left to finish.
    halted: AtomicBool,
    passes: AtomicU64,
    writes: AtomicU64,
    write_failures: AtomicU64,
}

impl SyncContext {
    pub(crate) fn new(
        config: ConnectorConfig,
        player: Arc<dyn Player>,
        timing: Arc<dyn TimingObject>,
        clock: Arc<dyn Clock>,
        diagnostics: Option<DiagnosticSink>,
    ) -> Self {
        let grace = config.echo_grace();
        Self {
            player_guard: FeedbackGuard::new(clock.clone(), grace),
            timing_guard: FeedbackGuard::new(clock.clone(), grace),
            config,
            player,
            timing,
            clock,
            diagnostics,
            halted: AtomicBool::new(true),
            passes: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.config.role
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.clock.now_secs()
    }

    pub(crate) fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    pub(crate) fn resume(&self) {
        self.halted.store(false, Ordering::SeqCst);
    }

    /// Whether writes are currently refused.
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    fn skip_write(&self, operation: &'static str) -> bool {
        let halted = self.is_halted();
        if halted {
            tracing::debug!(operation, "connector halted, write skipped");
        }
        halted
    }

    pub(crate) fn report(&self, diagnostic: Diagnostic) {
        diagnostics::report(self.diagnostics.as_ref(), diagnostic);
    }

    pub(crate) fn count_pass(&self) {
        self.passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> ConnectorStats {
        ConnectorStats {
            passes: self.passes.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            echoes_suppressed: self.player_guard.absorbed() + self.timing_guard.absorbed(),
        }
    }

    pub(crate) fn clear_guards(&self) {
        self.player_guard.clear();
        self.timing_guard.clear();
    }

    /// The timing object's vector, or `None` (reported) if it is malformed.
    pub(crate) fn read_vector(&self) -> Option<Vector> {
        let vector = self.timing.query();
        match vector.validate() {
            Ok(()) => Some(vector),
            Err(_) => {
                self.report(Diagnostic::MalformedVector {
                    role: self.role(),
                    vector,
                });
                None
            }
        }
    }

    /// Read position, paused flag and rate concurrently.
    ///
    /// Returns `None` (reported) if any read fails or yields a non-finite
    /// value.
    pub(crate) async fn read_player(&self) -> Option<PlayerSnapshot> {
        let (current_time, paused, playback_rate) = tokio::join!(
            self.player.current_time(),
            self.player.paused(),
            self.player.playback_rate()
        );

        let snapshot = PlayerSnapshot {
            current_time: self.read_ok("currentTime", current_time)?,
            paused: self.read_ok("paused", paused)?,
            playback_rate: self.read_ok("playbackRate", playback_rate)?,
        };

        if !snapshot.is_finite() {
            self.report(Diagnostic::MalformedPlayerState {
                role: self.role(),
                current_time: snapshot.current_time,
                playback_rate: snapshot.playback_rate,
            });
            return None;
        }
        Some(snapshot)
    }

    fn read_ok<T>(&self, operation: &'static str, result: EndpointResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(Diagnostic::ReadFailed {
                    role: self.role(),
                    operation,
                    error,
                });
                None
            }
        }
    }

    /// Guarded write to the player. Failures are reported, never returned.
    /// Returns whether the write was issued and succeeded.
    pub(crate) async fn write_player<F>(
        &self,
        operation: &'static str,
        echoes: &[PlayerEvent],
        write: F,
    ) -> bool
    where
        F: FnOnce(&dyn Player) -> BoxFuture<'static, EndpointResult<()>>,
    {
        if self.skip_write(operation) {
            return false;
        }
        let result = self
            .player_guard
            .wrap(echoes, || write(self.player.as_ref()))
            .await;
        self.settle_write(operation, result)
    }

    /// Like [`write_player`](Self::write_player) but hands the error back
    /// instead of reporting it, for callers that retry. A skipped write
    /// returns `Ok`.
    pub(crate) async fn try_write_player<F>(
        &self,
        operation: &'static str,
        echoes: &[PlayerEvent],
        write: F,
    ) -> EndpointResult<()>
    where
        F: FnOnce(&dyn Player) -> BoxFuture<'static, EndpointResult<()>>,
    {
        if self.skip_write(operation) {
            return Ok(());
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.player_guard
            .wrap(echoes, || write(self.player.as_ref()))
            .await
    }

    /// Guarded vector update on the timing object.
    pub(crate) async fn write_timing(&self, update: VectorUpdate) -> bool {
        if self.skip_write("update") {
            return false;
        }
        let result = self
            .timing_guard
            .wrap(&[TimingEvent::Change], || self.timing.update(update))
            .await;
        self.settle_write("update", result)
    }

    pub(crate) fn report_write_failure(&self, operation: &'static str, error: EndpointError) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
        self.report(Diagnostic::WriteFailed {
            role: self.role(),
            operation,
            error,
        });
    }

    fn settle_write(&self, operation: &'static str, result: EndpointResult<()>) -> bool {
        self.writes.fetch_add(1, Ordering::Relaxed);
        match result {
            Ok(()) => true,
            Err(error) => {
                self.report_write_failure(operation, error);
                false
            }
        }
    }
}
