// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Best-effort reporting channel for things that go wrong (or get corrected)
//! while a connector runs in the background.
//!
//! Steady-state failures never propagate to the endpoints or the embedder;
//! they are logged through `tracing` and, if the embedder registered one,
//! handed to a [`DiagnosticSink`].

use std::fmt;
use std::sync::Arc;

use crate::core::config::Role;
use crate::core::endpoints::EndpointError;
use crate::core::sync::Vector;

pub type DiagnosticSink = Arc<dyn Fn(&Diagnostic) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A guarded write to the sink was rejected.
    WriteFailed {
        role: Role,
        operation: &'static str,
        error: EndpointError,
    },
    /// Reading the player's state failed; the pass was skipped.
    ReadFailed {
        role: Role,
        operation: &'static str,
        error: EndpointError,
    },
    /// The timing object published a vector with non-finite fields.
    MalformedVector { role: Role, vector: Vector },
    /// The player reported a non-finite position or rate.
    MalformedPlayerState {
        role: Role,
        current_time: f64,
        playback_rate: f64,
    },
    /// Attaching to an endpoint after the timing object opened failed.
    SubscribeFailed {
        role: Role,
        event: &'static str,
        error: EndpointError,
    },
    /// Drift correction seeked the player.
    ResyncedBySeek { drift: f64 },
    /// Drift correction nudged the playback rate.
    ResyncedByRate { drift: f64, adjustment: f64 },
}

impl Diagnostic {
    /// Corrections are routine; everything else is a failure.
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            Diagnostic::ResyncedBySeek { .. } | Diagnostic::ResyncedByRate { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::WriteFailed {
                role,
                operation,
                error,
            } => write!(f, "[{}] {} failed: {}", role, operation, error),
            Diagnostic::ReadFailed {
                role,
                operation,
                error,
            } => write!(f, "[{}] reading {} failed: {}", role, operation, error),
            Diagnostic::MalformedVector { role, vector } => write!(
                f,
                "[{}] ignoring malformed vector (position={}, velocity={}, timestamp={})",
                role, vector.position, vector.velocity, vector.timestamp
            ),
            Diagnostic::MalformedPlayerState {
                role,
                current_time,
                playback_rate,
            } => write!(
                f,
                "[{}] ignoring malformed player state (current_time={}, playback_rate={})",
                role, current_time, playback_rate
            ),
            Diagnostic::SubscribeFailed { role, event, error } => {
                write!(f, "[{}] subscribing to '{}' failed: {}", role, event, error)
            }
            Diagnostic::ResyncedBySeek { drift } => {
                write!(f, "drift {:.3}s, resync by currentTime", drift)
            }
            Diagnostic::ResyncedByRate { drift, adjustment } => write!(
                f,
                "drift {:.3}s, resync by playbackRate ({:+.3})",
                drift, adjustment
            ),
        }
    }
}

/// Log `diagnostic` and forward it to `sink`.
pub(crate) fn report(sink: Option<&DiagnosticSink>, diagnostic: Diagnostic) {
    if diagnostic.is_failure() {
        tracing::warn!("{}", diagnostic);
    } else {
        tracing::debug!("{}", diagnostic);
    }

    if let Some(sink) = sink {
        sink(&diagnostic);
    }
}
