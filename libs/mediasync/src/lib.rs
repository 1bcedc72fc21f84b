// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Keeps a media player and an external timing object in sync.
//!
//! A [`TimingConnector`] subscribes to both endpoints and, depending on its
//! [`Role`], either slaves the player to the timing object's vector
//! (`Follower`) or publishes the player's playback state into the timing
//! object (`Controller`).

#![allow(clippy::type_complexity)] // Listener signatures are clear in context

pub mod core;
pub mod embed;

pub use core::{
    Clock, ConnectorConfig, ConnectorStats, Diagnostic, DiagnosticSink, EndpointError,
    EndpointResult, FeedbackGuard, ManualClock, Player, PlayerEvent, PlayerListener, ReadyState,
    Role, SoftwareClock, Subscription, SubscriptionId, SyncError, TimingConnector,
    TimingConnectorBuilder, TimingEvent, TimingListener, TimingObject, Vector, VectorUpdate,
    derive_vector_from_player, extrapolate, within_tolerance,
};
pub use core::error::Result;
pub use core::sim::{SimPlayer, SimTimingObject};
pub use embed::{EmbedError, EmbedParameters, vimeo_url};
