// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The two endpoints a connector binds together.
//!
//! Both are external collaborators: the connector only reads/writes them
//! through these traits and subscribes to a closed set of typed events.
//! Endpoints may invoke listeners synchronously from inside a mutator call
//! (the usual case for echoes) or from any other thread. Listeners never
//! block, but they may subscribe or unsubscribe while being dispatched, so
//! implementations must not hold their listener lock across a callback.

mod player;
mod subscription;
mod timing_object;

use thiserror::Error;

pub use player::{Player, PlayerEvent, PlayerListener};
pub use subscription::{Subscription, SubscriptionId};
pub(crate) use subscription::cancel_all;
pub use timing_object::{TimingEvent, TimingListener, TimingObject};

/// Failure reported by a player or timing object.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EndpointError {
    /// The environment refused the operation (e.g. autoplay policy).
    #[error("Operation not allowed: {0}")]
    NotAllowed(String),

    #[error("Operation rejected: {0}")]
    Rejected(String),

    #[error("Endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("Subscription refused: {0}")]
    Subscribe(String),
}

pub type EndpointResult<T> = std::result::Result<T, EndpointError>;
