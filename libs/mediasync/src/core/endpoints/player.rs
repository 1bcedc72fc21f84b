// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::{EndpointResult, SubscriptionId};

/// Events a player emits that the connector cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerEvent {
    Play,
    Pause,
    RateChange,
    Seeked,
    /// Periodic position-changed notification while playing.
    TimeUpdate,
}

impl PlayerEvent {
    pub const ALL: [PlayerEvent; 5] = [
        PlayerEvent::Play,
        PlayerEvent::Pause,
        PlayerEvent::RateChange,
        PlayerEvent::Seeked,
        PlayerEvent::TimeUpdate,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            PlayerEvent::Play => "play",
            PlayerEvent::Pause => "pause",
            PlayerEvent::RateChange => "ratechange",
            PlayerEvent::Seeked => "seeked",
            PlayerEvent::TimeUpdate => "timeupdate",
        }
    }
}

pub type PlayerListener = Arc<dyn Fn(PlayerEvent) + Send + Sync>;

/// Media playback endpoint.
///
/// Every accessor and mutator is asynchronous and may fail. Futures are
/// `'static` so the connector can hold them across its own awaits without
/// borrowing the player.
pub trait Player: Send + Sync {
    fn current_time(&self) -> BoxFuture<'static, EndpointResult<f64>>;
    fn paused(&self) -> BoxFuture<'static, EndpointResult<bool>>;
    fn playback_rate(&self) -> BoxFuture<'static, EndpointResult<f64>>;
    fn muted(&self) -> BoxFuture<'static, EndpointResult<bool>>;

    fn set_current_time(&self, seconds: f64) -> BoxFuture<'static, EndpointResult<()>>;
    fn set_playback_rate(&self, rate: f64) -> BoxFuture<'static, EndpointResult<()>>;
    fn set_muted(&self, muted: bool) -> BoxFuture<'static, EndpointResult<()>>;
    fn play(&self) -> BoxFuture<'static, EndpointResult<()>>;
    fn pause(&self) -> BoxFuture<'static, EndpointResult<()>>;

    fn subscribe(&self, event: PlayerEvent, listener: PlayerListener)
    -> EndpointResult<SubscriptionId>;
    fn unsubscribe(&self, event: PlayerEvent, id: SubscriptionId);
}
