// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;

use super::listeners::Listeners;
use crate::core::clocks::Clock;
use crate::core::endpoints::{
    EndpointError, EndpointResult, Player, PlayerEvent, PlayerListener, SubscriptionId,
};

#[derive(Debug)]
struct Playback {
    /// Position at `anchor_secs`.
    anchor_position: f64,
    anchor_secs: f64,
    paused: bool,
    rate: f64,
    muted: bool,
    duration: Option<f64>,
}

impl Playback {
    fn position(&self, now: f64) -> f64 {
        let velocity = if self.paused { 0.0 } else { self.rate };
        let position = self.anchor_position + velocity * (now - self.anchor_secs);
        let position = position.max(0.0);
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn reanchor(&mut self, now: f64) {
        self.anchor_position = self.position(now);
        self.anchor_secs = now;
    }
}

#[derive(Debug, Default)]
struct Faults {
    write_error: Option<EndpointError>,
    read_error: Option<EndpointError>,
    muted_autoplay_only: bool,
    reject_subscribe: Option<PlayerEvent>,
    reported_time: Option<f64>,
    time_skew_per_read: f64,
    skew: f64,
}

/// Simulated media element.
///
/// Position advances with the clock at the playback rate while playing.
/// Mutators apply immediately and emit the matching event before their
/// future is returned: `seeked` on every seek, `ratechange`/`play`/`pause`
/// only when the state actually changes.
pub struct SimPlayer {
    clock: Arc<dyn Clock>,
    playback: Mutex<Playback>,
    faults: Mutex<Faults>,
    listeners: Listeners<PlayerEvent>,
}

impl SimPlayer {
    /// A paused player at position 0, rate 1.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_secs();
        Self {
            clock,
            playback: Mutex::new(Playback {
                anchor_position: 0.0,
                anchor_secs: now,
                paused: true,
                rate: 1.0,
                muted: false,
                duration: None,
            }),
            faults: Mutex::new(Faults::default()),
            listeners: Listeners::new(),
        }
    }

    /// Clamp the position to `[0, duration]`.
    pub fn with_duration(self, duration: f64) -> Self {
        self.playback.lock().duration = Some(duration);
        self
    }

    pub fn position(&self) -> f64 {
        self.playback.lock().position(self.clock.now_secs())
    }

    pub fn is_paused(&self) -> bool {
        self.playback.lock().paused
    }

    pub fn rate(&self) -> f64 {
        self.playback.lock().rate
    }

    pub fn is_muted(&self) -> bool {
        self.playback.lock().muted
    }

    /// Fire `event` at the registered listeners without changing any state,
    /// as a real element does for `timeupdate`.
    pub fn emit(&self, event: PlayerEvent) {
        self.listeners.emit(event);
    }

    pub fn listener_count(&self, event: PlayerEvent) -> usize {
        self.listeners.count(event)
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.total()
    }

    /// Make every mutator fail with `error` until cleared.
    pub fn fail_writes(&self, error: Option<EndpointError>) {
        self.faults.lock().write_error = error;
    }

    /// Make every accessor fail with `error` until cleared.
    pub fn fail_reads(&self, error: Option<EndpointError>) {
        self.faults.lock().read_error = error;
    }

    /// Refuse `play()` with `NotAllowed` unless muted, like a browser's
    /// autoplay policy.
    pub fn require_muted_autoplay(&self, required: bool) {
        self.faults.lock().muted_autoplay_only = required;
    }

    /// Refuse subscriptions to `event`.
    pub fn reject_subscriptions(&self, event: Option<PlayerEvent>) {
        self.faults.lock().reject_subscribe = event;
    }

    /// Report `time` from `current_time()` regardless of the real position.
    pub fn report_time(&self, time: Option<f64>) {
        self.faults.lock().reported_time = time;
    }

    /// Add an extra `skew` seconds to every successive `current_time()` read,
    /// cumulatively.
    pub fn skew_reads(&self, skew: f64) {
        self.faults.lock().time_skew_per_read = skew;
    }

    fn check_read(&self) -> EndpointResult<()> {
        match &self.faults.lock().read_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn check_write(&self) -> EndpointResult<()> {
        match &self.faults.lock().write_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Apply `change` under the playback lock, then emit `event` if the
    /// change reports one.
    fn mutate<F>(&self, change: F) -> BoxFuture<'static, EndpointResult<()>>
    where
        F: FnOnce(&mut Playback, f64) -> EndpointResult<Option<PlayerEvent>>,
    {
        let result = self.check_write().and_then(|()| {
            let now = self.clock.now_secs();
            let mut playback = self.playback.lock();
            change(&mut playback, now)
        });

        match result {
            Ok(event) => {
                if let Some(event) = event {
                    self.listeners.emit(event);
                }
                future::ready(Ok(())).boxed()
            }
            Err(error) => future::ready(Err(error)).boxed(),
        }
    }
}

impl Player for SimPlayer {
    fn current_time(&self) -> BoxFuture<'static, EndpointResult<f64>> {
        let result = self.check_read().map(|()| {
            let mut faults = self.faults.lock();
            faults.skew += faults.time_skew_per_read;
            let skew = faults.skew;
            match faults.reported_time {
                Some(time) => time,
                None => self.position() + skew,
            }
        });
        future::ready(result).boxed()
    }

    fn paused(&self) -> BoxFuture<'static, EndpointResult<bool>> {
        let result = self.check_read().map(|()| self.is_paused());
        future::ready(result).boxed()
    }

    fn playback_rate(&self) -> BoxFuture<'static, EndpointResult<f64>> {
        let result = self.check_read().map(|()| self.rate());
        future::ready(result).boxed()
    }

    fn muted(&self) -> BoxFuture<'static, EndpointResult<bool>> {
        let result = self.check_read().map(|()| self.is_muted());
        future::ready(result).boxed()
    }

    fn set_current_time(&self, seconds: f64) -> BoxFuture<'static, EndpointResult<()>> {
        self.mutate(|playback, now| {
            if !seconds.is_finite() {
                return Err(EndpointError::Rejected(format!("invalid position {seconds}")));
            }
            playback.anchor_position = seconds;
            playback.anchor_secs = now;
            playback.anchor_position = playback.position(now);
            Ok(Some(PlayerEvent::Seeked))
        })
    }

    fn set_playback_rate(&self, rate: f64) -> BoxFuture<'static, EndpointResult<()>> {
        self.mutate(|playback, now| {
            if !rate.is_finite() {
                return Err(EndpointError::Rejected(format!("invalid rate {rate}")));
            }
            if playback.rate == rate {
                return Ok(None);
            }
            playback.reanchor(now);
            playback.rate = rate;
            Ok(Some(PlayerEvent::RateChange))
        })
    }

    fn set_muted(&self, muted: bool) -> BoxFuture<'static, EndpointResult<()>> {
        self.mutate(|playback, _| {
            playback.muted = muted;
            Ok(None)
        })
    }

    fn play(&self) -> BoxFuture<'static, EndpointResult<()>> {
        let muted_only = self.faults.lock().muted_autoplay_only;
        self.mutate(|playback, now| {
            if muted_only && !playback.muted {
                return Err(EndpointError::NotAllowed(
                    "play() requires muted playback".to_string(),
                ));
            }
            if !playback.paused {
                return Ok(None);
            }
            playback.reanchor(now);
            playback.paused = false;
            Ok(Some(PlayerEvent::Play))
        })
    }

    fn pause(&self) -> BoxFuture<'static, EndpointResult<()>> {
        self.mutate(|playback, now| {
            if playback.paused {
                return Ok(None);
            }
            playback.reanchor(now);
            playback.paused = true;
            Ok(Some(PlayerEvent::Pause))
        })
    }

    fn subscribe(
        &self,
        event: PlayerEvent,
        listener: PlayerListener,
    ) -> EndpointResult<SubscriptionId> {
        if self.faults.lock().reject_subscribe == Some(event) {
            return Err(EndpointError::Subscribe(format!(
                "{} listeners not accepted",
                event.name()
            )));
        }
        Ok(self.listeners.add(event, listener))
    }

    fn unsubscribe(&self, event: PlayerEvent, id: SubscriptionId) {
        self.listeners.remove(event, id);
    }
}
