// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Player slaved to the timing object.

use crate::core::diagnostics::Diagnostic;
use crate::core::endpoints::{EndpointError, PlayerEvent};
use crate::core::sync::{
    PlaybackAction, PlayerSnapshot, RATE_EPSILON, playback_actions, within_tolerance,
};

use super::SyncContext;

/// Rate offset used to absorb `drift` seconds within `max_catch_up` seconds,
/// capped at `max_rate_adjustment`.
pub fn rate_adjustment(drift: f64, max_catch_up: f64, max_rate_adjustment: f64) -> f64 {
    let min = drift.abs() / max_catch_up;
    if min < max_rate_adjustment {
        (max_rate_adjustment - min) / 2.0
    } else {
        max_rate_adjustment
    }
}

#[derive(Debug, Default)]
pub struct Follower {
    /// Offset drift correction currently applies on top of the base rate.
    speed_adjustment: f64,
}

impl Follower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speed_adjustment(&self) -> f64 {
        self.speed_adjustment
    }

    pub(crate) fn reset(&mut self) {
        self.speed_adjustment = 0.0;
    }

    /// Bring the player in line with the timing object's current vector.
    pub(crate) async fn reconcile(&mut self, ctx: &SyncContext) {
        let Some(player) = ctx.read_player().await else {
            return;
        };
        let Some(vector) = ctx.read_vector() else {
            return;
        };

        let now = ctx.now();
        let actions = playback_actions(
            &vector,
            now,
            &player,
            ctx.config.tolerance,
            ctx.config.signed_rate,
        );
        if actions.is_empty() {
            tracing::trace!(position = player.current_time, "player already in sync");
            return;
        }

        tracing::debug!(
            target_position = vector.extrapolate(now),
            velocity = vector.velocity,
            ?actions,
            "following timing object"
        );
        for action in actions {
            if ctx.is_halted() {
                tracing::debug!(?action, "connector halted, pass abandoned");
                break;
            }
            self.apply(ctx, action).await;
        }
    }

    async fn apply(&mut self, ctx: &SyncContext, action: PlaybackAction) {
        match action {
            PlaybackAction::Seek(position) => {
                ctx.write_player("setCurrentTime", &[PlayerEvent::Seeked], |p| {
                    p.set_current_time(position)
                })
                .await;
            }
            PlaybackAction::SetRate(rate) => {
                if ctx
                    .write_player("setPlaybackRate", &[PlayerEvent::RateChange], |p| {
                        p.set_playback_rate(rate)
                    })
                    .await
                {
                    self.speed_adjustment = 0.0;
                }
            }
            PlaybackAction::Play => self.play(ctx).await,
            PlaybackAction::Pause => {
                ctx.write_player("pause", &[PlayerEvent::Pause], |p| p.pause())
                    .await;
            }
        }
    }

    async fn play(&self, ctx: &SyncContext) {
        let error = match ctx
            .try_write_player("play", &[PlayerEvent::Play], |p| p.play())
            .await
        {
            Ok(()) => return,
            Err(error) => error,
        };

        if !(ctx.config.autoplay_muted && matches!(error, EndpointError::NotAllowed(_))) {
            ctx.report_write_failure("play", error);
            return;
        }

        // Muting cannot help a player that is already muted.
        if matches!(ctx.player.muted().await, Ok(true)) {
            ctx.report_write_failure("play", error);
            return;
        }

        tracing::info!("playback not allowed, retrying muted");
        if !ctx.write_player("setMuted", &[], |p| p.set_muted(true)).await {
            return;
        }
        if let Err(error) = ctx
            .try_write_player("play", &[PlayerEvent::Play], |p| p.play())
            .await
        {
            ctx.report_write_failure("play", error);
        }
    }

    /// Periodic check between source events: seek on large drift, nudge the
    /// playback rate on small drift, undo the nudge once back in sync.
    pub(crate) async fn correct_drift(&mut self, ctx: &SyncContext) {
        let Some(vector) = ctx.read_vector() else {
            return;
        };
        if vector.is_paused() {
            return;
        }
        let Some(player) = ctx.read_player().await else {
            return;
        };
        if player.paused {
            return;
        }

        let target = vector.extrapolate(ctx.now());
        let drift = target - player.current_time;
        tracing::trace!(drift, "drift check");

        let config = &ctx.config;
        if drift.abs() > config.max_drift {
            self.adjust_speed(ctx, &player, 0.0).await;
            if ctx
                .write_player("setCurrentTime", &[PlayerEvent::Seeked], |p| {
                    p.set_current_time(target)
                })
                .await
            {
                ctx.report(Diagnostic::ResyncedBySeek { drift });
            }
        } else if drift.abs() > config.tolerance {
            let adjustment = drift.signum()
                * rate_adjustment(drift, config.max_catch_up, config.max_rate_adjustment);
            if self.adjust_speed(ctx, &player, adjustment).await {
                ctx.report(Diagnostic::ResyncedByRate { drift, adjustment });
            }
        } else {
            self.adjust_speed(ctx, &player, 0.0).await;
        }
    }

    /// Swap the current rate offset for `adjustment`. Returns whether the
    /// player's rate was changed.
    async fn adjust_speed(
        &mut self,
        ctx: &SyncContext,
        player: &PlayerSnapshot,
        adjustment: f64,
    ) -> bool {
        if within_tolerance(self.speed_adjustment, adjustment, RATE_EPSILON) {
            return false;
        }

        let rate = player.playback_rate - self.speed_adjustment + adjustment;
        let changed = ctx
            .write_player("setPlaybackRate", &[PlayerEvent::RateChange], |p| {
                p.set_playback_rate(rate)
            })
            .await;
        if changed {
            self.speed_adjustment = adjustment;
        }
        changed
    }
}
