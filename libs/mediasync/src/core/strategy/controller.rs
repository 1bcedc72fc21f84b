// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Timing object slaved to the player.

use crate::core::endpoints::PlayerEvent;
use crate::core::sync::timing_update;

use super::{SyncContext, Trigger};

#[derive(Debug, Default)]
pub struct Controller;

impl Controller {
    pub fn new() -> Self {
        Self
    }

    /// Publish the player's playback state into the timing object.
    pub(crate) async fn reconcile(&mut self, ctx: &SyncContext, trigger: Trigger) {
        let Some(player) = ctx.read_player().await else {
            return;
        };
        let derived = player.to_vector(ctx.now());
        let existing = ctx.timing.query();

        // The initial pass always publishes, as does any pass over a vector
        // that cannot be extrapolated.
        let force = trigger == Trigger::Opened || !existing.is_finite();
        let rate_only = trigger == Trigger::Player(PlayerEvent::RateChange);

        let Some(update) =
            timing_update(&existing, &derived, ctx.config.tolerance, rate_only, force)
        else {
            tracing::trace!(?trigger, "timing object already mirrors player");
            return;
        };

        tracing::debug!(
            ?trigger,
            position = ?update.position,
            velocity = ?update.velocity,
            "publishing player state"
        );
        ctx.write_timing(update).await;
    }
}
