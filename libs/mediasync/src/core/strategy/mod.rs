// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Control-direction strategies.
//!
//! Each role has a *source* (the endpoint it follows) and a *sink* (the
//! endpoint it writes). The connector also watches the sink so that changes
//! made to it by someone else are corrected; the connector's own writes show
//! up there as echoes and are filtered by the context's feedback guards.

mod context;
mod controller;
mod follower;

pub use context::{ConnectorStats, SyncContext};
pub use controller::Controller;
pub use follower::{Follower, rate_adjustment};

use crate::core::config::Role;
use crate::core::endpoints::{PlayerEvent, TimingEvent};

/// What woke the reconciliation task up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The timing object became ready (or was ready at construction).
    Opened,
    /// The timing object stopped being ready.
    Closed,
    Timing(TimingEvent),
    Player(PlayerEvent),
    /// Periodic follower drift check.
    DriftCheck,
}

/// `Inactive` until the timing object is open, and again once it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyState {
    #[default]
    Inactive,
    Active,
}

impl StrategyState {
    #[inline]
    pub fn is_active(self) -> bool {
        self == StrategyState::Active
    }
}

/// Events a role listens to while active.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionPlan {
    pub player: &'static [PlayerEvent],
    pub timing: &'static [TimingEvent],
}

const FOLLOWER_PLAN: SubscriptionPlan = SubscriptionPlan {
    // Sink: external play/pause/seek/rate changes get corrected.
    player: &[
        PlayerEvent::Play,
        PlayerEvent::Pause,
        PlayerEvent::Seeked,
        PlayerEvent::RateChange,
    ],
    // Source.
    timing: &[TimingEvent::Change],
};

const CONTROLLER_PLAN: SubscriptionPlan = SubscriptionPlan {
    // Source.
    player: &PlayerEvent::ALL,
    // Sink: external vector updates get overwritten with the player state.
    timing: &[TimingEvent::Change],
};

impl SubscriptionPlan {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Follower => FOLLOWER_PLAN,
            Role::Controller => CONTROLLER_PLAN,
        }
    }
}

pub enum RoleStrategy {
    Follower(Follower),
    Controller(Controller),
}

impl RoleStrategy {
    pub fn new(role: Role) -> Self {
        match role {
            Role::Follower => RoleStrategy::Follower(Follower::new()),
            Role::Controller => RoleStrategy::Controller(Controller::new()),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            RoleStrategy::Follower(_) => Role::Follower,
            RoleStrategy::Controller(_) => Role::Controller,
        }
    }

    /// Run whatever `trigger` calls for. Never fails: problems go to the
    /// context's diagnostic channel.
    pub async fn handle(&mut self, ctx: &SyncContext, trigger: Trigger) {
        match (self, trigger) {
            (RoleStrategy::Follower(follower), Trigger::Closed) => follower.reset(),
            (RoleStrategy::Controller(_), Trigger::Closed) => {}
            (RoleStrategy::Follower(follower), Trigger::DriftCheck) => {
                ctx.count_pass();
                follower.correct_drift(ctx).await;
            }
            (RoleStrategy::Controller(_), Trigger::DriftCheck) => {}
            (RoleStrategy::Follower(follower), _) => {
                ctx.count_pass();
                follower.reconcile(ctx).await;
            }
            (RoleStrategy::Controller(controller), trigger) => {
                ctx.count_pass();
                controller.reconcile(ctx, trigger).await;
            }
        }
    }
}
