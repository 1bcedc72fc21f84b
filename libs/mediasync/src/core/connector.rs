// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The connector: subscriptions, readiness gating, teardown.
//!
//! Endpoint callbacks never do real work. They check the readiness gate and
//! the echo guards, then enqueue a [`Trigger`] for the connector's single
//! reconciliation task, which runs passes strictly in arrival order on the
//! host's tokio runtime.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::clocks::{Clock, SoftwareClock};
use crate::core::config::{ConnectorConfig, Role};
use crate::core::diagnostics::{Diagnostic, DiagnosticSink};
use crate::core::endpoints::{
    Player, PlayerEvent, PlayerListener, Subscription, TimingEvent, TimingListener, TimingObject,
    cancel_all,
};
use crate::core::error::{Result, SyncError};
use crate::core::strategy::{
    ConnectorStats, RoleStrategy, StrategyState, SubscriptionPlan, SyncContext, Trigger,
};

#[derive(Default)]
struct Link {
    state: StrategyState,
    disconnected: bool,
    readiness: Option<Subscription>,
    sources: Vec<Subscription>,
}

struct Shared {
    ctx: SyncContext,
    link: Mutex<Link>,
    signals: Mutex<Option<mpsc::UnboundedSender<Trigger>>>,
}

impl Shared {
    fn is_active(&self) -> bool {
        self.link.lock().state.is_active()
    }

    fn signal(&self, trigger: Trigger) {
        if let Some(signals) = self.signals.lock().as_ref() {
            // Only fails once the reconciliation task is gone.
            let _ = signals.send(trigger);
        }
    }

    fn player_listener(self: &Arc<Self>) -> PlayerListener {
        let weak = Arc::downgrade(self);
        Arc::new(move |event| {
            if let Some(shared) = weak.upgrade() {
                shared.on_player_event(event);
            }
        })
    }

    fn timing_listener(self: &Arc<Self>) -> TimingListener {
        let weak: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |event| {
            if let Some(shared) = weak.upgrade() {
                shared.on_timing_event(event);
            }
        })
    }

    fn on_player_event(&self, event: PlayerEvent) {
        if !self.is_active() || self.ctx.player_guard.absorb(event) {
            return;
        }
        self.signal(Trigger::Player(event));
    }

    fn on_timing_event(self: &Arc<Self>, event: TimingEvent) {
        match event {
            TimingEvent::ReadyStateChange => self.on_ready_state_change(),
            TimingEvent::Change => {
                if !self.is_active() || self.ctx.timing_guard.absorb(event) {
                    return;
                }
                self.signal(Trigger::Timing(event));
            }
        }
    }

    fn on_ready_state_change(self: &Arc<Self>) {
        if self.ctx.timing.ready_state().is_open() {
            if let Err(err) = self.activate() {
                match err {
                    SyncError::Subscribe { event, source, .. } => {
                        self.ctx.report(Diagnostic::SubscribeFailed {
                            role: self.ctx.role(),
                            event,
                            error: source,
                        })
                    }
                    other => tracing::warn!(error = %other, "failed to activate connector"),
                }
            }
        } else {
            self.deactivate();
        }
    }

    /// Attach every event of the role's plan, or nothing at all.
    fn attach_sources(self: &Arc<Self>) -> Result<Vec<Subscription>> {
        let plan = SubscriptionPlan::for_role(self.ctx.role());
        let mut attached = Vec::with_capacity(plan.player.len() + plan.timing.len());

        for &event in plan.player {
            match self.ctx.player.subscribe(event, self.player_listener()) {
                Ok(id) => attached.push(Subscription::player(self.ctx.player.clone(), event, id)),
                Err(source) => {
                    cancel_all(attached);
                    return Err(SyncError::Subscribe {
                        endpoint: "player",
                        event: event.name(),
                        source,
                    });
                }
            }
        }

        for &event in plan.timing {
            match self.ctx.timing.subscribe(event, self.timing_listener()) {
                Ok(id) => attached.push(Subscription::timing(self.ctx.timing.clone(), event, id)),
                Err(source) => {
                    cancel_all(attached);
                    return Err(SyncError::Subscribe {
                        endpoint: "timing object",
                        event: event.name(),
                        source,
                    });
                }
            }
        }

        Ok(attached)
    }

    /// `Inactive` → `Active`: attach the role's subscriptions and schedule
    /// the initial pass. No-op when already active or disconnected.
    fn activate(self: &Arc<Self>) -> Result<()> {
        {
            let link = self.link.lock();
            if link.disconnected || link.state.is_active() {
                return Ok(());
            }
        }

        // Subscribe without holding the link lock: endpoints may dispatch
        // to our listeners while we register.
        let sources = self.attach_sources()?;

        let mut link = self.link.lock();
        if link.disconnected || link.state.is_active() {
            drop(link);
            cancel_all(sources);
            return Ok(());
        }
        link.state = StrategyState::Active;
        link.sources = sources;
        self.ctx.resume();
        drop(link);

        tracing::info!(role = %self.ctx.role(), "timing object open, synchronizing");
        self.signal(Trigger::Opened);
        Ok(())
    }

    /// `Active` → `Inactive`: drop the role's subscriptions.
    fn deactivate(&self) {
        let sources = {
            let mut link = self.link.lock();
            if !link.state.is_active() {
                return;
            }
            link.state = StrategyState::Inactive;
            self.ctx.halt();
            std::mem::take(&mut link.sources)
        };

        cancel_all(sources);
        tracing::info!(role = %self.ctx.role(), "timing object closed, synchronization suspended");
        self.signal(Trigger::Closed);
    }

    fn disconnect(&self) {
        let (readiness, sources) = {
            let mut link = self.link.lock();
            if link.disconnected {
                return;
            }
            link.disconnected = true;
            link.state = StrategyState::Inactive;
            self.ctx.halt();
            (link.readiness.take(), std::mem::take(&mut link.sources))
        };

        cancel_all(sources);
        if let Some(readiness) = readiness {
            readiness.cancel();
        }
        // Closing the channel ends the reconciliation task once it has
        // drained; drained signals are ignored since the link is inactive.
        self.signals.lock().take();
        self.ctx.clear_guards();

        tracing::info!(role = %self.ctx.role(), "connector disconnected");
    }
}

async fn tick(drift_check: &mut Option<tokio::time::Interval>) {
    match drift_check {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// The reconciliation task. Processes one trigger at a time, in order.
async fn run(
    shared: Arc<Shared>,
    mut signals: mpsc::UnboundedReceiver<Trigger>,
    drift_period: Option<Duration>,
) {
    let mut strategy = RoleStrategy::new(shared.ctx.role());
    let mut drift_check = drift_period.map(|period| {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    loop {
        let trigger = tokio::select! {
            biased;
            signal = signals.recv() => match signal {
                Some(trigger) => trigger,
                None => break,
            },
            _ = tick(&mut drift_check) => Trigger::DriftCheck,
        };

        if trigger == Trigger::Closed {
            shared.ctx.clear_guards();
            strategy.handle(&shared.ctx, trigger).await;
            continue;
        }

        // Gate on both our own state and the source's current readiness:
        // the trigger may have been queued before a close.
        if !shared.is_active() || !shared.ctx.timing.ready_state().is_open() {
            tracing::trace!(?trigger, "not active, dropping trigger");
            continue;
        }

        strategy.handle(&shared.ctx, trigger).await;
    }

    tracing::debug!(role = %strategy.role(), "reconciliation task finished");
}

/// Builder for [`TimingConnector`].
pub struct TimingConnectorBuilder {
    player: Arc<dyn Player>,
    timing: Arc<dyn TimingObject>,
    config: ConnectorConfig,
    clock: Option<Arc<dyn Clock>>,
    diagnostics: Option<DiagnosticSink>,
    runtime: Option<Handle>,
}

impl TimingConnectorBuilder {
    pub fn config(mut self, config: ConnectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.config.role = role;
        self
    }

    /// Clock used for extrapolation and echo expiry. Must share its time
    /// base with the timing object's vector timestamps.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn diagnostics(mut self, sink: DiagnosticSink) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    pub fn on_diagnostic<F>(self, callback: F) -> Self
    where
        F: Fn(&Diagnostic) + Send + Sync + 'static,
    {
        self.diagnostics(Arc::new(callback))
    }

    /// Runtime the reconciliation task is spawned on. Defaults to the
    /// runtime `connect` is called from.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn connect(self) -> Result<TimingConnector> {
        self.config.validate()?;
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| SyncError::NoRuntime)?,
        };

        let role = self.config.role;
        let drift_period = (role == Role::Follower && self.config.drift_correction)
            .then(|| self.config.drift_check_interval());
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SoftwareClock::new()));

        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            ctx: SyncContext::new(self.config, self.player, self.timing, clock, self.diagnostics),
            link: Mutex::new(Link::default()),
            signals: Mutex::new(Some(sender)),
        });

        let id = shared
            .ctx
            .timing
            .subscribe(TimingEvent::ReadyStateChange, shared.timing_listener())
            .map_err(|source| SyncError::Subscribe {
                endpoint: "timing object",
                event: TimingEvent::ReadyStateChange.name(),
                source,
            })?;
        shared.link.lock().readiness = Some(Subscription::timing(
            shared.ctx.timing.clone(),
            TimingEvent::ReadyStateChange,
            id,
        ));

        if shared.ctx.timing.ready_state().is_open() {
            if let Err(err) = shared.activate() {
                shared.disconnect();
                return Err(err);
            }
        }

        runtime.spawn(run(shared.clone(), receiver, drift_period));
        tracing::info!(%role, clock = shared.ctx.clock.description(), "connector attached");

        Ok(TimingConnector { shared })
    }
}

/// Binds a player to a timing object for as long as it lives.
///
/// Dropping the connector disconnects it.
pub struct TimingConnector {
    shared: Arc<Shared>,
}

impl TimingConnector {
    pub fn builder(player: Arc<dyn Player>, timing: Arc<dyn TimingObject>) -> TimingConnectorBuilder {
        TimingConnectorBuilder {
            player,
            timing,
            config: ConnectorConfig::default(),
            clock: None,
            diagnostics: None,
            runtime: None,
        }
    }

    /// Attach with `config`, the system clock and no diagnostic callback.
    pub fn connect(
        player: Arc<dyn Player>,
        timing: Arc<dyn TimingObject>,
        config: ConnectorConfig,
    ) -> Result<Self> {
        Self::builder(player, timing).config(config).connect()
    }

    /// Stop synchronizing and remove every subscription. Idempotent, and safe
    /// to call from inside an endpoint's event handler, including one fired
    /// by the connector's own write. Leaves both endpoints as they are;
    /// writes already in flight are not cancelled, but a pass in progress
    /// issues no further ones.
    pub fn disconnect(&self) {
        self.shared.disconnect();
    }

    pub fn role(&self) -> Role {
        self.shared.ctx.role()
    }

    pub fn is_active(&self) -> bool {
        self.shared.is_active()
    }

    pub fn is_disconnected(&self) -> bool {
        self.shared.link.lock().disconnected
    }

    pub fn stats(&self) -> ConnectorStats {
        self.shared.ctx.stats()
    }
}

impl Drop for TimingConnector {
    fn drop(&mut self) {
        self.shared.disconnect();
    }
}
