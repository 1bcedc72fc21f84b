// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Connector simulation against in-process endpoints.
//!
//! Both endpoints run on the system clock. A scripted "remote party" changes
//! the source endpoint a few times during the run (faster playback, a jump,
//! a pause and a resume) so the connector has something to follow.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use mediasync::{
    Clock, ConnectorConfig, Player, Role, SimPlayer, SimTimingObject, SoftwareClock,
    TimingConnector, TimingObject, VectorUpdate,
};

#[derive(Debug, Clone, Copy)]
enum Step {
    SpeedUp,
    Jump,
    Pause,
    Resume,
}

const SCRIPT: [(f64, Step); 4] = [
    (0.2, Step::SpeedUp),
    (0.4, Step::Jump),
    (0.6, Step::Pause),
    (0.8, Step::Resume),
];

async fn apply(
    step: Step,
    role: Role,
    player: &SimPlayer,
    timing: &SimTimingObject,
) -> Result<()> {
    tracing::info!(?step, "remote change");
    match role {
        Role::Follower => {
            let update = match step {
                Step::SpeedUp => VectorUpdate::velocity(2.0),
                Step::Jump => VectorUpdate::position(timing.position() + 30.0),
                Step::Pause => VectorUpdate::velocity(0.0),
                Step::Resume => VectorUpdate::velocity(1.0),
            };
            timing.update(update).await?;
        }
        Role::Controller => match step {
            Step::SpeedUp => player.set_playback_rate(2.0).await?,
            Step::Jump => player.set_current_time(player.position() + 30.0).await?,
            Step::Pause => player.pause().await?,
            Step::Resume => player.play().await?,
        },
    }
    Ok(())
}

pub async fn run(
    role: Option<Role>,
    seconds: f64,
    tick_ms: u64,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => super::config::load(path)?,
        None => ConnectorConfig::default(),
    };
    if let Some(role) = role {
        config.role = role;
    }
    let role = config.role;

    let clock: Arc<dyn Clock> =
        Arc::new(SoftwareClock::with_description("simulation clock".to_string()));
    let player = Arc::new(SimPlayer::new(clock.clone()));
    let timing = Arc::new(SimTimingObject::new(clock.clone()).with_motion(0.0, 1.0));
    if role == Role::Controller {
        player.play().await?;
    }

    let connector = TimingConnector::builder(player.clone(), timing.clone())
        .config(config)
        .clock(clock.clone())
        .connect()
        .context("Failed to connect")?;

    tracing::info!(%role, "opening timing object");
    timing.open();

    let total = Duration::from_secs_f64(seconds.max(0.0));
    let mut ticks = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
    let started = tokio::time::Instant::now();
    let mut script = SCRIPT.iter().peekable();

    loop {
        ticks.tick().await;
        let elapsed = started.elapsed();
        if elapsed > total {
            break;
        }

        let now = elapsed.as_secs_f64();
        while let Some(&(_, step)) = script.next_if(|&&(at, _)| now >= at * seconds) {
            apply(step, role, &player, &timing).await?;
        }

        tracing::info!(
            t = now,
            timing = timing.position(),
            velocity = timing.query().velocity,
            player = player.position(),
            rate = player.rate(),
            paused = player.is_paused(),
            "state"
        );
    }

    let stats = connector.stats();
    connector.disconnect();

    println!("role:               {}", role);
    println!("passes:             {}", stats.passes);
    println!("writes:             {}", stats.writes);
    println!("write failures:     {}", stats.write_failures);
    println!("echoes suppressed:  {}", stats.echoes_suppressed);
    println!(
        "final drift:        {:+.3}s",
        timing.position() - player.position()
    );
    Ok(())
}
