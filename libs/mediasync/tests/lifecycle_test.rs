// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Connector lifecycle: readiness gating, construction, teardown.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::{Harness, assert_close, config, settle};
use mediasync::{
    Clock, ConnectorConfig, Diagnostic, Player, PlayerEvent, Role, SimPlayer, SyncError,
    TimingConnector, TimingEvent, TimingObject, Vector, VectorUpdate,
};
use parking_lot::Mutex;

#[tokio::test(start_paused = true)]
async fn test_nothing_happens_until_open() {
    let h = Harness::new(10.0, 1.0, false);
    let connector = h.connect(config(Role::Follower)).unwrap();
    settle().await;

    assert!(!connector.is_active());
    assert_eq!(connector.stats().passes, 0);
    assert!(h.player.is_paused());
    assert_eq!(h.player.total_listeners(), 0);
    assert_eq!(h.timing.listener_count(TimingEvent::ReadyStateChange), 1);
    assert_eq!(h.timing.listener_count(TimingEvent::Change), 0);

    h.timing.open();
    settle().await;

    assert!(connector.is_active());
    assert_close(h.player.position(), 10.0);
    assert!(!h.player.is_paused());
}

#[tokio::test(start_paused = true)]
async fn test_close_suspends_and_reopen_resyncs() {
    let h = Harness::new(10.0, 1.0, true);
    let connector = h.connect(config(Role::Follower)).unwrap();
    settle().await;
    assert_eq!(h.player.total_listeners(), 4);

    h.timing.close();
    settle().await;
    assert!(!connector.is_active());
    assert_eq!(h.player.total_listeners(), 0);
    assert_eq!(h.timing.listener_count(TimingEvent::Change), 0);

    // Changes while closed are not acted on.
    h.timing.set_vector(Vector::new(50.0, 1.0, h.clock.now_secs()));
    h.player.pause().await.unwrap();
    settle().await;
    assert!(h.player.is_paused());
    assert_close(h.player.position(), 10.0);

    h.timing.open();
    settle().await;
    assert!(connector.is_active());
    assert_close(h.player.position(), 50.0);
    assert!(!h.player.is_paused());
}

#[tokio::test(start_paused = true)]
async fn test_controller_idle_while_closed() {
    let h = Harness::new(0.0, 0.0, false);
    h.player.play().await.unwrap();
    let connector = h.connect(config(Role::Controller)).unwrap();

    h.player.set_current_time(30.0).await.unwrap();
    settle().await;
    assert_eq!(connector.stats().writes, 0);
    assert_eq!(h.timing.query().position, 0.0);

    h.timing.open();
    settle().await;
    assert_close(h.timing.position(), 30.0);
    assert_eq!(h.timing.velocity(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_removes_everything_and_is_idempotent() {
    let h = Harness::new(10.0, 1.0, true);
    let connector = h.connect(config(Role::Follower)).unwrap();
    settle().await;
    assert_eq!(h.timing.total_listeners(), 2);

    connector.disconnect();
    connector.disconnect();
    assert!(connector.is_disconnected());
    assert!(!connector.is_active());
    assert_eq!(h.player.total_listeners(), 0);
    assert_eq!(h.timing.total_listeners(), 0);

    // Endpoints are left as they were, and no longer linked.
    h.timing.update(VectorUpdate::position(99.0)).await.unwrap();
    settle().await;
    assert_close(h.player.position(), 10.0);
    assert!(!h.player.is_paused());

    // Reopening after disconnect does not resurrect the link.
    h.timing.close();
    h.timing.open();
    settle().await;
    assert!(!connector.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_drop_disconnects() {
    let h = Harness::new(10.0, 1.0, true);
    let connector = h.connect(config(Role::Controller)).unwrap();
    settle().await;
    assert!(h.player.total_listeners() > 0);

    drop(connector);
    assert_eq!(h.player.total_listeners(), 0);
    assert_eq!(h.timing.total_listeners(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_from_inside_a_handler() {
    let h = Harness::new(10.0, 1.0, true);
    let slot: Arc<Mutex<Option<Arc<TimingConnector>>>> = Arc::new(Mutex::new(None));

    // Registered first, so it runs before the connector's own listener.
    let handler_slot = slot.clone();
    h.timing
        .subscribe(
            TimingEvent::Change,
            Arc::new(move |_: TimingEvent| {
                if let Some(connector) = handler_slot.lock().as_ref() {
                    connector.disconnect();
                }
            }),
        )
        .unwrap();

    let connector = Arc::new(h.connect(config(Role::Follower)).unwrap());
    *slot.lock() = Some(connector.clone());
    settle().await;
    assert_close(h.player.position(), 10.0);

    h.timing.update(VectorUpdate::position(80.0)).await.unwrap();
    settle().await;

    assert!(connector.is_disconnected());
    assert_close(h.player.position(), 10.0);
    assert_eq!(h.player.total_listeners(), 0);
    // Only the embedder's own handler remains.
    assert_eq!(h.timing.total_listeners(), 1);

    slot.lock().take();
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_from_a_handler_fired_by_own_write() {
    let h = Harness::new(10.0, 1.0, false);
    let slot: Arc<Mutex<Option<Arc<TimingConnector>>>> = Arc::new(Mutex::new(None));

    let handler_slot = slot.clone();
    h.player
        .subscribe(
            PlayerEvent::Seeked,
            Arc::new(move |_: PlayerEvent| {
                if let Some(connector) = handler_slot.lock().as_ref() {
                    connector.disconnect();
                }
            }),
        )
        .unwrap();

    let connector = Arc::new(h.connect(config(Role::Follower)).unwrap());
    *slot.lock() = Some(connector.clone());

    // The opening pass seeks, and the seek's handler disconnects before the
    // pass gets to start playback.
    h.timing.open();
    settle().await;

    assert!(connector.is_disconnected());
    assert_close(h.player.position(), 10.0);
    assert!(h.player.is_paused());
    assert_eq!(connector.stats().writes, 1);
    assert_eq!(h.player.total_listeners(), 1);
    assert_eq!(h.timing.total_listeners(), 0);

    slot.lock().take();
}

#[tokio::test(start_paused = true)]
async fn test_close_during_a_pass_stops_it() {
    let h = Harness::new(10.0, 1.0, false);
    let closed_once = Arc::new(AtomicBool::new(false));

    let timing = h.timing.clone();
    let flag = closed_once.clone();
    h.player
        .subscribe(
            PlayerEvent::Seeked,
            Arc::new(move |_: PlayerEvent| {
                if !flag.swap(true, Ordering::SeqCst) {
                    timing.close();
                }
            }),
        )
        .unwrap();

    let connector = h.connect(config(Role::Follower)).unwrap();
    h.timing.open();
    settle().await;

    assert!(closed_once.load(Ordering::SeqCst));
    assert!(!connector.is_active());
    assert!(h.player.is_paused());
    assert_eq!(connector.stats().writes, 1);

    h.timing.open();
    settle().await;
    assert!(connector.is_active());
    assert!(!h.player.is_paused());
    assert_close(h.player.position(), 10.0);
}

#[tokio::test(start_paused = true)]
async fn test_connectors_sharing_a_timing_object_are_independent() {
    let h = Harness::new(10.0, 1.0, true);
    let other = Arc::new(SimPlayer::new(h.clock.clone()));

    let first = h.connect(config(Role::Follower)).unwrap();
    let second = TimingConnector::builder(other.clone(), h.timing.clone())
        .config(config(Role::Follower))
        .clock(h.clock.clone())
        .connect()
        .unwrap();
    settle().await;

    assert_close(h.player.position(), 10.0);
    assert_close(other.position(), 10.0);
    assert_eq!(h.timing.total_listeners(), 4);

    first.disconnect();
    assert!(second.is_active());
    assert_eq!(h.player.total_listeners(), 0);
    assert_eq!(other.total_listeners(), 4);
    assert_eq!(h.timing.total_listeners(), 2);

    h.timing.update(VectorUpdate::position(40.0)).await.unwrap();
    settle().await;
    assert_close(other.position(), 40.0);
    assert_close(h.player.position(), 10.0);

    drop(second);
    assert_eq!(other.total_listeners(), 0);
    assert_eq!(h.timing.total_listeners(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_construction_is_all_or_nothing() {
    let h = Harness::new(10.0, 1.0, true);
    h.player.reject_subscriptions(Some(PlayerEvent::Seeked));

    let err = h.connect(config(Role::Follower)).err().unwrap();
    assert!(matches!(
        err,
        SyncError::Subscribe {
            endpoint: "player",
            event: "seeked",
            ..
        }
    ));
    assert_eq!(h.player.total_listeners(), 0);
    assert_eq!(h.timing.total_listeners(), 0);
    assert!(h.player.is_paused());
}

#[tokio::test(start_paused = true)]
async fn test_readiness_subscription_failure() {
    let h = Harness::new(10.0, 1.0, false);
    h.timing
        .reject_subscriptions(Some(TimingEvent::ReadyStateChange));

    let err = h.connect(config(Role::Controller)).err().unwrap();
    assert!(matches!(
        err,
        SyncError::Subscribe {
            event: "readystatechange",
            ..
        }
    ));
    assert_eq!(h.timing.total_listeners(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_activation_failure_after_open_is_reported() {
    let h = Harness::new(10.0, 1.0, false);
    let connector = h.connect(config(Role::Follower)).unwrap();
    h.player.reject_subscriptions(Some(PlayerEvent::Pause));

    h.timing.open();
    settle().await;

    assert!(!connector.is_active());
    assert_eq!(h.player.total_listeners(), 0);
    assert!(matches!(
        h.failures().as_slice(),
        [Diagnostic::SubscribeFailed { event: "pause", .. }]
    ));

    // The next open attempt succeeds once the player accepts listeners.
    h.player.reject_subscriptions(None);
    h.timing.close();
    h.timing.open();
    settle().await;
    assert!(connector.is_active());
    assert_close(h.player.position(), 10.0);
}

#[test]
fn test_connect_requires_a_runtime() {
    let h = Harness::new(0.0, 0.0, true);
    let err = h.connect(config(Role::Follower)).err().unwrap();
    assert!(matches!(err, SyncError::NoRuntime));
    assert_eq!(h.timing.total_listeners(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_config_rejected() {
    let h = Harness::new(0.0, 0.0, true);
    let err = h
        .connect(ConnectorConfig {
            tolerance: -1.0,
            ..ConnectorConfig::default()
        })
        .err()
        .unwrap();
    assert!(matches!(err, SyncError::Configuration(_)));
    assert_eq!(h.timing.total_listeners(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_runtime_handle() {
    let h = Harness::new(5.0, 1.0, true);
    let connector = TimingConnector::builder(h.player.clone(), h.timing.clone())
        .config(config(Role::Follower))
        .clock(h.clock.clone())
        .runtime(tokio::runtime::Handle::current())
        .connect()
        .unwrap();
    settle().await;

    assert!(connector.is_active());
    assert_close(h.player.position(), 5.0);
}
