// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SyncError};

/// Default drift tolerance (seconds) below which no seek/update is issued.
pub const DEFAULT_SYNC_TOLERANCE_SECS: f64 = 0.3;

/// Two playback rates closer than this are considered equal.
pub const RATE_EPSILON: f64 = 1e-9;

/// Linear motion model of media time against real time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    /// Media position in seconds at `timestamp`.
    pub position: f64,
    /// Seconds of media time per real second. 0 means paused.
    pub velocity: f64,
    /// Real time (seconds) at which the vector was sampled.
    pub timestamp: f64,
}

impl Vector {
    pub fn new(position: f64, velocity: f64, timestamp: f64) -> Self {
        Self {
            position,
            velocity,
            timestamp,
        }
    }

    #[inline]
    pub fn extrapolate(&self, at_time: f64) -> f64 {
        extrapolate(self, at_time)
    }

    /// The same motion re-anchored at `at_time`.
    pub fn at(&self, at_time: f64) -> Vector {
        Vector::new(self.extrapolate(at_time), self.velocity, at_time)
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.velocity == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.timestamp.is_finite()
    }

    /// Reject vectors that cannot drive playback (NaN or infinite fields).
    pub fn validate(&self) -> Result<()> {
        if self.is_finite() {
            Ok(())
        } else {
            Err(SyncError::MalformedVector(format!(
                "position={} velocity={} timestamp={}",
                self.position, self.velocity, self.timestamp
            )))
        }
    }
}

/// Partial vector handed to a timing object's `update`.
///
/// Omitted fields keep their current (extrapolated) value; the timing object
/// stamps the result with its own notion of now.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
}

impl VectorUpdate {
    pub fn position(position: f64) -> Self {
        Self {
            position: Some(position),
            velocity: None,
        }
    }

    pub fn velocity(velocity: f64) -> Self {
        Self {
            position: None,
            velocity: Some(velocity),
        }
    }

    pub fn full(position: f64, velocity: f64) -> Self {
        Self {
            position: Some(position),
            velocity: Some(velocity),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.velocity.is_none()
    }

    /// Merge into `current` at real time `now`.
    pub fn apply_to(&self, current: &Vector, now: f64) -> Vector {
        Vector {
            position: self
                .position
                .unwrap_or_else(|| current.extrapolate(now)),
            velocity: self.velocity.unwrap_or(current.velocity),
            timestamp: now,
        }
    }
}

/// Readiness of the timing source. Anything that is not `Open` is `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    #[default]
    Closed,
    Open,
}

impl ReadyState {
    /// Map an external state name ("connecting", "closing", ...) onto the
    /// two states the connector distinguishes.
    pub fn from_external(state: &str) -> Self {
        if state.eq_ignore_ascii_case("open") {
            ReadyState::Open
        } else {
            ReadyState::Closed
        }
    }

    #[inline]
    pub fn is_open(self) -> bool {
        self == ReadyState::Open
    }
}

/// Player state as read in one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub current_time: f64,
    pub paused: bool,
    pub playback_rate: f64,
}

impl PlayerSnapshot {
    pub fn is_finite(&self) -> bool {
        self.current_time.is_finite() && self.playback_rate.is_finite()
    }

    pub fn to_vector(&self, now: f64) -> Vector {
        derive_vector_from_player(self.current_time, self.paused, self.playback_rate, now)
    }
}

/// A single mutation the follower applies to the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackAction {
    Seek(f64),
    SetRate(f64),
    Play,
    Pause,
}

#[inline]
pub fn extrapolate(vector: &Vector, at_time: f64) -> f64 {
    vector.position + vector.velocity * (at_time - vector.timestamp)
}

#[inline]
pub fn derive_vector_from_player(
    current_time: f64,
    paused: bool,
    playback_rate: f64,
    now: f64,
) -> Vector {
    Vector {
        position: current_time,
        velocity: if paused { 0.0 } else { playback_rate },
        timestamp: now,
    }
}

#[inline]
pub fn within_tolerance(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}

/// Rate the player must run at to follow `velocity`.
///
/// Without direction support the magnitude is used; reverse playback is the
/// sink's business.
#[inline]
pub fn playback_rate_for(velocity: f64, signed_rate: bool) -> f64 {
    if signed_rate { velocity } else { velocity.abs() }
}

/// Translate a timing vector into the player mutations that bring `player`
/// in line with it at real time `now`.
///
/// Position and motion are decided independently: a seek is only issued for
/// drift beyond `tolerance`, and play/pause/rate only when they disagree with
/// the vector's velocity.
pub fn playback_actions(
    target: &Vector,
    now: f64,
    player: &PlayerSnapshot,
    tolerance: f64,
    signed_rate: bool,
) -> Vec<PlaybackAction> {
    let mut actions = Vec::with_capacity(3);

    let position = target.extrapolate(now);
    if !within_tolerance(position, player.current_time, tolerance) {
        actions.push(PlaybackAction::Seek(position));
    }

    if target.is_paused() {
        if !player.paused {
            actions.push(PlaybackAction::Pause);
        }
    } else {
        let rate = playback_rate_for(target.velocity, signed_rate);
        if !within_tolerance(rate, player.playback_rate, RATE_EPSILON) {
            actions.push(PlaybackAction::SetRate(rate));
        }
        if player.paused {
            actions.push(PlaybackAction::Play);
        }
    }

    actions
}

/// Decide what (if anything) to publish into the timing object so that it
/// mirrors `derived` (the player's state).
///
/// `rate_only` restricts the position write to drift beyond `tolerance`;
/// `force` publishes the full vector regardless.
pub fn timing_update(
    existing: &Vector,
    derived: &Vector,
    tolerance: f64,
    rate_only: bool,
    force: bool,
) -> Option<VectorUpdate> {
    if force {
        return Some(VectorUpdate::full(derived.position, derived.velocity));
    }

    let expected = existing.extrapolate(derived.timestamp);
    let drifted = !within_tolerance(expected, derived.position, tolerance);
    let velocity_changed = !within_tolerance(existing.velocity, derived.velocity, RATE_EPSILON);

    let update = if rate_only {
        VectorUpdate {
            position: drifted.then_some(derived.position),
            velocity: velocity_changed.then_some(derived.velocity),
        }
    } else if drifted || velocity_changed {
        VectorUpdate::full(derived.position, derived.velocity)
    } else {
        VectorUpdate::default()
    };

    (!update.is_empty()).then_some(update)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(current_time: f64, rate: f64) -> PlayerSnapshot {
        PlayerSnapshot {
            current_time,
            paused: false,
            playback_rate: rate,
        }
    }

    fn paused(current_time: f64) -> PlayerSnapshot {
        PlayerSnapshot {
            current_time,
            paused: true,
            playback_rate: 1.0,
        }
    }

    #[test]
    fn test_extrapolate() {
        let v = Vector::new(10.0, 1.0, 100.0);
        assert_eq!(extrapolate(&v, 100.0), 10.0);
        assert_eq!(extrapolate(&v, 102.5), 12.5);

        let reverse = Vector::new(10.0, -2.0, 0.0);
        assert_eq!(reverse.extrapolate(1.0), 8.0);

        let stopped = Vector::new(7.0, 0.0, 0.0);
        assert_eq!(stopped.extrapolate(1_000.0), 7.0);
    }

    #[test]
    fn test_reanchor_keeps_motion() {
        let v = Vector::new(3.0, 2.0, 1.0);
        let moved = v.at(4.0);
        assert_eq!(moved, Vector::new(9.0, 2.0, 4.0));
        assert_eq!(moved.extrapolate(5.0), v.extrapolate(5.0));
    }

    #[test]
    fn test_derive_vector_from_player() {
        let v = derive_vector_from_player(20.0, false, 2.0, 5.0);
        assert_eq!(v, Vector::new(20.0, 2.0, 5.0));

        let v = derive_vector_from_player(20.0, true, 2.0, 5.0);
        assert_eq!(v.velocity, 0.0);
        assert!(v.is_paused());
    }

    #[test]
    fn test_within_tolerance() {
        assert!(within_tolerance(1.0, 1.2, 0.3));
        assert!(within_tolerance(1.2, 1.0, 0.3));
        assert!(within_tolerance(1.0, 1.25, 0.25));
        assert!(!within_tolerance(1.0, 1.31, 0.3));
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert!(Vector::new(1.0, 1.0, 0.0).validate().is_ok());
        assert!(Vector::new(f64::NAN, 1.0, 0.0).validate().is_err());
        assert!(matches!(
            Vector::new(1.0, f64::INFINITY, 0.0).validate(),
            Err(SyncError::MalformedVector(_))
        ));
    }

    #[test]
    fn test_update_keeps_position_continuous() {
        let current = Vector::new(10.0, 1.0, 0.0);

        let rate_only = VectorUpdate::velocity(2.0).apply_to(&current, 5.0);
        assert_eq!(rate_only, Vector::new(15.0, 2.0, 5.0));

        let jump = VectorUpdate::position(3.0).apply_to(&current, 5.0);
        assert_eq!(jump, Vector::new(3.0, 1.0, 5.0));
    }

    #[test]
    fn test_ready_state_from_external() {
        assert_eq!(ReadyState::from_external("open"), ReadyState::Open);
        assert_eq!(ReadyState::from_external("OPEN"), ReadyState::Open);
        assert_eq!(ReadyState::from_external("connecting"), ReadyState::Closed);
        assert_eq!(ReadyState::from_external("closing"), ReadyState::Closed);
    }

    #[test]
    fn test_follow_from_paused_player() {
        let target = Vector::new(10.0, 1.0, 0.0);
        let actions = playback_actions(&target, 0.0, &paused(0.0), 0.3, false);
        assert_eq!(actions, vec![PlaybackAction::Seek(10.0), PlaybackAction::Play]);
    }

    #[test]
    fn test_zero_velocity_pauses_without_seek_inside_tolerance() {
        let target = Vector::new(10.0, 0.0, 0.0);
        let actions = playback_actions(&target, 3.0, &playing(10.1, 1.0), 0.3, false);
        assert_eq!(actions, vec![PlaybackAction::Pause]);
    }

    #[test]
    fn test_in_sync_player_needs_nothing() {
        let target = Vector::new(10.0, 1.0, 0.0);
        let actions = playback_actions(&target, 2.0, &playing(12.0, 1.0), 0.3, false);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_rate_follows_velocity_magnitude() {
        let target = Vector::new(10.0, -2.0, 0.0);
        let actions = playback_actions(&target, 0.0, &playing(10.0, 1.0), 0.3, false);
        assert_eq!(actions, vec![PlaybackAction::SetRate(2.0)]);

        let actions = playback_actions(&target, 0.0, &playing(10.0, 1.0), 0.3, true);
        assert_eq!(actions, vec![PlaybackAction::SetRate(-2.0)]);
    }

    #[test]
    fn test_timing_update_mirrors_player() {
        let existing = Vector::new(0.0, 0.0, 0.0);
        let derived = Vector::new(20.0, 2.0, 0.0);
        assert_eq!(
            timing_update(&existing, &derived, 0.3, false, false),
            Some(VectorUpdate::full(20.0, 2.0))
        );
    }

    #[test]
    fn test_timing_update_rate_only_skips_position() {
        let existing = Vector::new(20.0, 2.0, 0.0);
        let derived = Vector::new(20.1, 1.0, 0.0);
        assert_eq!(
            timing_update(&existing, &derived, 0.3, true, false),
            Some(VectorUpdate::velocity(1.0))
        );
    }

    #[test]
    fn test_timing_update_nothing_to_do() {
        let existing = Vector::new(20.0, 1.0, 0.0);
        let derived = Vector::new(25.0, 1.0, 5.0);
        assert_eq!(timing_update(&existing, &derived, 0.3, false, false), None);
        assert_eq!(
            timing_update(&existing, &derived, 0.3, false, true),
            Some(VectorUpdate::full(25.0, 1.0))
        );
    }
}
