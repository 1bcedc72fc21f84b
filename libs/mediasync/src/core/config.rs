// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Connector Configuration
//!
//! Everything an embedder can tune about a connection. Runtime handles (the
//! clock and the diagnostic callback) are not configuration and are passed to
//! the connector builder instead.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SyncError};
use crate::core::guard::DEFAULT_ECHO_GRACE;
use crate::core::sync::DEFAULT_SYNC_TOLERANCE_SECS;

/// Upper bound on `echo_grace_ms`.
pub const MAX_ECHO_GRACE_MS: u64 = 60_000;

/// Control direction of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Player playback is slaved to the timing object.
    #[default]
    #[serde(alias = "viewer")]
    Follower,
    /// Timing object vector is slaved to player playback.
    Controller,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Follower => f.write_str("follower"),
            Role::Controller => f.write_str("controller"),
        }
    }
}

impl FromStr for Role {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "follower" | "viewer" => Ok(Role::Follower),
            "controller" => Ok(Role::Controller),
            other => Err(SyncError::Configuration(format!(
                "unknown role '{}', expected 'follower' or 'controller'",
                other
            ))),
        }
    }
}

/// Configuration for a [`TimingConnector`](crate::TimingConnector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub role: Role,

    /// Drift (seconds) below which no seek or position update is issued.
    pub tolerance: f64,

    /// How long an unmatched echo expectation stays live, in milliseconds.
    pub echo_grace_ms: u64,

    /// Hand negative velocities to the player as negative rates instead of
    /// their magnitude. Only for players that support reverse playback.
    pub signed_rate: bool,

    /// When the player refuses to start (autoplay policy), mute and retry.
    pub autoplay_muted: bool,

    /// Follower only: periodically correct small drift by nudging the rate.
    pub drift_correction: bool,

    /// Drift (seconds) beyond which drift correction seeks instead of nudging.
    pub max_drift: f64,

    /// Largest rate offset drift correction applies.
    pub max_rate_adjustment: f64,

    /// Time (seconds) drift correction aims to catch up within.
    pub max_catch_up: f64,

    /// Lower bound (seconds) on the drift check period.
    pub min_check_interval: f64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            role: Role::Follower,
            tolerance: DEFAULT_SYNC_TOLERANCE_SECS,
            echo_grace_ms: DEFAULT_ECHO_GRACE.as_millis() as u64,
            signed_rate: false,
            autoplay_muted: true,
            drift_correction: true,
            max_drift: 1.0,
            max_rate_adjustment: 0.2,
            max_catch_up: 1.0,
            min_check_interval: 0.1,
        }
    }
}

impl From<Role> for ConnectorConfig {
    fn from(role: Role) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }
}

impl ConnectorConfig {
    pub fn follower() -> Self {
        Role::Follower.into()
    }

    pub fn controller() -> Self {
        Role::Controller.into()
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: ConnectorConfig = toml::from_str(source)
            .map_err(|e| SyncError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SyncError::Configuration(e.to_string()))
    }

    pub fn echo_grace(&self) -> Duration {
        Duration::from_millis(self.echo_grace_ms)
    }

    /// Period of the follower's drift check.
    pub fn drift_check_interval(&self) -> Duration {
        let secs = self
            .max_catch_up
            .min(self.min_check_interval.max(self.max_drift));
        Duration::from_secs_f64(secs)
    }

    pub fn validate(&self) -> Result<()> {
        fn non_negative(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(SyncError::Configuration(format!(
                    "{} must be a finite, non-negative number of seconds (got {})",
                    name, value
                )))
            }
        }

        non_negative("tolerance", self.tolerance)?;
        non_negative("max_drift", self.max_drift)?;
        non_negative("max_rate_adjustment", self.max_rate_adjustment)?;
        non_negative("min_check_interval", self.min_check_interval)?;

        if self.echo_grace_ms > MAX_ECHO_GRACE_MS {
            return Err(SyncError::Configuration(format!(
                "echo_grace_ms must be at most {} (got {})",
                MAX_ECHO_GRACE_MS, self.echo_grace_ms
            )));
        }

        if !(self.max_catch_up.is_finite() && self.max_catch_up > 0.0) {
            return Err(SyncError::Configuration(format!(
                "max_catch_up must be positive (got {})",
                self.max_catch_up
            )));
        }
        if self.drift_correction && self.max_drift < self.tolerance {
            return Err(SyncError::Configuration(format!(
                "max_drift ({}) must not be below tolerance ({})",
                self.max_drift, self.tolerance
            )));
        }
        if self.drift_correction && self.drift_check_interval().is_zero() {
            return Err(SyncError::Configuration(
                "drift check interval resolves to zero".to_string(),
            ));
        }
        Ok(())
    }
}
