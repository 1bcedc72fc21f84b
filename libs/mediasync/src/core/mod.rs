// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

pub mod clocks;
pub mod config;
pub mod connector;
pub mod diagnostics;
pub mod endpoints;
pub mod error;
pub mod guard;
pub mod sim;
pub mod strategy;
pub mod sync;

pub use clocks::*;
pub use config::{ConnectorConfig, Role};
pub use connector::{TimingConnector, TimingConnectorBuilder};
pub use diagnostics::{Diagnostic, DiagnosticSink};
pub use endpoints::*;
pub use error::*;
pub use guard::{EchoToken, FeedbackGuard};
pub use strategy::ConnectorStats;
pub use sync::*;
