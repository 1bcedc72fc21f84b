// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Config file commands.

use std::path::Path;

use anyhow::{Context, Result};
use mediasync::{ConnectorConfig, Role};

pub fn load(path: &Path) -> Result<ConnectorConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    ConnectorConfig::from_toml_str(&source)
        .with_context(|| format!("Invalid connector config in {}", path.display()))
}

/// Validate the config at `path` and summarize it.
pub fn check(path: &Path, print: bool) -> Result<()> {
    let config = load(path)?;

    println!("{}: ok", path.display());
    println!("  role:       {}", config.role);
    println!("  tolerance:  {}s", config.tolerance);
    println!("  echo grace: {}ms", config.echo_grace_ms);
    if config.role == Role::Follower && config.drift_correction {
        println!(
            "  drift check every {:?} (seek beyond {}s)",
            config.drift_check_interval(),
            config.max_drift
        );
    }

    if print {
        println!();
        print!("{}", config.to_toml_string()?);
    }
    Ok(())
}
