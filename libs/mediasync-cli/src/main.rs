// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! mediasync CLI
//!
//! Runs connectors against simulated endpoints and exposes the embed helpers.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mediasync::Role;

mod commands;

#[derive(Parser)]
#[command(name = "mediasync")]
#[command(author, version, about = "Timing object / media player synchronization", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a connector between a simulated player and timing object
    Simulate {
        /// Connector role (follower or controller)
        #[arg(long)]
        role: Option<Role>,

        /// How long to run, in seconds
        #[arg(long, default_value_t = 8.0)]
        seconds: f64,

        /// State report interval, in milliseconds
        #[arg(long, default_value_t = 500)]
        tick_ms: u64,

        /// Connector config file (TOML)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Print the canonical vimeo.com URL for a video id or URL
    EmbedUrl {
        #[arg(value_name = "ID_OR_URL")]
        value: String,
    },

    /// Build VideoObject JSON-LD from video metadata (JSON)
    Markup {
        #[arg(value_name = "METADATA_FILE")]
        metadata: PathBuf,

        /// URL of the page embedding the video
        #[arg(long)]
        page_url: String,

        /// File holding the page's current JSON-LD, to merge with
        #[arg(long, value_name = "FILE")]
        existing: Option<PathBuf>,
    },

    /// Validate a connector config file
    CheckConfig {
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Print the config with defaults filled in
        #[arg(long)]
        print: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Simulate {
            role,
            seconds,
            tick_ms,
            config,
        } => {
            commands::simulate::run(role, seconds, tick_ms, config.as_deref()).await?;
        }
        Commands::EmbedUrl { value } => commands::embed::url(&value)?,
        Commands::Markup {
            metadata,
            page_url,
            existing,
        } => commands::embed::markup(&metadata, &page_url, existing.as_deref())?,
        Commands::CheckConfig { path, print } => commands::config::check(&path, print)?,
    }

    Ok(())
}
