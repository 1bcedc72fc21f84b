// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Embed helper commands.

use std::path::Path;

use anyhow::{Context, Result};
use mediasync::embed::{VideoObjectMetadata, video_object_markup};
use mediasync::{EmbedParameters, vimeo_url};

/// Print the canonical URL for `value`.
pub fn url(value: &str) -> Result<()> {
    let url = vimeo_url(&EmbedParameters::parse(value))?;
    println!("{}", url);
    Ok(())
}

/// Print the JSON-LD for the metadata in `metadata_path`, merged with the
/// markup in `existing` if given.
pub fn markup(metadata_path: &Path, page_url: &str, existing: Option<&Path>) -> Result<()> {
    let source = std::fs::read_to_string(metadata_path)
        .with_context(|| format!("Failed to read {}", metadata_path.display()))?;
    let metadata: VideoObjectMetadata = serde_json::from_str(&source)
        .with_context(|| format!("Invalid video metadata in {}", metadata_path.display()))?;

    let existing = existing
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .transpose()?;

    let markup = video_object_markup(&metadata, page_url, existing.as_deref())?;
    println!("{}", markup);
    Ok(())
}
