// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Helpers for embedding a hosted player: canonical video URLs, accessor
//! naming and schema.org markup.

mod markup;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use markup::{
    Chapter, DEFAULT_THUMBNAIL, MIN_CHAPTER_DURATION_SECS, VideoObjectMetadata, video_object,
    video_object_markup,
};

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("An id or url must be passed")]
    MissingIdOrUrl,

    #[error("\"{0}\" is not a valid video id")]
    InvalidId(String),

    #[error("\"{0}\" is not a vimeo.com url")]
    NotVimeoUrl(String),

    #[error("Invalid page url: {0}")]
    InvalidPageUrl(#[from] url::ParseError),

    #[error("Failed to serialize markup: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Accessor name for `prop`: `("color", "get")` → `"getColor"`.
///
/// `kind` is matched case-insensitively; names that already carry the
/// prefix are returned unchanged.
pub fn method_name(prop: &str, kind: &str) -> String {
    let kind = kind.to_lowercase();
    if prop.starts_with(&kind) {
        return prop.to_string();
    }

    let mut chars = prop.chars();
    match chars.next() {
        Some(first) => format!("{kind}{}{}", first.to_uppercase(), chars.as_str()),
        None => kind,
    }
}

/// Whether `value` reads as a finite whole number (`"1"`, `"1.0"`, `" 42 "`).
pub fn is_integer_like(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .is_ok_and(|v| v.is_finite() && v.fract() == 0.0)
}

/// Whether `url` points at `vimeo.com`, `www.vimeo.com` or
/// `player.vimeo.com`, with or without an http(s) scheme.
pub fn is_vimeo_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https:")
        .or_else(|| url.strip_prefix("http:"))
        .unwrap_or(url);
    let Some(rest) = rest.strip_prefix("//") else {
        return false;
    };
    let host = rest
        .strip_prefix("player.")
        .or_else(|| rest.strip_prefix("www."))
        .unwrap_or(rest);

    match host.strip_prefix("vimeo.com") {
        Some(after) => after.is_empty() || after.starts_with('/'),
        None => false,
    }
}

/// What identifies the video to embed. `id` wins when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl EmbedParameters {
    pub fn id(id: impl ToString) -> Self {
        Self {
            id: Some(id.to_string()),
            url: None,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            id: None,
            url: Some(url.into()),
        }
    }

    /// Numeric input is an id, anything else a url.
    pub fn parse(value: &str) -> Self {
        if is_integer_like(value) {
            Self::id(value.trim())
        } else {
            Self::url(value)
        }
    }
}

/// Canonical `https` URL for the video described by `params`.
pub fn vimeo_url(params: &EmbedParameters) -> Result<String, EmbedError> {
    let id = params.id.as_deref().filter(|id| !id.is_empty());
    let url = params.url.as_deref().filter(|url| !url.is_empty());
    let Some(id_or_url) = id.or(url) else {
        return Err(EmbedError::MissingIdOrUrl);
    };

    if is_integer_like(id_or_url) {
        return Ok(format!("https://vimeo.com/{}", id_or_url.trim()));
    }
    if is_vimeo_url(id_or_url) {
        return Ok(id_or_url.replacen("http:", "https:", 1));
    }

    match id {
        Some(id) => Err(EmbedError::InvalidId(id.to_string())),
        None => Err(EmbedError::NotVimeoUrl(id_or_url.to_string())),
    }
}
