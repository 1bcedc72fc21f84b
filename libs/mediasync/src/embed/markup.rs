// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! schema.org `VideoObject` JSON-LD for an embedded video.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use super::EmbedError;

/// Videos shorter than this get no key moments (chapters).
pub const MIN_CHAPTER_DURATION_SECS: f64 = 30.0;

pub const DEFAULT_THUMBNAIL: &str = "https://i.vimeocdn.com/portrait/default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub title: String,
    pub start_time: f64,
}

/// Metadata the hosted player reports for the current video or clip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoObjectMetadata {
    pub title: String,
    pub description: String,
    pub author: Option<String>,
    /// Seconds.
    pub duration: f64,
    pub embed_url: String,
    pub thumbnail_url: Option<String>,
    /// Base for sized thumbnails; `_640` is appended.
    pub thumbs_base_url: Option<String>,
    pub upload_date: String,
    pub chapters: Vec<Chapter>,
}

impl VideoObjectMetadata {
    fn thumbnail(&self) -> String {
        match (&self.thumbnail_url, &self.thumbs_base_url) {
            (Some(url), _) => url.clone(),
            (None, Some(base)) => format!("{base}_640"),
            (None, None) => DEFAULT_THUMBNAIL.to_string(),
        }
    }

    fn description(&self) -> String {
        match &self.author {
            Some(author) if self.description.trim().is_empty() => format!(
                "This is \"{}\" by {author} on Vimeo, the home for high quality videos and the people who love them.",
                self.title
            ),
            _ => self.description.clone(),
        }
    }

    fn has_key_moments(&self) -> bool {
        !self.chapters.is_empty() && self.duration > MIN_CHAPTER_DURATION_SECS
    }
}

/// Whole numbers serialize without a fractional part.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// The `VideoObject` for `metadata`, with `hasPart` clips linking back into
/// `page_url` when `with_chapters` is set and the video qualifies.
pub fn video_object(
    metadata: &VideoObjectMetadata,
    page_url: &str,
    with_chapters: bool,
) -> Result<Value, EmbedError> {
    let mut object = json!({
        "@context": "http://schema.org",
        "@type": "VideoObject",
        "name": metadata.title,
        "duration": format!("PT{}S", metadata.duration),
        "description": metadata.description(),
        "uploadDate": metadata.upload_date,
        "embedUrl": metadata.embed_url,
        "thumbnailUrl": metadata.thumbnail(),
    });

    if with_chapters && metadata.has_key_moments() {
        let page = Url::parse(page_url)?;
        let chapters = &metadata.chapters;

        let parts = chapters
            .iter()
            .enumerate()
            .map(|(i, chapter)| {
                let end = chapters
                    .get(i + 1)
                    .map_or(metadata.duration, |next| next.start_time);
                let mut url = page.clone();
                url.query_pairs_mut()
                    .append_pair("vimeo_t", &chapter.start_time.to_string());

                json!({
                    "name": chapter.title,
                    "startOffset": number(chapter.start_time),
                    "endOffset": number(end),
                    "@type": "Clip",
                    "url": url.as_str(),
                })
            })
            .collect::<Vec<_>>();

        if let Value::Object(map) = &mut object {
            map.insert("hasPart".to_string(), Value::Array(parts));
        }
    }

    Ok(object)
}

fn has_chapters(item: &Value) -> bool {
    item.as_object()
        .is_some_and(|object| object.contains_key("hasPart"))
}

/// JSON-LD text for a page's `application/ld+json` script: `existing`
/// microdata (an array or a single object) followed by this video's
/// `VideoObject`.
///
/// Only one video per page carries chapters, so they are left out when the
/// existing microdata already has some. Unparseable existing markup is
/// replaced.
pub fn video_object_markup(
    metadata: &VideoObjectMetadata,
    page_url: &str,
    existing: Option<&str>,
) -> Result<String, EmbedError> {
    let mut items = match existing.map(serde_json::from_str::<Value>) {
        None => Vec::new(),
        Some(Ok(Value::Array(items))) => items,
        Some(Ok(item)) => vec![item],
        Some(Err(err)) => {
            tracing::warn!(error = %err, "discarding unparseable structured data");
            Vec::new()
        }
    };

    let with_chapters = !items.iter().any(has_chapters);
    items.push(video_object(metadata, page_url, with_chapters)?);

    Ok(serde_json::to_string(&Value::Array(items))?)
}
