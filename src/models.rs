//! Records passed between the collector stages.
//!
//! `FormattedSnapshot` is the only shape that reaches disk; everything else
//! lives for the duration of a single run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A video id produced by the channel listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoRef {
    pub id: String,
}

impl VideoRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One page of the channel listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub videos: Vec<VideoRef>,
    pub next_page_token: Option<String>,
}

/// A single thumbnail rendition (`default`, `medium`, `high`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

pub type Thumbnails = BTreeMap<String, Thumbnail>;

/// Statistics and snippet fields of one video as returned by the API.
///
/// Counts are optional because the platform hides them for some videos
/// (likes disabled, premieres).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStatRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub published_at: String,
    pub thumbnails: Thumbnails,
}

/// Persisted per-video entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedVideo {
    pub title: String,
    pub description: String,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub published: String,
    pub thumbnails: Thumbnails,
}

/// Complete output of one run, keyed by video id.
pub type FormattedSnapshot = BTreeMap<String, FormattedVideo>;
