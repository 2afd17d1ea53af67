//! Source URL resolution
//!
//! Extracts the video id, playlist id and optional start/end offsets from
//! the many URL shapes YouTube hands out:
//! - `https://youtu.be/<id>`
//! - `https://www.youtube.com/watch?v=<id>&list=<list>`
//! - `https://www.youtube.com/embed/<id>`
//! - `https://www.youtube.com/v/<id>` and `/u/<x>/<id>`
//! - anything carrying `&v=<id>`

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Length of every valid video id
pub const VIDEO_ID_LEN: usize = 11;

/// MIME type the tech claims
pub const SOURCE_TYPE: &str = "video/youtube";

// The leading greedy `.*` makes the last marker in the string win.
static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").expect("valid regex")
});

static LIST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]list=([^#&?]+)").expect("valid regex"));

static START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[?&#])start=([0-9]+)").expect("valid regex"));

static END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[?&#])end=([0-9]+)").expect("valid regex"));

/// Identifiers resolved from a source string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLocator {
    /// Video id, `None` when the source is malformed
    pub video_id: Option<String>,
    /// Playlist id from the `list` parameter
    pub list_id: Option<String>,
    /// `start=` offset in seconds
    pub start: Option<u32>,
    /// `end=` offset in seconds
    pub end: Option<u32>,
}

impl ResourceLocator {
    /// Parse a source string. Never fails; unknown shapes yield no ids.
    pub fn parse(src: &str) -> Self {
        let video_id = VIDEO_ID_RE
            .captures(src)
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str())
            .filter(|id| id.chars().count() == VIDEO_ID_LEN)
            .map(str::to_string);

        let list_id = LIST_ID_RE
            .captures(src)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        Self {
            video_id,
            list_id,
            start: capture_seconds(&START_RE, src),
            end: capture_seconds(&END_RE, src),
        }
    }

    /// True when a video id was resolved
    pub fn is_playable(&self) -> bool {
        self.video_id.is_some()
    }

    /// Canonical watch URL. Re-parsing it yields the same video and list ids.
    pub fn canonical_url(&self) -> Option<String> {
        let id = self.video_id.as_deref()?;
        let mut url = format!("https://www.youtube.com/watch?v={}", id);
        if let Some(list) = &self.list_id {
            url.push_str("&list=");
            url.push_str(list);
        }
        Some(url)
    }
}

fn capture_seconds(re: &Regex, src: &str) -> Option<u32> {
    re.captures(src)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whether the tech can play a source of the given MIME type
pub fn can_play_type(mime: &str) -> bool {
    mime == SOURCE_TYPE
}
