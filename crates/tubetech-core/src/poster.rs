//! Poster resolution
//!
//! The default thumbnail (`0.jpg`) always exists but is small. The
//! `maxresdefault.jpg` variant only exists for some videos, and a missing
//! one is served as a 120x90 placeholder rather than an error, so the probe
//! has to look at the decoded size.

use serde::{Deserialize, Serialize};

/// Thumbnail host
pub const THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

/// Size of the placeholder served for missing thumbnails
pub const PLACEHOLDER_SIZE: ImageSize = ImageSize {
    width: 120,
    height: 90,
};

/// Decoded image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when strictly larger than the missing-thumbnail placeholder
    pub fn exceeds_placeholder(&self) -> bool {
        self.width > PLACEHOLDER_SIZE.width && self.height > PLACEHOLDER_SIZE.height
    }
}

/// Why a probe produced no image
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("image failed to load: {0}")]
    Load(String),
    #[error("image loader unavailable")]
    Unavailable,
}

/// Callback receiving the probe outcome
pub type ProbeCallback = Box<dyn FnOnce(Result<ImageSize, ProbeError>)>;

/// Loads an image out of band and reports its decoded size
///
/// Implementations may complete synchronously or later; they must call
/// `done` at most once.
pub trait ImageProbe {
    fn probe(&self, url: &str, done: ProbeCallback);
}

/// Default low resolution thumbnail
pub fn default_poster_url(video_id: &str) -> String {
    format!("{}/{}/0.jpg", THUMBNAIL_BASE, video_id)
}

/// High resolution thumbnail candidate
pub fn high_res_poster_url(video_id: &str) -> String {
    format!("{}/{}/maxresdefault.jpg", THUMBNAIL_BASE, video_id)
}

/// Decide whether a probe outcome upgrades the poster
pub fn accept_high_res(outcome: &Result<ImageSize, ProbeError>) -> bool {
    matches!(outcome, Ok(size) if size.exceeds_placeholder())
}

/// Probe that never loads anything, for hosts without image support
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProbe;

impl ImageProbe for NoopProbe {
    fn probe(&self, _url: &str, done: ProbeCallback) {
        done(Err(ProbeError::Unavailable));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        assert_eq!(
            default_poster_url("abc12345678"),
            "https://img.youtube.com/vi/abc12345678/0.jpg"
        );
        assert_eq!(
            high_res_poster_url("abc12345678"),
            "https://img.youtube.com/vi/abc12345678/maxresdefault.jpg"
        );
    }

    #[test]
    fn test_threshold() {
        assert!(accept_high_res(&Ok(ImageSize::new(1280, 720))));
        assert!(!accept_high_res(&Ok(ImageSize::new(120, 90))));
        assert!(!accept_high_res(&Ok(ImageSize::new(640, 90))));
        assert!(!accept_high_res(&Ok(ImageSize::new(120, 480))));
        assert!(!accept_high_res(&Err(ProbeError::Load("404".into()))));
    }

    #[test]
    fn test_noop_probe_reports_unavailable() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        NoopProbe.probe(
            "https://img.youtube.com/vi/x/maxresdefault.jpg",
            Box::new(move |outcome| *sink.borrow_mut() = Some(outcome)),
        );
        assert_eq!(*seen.borrow(), Some(Err(ProbeError::Unavailable)));
    }
}
