//! Media decoding seams.
//!
//! The ingest workflow never talks to ffmpeg directly: it probes durations
//! through [`MediaProbe`] and draws candidate frames on a [`FrameSurface`].

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub mod ffmpeg;

pub use ffmpeg::{FfmpegSurface, FfprobeProbe, VideoMetadata};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed: {stderr}")]
    Failed { program: String, stderr: String },

    #[error("Unreadable media metadata: {0}")]
    Parse(String),

    #[error("Seek to {0:.3}s is outside the video")]
    InvalidSeek(f64),

    #[error("Video has no decodable duration")]
    NoDuration,
}

#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Duration of the media file in seconds.
    async fn duration(&self, path: &Path) -> Result<f64, MediaError>;
}

/// A video decoder paired with a single-buffered drawing canvas.
///
/// Only one wait may be pending at a time: `seek` must resolve before the
/// next `seek` or `capture_jpeg`. Borrowing the surface `&mut` for a whole
/// sampling pass enforces that.
#[async_trait]
pub trait FrameSurface: Send {
    fn duration(&self) -> f64;

    fn native_size(&self) -> (u32, u32);

    fn resize_canvas(&mut self, width: u32, height: u32);

    /// Resolves once the decoder has settled on `seconds`.
    async fn seek(&mut self, seconds: f64) -> Result<(), MediaError>;

    /// Draws the current frame onto the canvas and encodes it as JPEG.
    async fn capture_jpeg(&mut self, quality: f32) -> Result<Vec<u8>, MediaError>;
}
