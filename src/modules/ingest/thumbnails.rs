use rand::Rng;
use tracing::debug;

use crate::common::data_uri;
use crate::infrastructure::media::{FrameSurface, MediaError};

pub const THUMBNAIL_COUNT: usize = 6;
pub const JPEG_QUALITY: f32 = 0.8;

/// Seek position for capture `index`: evenly spaced, nudged by a tenth of
/// `offset_percent`, and kept at least a second before the end.
pub fn seek_time(duration: f64, index: usize, offset_percent: u32) -> f64 {
    let base = duration / THUMBNAIL_COUNT as f64 * index as f64;
    let jitter = duration * (offset_percent as f64 / 100.0) * 0.1;
    (base + jitter).min(duration - 1.0).max(0.0)
}

/// One of 0, 10, ..., 90.
pub fn random_offset() -> u32 {
    rand::rng().random_range(0..10u32) * 10
}

/// Captures [`THUMBNAIL_COUNT`] JPEG data URIs from `surface`, one seek at a time.
pub async fn sample_frames(
    surface: &mut dyn FrameSurface,
    offset_percent: u32,
) -> Result<Vec<String>, MediaError> {
    let duration = surface.duration();
    if !duration.is_finite() || duration <= 0.0 {
        return Err(MediaError::NoDuration);
    }

    let (width, height) = surface.native_size();
    surface.resize_canvas(width, height);

    let mut candidates = Vec::with_capacity(THUMBNAIL_COUNT);
    for index in 0..THUMBNAIL_COUNT {
        let at = seek_time(duration, index, offset_percent);
        debug!("Thumbnail {}/{} at {:.2}s", index + 1, THUMBNAIL_COUNT, at);

        surface.seek(at).await?;
        let jpeg = surface.capture_jpeg(JPEG_QUALITY).await?;
        candidates.push(data_uri::encode("image/jpeg", &jpeg));
    }

    Ok(candidates)
}
