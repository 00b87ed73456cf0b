use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use super::{FrameSurface, MediaError, MediaProbe};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl ProbeOutput {
    fn into_metadata(self) -> Result<VideoMetadata, MediaError> {
        let duration = self
            .format
            .and_then(|f| f.duration)
            .ok_or_else(|| MediaError::Parse("missing format duration".to_string()))?
            .parse::<f64>()
            .map_err(|e| MediaError::Parse(format!("duration: {}", e)))?;

        let (width, height) = self
            .streams
            .first()
            .and_then(|s| Some((s.width?, s.height?)))
            .unwrap_or((0, 0));

        Ok(VideoMetadata { duration, width, height })
    }
}

async fn run(program: &str, args: &[&str]) -> Result<Vec<u8>, MediaError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|source| MediaError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(MediaError::Failed {
            program: program.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output.stdout)
}

/// Reads duration and frame size with `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: String,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub async fn metadata(&self, path: &Path) -> Result<VideoMetadata, MediaError> {
        let path = path.to_string_lossy().to_string();
        let stdout = run(
            &self.program,
            &[
                "-v", "error",
                "-select_streams", "v:0",
                "-show_entries", "format=duration:stream=width,height",
                "-of", "json",
                path.as_str(),
            ],
        )
        .await?;

        let parsed: ProbeOutput =
            serde_json::from_slice(&stdout).map_err(|e| MediaError::Parse(e.to_string()))?;
        parsed.into_metadata()
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn duration(&self, path: &Path) -> Result<f64, MediaError> {
        Ok(self.metadata(path).await?.duration)
    }
}

/// Frame surface backed by one `ffmpeg` invocation per capture.
///
/// `seek` only validates and records the position; the decode happens in
/// `capture_jpeg`, which always reads the most recently settled position.
#[derive(Debug)]
pub struct FfmpegSurface {
    program: String,
    path: PathBuf,
    metadata: VideoMetadata,
    canvas: (u32, u32),
    position: f64,
}

impl FfmpegSurface {
    pub async fn open(
        probe: &FfprobeProbe,
        ffmpeg: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Result<Self, MediaError> {
        let path = path.into();
        let metadata = probe.metadata(&path).await?;
        Ok(Self::with_metadata(ffmpeg, path, metadata))
    }

    pub fn with_metadata(ffmpeg: impl Into<String>, path: impl Into<PathBuf>, metadata: VideoMetadata) -> Self {
        Self {
            program: ffmpeg.into(),
            path: path.into(),
            metadata,
            canvas: (metadata.width, metadata.height),
            position: 0.0,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }
}

/// Maps a 0.0..=1.0 encoder quality onto ffmpeg's 2 (best) ..= 31 (worst) qscale.
pub fn jpeg_qscale(quality: f32) -> u32 {
    let quality = quality.clamp(0.0, 1.0);
    2 + ((1.0 - quality) * 29.0).round() as u32
}

#[async_trait]
impl FrameSurface for FfmpegSurface {
    fn duration(&self) -> f64 {
        self.metadata.duration
    }

    fn native_size(&self) -> (u32, u32) {
        (self.metadata.width, self.metadata.height)
    }

    fn resize_canvas(&mut self, width: u32, height: u32) {
        self.canvas = (width, height);
    }

    async fn seek(&mut self, seconds: f64) -> Result<(), MediaError> {
        if !seconds.is_finite() || seconds < 0.0 || seconds > self.metadata.duration {
            return Err(MediaError::InvalidSeek(seconds));
        }
        self.position = seconds;
        Ok(())
    }

    async fn capture_jpeg(&mut self, quality: f32) -> Result<Vec<u8>, MediaError> {
        let position = format!("{:.3}", self.position);
        let input = self.path.to_string_lossy().to_string();
        let qscale = jpeg_qscale(quality).to_string();
        let (width, height) = self.canvas;
        let scale = format!("scale={}:{}", width, height);

        let mut args = vec![
            "-v", "error",
            "-ss", position.as_str(),
            "-i", input.as_str(),
            "-frames:v", "1",
        ];
        // A zero-sized canvas means the probe could not read the frame size; keep the native one.
        if width > 0 && height > 0 {
            args.extend(["-vf", scale.as_str()]);
        }
        args.extend(["-q:v", qscale.as_str(), "-f", "image2pipe", "-vcodec", "mjpeg", "-"]);

        debug!("Capturing frame at {}s from {}", position, input);
        let jpeg = run(&self.program, &args).await?;
        if jpeg.is_empty() {
            return Err(MediaError::Failed {
                program: self.program.clone(),
                stderr: format!("no frame decoded at {}s", position),
            });
        }

        Ok(jpeg)
    }
}
