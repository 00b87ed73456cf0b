use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::config::env::{self, EnvKey};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub api_base_url: Url,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub thumbnail_settle_ms: u64,
    pub thumbnail_output_dir: PathBuf,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let raw_url = env::get_or(EnvKey::ApiBaseUrl, DEFAULT_API_BASE_URL);
        let api_base_url = Url::parse(&raw_url)
            .map_err(|e| anyhow!("Invalid {}: {} ({})", EnvKey::ApiBaseUrl.as_str(), raw_url, e))?;

        Ok(Self {
            api_base_url,
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg"),
            ffprobe_path: env::get_or(EnvKey::FfprobePath, "ffprobe"),
            thumbnail_settle_ms: env::get_parsed(EnvKey::ThumbnailSettleMs, 1000),
            thumbnail_output_dir: PathBuf::from(env::get_or(EnvKey::ThumbnailOutputDir, "thumbnails")),
        })
    }

    /// Config pointing at an explicit receiver, everything else defaulted.
    pub fn with_base_url(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            thumbnail_settle_ms: 1000,
            thumbnail_output_dir: PathBuf::from("thumbnails"),
        }
    }

    pub fn thumbnail_settle_delay(&self) -> Duration {
        Duration::from_millis(self.thumbnail_settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_delay_uses_millis() {
        let mut config = AppConfig::with_base_url(Url::parse("http://127.0.0.1:9000").unwrap());
        config.thumbnail_settle_ms = 250;
        assert_eq!(config.thumbnail_settle_delay(), Duration::from_millis(250));
    }

    #[test]
    fn explicit_base_url_keeps_defaults() {
        let config = AppConfig::with_base_url(Url::parse("http://127.0.0.1:9000").unwrap());
        assert_eq!(config.ffmpeg_path, "ffmpeg");
        assert_eq!(config.ffprobe_path, "ffprobe");
        assert_eq!(config.thumbnail_settle_ms, 1000);
    }
}
