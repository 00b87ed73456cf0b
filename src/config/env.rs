use std::env;
use std::str::FromStr;
use tracing::warn;

pub enum EnvKey {
    ApiBaseUrl,
    FfmpegPath,
    FfprobePath,
    ThumbnailSettleMs,
    ThumbnailOutputDir,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ApiBaseUrl => "API_BASE_URL",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::FfprobePath => "FFPROBE_PATH",
            EnvKey::ThumbnailSettleMs => "THUMBNAIL_SETTLE_MS",
            EnvKey::ThumbnailOutputDir => "THUMBNAIL_OUTPUT_DIR",
        }
    }
}

/// Trimmed value of `key`. A blank value (`FFMPEG_PATH=` in `.env`) counts as unset.
pub fn get(key: &EnvKey) -> Option<String> {
    env::var(key.as_str())
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|val| !val.is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    get(&key).unwrap_or_else(|| default.to_string())
}

/// Falls back to `default`, loudly, when the value does not parse.
pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    let Some(raw) = get(&key) else {
        return default;
    };

    raw.parse::<T>().unwrap_or_else(|_| {
        warn!("Ignoring {}={:?}: not a valid value, using default", key.as_str(), raw);
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns its key so parallel tests never race on the environment.

    #[test]
    fn blank_value_counts_as_unset() {
        unsafe { env::set_var(EnvKey::FfmpegPath.as_str(), "   ") };
        assert_eq!(get(&EnvKey::FfmpegPath), None);
        assert_eq!(get_or(EnvKey::FfmpegPath, "ffmpeg"), "ffmpeg");

        unsafe { env::set_var(EnvKey::FfmpegPath.as_str(), " /opt/ffmpeg/bin/ffmpeg ") };
        assert_eq!(get_or(EnvKey::FfmpegPath, "ffmpeg"), "/opt/ffmpeg/bin/ffmpeg");
        unsafe { env::remove_var(EnvKey::FfmpegPath.as_str()) };
    }

    #[test]
    fn unparsable_number_falls_back() {
        unsafe { env::set_var(EnvKey::ThumbnailSettleMs.as_str(), "soon") };
        assert_eq!(get_parsed(EnvKey::ThumbnailSettleMs, 1000u64), 1000);

        unsafe { env::set_var(EnvKey::ThumbnailSettleMs.as_str(), "250") };
        assert_eq!(get_parsed(EnvKey::ThumbnailSettleMs, 1000u64), 250);
        unsafe { env::remove_var(EnvKey::ThumbnailSettleMs.as_str()) };
    }
}
