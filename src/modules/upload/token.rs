use rand::distr::Alphanumeric;
use rand::Rng;
use time::OffsetDateTime;
use uuid::Uuid;

fn now_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

/// Per-attempt transfer token: `<millis>-<uuid v4>`.
///
/// The uuid comes from the OS random source, so two clients retrying the
/// same file name in the same millisecond still get distinct ids.
pub fn transfer_id() -> String {
    format!("{}-{}", now_millis(), Uuid::new_v4().simple())
}

/// Correlation token sent as `generatedId`: `video_<millis>_<9 base36 chars>`.
pub fn video_correlation_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(9)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();

    format!("video_{}_{}", now_millis(), suffix)
}
