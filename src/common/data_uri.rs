use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("not a data URI")]
    MissingScheme,
    #[error("data URI is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Payload(String),
}

pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

pub fn decode(uri: &str) -> Result<(String, Vec<u8>), DataUriError> {
    let rest = uri.strip_prefix("data:").ok_or(DataUriError::MissingScheme)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingScheme)?;
    let mime = header.strip_suffix(";base64").ok_or(DataUriError::NotBase64)?;

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| DataUriError::Payload(e.to_string()))?;

    Ok((mime.to_string(), bytes))
}

/// File extension to use when writing a decoded image to disk.
pub fn extension_for(mime: &str) -> &'static str {
    if mime == "image/jpeg" {
        return "jpg";
    }

    mime_guess::get_mime_extensions_str(mime)
        .and_then(|exts| exts.first().copied())
        .unwrap_or("bin")
}
