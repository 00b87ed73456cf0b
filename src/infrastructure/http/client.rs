use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::common::response::{ChunkResponse, DeleteRequest, DeleteResponse};

pub const UPLOAD_CHUNK_PATH: &str = "/api/movies/upload-chunk";
pub const DELETE_PATH: &str = "/api/movies/delete";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request failed with status {status}")]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Invalid response from server")]
    InvalidResponse,
}

/// One slice of a file as the chunk receiver expects it.
#[derive(Debug)]
pub struct ChunkUpload<'a> {
    pub chunk: Vec<u8>,
    pub chunk_index: u64,
    pub total_chunks: u64,
    pub file_name: &'a str,
    pub file_id: &'a str,
    pub video_type: &'a str,
    pub generated_id: &'a str,
}

impl ChunkUpload<'_> {
    fn into_form(self) -> Result<Form, reqwest::Error> {
        let part = Part::bytes(self.chunk)
            .file_name(self.file_name.to_string())
            .mime_str("application/octet-stream")?;

        Ok(Form::new()
            .part("chunk", part)
            .text("chunkIndex", self.chunk_index.to_string())
            .text("totalChunks", self.total_chunks.to_string())
            .text("fileName", self.file_name.to_string())
            .text("fileId", self.file_id.to_string())
            .text("videoType", self.video_type.to_string())
            .text("generatedId", self.generated_id.to_string()))
    }
}

/// HTTP client for the movie upload endpoints.
#[derive(Clone, Debug)]
pub struct MediaApi {
    client: Client,
    base_url: Url,
}

impl MediaApi {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    pub async fn upload_chunk(&self, upload: ChunkUpload<'_>) -> Result<ChunkResponse, ApiError> {
        let url = self.endpoint(UPLOAD_CHUNK_PATH)?;
        let chunk_index = upload.chunk_index;
        let form = upload.into_form()?;

        debug!("POST {} (chunk {})", url, chunk_index);
        let response = self.client.post(url).multipart(form).send().await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = Self::parse::<ChunkResponse>(status, &body)?;

        Ok(parsed)
    }

    pub async fn delete_file(&self, file_path: &str) -> Result<DeleteResponse, ApiError> {
        let url = self.endpoint(DELETE_PATH)?;

        debug!("DELETE {} ({})", url, file_path);
        let response = self
            .client
            .delete(url)
            .json(&DeleteRequest { file_path })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Self::parse::<DeleteResponse>(status, &body)
    }

    /// Failure statuses surface the server's `error` field when the body has one.
    fn parse<T: DeserializeOwned + HasError>(status: StatusCode, body: &str) -> Result<T, ApiError> {
        let parsed = serde_json::from_str::<T>(body);

        if !status.is_success() {
            let message = parsed.ok().and_then(|p| p.error_message());
            return Err(ApiError::Status { status, message });
        }

        parsed.map_err(|e| {
            error!("Failed to parse server response ({}): {}", status, e);
            ApiError::InvalidResponse
        })
    }
}

trait HasError {
    fn error_message(self) -> Option<String>;
}

impl HasError for ChunkResponse {
    fn error_message(self) -> Option<String> {
        self.error
    }
}

impl HasError for DeleteResponse {
    fn error_message(self) -> Option<String> {
        self.error
    }
}
