use std::io::SeekFrom;
use std::ops::Range;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::dto::{SelectedFile, UploadResult};
use super::progress::{chunk_percent, ProgressCell, UploadProgress};
use super::token;
use crate::common::notify::Notifier;
use crate::infrastructure::http::client::{ApiError, ChunkUpload, MediaApi};

/// The receiver appends chunks in order; every chunk but the last is exactly this size.
pub const CHUNK_SIZE: u64 = 5 * 1024 * 1024;

pub const CHUNK_FAILED: &str = "Chunk upload failed";
pub const UPLOAD_CANCELLED: &str = "Upload cancelled";

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Upload cancelled")]
    Cancelled,

    #[error("An upload is already in progress")]
    Busy,

    #[error("{0}")]
    Server(String),

    #[error("Invalid response from server")]
    InvalidResponse,

    #[error("Upload incomplete")]
    Incomplete,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to read video file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ApiError> for TransferError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(e) => TransferError::Network(e),
            ApiError::Status { message, .. } => {
                TransferError::Server(message.unwrap_or_else(|| CHUNK_FAILED.to_string()))
            }
            ApiError::InvalidResponse => TransferError::InvalidResponse,
            ApiError::Endpoint(e) => TransferError::Server(format!("{}: {}", CHUNK_FAILED, e)),
        }
    }
}

pub fn chunk_count(len: u64) -> u64 {
    len.div_ceil(CHUNK_SIZE).max(1)
}

/// Byte range of chunk `index` within a file of `len` bytes. Empty for a zero-length file.
pub fn chunk_range(index: u64, len: u64) -> Range<u64> {
    let start = index.saturating_mul(CHUNK_SIZE).min(len);
    let end = start.saturating_add(CHUNK_SIZE).min(len);
    start..end
}

/// State of one `upload_file` call. Never outlives it.
#[derive(Debug)]
struct TransferSession {
    file_id: String,
    chunk_size: u64,
    total_chunks: u64,
    current_chunk_index: u64,
    cancel: CancellationToken,
}

impl TransferSession {
    fn new(len: u64, cancel: CancellationToken) -> Self {
        Self {
            file_id: token::transfer_id(),
            chunk_size: CHUNK_SIZE,
            total_chunks: chunk_count(len),
            current_chunk_index: 0,
            cancel,
        }
    }
}

/// Sends a file to the chunk receiver one 5 MiB slice at a time.
///
/// One transfer at a time per instance: a second `upload_file` while the
/// first is running is rejected rather than replacing the cancel slot.
pub struct ChunkTransfer {
    api: MediaApi,
    notifier: Arc<dyn Notifier>,
    progress: ProgressCell,
    active: Mutex<Option<CancellationToken>>,
}

impl ChunkTransfer {
    pub fn new(api: MediaApi, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            progress: ProgressCell::default(),
            active: Mutex::new(None),
        }
    }

    pub fn progress(&self) -> UploadProgress {
        self.progress.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.progress.subscribe()
    }

    pub fn is_uploading(&self) -> bool {
        self.progress.get().uploading
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn claim(&self) -> Option<CancellationToken> {
        let mut slot = self.slot();
        if slot.is_some() {
            return None;
        }
        let token = CancellationToken::new();
        *slot = Some(token.clone());
        Some(token)
    }

    fn release(&self) {
        self.slot().take();
    }

    /// Signals the running transfer, if any. Progress is reset by the transfer itself.
    pub fn cancel_upload(&self) {
        if let Some(token) = self.slot().as_ref() {
            info!("Cancelling active upload");
            token.cancel();
        }
    }

    pub async fn upload_file(
        &self,
        file: &SelectedFile,
        category: &str,
        correlation_id: &str,
    ) -> Option<UploadResult> {
        let Some(cancel) = self.claim() else {
            warn!("Rejected upload of {}: another transfer is running", file.name);
            self.notifier.error(&TransferError::Busy.to_string());
            return None;
        };

        self.progress.set(0, true);
        let outcome = self.run(file, category, correlation_id, cancel).await;
        self.release();

        match outcome {
            Ok(result) => {
                self.progress.set(100, false);
                info!("✅ Upload complete: {} -> {}", file.name, result.file_path);
                Some(result)
            }
            Err(TransferError::Cancelled) => {
                self.progress.reset();
                info!("Upload of {} cancelled", file.name);
                self.notifier.info(UPLOAD_CANCELLED);
                None
            }
            Err(e) => {
                self.progress.reset();
                error!("❌ Upload of {} failed: {}", file.name, e);
                self.notifier.error(&e.to_string());
                None
            }
        }
    }

    async fn run(
        &self,
        file: &SelectedFile,
        category: &str,
        correlation_id: &str,
        cancel: CancellationToken,
    ) -> Result<UploadResult, TransferError> {
        let mut source = File::open(&file.path).await?;
        let len = source.metadata().await?.len();
        let mut session = TransferSession::new(len, cancel);

        info!(
            "Uploading {} ({} bytes) in {} chunks of {} bytes; file_id={}",
            file.name, len, session.total_chunks, session.chunk_size, session.file_id
        );

        while session.current_chunk_index < session.total_chunks {
            if session.cancel.is_cancelled() {
                return Err(TransferError::Cancelled);
            }

            let index = session.current_chunk_index;
            let chunk = read_range(&mut source, chunk_range(index, len)).await?;
            debug!(
                "Sending chunk {}/{} ({} bytes)",
                index + 1,
                session.total_chunks,
                chunk.len()
            );

            let upload = ChunkUpload {
                chunk,
                chunk_index: index,
                total_chunks: session.total_chunks,
                file_name: &file.name,
                file_id: &session.file_id,
                video_type: category,
                generated_id: correlation_id,
            };

            // Dropping the request future on cancel aborts the HTTP exchange.
            let reply = tokio::select! {
                biased;
                _ = session.cancel.cancelled() => return Err(TransferError::Cancelled),
                reply = self.api.upload_chunk(upload) => reply?,
            };

            if reply.completed {
                let file_path = reply.file_path.ok_or(TransferError::InvalidResponse)?;
                return Ok(UploadResult {
                    file_path,
                    video_id: reply.video_id,
                });
            }

            // 100 is reserved for a receiver-confirmed completion.
            self.progress
                .set(chunk_percent(index, session.total_chunks).min(99), true);
            session.current_chunk_index += 1;
        }

        Err(TransferError::Incomplete)
    }
}

async fn read_range(source: &mut File, range: Range<u64>) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0u8; (range.end - range.start) as usize];
    source.seek(SeekFrom::Start(range.start)).await?;
    source.read_exact(&mut buf).await?;
    Ok(buf)
}
