//! Shared fixtures: an in-process chunk receiver and stub media seams.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{watch, Notify};
use url::Url;

use movie_ingest::common::notify::MemoryNotifier;
use movie_ingest::infrastructure::http::client::MediaApi;
use movie_ingest::infrastructure::media::{FrameSurface, MediaError, MediaProbe};
use movie_ingest::modules::ingest::{FilePicker, VideoIngestController};
use movie_ingest::modules::upload::dto::SelectedFile;
use movie_ingest::modules::upload::{ChunkTransfer, UploadProgress};

pub const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct ReceivedChunk {
    pub chunk_index: u64,
    pub total_chunks: u64,
    pub file_name: String,
    pub upload_name: Option<String>,
    pub file_id: String,
    pub video_type: String,
    pub generated_id: String,
    pub bytes: Vec<u8>,
    /// Progress the client had published when this chunk arrived.
    pub progress_at_arrival: Option<UploadProgress>,
}

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Report `completed: true` on the last chunk.
    pub complete_on_last: bool,
    pub fail_at: Option<(u64, StatusCode, Value)>,
    pub garbage_at: Option<u64>,
    /// Stall the first request for this chunk index until the client goes away.
    pub hang_at: Option<u64>,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            complete_on_last: true,
            fail_at: None,
            garbage_at: None,
            hang_at: None,
        }
    }
}

#[derive(Default)]
struct Shared {
    config: Mutex<ReceiverConfig>,
    started: AtomicUsize,
    chunks: Mutex<Vec<ReceivedChunk>>,
    deletes: Mutex<Vec<String>>,
    delete_fails: AtomicBool,
    hung: Notify,
    progress: Mutex<Option<watch::Receiver<UploadProgress>>>,
}

pub struct MockReceiver {
    pub base_url: Url,
    shared: Arc<Shared>,
}

impl MockReceiver {
    pub async fn start(config: ReceiverConfig) -> Self {
        let shared = Arc::new(Shared {
            config: Mutex::new(config),
            ..Default::default()
        });

        let app = Router::new()
            .route("/api/movies/upload-chunk", post(upload_chunk))
            .route("/api/movies/delete", delete(delete_file))
            .layer(DefaultBodyLimit::max(16 * MIB))
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: Url::parse(&format!("http://{}", addr)).unwrap(),
            shared,
        }
    }

    pub fn api(&self) -> MediaApi {
        MediaApi::new(self.base_url.clone())
    }

    pub fn watch_progress(&self, rx: watch::Receiver<UploadProgress>) {
        *self.shared.progress.lock().unwrap() = Some(rx);
    }

    pub fn chunks(&self) -> Vec<ReceivedChunk> {
        self.shared.chunks.lock().unwrap().clone()
    }

    /// Chunk requests that reached a handler, including stalled ones.
    pub fn requests(&self) -> usize {
        self.shared.started.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> Vec<String> {
        self.shared.deletes.lock().unwrap().clone()
    }

    pub fn set_delete_fails(&self, fails: bool) {
        self.shared.delete_fails.store(fails, Ordering::SeqCst);
    }

    pub async fn wait_for_hang(&self) {
        tokio::time::timeout(Duration::from_secs(10), self.shared.hung.notified())
            .await
            .expect("receiver never stalled");
    }
}

async fn upload_chunk(State(shared): State<Arc<Shared>>, mut multipart: Multipart) -> Response {
    shared.started.fetch_add(1, Ordering::SeqCst);

    let mut chunk = ReceivedChunk::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or("").to_string();
        if name == "chunk" {
            chunk.upload_name = field.file_name().map(str::to_string);
            chunk.bytes = field.bytes().await.unwrap().to_vec();
            continue;
        }

        let value = field.text().await.unwrap();
        match name.as_str() {
            "chunkIndex" => chunk.chunk_index = value.parse().unwrap(),
            "totalChunks" => chunk.total_chunks = value.parse().unwrap(),
            "fileName" => chunk.file_name = value,
            "fileId" => chunk.file_id = value,
            "videoType" => chunk.video_type = value,
            "generatedId" => chunk.generated_id = value,
            other => panic!("unexpected form field {other}"),
        }
    }

    chunk.progress_at_arrival = shared
        .progress
        .lock()
        .unwrap()
        .as_ref()
        .map(|rx| *rx.borrow());
    shared.chunks.lock().unwrap().push(chunk.clone());

    let config = {
        let mut config = shared.config.lock().unwrap();
        let snapshot = config.clone();
        if config.hang_at == Some(chunk.chunk_index) {
            config.hang_at = None;
        }
        snapshot
    };

    if config.hang_at == Some(chunk.chunk_index) {
        shared.hung.notify_one();
        std::future::pending::<()>().await;
    }

    if let Some((index, status, body)) = config.fail_at {
        if index == chunk.chunk_index {
            return (status, Json(body)).into_response();
        }
    }

    if config.garbage_at == Some(chunk.chunk_index) {
        return (StatusCode::OK, "<html>definitely not json</html>").into_response();
    }

    let completed = config.complete_on_last && chunk.chunk_index + 1 == chunk.total_chunks;
    if completed {
        Json(json!({
            "completed": true,
            "filePath": format!("uploads/{}/{}", chunk.file_id, chunk.file_name),
            "videoId": format!("vid-{}", chunk.generated_id),
            "received": chunk.chunk_index + 1,
        }))
        .into_response()
    } else {
        Json(json!({ "completed": false, "received": chunk.chunk_index + 1 })).into_response()
    }
}

async fn delete_file(State(shared): State<Arc<Shared>>, Json(body): Json<Value>) -> Response {
    let path = body["filePath"].as_str().unwrap_or_default().to_string();
    shared.deletes.lock().unwrap().push(path);

    if shared.delete_fails.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": "Storage unavailable" })),
        )
            .into_response();
    }

    Json(json!({ "success": true })).into_response()
}

/// Writes `len` bytes of a repeating pattern so every chunk is distinguishable.
pub fn video_file(dir: &TempDir, name: &str, len: usize) -> SelectedFile {
    let path: PathBuf = dir.path().join(name);
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, &data).unwrap();

    SelectedFile {
        path,
        name: name.to_string(),
        size: len as u64,
    }
}

pub struct StubProbe(pub f64);

#[async_trait]
impl MediaProbe for StubProbe {
    async fn duration(&self, _path: &Path) -> Result<f64, MediaError> {
        Ok(self.0)
    }
}

/// Surface that returns the seek time as the "JPEG" payload.
pub struct StubSurface {
    pub duration: f64,
    pub seeks: Arc<Mutex<Vec<f64>>>,
    position: f64,
    gate: Option<SurfaceGate>,
}

/// Stalls the first seek until `release` is notified; `entered` fires when it starts.
#[derive(Clone, Default)]
pub struct SurfaceGate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl SurfaceGate {
    pub async fn wait_entered(&self) {
        tokio::time::timeout(Duration::from_secs(10), self.entered.notified())
            .await
            .expect("sampling never started");
    }
}

impl StubSurface {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            seeks: Arc::new(Mutex::new(Vec::new())),
            position: 0.0,
            gate: None,
        }
    }

    pub fn gated(duration: f64) -> (Self, SurfaceGate) {
        let gate = SurfaceGate::default();
        let mut surface = Self::new(duration);
        surface.gate = Some(gate.clone());
        (surface, gate)
    }
}

#[async_trait]
impl FrameSurface for StubSurface {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn native_size(&self) -> (u32, u32) {
        (640, 360)
    }

    fn resize_canvas(&mut self, _width: u32, _height: u32) {}

    async fn seek(&mut self, seconds: f64) -> Result<(), MediaError> {
        if let Some(gate) = self.gate.take() {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.seeks.lock().unwrap().push(seconds);
        self.position = seconds;
        Ok(())
    }

    async fn capture_jpeg(&mut self, _quality: f32) -> Result<Vec<u8>, MediaError> {
        Ok(format!("jpeg@{:.2}", self.position).into_bytes())
    }
}

#[derive(Default)]
pub struct CountingPicker(pub AtomicUsize);

impl FilePicker for CountingPicker {
    fn clear(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Ingest {
    pub controller: Arc<VideoIngestController>,
    pub notifier: Arc<MemoryNotifier>,
    pub picker: Arc<CountingPicker>,
}

pub fn ingest(receiver: &MockReceiver, duration: f64) -> Ingest {
    ingest_with_settle(receiver, duration, Duration::ZERO)
}

pub fn ingest_with_settle(receiver: &MockReceiver, duration: f64, settle: Duration) -> Ingest {
    let notifier = Arc::new(MemoryNotifier::new());
    let picker = Arc::new(CountingPicker::default());
    let transfer = Arc::new(ChunkTransfer::new(receiver.api(), notifier.clone()));
    let controller = Arc::new(VideoIngestController::new(
        transfer,
        receiver.api(),
        notifier.clone(),
        picker.clone(),
        Arc::new(StubProbe(duration)),
        settle,
    ));

    Ingest {
        controller,
        notifier,
        picker,
    }
}
