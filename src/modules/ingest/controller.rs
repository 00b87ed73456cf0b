use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use super::dto::FileSelection;
use super::duration::format_duration;
use super::picker::FilePicker;
use super::state::{IngestPhase, IngestState};
use super::thumbnails;
use crate::common::data_uri;
use crate::common::notify::Notifier;
use crate::infrastructure::http::client::{ApiError, MediaApi};
use crate::infrastructure::media::{FrameSurface, MediaProbe};
use crate::modules::upload::token;
use crate::modules::upload::transfer::UPLOAD_CANCELLED;
use crate::modules::upload::{ChunkTransfer, UploadProgress, UploadResult};

pub const MISSING_FILE: &str = "Please select a video file first";
pub const MISSING_CATEGORY: &str = "Please select a video type first";
pub const DELETE_FAILED: &str = "Failed to delete uploaded video";
pub const THUMBNAILS_FAILED: &str = "Failed to generate thumbnails";

pub type DurationCallback = Box<dyn FnOnce(f64, String) + Send + 'static>;
pub type SuccessCallback = Box<dyn FnOnce(&UploadResult) + Send + 'static>;
pub type CancelCallback = Box<dyn FnOnce() + Send + 'static>;

/// Drives one upload form: pick a video, send it, sample thumbnails, pick one.
///
/// Every operation takes `&self` so a cancel can land while an upload is
/// pending. State locks are never held across network calls.
///
/// Each reset starts a new generation. Work begun under an older generation
/// (a transfer, a sampling pass, a duration probe) must not write its
/// results into the form once it has been reset.
pub struct VideoIngestController {
    transfer: Arc<ChunkTransfer>,
    api: MediaApi,
    notifier: Arc<dyn Notifier>,
    picker: Arc<dyn FilePicker>,
    probe: Arc<dyn MediaProbe>,
    settle_delay: Duration,
    state: Arc<Mutex<IngestState>>,
    generation: AtomicU64,
    surface: Mutex<Option<Box<dyn FrameSurface>>>,
}

impl VideoIngestController {
    pub fn new(
        transfer: Arc<ChunkTransfer>,
        api: MediaApi,
        notifier: Arc<dyn Notifier>,
        picker: Arc<dyn FilePicker>,
        probe: Arc<dyn MediaProbe>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            transfer,
            api,
            notifier,
            picker,
            probe,
            settle_delay,
            state: Arc::new(Mutex::new(IngestState::default())),
            generation: AtomicU64::new(0),
            surface: Mutex::new(None),
        }
    }

    pub fn transfer(&self) -> &Arc<ChunkTransfer> {
        &self.transfer
    }

    pub fn progress(&self) -> UploadProgress {
        self.transfer.progress()
    }

    pub async fn state(&self) -> IngestState {
        self.state.lock().await.clone()
    }

    pub async fn phase(&self) -> IngestPhase {
        self.state.lock().await.phase(self.transfer.is_uploading())
    }

    /// Hands the controller the decoder/canvas pair the uploaded video is loaded into.
    pub async fn attach_surface(&self, surface: Box<dyn FrameSurface>) {
        *self.surface.lock().await = Some(surface);
    }

    pub async fn detach_surface(&self) -> Option<Box<dyn FrameSurface>> {
        self.surface.lock().await.take()
    }

    /// Stores the first picked file and starts probing its duration in the background.
    ///
    /// Returns the probe task so callers that care can await it.
    pub async fn handle_video_upload(
        &self,
        selection: &FileSelection,
        on_duration: Option<DurationCallback>,
    ) -> Option<JoinHandle<()>> {
        let file = selection.first()?.clone();

        let preview_url = std::path::absolute(&file.path)
            .ok()
            .and_then(|p| Url::from_file_path(p).ok());

        let correlation_id = token::video_correlation_id();
        {
            let mut state = self.state.lock().await;
            state.video_file = Some(file.clone());
            state.preview_url = preview_url;
            state.generated_video_id = Some(correlation_id.clone());
        }
        info!("Selected {} ({} bytes)", file.name, file.size);

        let probe = self.probe.clone();
        let notifier = self.notifier.clone();
        let state = self.state.clone();

        Some(tokio::spawn(async move {
            match probe.duration(&file.path).await {
                Ok(seconds) => {
                    // A newer selection or a reset owns the form now
                    let current = state.lock().await.generated_video_id.clone();
                    if current.as_deref() != Some(correlation_id.as_str()) {
                        debug!("Dropping stale duration for {}", file.name);
                        return;
                    }

                    let formatted = format_duration(seconds);
                    debug!("Duration of {}: {}", file.name, formatted);
                    notifier.info(&format!("Video duration: {}", formatted));
                    if let Some(callback) = on_duration {
                        callback(seconds, formatted);
                    }
                }
                Err(e) => warn!("Could not read duration of {}: {}", file.name, e),
            }
        }))
    }

    pub async fn upload_video(
        &self,
        category: &str,
        on_success: Option<SuccessCallback>,
    ) -> Option<UploadResult> {
        // 1. Preconditions, checked before any network activity
        let (file, correlation_id, generation) = {
            let mut state = self.state.lock().await;
            let Some(file) = state.video_file.clone() else {
                self.notifier.error(MISSING_FILE);
                return None;
            };
            if category.trim().is_empty() {
                self.notifier.error(MISSING_CATEGORY);
                return None;
            }
            let correlation_id = state
                .generated_video_id
                .get_or_insert_with(token::video_correlation_id)
                .clone();
            (file, correlation_id, self.generation.load(Ordering::SeqCst))
        };

        // 2. Transfer; failures were already reported by the transfer
        let result = self
            .transfer
            .upload_file(&file, category, &correlation_id)
            .await?;

        {
            let mut state = self.state.lock().await;
            if !self.is_current(generation) {
                drop(state);
                self.discard_upload(&result.file_path).await;
                return None;
            }
            state.uploaded_video_path = Some(result.file_path.clone());
        }
        self.notifier.success("Video uploaded successfully");
        if let Some(callback) = on_success {
            callback(&result);
        }

        // 3. Let the decoder pick up the finished file, then sample frames
        tokio::time::sleep(self.settle_delay).await;
        self.sample_thumbnails(0, generation).await;

        // Cancelled after the transfer: the upload is gone, so is its result
        let _state = self.state.lock().await;
        if !self.is_current(generation) {
            info!("Upload of {} was cancelled after it finished", file.name);
            return None;
        }

        Some(result)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Best-effort removal of an upload that finished after the form was reset.
    async fn discard_upload(&self, file_path: &str) {
        info!("Upload finished after cancel, removing {}", file_path);
        match self.api.delete_file(file_path).await {
            Ok(res) if res.success => {}
            Ok(res) => warn!("Could not remove {}: {:?}", file_path, res.error),
            Err(e) => warn!("Could not remove {}: {}", file_path, e),
        }
    }

    pub async fn generate_thumbnails(&self, start_offset_percent: u32) {
        let generation = self.generation.load(Ordering::SeqCst);
        self.sample_thumbnails(start_offset_percent, generation).await;
    }

    /// Samples candidates for the form as it was at `generation`.
    async fn sample_thumbnails(&self, start_offset_percent: u32, generation: u64) {
        let mut slot = self.surface.lock().await;
        let Some(surface) = slot.as_mut() else {
            debug!("No frame surface attached, skipping thumbnail generation");
            return;
        };

        {
            let mut state = self.state.lock().await;
            if !self.is_current(generation) {
                return;
            }
            state.sampling_thumbnails = true;
        }
        let sampled = thumbnails::sample_frames(&mut **surface, start_offset_percent).await;
        drop(slot);

        let mut state = self.state.lock().await;
        if !self.is_current(generation) {
            debug!("Form was reset while sampling, discarding candidates");
            return;
        }
        state.sampling_thumbnails = false;
        match sampled {
            Ok(candidates) => {
                info!("Generated {} thumbnail candidates", candidates.len());
                state.thumbnail_options = candidates;
                state.show_thumbnail_selector = true;
            }
            Err(e) => {
                drop(state);
                error!("Thumbnail sampling failed: {}", e);
                self.notifier.error(THUMBNAILS_FAILED);
            }
        }
    }

    pub async fn regenerate_thumbnails(&self) {
        let offset = thumbnails::random_offset();
        self.notifier.info("Generating new thumbnails...");
        self.generate_thumbnails(offset).await;
    }

    pub async fn select_thumbnail(&self, candidate: impl Into<String>) {
        {
            let mut state = self.state.lock().await;
            state.selected_thumbnail = Some(candidate.into());
            state.show_thumbnail_selector = false;
        }
        self.notifier.success("Thumbnail selected");
    }

    pub async fn deselect_thumbnail(&self) {
        {
            let mut state = self.state.lock().await;
            state.selected_thumbnail = None;
            state.show_thumbnail_selector = true;
        }
        self.notifier.success("Thumbnail removed");
    }

    /// Manual thumbnail: reads the picked image straight into a data URI.
    pub async fn create_data_uri(&self, selection: &FileSelection) -> Option<String> {
        let file = selection.first()?;

        let bytes = match tokio::fs::read(&file.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to read thumbnail {}: {}", file.path.display(), e);
                self.notifier.error(&format!("Failed to read image: {}", e));
                return None;
            }
        };

        let mime = mime_guess::from_path(&file.path).first_or_octet_stream();
        let uri = data_uri::encode(mime.essence_str(), &bytes);

        let mut state = self.state.lock().await;
        state.selected_thumbnail = Some(uri.clone());
        state.show_thumbnail_selector = false;

        Some(uri)
    }

    pub async fn reset_upload_state(&self) {
        {
            let mut state = self.state.lock().await;
            state.reset();
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        self.picker.clear();
    }

    pub async fn cancel_upload(&self, on_cancelled: Option<CancelCallback>) {
        // 1. Transfer still running
        if self.transfer.is_uploading() {
            self.transfer.cancel_upload();
            self.reset_upload_state().await;
            self.notifier.info(UPLOAD_CANCELLED);
            if let Some(callback) = on_cancelled {
                callback();
            }
            return;
        }

        // 2. Nothing reached the server
        let uploaded = self.state.lock().await.uploaded_video_path.clone();
        let Some(file_path) = uploaded else {
            self.reset_upload_state().await;
            self.notifier.info(UPLOAD_CANCELLED);
            if let Some(callback) = on_cancelled {
                callback();
            }
            return;
        };

        // 3. Remove the finished upload; keep state on failure so the user can retry
        let failure = match self.api.delete_file(&file_path).await {
            Ok(res) if res.success => None,
            Ok(res) => Some(res.error.unwrap_or_else(|| DELETE_FAILED.to_string())),
            Err(ApiError::Status { message, .. }) => {
                Some(message.unwrap_or_else(|| DELETE_FAILED.to_string()))
            }
            Err(e) => {
                error!("Delete request for {} failed: {}", file_path, e);
                Some(DELETE_FAILED.to_string())
            }
        };

        if let Some(message) = failure {
            warn!("Keeping ingest state, delete of {} failed: {}", file_path, message);
            self.notifier.error(&message);
            return;
        }

        info!("Deleted uploaded video {}", file_path);
        self.reset_upload_state().await;
        self.notifier.success("Uploaded video removed");
        if let Some(callback) = on_cancelled {
            callback();
        }
    }
}
