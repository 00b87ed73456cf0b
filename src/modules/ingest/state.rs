use url::Url;

use crate::modules::upload::dto::SelectedFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestPhase {
    Idle,
    FileSelected,
    Uploading,
    Uploaded,
    SamplingThumbnails,
    ThumbnailPending,
    ThumbnailChosen,
}

/// Everything one upload form knows about the video being ingested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestState {
    pub video_file: Option<SelectedFile>,
    pub preview_url: Option<Url>,
    pub generated_video_id: Option<String>,
    /// Set only once the receiver confirmed the whole file.
    pub uploaded_video_path: Option<String>,
    pub thumbnail_options: Vec<String>,
    pub show_thumbnail_selector: bool,
    pub selected_thumbnail: Option<String>,
    pub sampling_thumbnails: bool,
}

impl IngestState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn phase(&self, uploading: bool) -> IngestPhase {
        if self.selected_thumbnail.is_some() {
            IngestPhase::ThumbnailChosen
        } else if self.sampling_thumbnails {
            IngestPhase::SamplingThumbnails
        } else if !self.thumbnail_options.is_empty() {
            IngestPhase::ThumbnailPending
        } else if self.uploaded_video_path.is_some() {
            IngestPhase::Uploaded
        } else if uploading {
            IngestPhase::Uploading
        } else if self.video_file.is_some() {
            IngestPhase::FileSelected
        } else {
            IngestPhase::Idle
        }
    }
}
