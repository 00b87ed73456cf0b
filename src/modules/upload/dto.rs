use std::path::{Path, PathBuf};

/// Where the receiver put the reassembled file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub file_path: String,
    pub video_id: Option<String>,
}

/// A local file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl SelectedFile {
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let size = tokio::fs::metadata(&path).await?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video.mp4".to_string());

        Ok(Self { path, name, size })
    }
}
