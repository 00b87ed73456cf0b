use std::path::Path;

use crate::modules::upload::dto::SelectedFile;

/// What a file-picker change event carries: zero or more chosen files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    pub files: Vec<SelectedFile>,
}

impl FileSelection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(file: SelectedFile) -> Self {
        Self { files: vec![file] }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::single(SelectedFile::from_path(path).await?))
    }

    pub fn first(&self) -> Option<&SelectedFile> {
        self.files.first()
    }
}
