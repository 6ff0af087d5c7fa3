//! Download and upload coordination around the canonical library layout.
//!
//! Files land at `downloads/{ShowCleaned}/Season NN/{ShowCleaned}_SxxEyy.ext`.
//! A video counts as complete only when its `.complete` manifest records the
//! size found on disk; anything else is treated as a leftover partial.

mod aggregation;
mod download;
mod manifest;
mod upload;

pub use aggregation::{SeasonProgress, SeriesAggregation, SharedAggregation};
pub use download::{DownloadCoordinator, DownloadReport, episode_path};
pub use manifest::{PartialFile, is_complete, manifest_path, mark_complete};
pub use upload::{UploadCoordinator, UploadJob, UploadReport};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::constants::VIDEO_EXTENSIONS;
use crate::domain::FileCode;
use crate::parser::naming;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Host error: {0}")]
    Host(String),
}

/// One downloadable item offered by a [`TransferSource`].
#[derive(Debug, Clone, Default)]
pub struct SourceItem {
    pub id: String,
    pub filename: Option<String>,
    pub caption: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
}

impl SourceItem {
    fn is_video(&self) -> bool {
        match self.mime_type.as_deref() {
            Some(mime) => mime.to_ascii_lowercase().starts_with("video/"),
            None => self
                .filename
                .as_deref()
                .and_then(naming::media_extension)
                .is_some_and(is_video_extension),
        }
    }

    /// Video extension from the original filename, `mkv` otherwise.
    fn extension(&self) -> String {
        self.filename
            .as_deref()
            .and_then(naming::media_extension)
            .filter(|ext| is_video_extension(ext))
            .unwrap_or("mkv")
            .to_ascii_lowercase()
    }
}

fn is_video_extension(ext: &str) -> bool {
    VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext))
}

/// Where media comes from, e.g. a chat channel.
#[async_trait]
pub trait TransferSource: Send + Sync {
    async fn list_items(&self) -> Result<Vec<SourceItem>, TransferError>;

    /// Writes the item's bytes to `dest`.
    async fn download(&self, item: &SourceItem, dest: &Path) -> Result<(), TransferError>;

    /// Called once the item is safely on disk.
    async fn acknowledge(&self, _item: &SourceItem) -> Result<(), TransferError> {
        Ok(())
    }
}

/// Where finished files go. `remote_dir` mirrors the local layout: `/{series}/{season}`.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(
        &self,
        local: &Path,
        remote_dir: &str,
    ) -> Result<Option<FileCode>, TransferError>;
}
