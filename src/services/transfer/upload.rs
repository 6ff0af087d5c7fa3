use futures::{StreamExt, stream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::manifest::{is_complete, manifest_path, remove_if_exists};
use super::{MediaHost, TransferError, is_video_extension};
use crate::config::Config;
use crate::domain::FileCode;
use crate::models::SeasonGroup;
use crate::parser::{find_episode_tag, naming};

#[derive(Debug, Clone)]
pub struct UploadJob {
    pub local: PathBuf,
    pub remote_dir: String,
    pub filename: String,
}

#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: usize,
    /// Videos left alone because they have no matching completion manifest.
    pub incomplete: usize,
    /// `(filename, code)` for uploads the host returned a code for.
    pub codes: Vec<(String, FileCode)>,
    /// `(local path, error)`
    pub failed: Vec<(PathBuf, String)>,
}

pub struct UploadCoordinator {
    host: Arc<dyn MediaHost>,
    downloads_root: PathBuf,
    max_concurrent: usize,
}

impl UploadCoordinator {
    pub fn new(host: Arc<dyn MediaHost>, downloads_root: impl Into<PathBuf>, max_concurrent: usize) -> Self {
        Self {
            host,
            downloads_root: downloads_root.into(),
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn from_config(host: Arc<dyn MediaHost>, config: &Config) -> Self {
        Self::new(
            host,
            &config.library.downloads_path,
            config.transfers.max_concurrent,
        )
    }

    /// Media files under `{series}/Season NN/`, series by name, seasons by
    /// number, files by episode tag. Returns the jobs plus the count of
    /// videos skipped as incomplete.
    pub async fn scan(&self) -> Result<(Vec<UploadJob>, usize), TransferError> {
        let mut jobs = Vec::new();
        let mut incomplete = 0;

        for series_dir in sorted_dirs(&self.downloads_root)? {
            let series_name = file_name(&series_dir);

            let mut seasons: Vec<_> = sorted_dirs(&series_dir)?
                .into_iter()
                .filter(|dir| file_name(dir).to_lowercase().starts_with("season"))
                .collect();
            seasons.sort_by_key(|dir| SeasonGroup::new(file_name(dir), Vec::new()).season_number());

            for season_dir in seasons {
                let season_name = file_name(&season_dir);
                let mut files = Vec::new();
                for entry in std::fs::read_dir(&season_dir)? {
                    let path = entry?.path();
                    if !path.is_file() {
                        continue;
                    }
                    let name = file_name(&path);
                    let Some(ext) = naming::media_extension(&name) else {
                        continue;
                    };
                    if is_video_extension(ext) && !is_complete(&path).await {
                        warn!(path = %path.display(), "Skipping incomplete download");
                        incomplete += 1;
                        continue;
                    }
                    files.push(path);
                }
                files.sort_by_key(|path| {
                    let name = file_name(path);
                    (find_episode_tag(&name).map(|k| k.episode), name)
                });

                jobs.extend(files.into_iter().map(|local| UploadJob {
                    filename: file_name(&local),
                    remote_dir: format!("/{series_name}/{season_name}"),
                    local,
                }));
            }
        }

        Ok((jobs, incomplete))
    }

    /// Uploads everything [`scan`](Self::scan) finds. Successful uploads are
    /// removed locally and their emptied folders pruned.
    pub async fn run(&self) -> Result<UploadReport, TransferError> {
        let (jobs, incomplete) = self.scan().await?;
        info!(event = "uploads_started", files = jobs.len(), "Starting uploads");

        let results = stream::iter(jobs)
            .map(|job| async move {
                let result = self.host.upload(&job.local, &job.remote_dir).await;
                (job, result)
            })
            .buffer_unordered(self.max_concurrent)
            .collect::<Vec<_>>()
            .await;

        let mut report = UploadReport {
            incomplete,
            ..UploadReport::default()
        };
        for (job, result) in results {
            match result {
                Ok(code) => {
                    report.uploaded += 1;
                    if let Some(code) = code {
                        report.codes.push((job.filename.clone(), code));
                    }
                    self.remove_uploaded(&job.local).await;
                }
                Err(e) => {
                    error!(path = %job.local.display(), error = %e, "Upload failed");
                    report.failed.push((job.local, e.to_string()));
                }
            }
        }

        info!(
            event = "uploads_finished",
            uploaded = report.uploaded,
            failed = report.failed.len(),
            incomplete = report.incomplete,
            "Finished uploads"
        );
        Ok(report)
    }

    async fn remove_uploaded(&self, local: &Path) {
        for path in [local.to_path_buf(), manifest_path(local)] {
            if let Err(e) = remove_if_exists(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to delete uploaded file");
            }
        }
        if let Some(season_dir) = local.parent() {
            prune_empty_dirs(season_dir, &self.downloads_root).await;
        }
    }
}

/// Removes `start` and its empty ancestors, stopping below `root`.
async fn prune_empty_dirs(start: &Path, root: &Path) {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        // Fails on non-empty directories, which ends the walk.
        if tokio::fs::remove_dir(dir).await.is_err() {
            break;
        }
        debug!(dir = %dir.display(), "Removed empty directory");
        current = dir.parent();
    }
}

fn sorted_dirs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::transfer::mark_complete;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    struct FakeHost {
        calls: StdMutex<Vec<(String, String)>>,
        failing: &'static str,
    }

    #[async_trait]
    impl MediaHost for FakeHost {
        async fn upload(&self, local: &Path, remote_dir: &str) -> Result<Option<FileCode>, TransferError> {
            let name = file_name(local);
            self.calls.lock().unwrap().push((remote_dir.to_string(), name.clone()));
            if name == self.failing {
                return Err(TransferError::Host("550 permission denied".into()));
            }
            Ok(Some(FileCode::new(format!("code-{name}"))))
        }
    }

    async fn complete_file(path: &Path) {
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, b"video").await.unwrap();
        mark_complete(path).await.unwrap();
    }

    #[tokio::test]
    async fn upload_scan_orders_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        complete_file(&root.join("Dark/Season 10/Dark_S10E01.mkv")).await;
        complete_file(&root.join("Dark/Season 02/Dark_S02E10.mkv")).await;
        complete_file(&root.join("Dark/Season 02/Dark_S02E02.mkv")).await;
        std::fs::write(root.join("Dark/Season 02/Dark_S02E02.srt"), "1\n").unwrap();
        std::fs::write(root.join("Dark/Season 02/Dark_S02E03.mkv"), "partial").unwrap();
        std::fs::write(root.join("Dark/Season 02/notes.txt"), "x").unwrap();
        std::fs::write(root.join("Dark/Season 02/Dark_S02E04.mkv.0f3a.part"), "half").unwrap();
        std::fs::create_dir_all(root.join("Dark/Extras")).unwrap();
        std::fs::write(root.join("Dark/Extras/Dark_S00E01.mkv"), "x").unwrap();

        let host = Arc::new(FakeHost {
            calls: StdMutex::new(Vec::new()),
            failing: "",
        });
        let coordinator = UploadCoordinator::new(host, root, 3);
        let (jobs, incomplete) = coordinator.scan().await.unwrap();

        let names: Vec<_> = jobs.iter().map(|j| j.filename.as_str()).collect();
        assert_eq!(
            names,
            ["Dark_S02E02.mkv", "Dark_S02E02.srt", "Dark_S02E10.mkv", "Dark_S10E01.mkv"]
        );
        assert_eq!(jobs[0].remote_dir, "/Dark/Season 02");
        assert_eq!(incomplete, 1);
    }

    #[tokio::test]
    async fn successful_uploads_are_removed_and_dirs_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        complete_file(&root.join("Dark/Season 01/Dark_S01E01.mkv")).await;
        complete_file(&root.join("Lost/Season 01/Lost_S01E01.mkv")).await;
        complete_file(&root.join("Lost/Season 01/Lost_S01E02.mkv")).await;

        let host = Arc::new(FakeHost {
            calls: StdMutex::new(Vec::new()),
            failing: "Lost_S01E02.mkv",
        });
        let coordinator = UploadCoordinator::new(host.clone(), root, 2);
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.uploaded, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.codes.len(), 2);
        assert_eq!(host.calls.lock().unwrap().len(), 3);

        assert!(!root.join("Dark").exists());
        assert!(root.exists());
        assert!(!root.join("Lost/Season 01/Lost_S01E01.mkv").exists());
        assert!(!manifest_path(&root.join("Lost/Season 01/Lost_S01E01.mkv")).exists());
        assert!(root.join("Lost/Season 01/Lost_S01E02.mkv").exists());
    }
}
