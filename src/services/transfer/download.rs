use futures::{StreamExt, stream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::aggregation::{SeriesAggregation, SharedAggregation};
use super::manifest::{PartialFile, is_complete};
use super::{SourceItem, TransferError, TransferSource};
use crate::config::Config;
use crate::domain::EpisodeKey;
use crate::parser::{naming, resolve_episode_info};

/// Canonical location of an episode under `root`.
#[must_use]
pub fn episode_path(root: &Path, series: &str, key: EpisodeKey, ext: &str) -> PathBuf {
    root.join(naming::clean_show_name(series))
        .join(naming::season_folder(key.season))
        .join(naming::episode_filename(series, key, ext))
}

#[derive(Debug)]
enum ItemOutcome {
    Downloaded { bytes: u64 },
    AlreadyComplete,
    Skipped(&'static str),
}

#[derive(Debug, Default)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub already_complete: usize,
    pub bytes: u64,
    /// `(item id, reason)`
    pub skipped: Vec<(String, String)>,
    /// `(item id, error)`
    pub failed: Vec<(String, String)>,
}

pub struct DownloadCoordinator {
    source: Arc<dyn TransferSource>,
    downloads_root: PathBuf,
    max_concurrent: usize,
    aggregation: SharedAggregation,
}

impl DownloadCoordinator {
    pub fn new(source: Arc<dyn TransferSource>, downloads_root: impl Into<PathBuf>, max_concurrent: usize) -> Self {
        Self {
            source,
            downloads_root: downloads_root.into(),
            max_concurrent: max_concurrent.max(1),
            aggregation: SeriesAggregation::shared(),
        }
    }

    /// Uses `[library] downloads_path` and `[transfers] max_concurrent`.
    pub fn from_config(source: Arc<dyn TransferSource>, config: &Config) -> Self {
        Self::new(
            source,
            &config.library.downloads_path,
            config.transfers.max_concurrent,
        )
    }

    #[must_use]
    pub fn with_aggregation(mut self, aggregation: SharedAggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    #[must_use]
    pub fn aggregation(&self) -> SharedAggregation {
        Arc::clone(&self.aggregation)
    }

    /// Downloads every item the source lists. Only listing errors abort the run.
    pub async fn run(&self) -> Result<DownloadReport, TransferError> {
        let items = self.source.list_items().await?;
        info!(
            event = "downloads_started",
            items = items.len(),
            concurrency = self.max_concurrent,
            "Starting downloads"
        );

        let outcomes = stream::iter(items)
            .map(|item| async move {
                let outcome = self.process(&item).await;
                (item, outcome)
            })
            .buffer_unordered(self.max_concurrent)
            .collect::<Vec<_>>()
            .await;

        let mut report = DownloadReport::default();
        for (item, outcome) in outcomes {
            match outcome {
                Ok(ItemOutcome::Downloaded { bytes }) => {
                    report.downloaded += 1;
                    report.bytes += bytes;
                }
                Ok(ItemOutcome::AlreadyComplete) => report.already_complete += 1,
                Ok(ItemOutcome::Skipped(reason)) => {
                    report.skipped.push((item.id, reason.to_string()));
                }
                Err(e) => {
                    error!(item = %item.id, error = %e, "Download failed");
                    report.failed.push((item.id, e.to_string()));
                }
            }
        }

        info!(
            event = "downloads_finished",
            downloaded = report.downloaded,
            already_complete = report.already_complete,
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Finished downloads"
        );
        Ok(report)
    }

    async fn process(&self, item: &SourceItem) -> Result<ItemOutcome, TransferError> {
        if !item.is_video() {
            debug!(item = %item.id, "Skipping non-video item");
            return Ok(ItemOutcome::Skipped("not a video"));
        }

        let Some(info) = resolve_episode_info(item.filename.as_deref(), item.caption.as_deref())
        else {
            warn!(item = %item.id, filename = ?item.filename, "Could not determine series or episode");
            return Ok(ItemOutcome::Skipped("series or episode unknown"));
        };

        let ext = item.extension();
        let path = episode_path(&self.downloads_root, &info.series, info.key(), &ext);

        if is_complete(&path).await {
            debug!(path = %path.display(), "Already downloaded");
            self.aggregation.lock().await.record(&info, &ext);
            return Ok(ItemOutcome::AlreadyComplete);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = PartialFile::new(path.clone());
        self.source.download(item, partial.path()).await?;
        let bytes = partial.commit().await?;

        self.aggregation.lock().await.record(&info, &ext);
        if let Err(e) = self.source.acknowledge(item).await {
            warn!(item = %item.id, error = %e, "Failed to acknowledge downloaded item");
        }

        info!(
            event = "episode_downloaded",
            series = %info.series,
            episode = %info.key(),
            bytes,
            path = %path.display(),
            "Downloaded episode"
        );
        Ok(ItemOutcome::Downloaded { bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::transfer::manifest_path;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::Barrier;

    const CAPTION: &str = "**○ Series:** `Dark`\n**○ Episode Number:** `1/10`";

    struct FakeSource {
        items: Vec<SourceItem>,
        failing: HashSet<String>,
        acknowledged: StdMutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(items: Vec<SourceItem>, failing: &[&str]) -> Self {
            Self {
                items,
                failing: failing.iter().map(ToString::to_string).collect(),
                acknowledged: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TransferSource for FakeSource {
        async fn list_items(&self) -> Result<Vec<SourceItem>, TransferError> {
            Ok(self.items.clone())
        }

        async fn download(&self, item: &SourceItem, dest: &Path) -> Result<(), TransferError> {
            tokio::fs::write(dest, format!("bytes of {}", item.id)).await?;
            if self.failing.contains(&item.id) {
                return Err(TransferError::Source("connection reset".into()));
            }
            Ok(())
        }

        async fn acknowledge(&self, item: &SourceItem) -> Result<(), TransferError> {
            self.acknowledged.lock().unwrap().push(item.id.clone());
            Ok(())
        }
    }

    fn item(id: &str, filename: &str) -> SourceItem {
        SourceItem {
            id: id.to_string(),
            filename: Some(filename.to_string()),
            mime_type: Some("video/x-matroska".to_string()),
            ..SourceItem::default()
        }
    }

    #[tokio::test]
    async fn downloads_collect_failures_without_cancelling_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![
            item("1", "Dark_S01E01.mkv"),
            item("2", "Dark_S01E02.mkv"),
            item("3", "Dark_S01E03.mkv"),
            SourceItem {
                id: "4".into(),
                filename: Some("cover.jpg".into()),
                mime_type: Some("image/jpeg".into()),
                ..SourceItem::default()
            },
            item("5", "random clip.mkv"),
        ];
        let source = Arc::new(FakeSource::new(items, &["2"]));
        let coordinator = DownloadCoordinator::new(source.clone(), dir.path(), 2);

        let report = coordinator.run().await.unwrap();
        assert_eq!(report.downloaded, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "2");
        assert_eq!(report.skipped.len(), 2);

        let season = dir.path().join("Dark").join("Season 01");
        assert!(is_complete(&season.join("Dark_S01E01.mkv")).await);
        assert!(!season.join("Dark_S01E02.mkv").exists());
        assert!(!manifest_path(&season.join("Dark_S01E02.mkv")).exists());

        let mut acked = source.acknowledged.lock().unwrap().clone();
        acked.sort();
        assert_eq!(acked, ["1", "3"]);

        let aggregation = coordinator.aggregation();
        let aggregation = aggregation.lock().await;
        let progress = aggregation.progress("Dark", 1).unwrap();
        assert_eq!(progress.episodes.len(), 2);
    }

    #[tokio::test]
    async fn completed_files_are_skipped_but_still_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![item("1", "Dark_S01E01.mkv")];
        let source = Arc::new(FakeSource::new(items, &[]));

        let first = DownloadCoordinator::new(source.clone(), dir.path(), 3);
        assert_eq!(first.run().await.unwrap().downloaded, 1);

        let second = DownloadCoordinator::new(source, dir.path(), 3);
        let report = second.run().await.unwrap();
        assert_eq!(report.downloaded, 0);
        assert_eq!(report.already_complete, 1);
        assert!(second.aggregation().lock().await.progress("Dark", 1).is_some());
    }

    #[tokio::test]
    async fn caption_fills_in_for_unparseable_filename() {
        let dir = tempfile::tempdir().unwrap();
        let mut with_caption = item("1", "upload.mp4");
        with_caption.caption = Some(CAPTION.to_string());
        let source = Arc::new(FakeSource::new(vec![with_caption], &[]));

        let mut config = Config::default();
        config.library.downloads_path = dir.path().display().to_string();
        let coordinator = DownloadCoordinator::from_config(source, &config);
        let report = coordinator.run().await.unwrap();
        assert_eq!(report.downloaded, 1);
        assert!(dir.path().join("Dark/Season 01/Dark_S01E01.mp4").exists());

        let shows = coordinator.aggregation().lock().await.to_shows();
        assert_eq!(shows.len(), 1);
        let episode = shows[0].episodes().next().unwrap();
        assert_eq!(episode.total_episodes_in_season, Some(10));
        assert!(episode.is_placeholder());
    }

    /// Both items resolve to the same episode. They meet at a barrier so
    /// neither can see the other's finished file before starting.
    struct DuplicateSource {
        barrier: Barrier,
    }

    #[async_trait]
    impl TransferSource for DuplicateSource {
        async fn list_items(&self) -> Result<Vec<SourceItem>, TransferError> {
            Ok(vec![
                item("slow-fail", "Dark_S01E01.mkv"),
                item("fast-ok", "Dark_S01E01.mkv"),
            ])
        }

        async fn download(&self, item: &SourceItem, dest: &Path) -> Result<(), TransferError> {
            self.barrier.wait().await;
            if item.id == "fast-ok" {
                tokio::fs::write(dest, b"full episode").await?;
                return Ok(());
            }
            tokio::fs::write(dest, b"half").await?;
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(TransferError::Source("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn failed_duplicate_keeps_sibling_download() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(DuplicateSource {
            barrier: Barrier::new(2),
        });
        let coordinator = DownloadCoordinator::new(source, dir.path(), 3);

        let report = coordinator.run().await.unwrap();
        assert_eq!(report.downloaded, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "slow-fail");

        let season = dir.path().join("Dark/Season 01");
        let file = season.join("Dark_S01E01.mkv");
        assert_eq!(std::fs::read(&file).unwrap(), b"full episode");
        assert!(is_complete(&file).await);

        let mut names: Vec<_> = std::fs::read_dir(&season)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, ["Dark_S01E01.mkv", "Dark_S01E01.mkv.complete"]);
    }
}
