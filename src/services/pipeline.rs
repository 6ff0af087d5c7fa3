//! End-to-end reconciliation of one scraped show: catalog alignment, local
//! subtitle attachment, cleaning and persistence.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{Config, PositionalFallback};
use crate::models::{Category, ShowRecord};
use crate::services::aligner::{AlignOptions, AlignmentReport, align_from_path};
use crate::services::assets::LocalAssetMatcher;
use crate::services::show_store::{ShowRecordStore, UpsertOutcome};
use crate::services::validity;

/// Per-run overrides coming from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub force_positional: bool,
    pub query: Option<String>,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileSummary {
    pub alignment: AlignmentReport,
    pub subtitles_attached: usize,
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; {} subtitles attached",
            self.alignment, self.subtitles_attached
        )
    }
}

#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Saved {
        summary: ReconcileSummary,
        outcome: UpsertOutcome,
    },
    /// Nothing survived cleaning, so the stored document was left alone.
    NoValidEpisodes {
        summary: ReconcileSummary,
        removed: usize,
    },
    StoreFailed {
        summary: ReconcileSummary,
    },
}

impl SyncOutcome {
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

pub struct ReconciliationPipeline {
    catalog_path: PathBuf,
    downloads_root: PathBuf,
    fallback: PositionalFallback,
    assets: LocalAssetMatcher,
}

impl ReconciliationPipeline {
    pub fn new(
        catalog_path: impl Into<PathBuf>,
        downloads_root: impl Into<PathBuf>,
        fallback: PositionalFallback,
        assets: LocalAssetMatcher,
    ) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            downloads_root: downloads_root.into(),
            fallback,
            assets,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.catalog.csv_path,
            &config.library.downloads_path,
            config.aligner.positional_fallback,
            LocalAssetMatcher::new(&config.library.subtitle_extensions),
        )
    }

    #[must_use]
    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = path.into();
        self
    }

    /// Aligns URLs and attaches subtitles in place. Never drops episodes.
    pub fn reconcile(&self, show: &mut ShowRecord, options: &RunOptions) -> ReconcileSummary {
        if let Some(category) = options.category {
            show.category = Some(category);
        }

        let align = AlignOptions::for_show(
            self.fallback,
            show,
            options.force_positional,
            options.query.clone(),
        );
        let alignment = align_from_path(&self.catalog_path, show, &align);
        let subtitles_attached = self.assets.attach_from_dir(show, &self.downloads_root);

        ReconcileSummary {
            alignment,
            subtitles_attached,
        }
    }

    /// [`reconcile`](Self::reconcile), then store the cleaned show unless no
    /// episode is left with a valid URL.
    pub async fn sync(
        &self,
        store: &ShowRecordStore,
        mut show: ShowRecord,
        options: &RunOptions,
    ) -> SyncOutcome {
        let summary = self.reconcile(&mut show, options);

        let remaining = show
            .episodes()
            .filter(|ep| validity::is_valid_url(&ep.url))
            .count();
        if remaining == 0 {
            let removed = show.episode_count();
            warn!(
                event = "sync_aborted",
                show = %show.show_title,
                removed,
                "No valid episodes left after cleaning, not saving"
            );
            return SyncOutcome::NoValidEpisodes { summary, removed };
        }

        match store.upsert_show_with_outcome(show, options.category).await {
            Some(outcome) => SyncOutcome::Saved { summary, outcome },
            None => SyncOutcome::StoreFailed { summary },
        }
    }
}

/// Reads a scraped or previously aligned show document.
pub fn read_snapshot(path: &Path) -> Result<ShowRecord> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read show file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse show file: {}", path.display()))
}

pub fn write_snapshot(path: &Path, show: &ShowRecord) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(show)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write show file: {}", path.display()))?;
    info!(event = "snapshot_written", path = %path.display(), "Wrote show snapshot");
    Ok(())
}

/// `shows/dark.json` -> `shows/dark_with_urls.json`
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "show".to_string());
    input.with_file_name(format!("{stem}_with_urls.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EpisodeKey;
    use crate::models::{EpisodeRecord, SeasonGroup};

    fn show() -> ShowRecord {
        let mut show = ShowRecord::new("Dark", Category::Series);
        show.push_season(SeasonGroup::new(
            "Season 01",
            (1..=2)
                .map(|n| EpisodeRecord::new("Dark", EpisodeKey::new(1, n), format!("Ep {n}"), "mkv"))
                .collect(),
        ));
        show
    }

    fn pipeline(dir: &Path, csv: &str) -> ReconciliationPipeline {
        let csv_path = dir.join("catalog.csv");
        std::fs::write(&csv_path, csv).unwrap();
        ReconciliationPipeline::new(
            csv_path,
            dir.join("downloads"),
            PositionalFallback::Auto,
            LocalAssetMatcher::default(),
        )
    }

    #[test]
    fn reconcile_aligns_and_attaches() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), "file_code,title\nabc,Dark_S01E01.mkv\n");
        let season = dir.path().join("downloads/Dark/Season 01");
        std::fs::create_dir_all(&season).unwrap();
        std::fs::write(season.join("Dark_S01E02.srt"), "1\n").unwrap();

        let mut show = show();
        let summary = pipeline.reconcile(&mut show, &RunOptions::default());

        assert_eq!(summary.alignment.exact, 1);
        assert_eq!(summary.alignment.unresolved, 1);
        assert_eq!(summary.subtitles_attached, 1);
        let episodes: Vec<_> = show.episodes().collect();
        assert_eq!(episodes[0].url, "https://filemoon.in/e/abc");
        assert!(episodes[1].subtitle_file.is_some());
        assert!(summary.to_string().contains("1 subtitles attached"));
    }

    #[test]
    fn category_override_enables_positional_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), "file_code,title\nb,Dark 2.mp4\na,Dark 1.mp4\n");

        let mut show = show();
        let options = RunOptions {
            category: Some(Category::Anime),
            ..RunOptions::default()
        };
        let summary = pipeline.reconcile(&mut show, &options);

        assert_eq!(summary.alignment.positional, 2);
        let urls: Vec<_> = show.episodes().map(|ep| ep.url.as_str()).collect();
        assert_eq!(urls, ["https://filemoon.in/e/a", "https://filemoon.in/e/b"]);
    }

    #[tokio::test]
    async fn sync_skips_save_when_nothing_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), "file_code,title\n");
        let store = ShowRecordStore::disconnected(crate::config::UpsertMode::Replace);

        let outcome = pipeline.sync(&store, show(), &RunOptions::default()).await;
        assert!(matches!(outcome, SyncOutcome::NoValidEpisodes { removed: 2, .. }));
    }

    #[test]
    fn snapshot_paths_and_round_trip() {
        assert_eq!(
            default_output_path(Path::new("shows/dark.json")),
            PathBuf::from("shows/dark_with_urls.json")
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/dark.json");
        write_snapshot(&path, &show()).unwrap();
        let back = read_snapshot(&path).unwrap();
        assert_eq!(back.show_title, "Dark");
        assert_eq!(back.episode_count(), 2);
    }
}
