//! Attaches locally generated subtitle files to episodes.
//!
//! Subtitles are written under the same canonical stem as their video, so
//! matching is exact stem equality; a miss means nothing was generated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::models::ShowRecord;

#[derive(Debug, Clone)]
pub struct LocalAssetMatcher {
    extensions: Vec<String>,
}

impl Default for LocalAssetMatcher {
    fn default() -> Self {
        Self::new(crate::constants::SUBTITLE_EXTENSIONS.iter().copied())
    }
}

impl LocalAssetMatcher {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    fn is_asset(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Indexes asset files under `root` by filename stem.
    ///
    /// The walk is sorted, so when two files share a stem the first path wins.
    /// A missing root yields an empty map.
    #[must_use]
    pub fn find_assets(&self, root: &Path) -> HashMap<String, PathBuf> {
        let mut assets = HashMap::new();
        if !root.is_dir() {
            debug!(root = %root.display(), "Asset root does not exist");
            return assets;
        }

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok);

        for entry in walker {
            let path = entry.path();
            if !entry.file_type().is_file() || !self.is_asset(path) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            assets
                .entry(stem.to_string())
                .or_insert_with(|| path.to_path_buf());
        }

        debug!(root = %root.display(), count = assets.len(), "Indexed local assets");
        assets
    }

    /// Sets `subtitle_file` on every episode whose filename stem has an asset.
    /// Returns how many episodes were updated.
    pub fn attach(&self, show: &mut ShowRecord, assets: &HashMap<String, PathBuf>) -> usize {
        if assets.is_empty() {
            return 0;
        }

        let mut attached = 0;
        for episode in show.episodes_mut() {
            let Some(path) = episode.filename_stem().and_then(|stem| assets.get(stem)) else {
                continue;
            };
            episode.subtitle_file = Some(path.display().to_string());
            attached += 1;
        }

        info!(
            event = "subtitles_attached",
            show = %show.show_title,
            attached,
            "Attached local subtitles"
        );
        attached
    }

    /// [`find_assets`](Self::find_assets) followed by [`attach`](Self::attach).
    pub fn attach_from_dir(&self, show: &mut ShowRecord, root: &Path) -> usize {
        let assets = self.find_assets(root);
        self.attach(show, &assets)
    }
}
