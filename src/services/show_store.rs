//! Persistence façade for show documents.
//!
//! Every write goes through [`validity::clean`](crate::services::validity::clean)
//! first, so the store never holds an episode without a working link. Failures
//! are logged and reported as `false` / `None` / empty so batch callers can move
//! on to the next show.
//!
//! Point updates are read-modify-write without any concurrency check: two
//! concurrent updates to the same show can silently lose one of them.

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::config::{StoreConfig, UpsertMode};
use crate::db::{ShowSummary, Store};
use crate::models::{Category, EpisodeRecord, SeasonEntry, SeasonGroup, ShowRecord};
use crate::services::validity::{self, RemovedEpisode};

/// What an upsert actually persisted.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub stored_episodes: usize,
    pub removed: Vec<RemovedEpisode>,
    /// Episodes carried over from the previous document in merge mode.
    pub merged: usize,
}

#[derive(Clone)]
pub struct ShowRecordStore {
    store: Option<Store>,
    mode: UpsertMode,
}

impl ShowRecordStore {
    /// Connects using `[store]` settings. A failed connection is logged and
    /// yields a store whose operations all report failure.
    pub async fn connect(config: &StoreConfig) -> Self {
        let store = match Store::with_pool_options(
            &config.database_path,
            config.max_connections,
            config.min_connections,
        )
        .await
        {
            Ok(store) => Some(store),
            Err(e) => {
                error!(
                    event = "store_unavailable",
                    database = %config.database_path,
                    error = %e,
                    "Failed to open show store"
                );
                None
            }
        };

        Self {
            store,
            mode: config.upsert_mode,
        }
    }

    #[must_use]
    pub const fn from_store(store: Store, mode: UpsertMode) -> Self {
        Self {
            store: Some(store),
            mode,
        }
    }

    #[must_use]
    pub const fn disconnected(mode: UpsertMode) -> Self {
        Self { store: None, mode }
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> Option<&Store> {
        if self.store.is_none() {
            warn!("Show store is not connected");
        }
        self.store.as_ref()
    }

    /// Cleans, stamps and stores `record` under its exact title.
    ///
    /// `category` overrides the record's own; a record with neither is stored
    /// as `series`.
    pub async fn upsert_show(&self, record: ShowRecord, category: Option<Category>) -> bool {
        self.upsert_show_with_outcome(record, category).await.is_some()
    }

    pub async fn upsert_show_with_outcome(
        &self,
        record: ShowRecord,
        category: Option<Category>,
    ) -> Option<UpsertOutcome> {
        if record.show_title.trim().is_empty() {
            warn!("Refusing to save a show without a title");
            return None;
        }
        let store = self.store()?;

        let cleaned = validity::clean(record);
        let mut record = cleaned.record;
        record.category = Some(category.or(record.category).unwrap_or_default());
        record.created_at = Some(Utc::now());

        let mut merged = 0;
        if self.mode == UpsertMode::Merge {
            match store.get_show(&record.show_title).await {
                Ok(Some(previous)) => merged = merge_missing_episodes(&mut record, previous),
                Ok(None) => {}
                Err(e) => {
                    error!(show = %record.show_title, error = %e, "Failed to read show for merge");
                    return None;
                }
            }
        }

        if let Err(e) = store.upsert_show(&record).await {
            error!(show = %record.show_title, error = %e, "Failed to save show");
            return None;
        }

        let outcome = UpsertOutcome {
            stored_episodes: record.episode_count(),
            removed: cleaned.removed,
            merged,
        };
        info!(
            event = "show_saved",
            show = %record.show_title,
            category = %record.category_or_default(),
            episodes = outcome.stored_episodes,
            removed = outcome.removed.len(),
            merged = outcome.merged,
            "Saved show"
        );
        Some(outcome)
    }

    pub async fn get_show(&self, show_title: &str) -> Option<ShowRecord> {
        match self.store()?.get_show(show_title).await {
            Ok(record) => record,
            Err(e) => {
                error!(show = %show_title, error = %e, "Failed to load show");
                None
            }
        }
    }

    /// Stored shows sorted by title.
    pub async fn list_shows(&self) -> Vec<ShowSummary> {
        let Some(store) = self.store() else {
            return Vec::new();
        };
        store.list_shows().await.unwrap_or_else(|e| {
            error!(error = %e, "Failed to list shows");
            Vec::new()
        })
    }

    /// Applies `updates` to the episode numbered `episode` inside the group
    /// whose label carries `season`, then stores the whole document again.
    pub async fn update_episode_fields(
        &self,
        show_title: &str,
        season: u32,
        episode: u32,
        updates: &Map<String, Value>,
    ) -> bool {
        let Some(store) = self.store() else {
            return false;
        };
        let mut record = match store.get_show(show_title).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(show = %show_title, "Show not found for episode update");
                return false;
            }
            Err(e) => {
                error!(show = %show_title, error = %e, "Failed to load show for episode update");
                return false;
            }
        };

        let Some(target) = find_episode_mut(&mut record, season, episode) else {
            warn!(show = %show_title, season, episode, "Episode not found for update");
            return false;
        };
        if let Err(e) = target.apply_updates(updates) {
            warn!(show = %show_title, season, episode, error = %e, "Rejected episode update");
            return false;
        }

        let cleaned = validity::clean(record);
        if let Err(e) = store.upsert_show(&cleaned.record).await {
            error!(show = %show_title, error = %e, "Failed to save episode update");
            return false;
        }

        info!(
            event = "episode_updated",
            show = %show_title,
            season,
            episode,
            fields = updates.len(),
            "Updated episode"
        );
        true
    }

    pub async fn delete_show(&self, show_title: &str) -> bool {
        let Some(store) = self.store() else {
            return false;
        };
        match store.delete_show(show_title).await {
            Ok(deleted) => {
                if deleted {
                    info!(event = "show_deleted", show = %show_title, "Deleted show");
                }
                deleted
            }
            Err(e) => {
                error!(show = %show_title, error = %e, "Failed to delete show");
                false
            }
        }
    }
}

fn find_episode_mut(
    record: &mut ShowRecord,
    season: u32,
    episode: u32,
) -> Option<&mut EpisodeRecord> {
    record
        .groups_mut()
        .filter(|group| group.season_number() == Some(season))
        .flat_map(|group| group.episodes.iter_mut())
        .find(|ep| ep.episode_number == Some(episode))
}

/// Identity of an episode inside its group: number when known, else filename.
fn episode_identity(episode: &EpisodeRecord) -> String {
    episode
        .episode_number
        .map_or_else(|| format!("file:{}", episode.filename), |n| format!("ep:{n}"))
}

/// Appends episodes of `previous` that `record` no longer has. Returns how many.
fn merge_missing_episodes(record: &mut ShowRecord, previous: ShowRecord) -> usize {
    let mut merged = 0;

    for old_group in previous.seasons_data.into_iter().flat_map(|e| e.groups) {
        let existing = record.groups_mut().find(|g| g.label == old_group.label);
        match existing {
            Some(group) => {
                for old in old_group.episodes {
                    let id = episode_identity(&old);
                    if !group.episodes.iter().any(|ep| episode_identity(ep) == id) {
                        group.episodes.push(old);
                        merged += 1;
                    }
                }
            }
            None if !old_group.episodes.is_empty() => {
                merged += old_group.episodes.len();
                record
                    .seasons_data
                    .push(SeasonEntry::single(SeasonGroup::new(old_group.label, old_group.episodes)));
            }
            None => {}
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EpisodeKey;

    fn episode(season: u32, n: u32, code: &str) -> EpisodeRecord {
        let mut ep = EpisodeRecord::new("Dark", EpisodeKey::new(season, n), format!("Ep {n}"), "mkv");
        ep.url = format!("https://filemoon.in/e/{code}");
        ep
    }

    #[test]
    fn merge_keeps_missing_episodes_and_groups() {
        let mut previous = ShowRecord::new("Dark", Category::Series);
        previous.push_season(SeasonGroup::new("Season 01", vec![episode(1, 1, "a"), episode(1, 2, "b")]));
        previous.push_season(SeasonGroup::new("Season 02", vec![episode(2, 1, "c")]));

        let mut fresh = ShowRecord::new("Dark", Category::Series);
        fresh.push_season(SeasonGroup::new("Season 01", vec![episode(1, 1, "new")]));

        let merged = merge_missing_episodes(&mut fresh, previous);
        assert_eq!(merged, 2);
        assert_eq!(fresh.episode_count(), 3);
        assert_eq!(fresh.episodes().next().unwrap().url, "https://filemoon.in/e/new");
        let labels: Vec<_> = fresh.groups().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["Season 01", "Season 02"]);
    }

    #[test]
    fn finds_episode_by_label_digits_and_number() {
        let mut record = ShowRecord::new("Dark", Category::Series);
        record.push_season(SeasonGroup::new("Season 01", vec![episode(1, 1, "a")]));
        record.push_season(SeasonGroup::new("Season 02", vec![episode(2, 1, "b"), episode(2, 2, "c")]));

        let found = find_episode_mut(&mut record, 2, 2).unwrap();
        assert!(found.url.ends_with("/c"));
        assert!(find_episode_mut(&mut record, 3, 1).is_none());
    }

    #[tokio::test]
    async fn disconnected_store_reports_failure() {
        let store = ShowRecordStore::disconnected(UpsertMode::Replace);
        let record = ShowRecord::new("Dark", Category::Series);
        assert!(!store.is_connected());
        assert!(!store.upsert_show(record, None).await);
        assert!(store.get_show("Dark").await.is_none());
        assert!(store.list_shows().await.is_empty());
        assert!(!store.update_episode_fields("Dark", 1, 1, &Map::new()).await);
        assert!(!store.delete_show("Dark").await);
    }
}
