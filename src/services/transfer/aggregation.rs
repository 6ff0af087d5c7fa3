use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::{Category, EpisodeRecord, SeasonGroup, ShowRecord};
use crate::parser::EpisodeInfo;

#[derive(Debug, Clone, Default)]
pub struct SeasonProgress {
    pub episodes: BTreeMap<u32, EpisodeRecord>,
    pub total_expected: Option<u32>,
}

impl SeasonProgress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total_expected
            .is_some_and(|total| self.episodes.len() >= total as usize)
    }
}

/// Completed episodes folded per series and season.
#[derive(Debug, Clone, Default)]
pub struct SeriesAggregation {
    series: BTreeMap<String, BTreeMap<u32, SeasonProgress>>,
}

pub type SharedAggregation = Arc<Mutex<SeriesAggregation>>;

impl SeriesAggregation {
    #[must_use]
    pub fn shared() -> SharedAggregation {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn record(&mut self, info: &EpisodeInfo, ext: &str) {
        let key = info.key();
        let title = info
            .episode_title
            .clone()
            .unwrap_or_else(|| format!("Episode {}", key.episode));

        let season = self
            .series
            .entry(info.series.clone())
            .or_default()
            .entry(key.season)
            .or_default();

        if info.total_in_season.is_some() {
            season.total_expected = info.total_in_season;
        }

        let mut episode = EpisodeRecord::new(&info.series, key, title, ext);
        episode.total_episodes_in_season = season.total_expected;
        season.episodes.insert(key.episode, episode);
    }

    #[must_use]
    pub fn progress(&self, series: &str, season: u32) -> Option<&SeasonProgress> {
        self.series.get(series)?.get(&season)
    }

    /// One show per series, seasons and episodes in numeric order.
    #[must_use]
    pub fn to_shows(&self) -> Vec<ShowRecord> {
        self.series
            .iter()
            .map(|(title, seasons)| {
                let mut show = ShowRecord::new(title.clone(), Category::Series);
                for (number, progress) in seasons {
                    show.push_season(SeasonGroup::new(
                        SeasonGroup::label_for(*number),
                        progress.episodes.values().cloned().collect(),
                    ));
                }
                show
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::resolve_episode_info;

    const CAPTION: &str = "**○ Series:** `Dark`\n**○ Episode Number:** `1/10`";

    #[test]
    fn aggregation_tracks_expected_totals() {
        let mut aggregation = SeriesAggregation::default();
        let mut info = resolve_episode_info(Some("Dark_S02E01.mkv"), Some(CAPTION)).unwrap();
        aggregation.record(&info, "mkv");
        assert!(!aggregation.progress("Dark", 2).unwrap().is_complete());

        info.total_in_season = Some(2);
        info.episode = 2;
        aggregation.record(&info, "mkv");
        let progress = aggregation.progress("Dark", 2).unwrap();
        assert_eq!(progress.total_expected, Some(2));
        assert!(progress.is_complete());

        let shows = aggregation.to_shows();
        assert_eq!(shows[0].groups().next().unwrap().label, "Season 02");
    }
}
