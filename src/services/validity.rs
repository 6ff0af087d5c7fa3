//! Whitelist check for hosted-media links and the pre-persistence cleaning pass.
//!
//! Anything that does not look like a resolved embed link is dropped, so new
//! placeholder shapes coming from upstream scraping fail closed.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::models::{SeasonEntry, SeasonGroup, ShowRecord};

fn embed_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://(?:www\.)?filemoon\.in/e/[A-Za-z0-9_-]+/?(?:\?.*)?$")
            .expect("Invalid regex pattern defined in code")
    })
}

/// `true` only for non-placeholder `filemoon.in/e/<code>` links.
///
/// Surrounding whitespace makes a link invalid, since it would be stored as is.
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() || url.to_lowercase().contains("placeholder") {
        return false;
    }
    embed_regex().is_match(url)
}

/// An episode dropped by [`clean`], kept for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedEpisode {
    pub season: String,
    pub title: String,
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct CleanedShow {
    pub record: ShowRecord,
    pub removed: Vec<RemovedEpisode>,
}

impl CleanedShow {
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// Keeps only episodes with a valid URL.
///
/// Groups left empty are dropped, and so are season entries left without groups.
#[must_use]
pub fn clean(mut record: ShowRecord) -> CleanedShow {
    let mut removed = Vec::new();

    let seasons = std::mem::take(&mut record.seasons_data);
    record.seasons_data = seasons
        .into_iter()
        .filter_map(|entry| {
            let groups: Vec<SeasonGroup> = entry
                .groups
                .into_iter()
                .filter_map(|group| {
                    let SeasonGroup { label, episodes } = group;
                    let (kept, dropped): (Vec<_>, Vec<_>) =
                        episodes.into_iter().partition(|ep| is_valid_url(&ep.url));

                    removed.extend(dropped.into_iter().map(|ep| RemovedEpisode {
                        season: label.clone(),
                        title: ep.title,
                        filename: ep.filename,
                        url: ep.url,
                    }));

                    (!kept.is_empty()).then(|| SeasonGroup::new(label, kept))
                })
                .collect();

            (!groups.is_empty()).then_some(SeasonEntry { groups })
        })
        .collect();

    if removed.is_empty() {
        debug!(show = %record.show_title, "No invalid episodes to remove");
    } else {
        info!(
            event = "invalid_episodes_removed",
            show = %record.show_title,
            removed = removed.len(),
            kept = record.episode_count(),
            "Removed episodes without a valid URL"
        );
    }

    CleanedShow { record, removed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::hosting::PLACEHOLDER_URL;
    use crate::domain::EpisodeKey;
    use crate::models::EpisodeRecord;

    fn episode(n: u32, url: &str) -> EpisodeRecord {
        let mut ep = EpisodeRecord::new("Show", EpisodeKey::new(1, n), format!("Ep {n}"), "mkv");
        ep.url = url.to_string();
        ep
    }

    #[test]
    fn whitelist() {
        assert!(is_valid_url("https://filemoon.in/e/abc123"));
        assert!(is_valid_url("http://www.FileMoon.in/e/a_b-C/"));
        assert!(is_valid_url("https://filemoon.in/e/abc123?t=5"));
        assert!(!is_valid_url("https://filemoon.in/e/placeholder"));
        assert!(!is_valid_url(PLACEHOLDER_URL));
        assert!(!is_valid_url("https://evil.com/e/abc123"));
        assert!(!is_valid_url("https://filemoon.in/d/abc123"));
        assert!(!is_valid_url("https://filemoon.in/e/"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("   "));
        assert!(!is_valid_url(" https://filemoon.in/e/abc123 "));
        assert!(!is_valid_url("https://filemoon.in/e/abc123\n"));
    }

    #[test]
    fn clean_drops_invalid_and_empty_groups() {
        let mut show = ShowRecord::new("Show", crate::models::Category::Series);
        show.push_season(SeasonGroup::new(
            "Season 01",
            vec![
                episode(1, "https://filemoon.in/e/aaa"),
                episode(2, PLACEHOLDER_URL),
                episode(3, ""),
            ],
        ));
        show.push_season(SeasonGroup::new("Season 02", vec![episode(1, PLACEHOLDER_URL)]));
        show.seasons_data.push(SeasonEntry {
            groups: vec![
                SeasonGroup::new("Specials", vec![]),
                SeasonGroup::new("Extras", vec![episode(9, "https://filemoon.in/e/zzz")]),
            ],
        });

        let cleaned = clean(show);
        assert_eq!(cleaned.removed_count(), 3);
        assert_eq!(cleaned.record.seasons_data.len(), 2);

        let labels: Vec<_> = cleaned.record.groups().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["Season 01", "Extras"]);
        assert!(cleaned.record.episodes().all(|ep| is_valid_url(&ep.url)));
        assert_eq!(cleaned.removed[2].season, "Season 02");
        assert_eq!(cleaned.removed[0].filename, "Show_S01E02.mkv");
    }
}
