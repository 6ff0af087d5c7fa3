//! Assigns hosted-media URLs to scraped episodes.
//!
//! Per episode, an exact normalized-filename match is tried first, then an
//! `SxxEyy` tag match. Optionally, a positional pass zips whatever is still
//! unresolved against the fuzzy-filtered, naturally sorted catalog. Episodes
//! nothing matches keep their placeholder URL; they are dropped later by the
//! validity filter, not here.

use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, HostedCatalog};
use crate::config::PositionalFallback;
use crate::models::{Category, EpisodeRecord, HostedFileRecord, ShowRecord};
use crate::parser::find_episode_tag;
use crate::parser::naming::clean_show_name;
use crate::services::validity::is_valid_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Exact,
    Tagged,
    Positional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub url: String,
    pub catalog_title: String,
    pub strategy: MatchStrategy,
}

impl Match {
    fn from_row(row: &HostedFileRecord, strategy: MatchStrategy) -> Self {
        Self {
            url: row.url(),
            catalog_title: row.title.clone(),
            strategy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoMatchReason {
    #[error("episode has no filename")]
    MissingFilename,

    #[error("no catalog row matches the episode")]
    NoCandidate,
}

/// Per-pass settings.
#[derive(Debug, Clone, Default)]
pub struct AlignOptions {
    /// Run the positional fallback after the per-episode strategies.
    pub positional: bool,
    /// Fuzzy query for positional candidates; defaults to the show title.
    pub query: Option<String>,
}

impl AlignOptions {
    /// Resolves the configured fallback mode for one show.
    #[must_use]
    pub fn for_show(
        mode: PositionalFallback,
        show: &ShowRecord,
        force_positional: bool,
        query: Option<String>,
    ) -> Self {
        let positional = force_positional
            || match mode {
                PositionalFallback::Always => true,
                PositionalFallback::Never => false,
                PositionalFallback::Auto => show.category == Some(Category::Anime),
            };
        Self { positional, query }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentReport {
    pub total: usize,
    pub exact: usize,
    pub tagged: usize,
    pub positional: usize,
    /// Not matched this pass but already carrying a valid URL.
    pub preserved: usize,
    pub unresolved: usize,
    /// Catalog rows considered by the positional pass.
    pub candidates: usize,
}

impl AlignmentReport {
    #[must_use]
    pub const fn matched(&self) -> usize {
        self.exact + self.tagged + self.positional
    }
}

impl fmt::Display for AlignmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Matched {}/{} episodes (exact {}, tagged {}, positional {}); {} kept existing URL; {} unresolved",
            self.matched(),
            self.total,
            self.exact,
            self.tagged,
            self.positional,
            self.preserved,
            self.unresolved
        )?;
        if self.candidates > 0 {
            write!(f, "; {} positional candidates", self.candidates)?;
        }
        Ok(())
    }
}

pub struct EpisodeAligner<'a> {
    catalog: &'a HostedCatalog,
}

impl<'a> EpisodeAligner<'a> {
    #[must_use]
    pub const fn new(catalog: &'a HostedCatalog) -> Self {
        Self { catalog }
    }

    /// Exact stem match, then `SxxEyy` tag match against the cleaned show name.
    pub fn resolve(&self, show_clean: &str, episode: &EpisodeRecord) -> Result<Match, NoMatchReason> {
        let filename = episode.filename.trim();
        if filename.is_empty() {
            return Err(NoMatchReason::MissingFilename);
        }

        if let Some(row) = self.catalog.find_exact(filename) {
            return Ok(Match::from_row(row, MatchStrategy::Exact));
        }

        find_episode_tag(filename)
            .and_then(|key| self.catalog.find_tagged(key, show_clean))
            .map(|row| Match::from_row(row, MatchStrategy::Tagged))
            .ok_or(NoMatchReason::NoCandidate)
    }

    /// Aligns every episode of `show` in place.
    pub fn align(&self, show: &mut ShowRecord, options: &AlignOptions) -> AlignmentReport {
        let show_clean = clean_show_name(&show.show_title);
        let mut report = AlignmentReport::default();
        let mut settled = Vec::new();

        for episode in show.episodes_mut() {
            report.total += 1;
            match self.resolve(&show_clean, episode) {
                Ok(found) => {
                    debug!(
                        filename = %episode.filename,
                        catalog_title = %found.catalog_title,
                        strategy = ?found.strategy,
                        "Episode matched"
                    );
                    match found.strategy {
                        MatchStrategy::Exact => report.exact += 1,
                        MatchStrategy::Tagged => report.tagged += 1,
                        MatchStrategy::Positional => report.positional += 1,
                    }
                    episode.url = found.url;
                    settled.push(true);
                }
                Err(reason) => {
                    debug!(filename = %episode.filename, %reason, "Episode not matched");
                    settled.push(is_valid_url(&episode.url));
                }
            }
        }

        if options.positional {
            let query = options
                .query
                .clone()
                .unwrap_or_else(|| show.show_title.clone());
            let candidates = self.catalog.candidates(&query);
            report.candidates = candidates.len();

            // Slots are consumed by position even when the episode was settled above.
            for ((episode, done), row) in show.episodes_mut().zip(&settled).zip(&candidates) {
                if *done {
                    continue;
                }
                debug!(title = %episode.title, catalog_title = %row.title, "Positional match");
                episode.url = row.url();
                report.positional += 1;
            }
        }

        for episode in show.episodes() {
            if !is_valid_url(&episode.url) {
                report.unresolved += 1;
            }
        }
        report.preserved = report
            .total
            .saturating_sub(report.matched() + report.unresolved);

        info!(
            event = "alignment_completed",
            show = %show.show_title,
            total = report.total,
            exact = report.exact,
            tagged = report.tagged,
            positional = report.positional,
            unresolved = report.unresolved,
            "{report}"
        );
        report
    }
}

/// Loads the catalog at `path` and aligns `show`.
///
/// A missing or unreadable catalog leaves the show untouched and is only logged.
pub fn align_from_path(path: &Path, show: &mut ShowRecord, options: &AlignOptions) -> AlignmentReport {
    match HostedCatalog::load(path) {
        Ok(catalog) => EpisodeAligner::new(&catalog).align(show, options),
        Err(e @ (CatalogError::Missing(_) | CatalogError::Unreadable { .. })) => {
            warn!(event = "alignment_skipped", error = %e, "Catalog unavailable, leaving episodes unchanged");
            unaligned_report(show)
        }
        Err(e) => {
            warn!(event = "alignment_skipped", error = %e, "Catalog error, leaving episodes unchanged");
            unaligned_report(show)
        }
    }
}

fn unaligned_report(show: &ShowRecord) -> AlignmentReport {
    let total = show.episode_count();
    let unresolved = show.episodes().filter(|ep| !is_valid_url(&ep.url)).count();
    AlignmentReport {
        total,
        unresolved,
        preserved: total - unresolved,
        ..AlignmentReport::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::hosting::PLACEHOLDER_URL;
    use crate::domain::EpisodeKey;
    use crate::models::SeasonGroup;

    fn catalog(rows: &[(&str, &str)]) -> HostedCatalog {
        HostedCatalog::from_rows(rows.iter().map(|(t, c)| HostedFileRecord::new(*t, *c)))
    }

    fn series(title: &str, seasons: &[(u32, u32)]) -> ShowRecord {
        let mut show = ShowRecord::new(title, Category::Series);
        for &(season, count) in seasons {
            let episodes = (1..=count)
                .map(|n| EpisodeRecord::new(title, EpisodeKey::new(season, n), format!("Episode {n}"), "mkv"))
                .collect();
            show.push_season(SeasonGroup::new(SeasonGroup::label_for(season), episodes));
        }
        show
    }

    fn anime(title: &str, count: usize) -> ShowRecord {
        let mut show = ShowRecord::new(title, Category::Anime);
        let episodes = (1..=count)
            .map(|n| EpisodeRecord {
                title: format!("Episode {n}"),
                filename: crate::parser::naming::sequential_filename(title, n, "mp4"),
                ..EpisodeRecord::default()
            })
            .collect();
        show.push_season(SeasonGroup::new("Season 01", episodes));
        show
    }

    fn urls(show: &ShowRecord) -> Vec<String> {
        show.episodes().map(|ep| ep.url.clone()).collect()
    }

    #[test]
    fn exact_match_wins_over_fuzzy_rows() {
        let cat = catalog(&[("Show S01E01 alt upload", "fuzzy"), ("Show_S01E01", "exact")]);
        let mut show = series("Show", &[(1, 1)]);
        let report = EpisodeAligner::new(&cat).align(
            &mut show,
            &AlignOptions {
                positional: true,
                query: None,
            },
        );

        assert_eq!(urls(&show), ["https://filemoon.in/e/exact"]);
        assert_eq!(report.exact, 1);
        assert_eq!(report.positional, 0);
        assert_eq!(report.unresolved, 0);
    }

    #[test]
    fn tagged_match_needs_show_words() {
        let cat = catalog(&[
            ("Random Thing S01E02", "wrong"),
            ("The Witcher 2019 S01E02 1080p", "right"),
        ]);
        let mut show = series("The Witcher", &[(1, 3)]);
        let report = EpisodeAligner::new(&cat).align(&mut show, &AlignOptions::default());

        assert_eq!(report.tagged, 1);
        assert_eq!(report.unresolved, 2);
        assert_eq!(show.episodes().nth(1).unwrap().url, "https://filemoon.in/e/right");
        assert_eq!(show.episodes().next().unwrap().url, PLACEHOLDER_URL);
    }

    #[test]
    fn positional_order_ignores_input_order() {
        let cat = catalog(&[("Show 3", "c3"), ("Show 1", "c1"), ("Show 2", "c2")]);
        let mut show = anime("Show Title Missing", 3);
        let report = EpisodeAligner::new(&cat).align(
            &mut show,
            &AlignOptions {
                positional: true,
                query: Some("Show".into()),
            },
        );

        assert_eq!(
            urls(&show),
            [
                "https://filemoon.in/e/c1",
                "https://filemoon.in/e/c2",
                "https://filemoon.in/e/c3"
            ]
        );
        assert_eq!(report.positional, 3);
        assert_eq!(report.candidates, 3);
    }

    #[test]
    fn positional_leaves_excess_episodes_unresolved() {
        let cat = catalog(&[("Demon Slayer 2", "b"), ("Demon Slayer 1", "a"), ("Bleach 1", "x")]);
        let mut show = anime("Kimetsu", 4);
        let report = EpisodeAligner::new(&cat).align(
            &mut show,
            &AlignOptions {
                positional: true,
                query: Some("Demon Slayer".into()),
            },
        );

        assert_eq!(report.positional, 2);
        assert_eq!(report.unresolved, 2);
        assert_eq!(show.episodes().nth(2).unwrap().url, PLACEHOLDER_URL);
    }

    #[test]
    fn positional_skips_settled_episodes_without_shifting() {
        let cat = catalog(&[("Demon Slayer 1", "a"), ("Demon Slayer 2", "b"), ("Demon Slayer 3", "c")]);
        let mut show = anime("Demon Slayer", 3);
        // Every sequential filename matches its catalog row exactly.
        let report = EpisodeAligner::new(&cat).align(
            &mut show,
            &AlignOptions {
                positional: true,
                query: None,
            },
        );

        assert_eq!(report.exact, 3);
        assert_eq!(report.positional, 0);

        let cat = catalog(&[("Demon Slayer 1", "a"), ("Demon Slayer 2", "b"), ("Demon Slayer 3", "c")]);
        let mut show = anime("Kimetsu", 3);
        show.episodes_mut().nth(1).unwrap().url = "https://filemoon.in/e/manual".into();
        let report = EpisodeAligner::new(&cat).align(
            &mut show,
            &AlignOptions {
                positional: true,
                query: Some("demon slayer".into()),
            },
        );
        assert_eq!(
            urls(&show),
            [
                "https://filemoon.in/e/a",
                "https://filemoon.in/e/manual",
                "https://filemoon.in/e/c"
            ]
        );
        assert_eq!(report.preserved, 1);
        assert_eq!(report.positional, 2);
    }

    #[test]
    fn resolve_reports_reasons() {
        let cat = catalog(&[("Show_S01E01", "a")]);
        let aligner = EpisodeAligner::new(&cat);
        let no_name = EpisodeRecord::default();
        assert_eq!(aligner.resolve("Show", &no_name), Err(NoMatchReason::MissingFilename));

        let other = EpisodeRecord::new("Show", EpisodeKey::new(2, 1), "x", "mkv");
        assert_eq!(aligner.resolve("Show", &other), Err(NoMatchReason::NoCandidate));
    }

    #[test]
    fn auto_mode_enables_positional_for_anime_only() {
        let anime_show = anime("Demon Slayer", 1);
        let tv = series("Dark", &[(1, 1)]);
        assert!(AlignOptions::for_show(PositionalFallback::Auto, &anime_show, false, None).positional);
        assert!(!AlignOptions::for_show(PositionalFallback::Auto, &tv, false, None).positional);
        assert!(AlignOptions::for_show(PositionalFallback::Never, &tv, true, None).positional);
        assert!(AlignOptions::for_show(PositionalFallback::Always, &tv, false, None).positional);
    }

    #[test]
    fn missing_catalog_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut show = series("Show", &[(1, 2)]);
        let before = show.clone();
        let report = align_from_path(&dir.path().join("missing.csv"), &mut show, &AlignOptions::default());

        assert_eq!(show, before);
        assert_eq!(report.total, 2);
        assert_eq!(report.unresolved, 2);
        assert_eq!(report.matched(), 0);
    }
}
