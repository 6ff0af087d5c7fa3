//! Canonical filenames shared by the downloader, the uploader and the aligner.
//!
//! Every producer derives names from `(show, season, episode)` through these
//! helpers, which is what lets independent runs meet on the same stem.

use regex::Regex;
use std::sync::OnceLock;

use crate::constants::{SUBTITLE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::domain::EpisodeKey;

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

fn strip_symbols(s: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"[^\w\s-]").replace_all(s, "").into_owned()
}

fn underscore_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join("_")
}

/// `"Grey's Anatomy (2005)"` -> `"Greys_Anatomy"`.
#[must_use]
pub fn clean_show_name(title: &str) -> String {
    static PARENS: OnceLock<Regex> = OnceLock::new();
    let without_year = get_regex(&PARENS, r"\s*\([^)]*\)").replace_all(title, "");
    underscore_spaces(&strip_symbols(&without_year))
}

/// `{ShowCleaned}_S{season:02}E{episode:02}.{ext}`
#[must_use]
pub fn episode_filename(show_title: &str, key: EpisodeKey, ext: &str) -> String {
    format!(
        "{}_{}.{}",
        clean_show_name(show_title),
        key.tag(),
        ext.trim_start_matches('.')
    )
}

/// Name used by sources that number episodes globally: `"Demon Slayer 27.mp4"`.
#[must_use]
pub fn sequential_filename(show_title: &str, index: usize, ext: &str) -> String {
    format!(
        "{} {index}.{}",
        title_case(show_title.trim()),
        ext.trim_start_matches('.')
    )
}

/// Season directory name under a series folder: `"Season 04"`.
#[must_use]
pub fn season_folder(season: u32) -> String {
    format!("Season {season:02}")
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Extension of `name` when it is a known video or subtitle extension.
#[must_use]
pub fn media_extension(name: &str) -> Option<&str> {
    let (_, ext) = name.rsplit_once('.')?;
    let known = VIDEO_EXTENSIONS
        .iter()
        .chain(SUBTITLE_EXTENSIONS)
        .any(|e| e.eq_ignore_ascii_case(ext));
    known.then_some(ext)
}

/// Drops a trailing media/subtitle extension; other dots are part of the name.
#[must_use]
pub fn strip_media_extension(name: &str) -> &str {
    match media_extension(name) {
        Some(ext) => &name[..name.len() - ext.len() - 1],
        None => name,
    }
}

/// Key used for exact filename alignment on both sides of the match.
///
/// `"The Witcher S01E01"`, `"The_Witcher_S01E01.mkv"` and
/// `"The Witcher: S01E01"` all normalize to `"The_Witcher_S01E01"`.
#[must_use]
pub fn normalize_stem(name: &str) -> String {
    underscore_spaces(&strip_symbols(strip_media_extension(name.trim())))
}
