use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::domain::EpisodeKey;

/// Season/episode information recovered from a release filename.
///
/// Numbers are kept as zero-padded strings (`"04"`), matching how they appear
/// in canonical names; use [`FilenameInfo::key`] for arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameInfo {
    pub series: String,
    pub season_number: String,
    pub episode_number: String,
}

impl FilenameInfo {
    #[must_use]
    pub fn key(&self) -> Option<EpisodeKey> {
        Some(EpisodeKey::new(
            self.season_number.parse().ok()?,
            self.episode_number.parse().ok()?,
        ))
    }
}

/// Fields of a structured channel caption (`**○ Series:** `...``).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionInfo {
    pub series: Option<String>,
    pub language: Option<String>,
    pub resolution: Option<String>,
    pub codec: Option<String>,
    pub episode_title: Option<String>,
    pub episode_number: Option<u32>,
    pub total_in_season: Option<u32>,
    pub released_on: Option<String>,
    pub rating: Option<String>,
}

/// Fully resolved episode identity for one downloaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeInfo {
    pub series: String,
    pub season: u32,
    pub episode: u32,
    pub total_in_season: Option<u32>,
    pub episode_title: Option<String>,
    pub language: Option<String>,
    pub resolution: Option<String>,
    pub codec: Option<String>,
    pub released_on: Option<String>,
    pub rating: Option<String>,
}

impl EpisodeInfo {
    #[must_use]
    pub const fn key(&self) -> EpisodeKey {
        EpisodeKey::new(self.season, self.episode)
    }
}

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

/// Parses `Stranger.Things.S04E01.1080p.mkv`-style names.
///
/// The strict `SxxEyy` form is tried first, then a looser one where the `S`
/// and `E` letters are optional (`Show 04 01.mkv`, `Show.S04.E01.mkv`).
#[must_use]
pub fn parse_filename_info(filename: &str) -> Option<FilenameInfo> {
    parse_strict(filename).or_else(|| parse_loose(filename))
}

fn parse_strict(filename: &str) -> Option<FilenameInfo> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(
        &RE,
        r"(?i)^(?P<series>.+?)[._\s]S(?P<season>\d{1,2})E(?P<episode>\d{1,3})(?:[._\s].*)?\.[^.]+$",
    );

    info_from_captures(&re.captures(filename)?)
}

fn parse_loose(filename: &str) -> Option<FilenameInfo> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(
        &RE,
        r"(?i)^(?P<series>.+?)[._\s]S?(?P<season>\d{1,2})[._\s]E?(?P<episode>\d{1,3}).*\.[^.]+$",
    );

    info_from_captures(&re.captures(filename)?)
}

fn info_from_captures(caps: &Captures<'_>) -> Option<FilenameInfo> {
    let series = clean_series(caps.name("series")?.as_str());
    if series.is_empty() {
        return None;
    }

    Some(FilenameInfo {
        series,
        season_number: zero_pad(caps.name("season")?.as_str()),
        episode_number: zero_pad(caps.name("episode")?.as_str()),
    })
}

fn clean_series(raw: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"[._\s]+")
        .replace_all(raw, " ")
        .trim()
        .to_string()
}

fn zero_pad(digits: &str) -> String {
    format!("{digits:0>2}")
}

/// First `SxxEyy` tag anywhere in `name`, e.g. `The_Witcher_S01E02.mkv`.
#[must_use]
pub fn find_episode_tag(name: &str) -> Option<EpisodeKey> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let caps = get_regex(&RE, r"(?i)S(\d+)E(\d+)").captures(name)?;
    Some(EpisodeKey::new(
        caps.get(1)?.as_str().parse().ok()?,
        caps.get(2)?.as_str().parse().ok()?,
    ))
}

fn caption_patterns() -> &'static [(CaptionField, Regex)] {
    static PATTERNS: OnceLock<Vec<(CaptionField, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let field = |label: &str| {
            Regex::new(&format!(r"(?i)\*\*○ {label}:\*\* `([^`]+)`"))
                .expect("Invalid regex pattern defined in code")
        };
        vec![
            (CaptionField::Series, field("Series")),
            (
                CaptionField::Language,
                Regex::new(r"(?i)\*\*○ Language:\*\* `([^`]+)`|○ Language:\s*([^\n`]+)")
                    .expect("Invalid regex pattern defined in code"),
            ),
            (CaptionField::Resolution, field("Resolution")),
            (CaptionField::Codec, field("Codec")),
            (CaptionField::EpisodeTitle, field("Episode Title")),
            (CaptionField::EpisodeNumber, field("Episode Number")),
            (CaptionField::ReleasedOn, field("Released on")),
            (CaptionField::Rating, field("Episode Rating")),
        ]
    })
}

#[derive(Debug, Clone, Copy)]
enum CaptionField {
    Series,
    Language,
    Resolution,
    Codec,
    EpisodeTitle,
    EpisodeNumber,
    ReleasedOn,
    Rating,
}

/// Reads the markdown-style fields of a channel post caption.
#[must_use]
pub fn extract_caption_info(text: &str) -> CaptionInfo {
    let mut info = CaptionInfo::default();
    if text.trim().is_empty() {
        return info;
    }

    for (field, re) in caption_patterns() {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        let Some(value) = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().trim())
            .find(|v| !v.is_empty())
        else {
            continue;
        };
        let value = value.to_string();

        match field {
            CaptionField::Series => info.series = Some(value.replace('`', "").trim().to_string()),
            CaptionField::Language => info.language = Some(value),
            CaptionField::Resolution => info.resolution = Some(value),
            CaptionField::Codec => info.codec = Some(value),
            CaptionField::EpisodeTitle => info.episode_title = Some(value),
            CaptionField::EpisodeNumber => {
                let (episode, total) = parse_episode_number(&value);
                info.episode_number = episode;
                info.total_in_season = total;
            }
            CaptionField::ReleasedOn => info.released_on = Some(value),
            CaptionField::Rating => info.rating = Some(value),
        }
    }

    info
}

/// `"3/12"` -> `(Some(3), Some(12))`; otherwise the first digit run is the episode.
fn parse_episode_number(raw: &str) -> (Option<u32>, Option<u32>) {
    static FRACTION: OnceLock<Regex> = OnceLock::new();
    static DIGITS: OnceLock<Regex> = OnceLock::new();

    if let Some(caps) = get_regex(&FRACTION, r"^(\d+)\s*/\s*(\d+)").captures(raw) {
        return (
            caps.get(1).and_then(|m| m.as_str().parse().ok()),
            caps.get(2).and_then(|m| m.as_str().parse().ok()),
        );
    }

    let episode = get_regex(&DIGITS, r"\d+")
        .find(raw)
        .and_then(|m| m.as_str().parse().ok());
    (episode, None)
}

/// Combines filename and caption data; filename values win.
///
/// Returns `None` when the series or the episode number cannot be determined.
/// The season falls back to 1 only once the episode is known.
#[must_use]
pub fn resolve_episode_info(filename: Option<&str>, caption: Option<&str>) -> Option<EpisodeInfo> {
    let from_name = filename.and_then(parse_filename_info);
    let caption = caption.map(extract_caption_info).unwrap_or_default();

    let series = from_name
        .as_ref()
        .map(|f| f.series.clone())
        .or(caption.series)
        .filter(|s| !s.trim().is_empty())?;

    let episode = from_name
        .as_ref()
        .and_then(|f| f.episode_number.parse().ok())
        .or(caption.episode_number)?;

    let season = from_name
        .as_ref()
        .and_then(|f| f.season_number.parse().ok())
        .unwrap_or(1);

    Some(EpisodeInfo {
        series: series.trim().to_string(),
        season,
        episode,
        total_in_season: caption.total_in_season,
        episode_title: caption.episode_title,
        language: caption.language,
        resolution: caption.resolution,
        codec: caption.codec,
        released_on: caption.released_on,
        rating: caption.rating,
    })
}
