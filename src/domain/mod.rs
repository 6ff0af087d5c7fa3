//! Domain primitives shared by the reconciliation pipeline.
//!
//! Newtypes here keep opaque identifiers issued by the hosting platform from
//! being confused with free-text titles or arbitrary URLs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::hosting::EMBED_BASE_URL;

/// Opaque file identifier issued by the hosting platform.
///
/// # Examples
///
/// ```rust
/// use moonarr::domain::FileCode;
///
/// let code = FileCode::new("abc123");
/// assert_eq!(code.embed_url(), "https://filemoon.in/e/abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileCode(String);

impl FileCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolved media URL for this file.
    #[must_use]
    pub fn embed_url(&self) -> String {
        format!("{EMBED_BASE_URL}{}", self.0)
    }
}

impl fmt::Display for FileCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// A (season, episode) coordinate inside one show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpisodeKey {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeKey {
    #[must_use]
    pub const fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }

    /// `S01E02`-style tag used in canonical filenames.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("S{:02}E{:02}", self.season, self.episode)
    }
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_code_trims_and_builds_url() {
        let code = FileCode::new("  xyz_9-A ");
        assert_eq!(code.as_str(), "xyz_9-A");
        assert_eq!(code.embed_url(), "https://filemoon.in/e/xyz_9-A");
    }

    #[test]
    fn episode_key_tag_is_zero_padded() {
        assert_eq!(EpisodeKey::new(4, 1).tag(), "S04E01");
        assert_eq!(EpisodeKey::new(1, 123).to_string(), "S01E123");
    }
}
