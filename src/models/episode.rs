use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use crate::constants::hosting::PLACEHOLDER_URL;
use crate::domain::EpisodeKey;
use crate::parser::naming;

/// One TV/anime episode as scraped, plus whatever the pipeline resolved for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub duration: String,

    #[serde(
        default,
        deserialize_with = "lenient::non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,

    #[serde(default = "default_season", deserialize_with = "lenient::season")]
    pub season_number: u32,

    #[serde(
        default,
        deserialize_with = "lenient::optional_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub episode_number: Option<u32>,

    #[serde(
        default,
        deserialize_with = "lenient::optional_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_episodes_in_season: Option<u32>,

    #[serde(default)]
    pub filename: String,

    #[serde(default = "placeholder_url")]
    pub url: String,

    #[serde(
        default,
        alias = "subtitle",
        deserialize_with = "lenient::non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub subtitle_file: Option<String>,

    /// Fields this crate does not interpret, kept so documents round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const fn default_season() -> u32 {
    1
}

fn placeholder_url() -> String {
    PLACEHOLDER_URL.to_string()
}

impl Default for EpisodeRecord {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            duration: String::new(),
            image_url: None,
            season_number: default_season(),
            episode_number: None,
            total_episodes_in_season: None,
            filename: String::new(),
            url: placeholder_url(),
            subtitle_file: None,
            extra: Map::new(),
        }
    }
}

impl EpisodeRecord {
    /// Builds an episode with its canonical `{Show}_SxxEyy.{ext}` filename.
    #[must_use]
    pub fn new(show_title: &str, key: EpisodeKey, title: impl Into<String>, ext: &str) -> Self {
        Self {
            title: title.into(),
            season_number: key.season,
            episode_number: Some(key.episode),
            filename: naming::episode_filename(show_title, key, ext),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn key(&self) -> Option<EpisodeKey> {
        self.episode_number
            .map(|episode| EpisodeKey::new(self.season_number, episode))
    }

    /// Filename without a trailing media/subtitle extension.
    #[must_use]
    pub fn filename_stem(&self) -> Option<&str> {
        let filename = self.filename.trim();
        if filename.is_empty() {
            return None;
        }
        Some(naming::strip_media_extension(filename))
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.url.trim().is_empty() || self.url.to_lowercase().contains("placeholder")
    }

    /// Applies arbitrary field updates the same way a document store would:
    /// known fields are re-validated, unknown ones land in `extra`.
    pub fn apply_updates(&mut self, updates: &Map<String, Value>) -> Result<(), serde_json::Error> {
        let mut value = serde_json::to_value(&*self)?;
        if let Value::Object(fields) = &mut value {
            for (key, update) in updates {
                fields.insert(key.clone(), update.clone());
            }
        }
        *self = serde_json::from_value(value)?;
        Ok(())
    }
}
