use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::EpisodeRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Series,
    Anime,
    Movie,
}

impl Category {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Anime => "anime",
            Self::Movie => "movie",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "series" | "tv" | "show" => Ok(Self::Series),
            "anime" => Ok(Self::Anime),
            "movie" | "film" => Ok(Self::Movie),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Episodes under one human-readable season label, in catalog order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeasonGroup {
    pub label: String,
    pub episodes: Vec<EpisodeRecord>,
}

impl SeasonGroup {
    #[must_use]
    pub fn new(label: impl Into<String>, episodes: Vec<EpisodeRecord>) -> Self {
        Self {
            label: label.into(),
            episodes,
        }
    }

    #[must_use]
    pub fn label_for(season: u32) -> String {
        format!("Season {season:02}")
    }

    /// The season number embedded in the label (`"Season 03"` -> 3).
    #[must_use]
    pub fn season_number(&self) -> Option<u32> {
        let digits: String = self
            .label
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }
}

/// One element of `seasons_data`: a JSON object mapping labels to episode lists.
///
/// Usually holds a single group, but the wire format allows several and
/// their order is preserved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeasonEntry {
    pub groups: Vec<SeasonGroup>,
}

impl SeasonEntry {
    #[must_use]
    pub fn single(group: SeasonGroup) -> Self {
        Self {
            groups: vec![group],
        }
    }
}

impl Serialize for SeasonEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.label, &group.episodes)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SeasonEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = SeasonEntry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping season labels to episode lists")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut groups = Vec::new();
                while let Some((label, episodes)) =
                    access.next_entry::<String, Vec<EpisodeRecord>>()?
                {
                    groups.push(SeasonGroup { label, episodes });
                }
                Ok(SeasonEntry { groups })
            }
        }

        deserializer.deserialize_map(EntryVisitor)
    }
}

/// One show/series/movie document, keyed by `show_title`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShowRecord {
    #[serde(default)]
    pub show_title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    #[serde(default)]
    pub seasons_data: Vec<SeasonEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Descriptive metadata (year, rating, cast, images, ...) passed through untouched.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl ShowRecord {
    #[must_use]
    pub fn new(show_title: impl Into<String>, category: Category) -> Self {
        Self {
            show_title: show_title.into(),
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn push_season(&mut self, group: SeasonGroup) {
        self.seasons_data.push(SeasonEntry::single(group));
    }

    pub fn groups(&self) -> impl Iterator<Item = &SeasonGroup> {
        self.seasons_data.iter().flat_map(|entry| entry.groups.iter())
    }

    pub fn groups_mut(&mut self) -> impl Iterator<Item = &mut SeasonGroup> {
        self.seasons_data
            .iter_mut()
            .flat_map(|entry| entry.groups.iter_mut())
    }

    /// All episodes in season-then-episode (document) order.
    pub fn episodes(&self) -> impl Iterator<Item = &EpisodeRecord> {
        self.groups().flat_map(|group| group.episodes.iter())
    }

    pub fn episodes_mut(&mut self) -> impl Iterator<Item = &mut EpisodeRecord> {
        self.groups_mut().flat_map(|group| group.episodes.iter_mut())
    }

    #[must_use]
    pub fn episode_count(&self) -> usize {
        self.groups().map(|group| group.episodes.len()).sum()
    }

    #[must_use]
    pub fn category_or_default(&self) -> Category {
        self.category.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "show_title": "The Witcher",
            "year": "2019",
            "cast": ["Henry Cavill"],
            "seasons_data": [
                { "Season 01": [
                    { "title": "The End's Beginning", "episode_number": 1, "filename": "The_Witcher_S01E01.mkv", "url": "https://filemoon.in/placeholder" },
                    { "title": "Four Marks", "episode_number": "02", "filename": "The_Witcher_S01E02.mkv", "url": "https://filemoon.in/e/abc" }
                ]},
                { "Season 02": [], "Specials": [ { "title": "Extra" } ] }
            ]
        })
    }

    #[test]
    fn season_entries_keep_label_order() {
        let show: ShowRecord = serde_json::from_value(sample()).unwrap();
        assert_eq!(show.seasons_data.len(), 2);
        let labels: Vec<_> = show.groups().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["Season 01", "Season 02", "Specials"]);
        assert_eq!(show.episode_count(), 3);
        assert_eq!(show.metadata.get("year"), Some(&json!("2019")));
        assert_eq!(show.category, None);
    }

    #[test]
    fn serializes_back_to_label_objects() {
        let show: ShowRecord = serde_json::from_value(sample()).unwrap();
        let out = serde_json::to_value(&show).unwrap();
        assert_eq!(out["seasons_data"][0]["Season 01"][1]["episode_number"], 2);
        assert_eq!(out["cast"][0], "Henry Cavill");
        assert!(out.get("created_at").is_none());
    }

    #[test]
    fn season_number_from_label() {
        assert_eq!(SeasonGroup::new("Season 03", vec![]).season_number(), Some(3));
        assert_eq!(SeasonGroup::new("S12", vec![]).season_number(), Some(12));
        assert_eq!(SeasonGroup::new("Specials", vec![]).season_number(), None);
        assert_eq!(SeasonGroup::label_for(7), "Season 07");
    }

    #[test]
    fn category_parsing() {
        assert_eq!("Anime".parse::<Category>(), Ok(Category::Anime));
        assert_eq!("tv".parse::<Category>(), Ok(Category::Series));
        assert!("podcast".parse::<Category>().is_err());
        assert_eq!(serde_json::to_value(Category::Movie).unwrap(), json!("movie"));
    }
}
