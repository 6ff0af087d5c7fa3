pub mod episode;
pub mod hosted;
pub mod show;

pub use episode::EpisodeRecord;
pub use hosted::HostedFileRecord;
pub use show::{Category, SeasonEntry, SeasonGroup, ShowRecord};

/// Tolerant numeric field handling for scraped documents, where numbers show
/// up as integers, floats, or zero-padded strings such as `"01"`.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    fn to_u32(raw: Raw) -> Option<u32> {
        match raw {
            Raw::Int(n) => u32::try_from(n).ok(),
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Raw::Float(f) if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) => {
                Some(f as u32)
            }
            Raw::Float(_) => None,
            Raw::Text(s) => {
                let digits: String = s.chars().filter(char::is_ascii_digit).collect();
                digits.parse().ok()
            }
        }
    }

    pub fn optional_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Raw>::deserialize(deserializer)?.and_then(to_u32))
    }

    /// Season numbers fall back to 1 when present but unreadable.
    pub fn season<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(optional_u32(deserializer)?.unwrap_or(1))
    }

    pub fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.trim().is_empty()))
    }
}
