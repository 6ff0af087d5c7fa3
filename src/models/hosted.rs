use serde::{Deserialize, Serialize};

use crate::domain::FileCode;

/// One row of the hosted-file catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostedFileRecord {
    #[serde(default)]
    pub file_code: String,

    #[serde(default, alias = "filename", alias = "name")]
    pub title: String,

    #[serde(default)]
    pub file_size: String,

    #[serde(default)]
    pub uploaded: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub public: String,
}

impl HostedFileRecord {
    #[must_use]
    pub fn new(title: impl Into<String>, file_code: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            file_code: file_code.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn code(&self) -> FileCode {
        FileCode::new(self.file_code.as_str())
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.code().embed_url()
    }

    /// Rows without a title or code cannot be matched to anything.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty() && !self.file_code.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_trimmed_code() {
        let row = HostedFileRecord::new("Show_S01E01", " abc123 ");
        assert_eq!(row.url(), "https://filemoon.in/e/abc123");
        assert!(row.is_usable());
    }

    #[test]
    fn filename_alias_fills_title() {
        let row: HostedFileRecord =
            serde_json::from_str(r#"{"filename": "Show 3.mp4", "file_code": "zz"}"#).unwrap();
        assert_eq!(row.title, "Show 3.mp4");
        assert!(!HostedFileRecord::new("", "zz").is_usable());
    }
}
