//! Point-in-time snapshot of the files already uploaded to the hosting platform.
//!
//! The snapshot lives in a CSV file regenerated on demand from the hosting API
//! (see [`fetch_catalog`]) and is read by the aligner to resolve episode URLs.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clients::{CatalogSource, ClientError};
use crate::domain::EpisodeKey;
use crate::matching::FuzzyTitleMatcher;
use crate::models::HostedFileRecord;
use crate::parser::NaturalKey;
use crate::parser::naming::normalize_stem;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Catalog file unreadable: {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("Failed to write catalog: {0}")]
    Write(String),
}

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        Self::Write(err.to_string())
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Write(err.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct HostedCatalog {
    rows: Vec<HostedFileRecord>,
    /// Normalized stem -> index of the first row carrying it.
    by_stem: HashMap<String, usize>,
}

impl HostedCatalog {
    /// Builds a catalog, dropping rows without a title or file code.
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = HostedFileRecord>) -> Self {
        let mut catalog = Self::default();
        for mut row in rows {
            row.title = row.title.trim().to_string();
            row.file_code = row.file_code.trim().to_string();
            if !row.is_usable() {
                continue;
            }

            let stem = normalize_stem(&row.title);
            if catalog.by_stem.contains_key(&stem) {
                debug!(title = %row.title, "Duplicate catalog title, keeping first row");
            } else {
                catalog.by_stem.insert(stem, catalog.rows.len());
            }
            catalog.rows.push(row);
        }
        catalog
    }

    /// Reads a CSV with a header row; the title column may be named
    /// `title` or `filename`.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::Missing(path.to_path_buf()));
        }

        let unreadable = |message: String| CatalogError::Unreadable {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| unreadable(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| unreadable(e.to_string()))?
            .clone();
        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let title_col = column("title")
            .or_else(|| column("filename"))
            .ok_or_else(|| unreadable("missing `title` column".to_string()))?;
        let code_col = column("file_code")
            .ok_or_else(|| unreadable("missing `file_code` column".to_string()))?;
        let size_col = column("file_size");
        let uploaded_col = column("uploaded");
        let status_col = column("status");
        let public_col = column("public");

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!(line = line + 2, error = %e, "Skipping malformed catalog row");
                    continue;
                }
            };
            let field = |col: Option<usize>| {
                col.and_then(|c| record.get(c))
                    .unwrap_or_default()
                    .to_string()
            };

            rows.push(HostedFileRecord {
                title: field(Some(title_col)),
                file_code: field(Some(code_col)),
                file_size: field(size_col),
                uploaded: field(uploaded_col),
                status: field(status_col),
                public: field(public_col),
            });
        }

        let catalog = Self::from_rows(rows);
        info!(
            event = "catalog_loaded",
            path = %path.display(),
            rows = catalog.len(),
            "Loaded hosted-file catalog"
        );
        Ok(catalog)
    }

    /// Rewrites the snapshot, columns in the order the hosting API reports them.
    pub fn write(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        if self.rows.is_empty() {
            writer.write_record(crate::constants::catalog::CSV_COLUMNS)?;
        }
        writer.flush()?;
        Ok(())
    }

    #[must_use]
    pub fn rows(&self) -> &[HostedFileRecord] {
        &self.rows
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row whose normalized title equals the normalized `name`.
    #[must_use]
    pub fn find_exact(&self, name: &str) -> Option<&HostedFileRecord> {
        self.by_stem
            .get(&normalize_stem(name))
            .and_then(|&idx| self.rows.get(idx))
    }

    /// Earliest row tagged `SxxEyy` for `key` that also shares enough words
    /// with the cleaned show title: two, or all of them for one-word titles.
    #[must_use]
    pub fn find_tagged(&self, key: EpisodeKey, show_clean: &str) -> Option<&HostedFileRecord> {
        let show_words: HashSet<String> = show_clean
            .to_lowercase()
            .split('_')
            .filter(|w| !w.is_empty())
            .map(ToString::to_string)
            .collect();
        if show_words.is_empty() {
            return None;
        }
        let needed = show_words.len().min(2);
        let tag = key.tag().to_lowercase();

        self.rows.iter().find(|row| {
            let stem = normalize_stem(&row.title).to_lowercase();
            if !contains_tag(&stem, &tag) {
                return false;
            }
            let common = stem
                .split('_')
                .filter(|word| show_words.contains(*word))
                .collect::<HashSet<_>>()
                .len();
            common >= needed
        })
    }

    /// Rows accepted by the fuzzy matcher for `query`, in natural title order.
    #[must_use]
    pub fn candidates(&self, query: &str) -> Vec<&HostedFileRecord> {
        let matcher = FuzzyTitleMatcher::new(query);
        let mut found: Vec<_> = self
            .rows
            .iter()
            .filter(|row| matcher.matches(&row.title))
            .collect();
        found.sort_by_cached_key(|row| NaturalKey::new(&row.title));
        found
    }

    /// Row sharing the most words with `query`, in catalog order on ties.
    #[must_use]
    pub fn best_match(&self, query: &str) -> Option<&HostedFileRecord> {
        FuzzyTitleMatcher::new(query).best_match(&self.rows, |row| row.title.as_str())
    }
}

/// `s01e10` must not be followed by another digit, or it would hit `s01e100`.
fn contains_tag(stem: &str, tag: &str) -> bool {
    stem.match_indices(tag).any(|(start, _)| {
        !stem[start + tag.len()..].starts_with(|c: char| c.is_ascii_digit())
    })
}

/// Pages through `source` until a page comes back short.
pub async fn fetch_catalog(
    source: &dyn CatalogSource,
    per_page: u32,
) -> Result<HostedCatalog, ClientError> {
    let per_page = per_page.max(1);
    let mut rows = Vec::new();
    let mut page = 1;

    loop {
        let batch = source.list_page(page, per_page).await?;
        let count = batch.len();
        rows.extend(batch);
        info!(
            event = "catalog_page_fetched",
            page,
            count,
            total = rows.len(),
            "Fetched catalog page"
        );

        if count < per_page as usize {
            break;
        }
        page += 1;
    }

    Ok(HostedCatalog::from_rows(rows))
}
