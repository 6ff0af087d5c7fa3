use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::transfers::{COMPLETION_SUFFIX, PARTIAL_SUFFIX};

#[must_use]
pub fn manifest_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(format!(".{COMPLETION_SUFFIX}"));
    PathBuf::from(name)
}

pub async fn is_complete(file: &Path) -> bool {
    let Ok(meta) = tokio::fs::metadata(file).await else {
        return false;
    };
    let Ok(recorded) = tokio::fs::read_to_string(manifest_path(file)).await else {
        return false;
    };
    recorded.trim().parse::<u64>().ok() == Some(meta.len())
}

/// Records the current on-disk size of `file`. Returns that size.
pub async fn mark_complete(file: &Path) -> std::io::Result<u64> {
    let size = tokio::fs::metadata(file).await?.len();
    tokio::fs::write(manifest_path(file), size.to_string()).await?;
    Ok(size)
}

pub(super) async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Staging file for a download headed to `target`. Every guard gets its own
/// `{target}.{uuid}.part` name; dropping it uncommitted removes only that file.
#[derive(Debug)]
pub struct PartialFile {
    target: PathBuf,
    staged: PathBuf,
    committed: bool,
}

impl PartialFile {
    #[must_use]
    pub fn new(target: PathBuf) -> Self {
        let mut staged = target.as_os_str().to_owned();
        staged.push(format!(".{}.{PARTIAL_SUFFIX}", Uuid::new_v4().simple()));
        Self {
            target,
            staged: PathBuf::from(staged),
            committed: false,
        }
    }

    /// Where the download should write.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.staged
    }

    /// Renames the staged file onto the target, then records its size.
    pub async fn commit(mut self) -> std::io::Result<u64> {
        tokio::fs::rename(&self.staged, &self.target).await?;
        self.committed = true;
        mark_complete(&self.target).await
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.staged) {
            Ok(()) => debug!(path = %self.staged.display(), "Removed partial download"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.staged.display(), error = %e, "Failed to remove partial download"),
        }
    }
}
