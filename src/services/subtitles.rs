//! Subtitle generation for downloaded videos that have no sibling `.srt`.
//!
//! Speech recognition itself sits behind [`Transcriber`]; this module only
//! decides which files need it and writes the SRT output.

use async_trait::async_trait;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::constants::VIDEO_EXTENSIONS;
use crate::parser::naming;

/// One recognised stretch of speech. Times are seconds from the start.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    #[must_use]
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, video: &Path) -> anyhow::Result<Vec<TranscriptSegment>>;
}

/// `HH:MM:SS,mmm`
#[must_use]
pub fn format_timestamp(seconds: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let (hours, rest) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (secs, millis) = (rest / 1000, rest % 1000);
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// Numbered SRT blocks separated by blank lines.
#[must_use]
pub fn render_srt(segments: &[TranscriptSegment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let _ = writeln!(out, "{}", i + 1);
        let _ = writeln!(
            out,
            "{} --> {}",
            format_timestamp(segment.start),
            format_timestamp(segment.end)
        );
        let _ = writeln!(out, "{}", segment.text.trim());
        out.push('\n');
    }
    out
}

#[must_use]
pub fn subtitle_path(video: &Path) -> PathBuf {
    video.with_extension("srt")
}

#[derive(Debug, Default)]
pub struct SubtitleReport {
    pub generated: usize,
    pub already_present: usize,
    /// `(video, error)`
    pub failed: Vec<(PathBuf, String)>,
}

pub struct SubtitleService {
    transcriber: Arc<dyn Transcriber>,
}

impl SubtitleService {
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self { transcriber }
    }

    /// Videos under `root` without a sibling `.srt`, in path order.
    #[must_use]
    pub fn videos_missing_subtitles(root: &Path) -> (Vec<PathBuf>, usize) {
        let mut missing = Vec::new();
        let mut present = 0;

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let is_video = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(naming::media_extension)
                .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)));
            if !is_video {
                continue;
            }
            if subtitle_path(path).exists() {
                present += 1;
            } else {
                missing.push(path.to_path_buf());
            }
        }

        (missing, present)
    }

    /// Transcribes each video lacking subtitles, one at a time.
    pub async fn generate_missing(&self, root: &Path) -> SubtitleReport {
        let (videos, already_present) = Self::videos_missing_subtitles(root);
        let mut report = SubtitleReport {
            already_present,
            ..SubtitleReport::default()
        };
        info!(
            event = "subtitles_started",
            missing = videos.len(),
            present = already_present,
            "Generating missing subtitles"
        );

        for video in videos {
            match self.generate_one(&video).await {
                Ok(path) => {
                    debug!(path = %path.display(), "Wrote subtitles");
                    report.generated += 1;
                }
                Err(e) => {
                    error!(video = %video.display(), error = %e, "Subtitle generation failed");
                    report.failed.push((video, e.to_string()));
                }
            }
        }

        info!(
            event = "subtitles_finished",
            generated = report.generated,
            failed = report.failed.len(),
            "Finished generating subtitles"
        );
        report
    }

    async fn generate_one(&self, video: &Path) -> anyhow::Result<PathBuf> {
        let segments = self.transcriber.transcribe(video).await?;
        if segments.is_empty() {
            anyhow::bail!("no speech recognised");
        }
        let path = subtitle_path(video);
        tokio::fs::write(&path, render_srt(&segments)).await?;
        Ok(path)
    }
}
