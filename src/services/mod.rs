pub mod aligner;
pub use aligner::{AlignOptions, AlignmentReport, EpisodeAligner, Match, MatchStrategy, NoMatchReason};

pub mod assets;
pub use assets::LocalAssetMatcher;

pub mod pipeline;
pub use pipeline::{ReconcileSummary, ReconciliationPipeline, RunOptions, SyncOutcome};

pub mod show_store;
pub use show_store::{ShowRecordStore, UpsertOutcome};

pub mod subtitles;
pub use subtitles::{SubtitleService, Transcriber, TranscriptSegment};

pub mod transfer;
pub use transfer::{
    DownloadCoordinator, MediaHost, SeriesAggregation, TransferError, TransferSource,
    UploadCoordinator,
};

pub mod validity;
