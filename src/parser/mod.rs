pub mod filename;
pub mod natural;
pub mod naming;

pub use filename::{
    CaptionInfo, EpisodeInfo, FilenameInfo, extract_caption_info, find_episode_tag, parse_filename_info,
    resolve_episode_info,
};
pub use natural::{NaturalKey, natural_cmp};
