pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "webm", "mov", "wmv", "flv", "m4v"];

pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt"];

pub mod hosting {

    pub const EMBED_BASE_URL: &str = "https://filemoon.in/e/";

    pub const PLACEHOLDER_URL: &str = "https://filemoon.in/placeholder";

    pub const API_BASE_URL: &str = "https://filemoonapi.com/api/";
}

pub mod catalog {

    pub const DEFAULT_CSV_PATH: &str = "filemoon_files.csv";

    pub const PAGE_SIZE: u32 = 100;

    pub const CSV_COLUMNS: &[&str] = &["file_code", "title", "file_size", "uploaded", "status", "public"];
}

pub mod transfers {

    pub const DEFAULT_CONCURRENCY: usize = 3;

    pub const COMPLETION_SUFFIX: &str = "complete";

    /// In-flight downloads are staged as `{file}.{uuid}.part`.
    pub const PARTIAL_SUFFIX: &str = "part";
}

pub mod limits {

    pub const MAX_SEARCH_RESULTS: usize = 25;
}
