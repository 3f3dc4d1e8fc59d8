use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;

/// Layout used for human-readable timestamps in CSV, Markdown and the log.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One file's path plus the instant it was last changed in history.
///
/// The instant is the only stored time; `unix_time()` and the formatted
/// strings are derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTimeRecord {
    pub path: String,
    pub modified: DateTime<Utc>,
}

impl FileTimeRecord {
    pub fn new(path: impl Into<String>, modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            modified: truncate_to_seconds(modified),
        }
    }

    /// Returns `None` when the seconds value is outside chrono's range.
    pub fn from_unix(path: impl Into<String>, unix_time: i64) -> Option<Self> {
        let modified = Utc.timestamp_opt(unix_time, 0).single()?;
        Some(Self {
            path: path.into(),
            modified,
        })
    }

    pub fn unix_time(&self) -> i64 {
        self.modified.timestamp()
    }

    pub fn display_time(&self) -> String {
        self.modified.format(DISPLAY_FORMAT).to_string()
    }
}

fn truncate_to_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(instant.timestamp(), 0)
        .single()
        .unwrap_or(instant)
}

/// Sort newest first. The sort is stable, so equal instants keep scan order.
pub fn sort_newest_first(records: &mut [FileTimeRecord]) {
    records.sort_by(|a, b| b.modified.cmp(&a.modified));
}

/// Root-relative path with `/` separators regardless of platform.
pub fn normalize_relative(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
