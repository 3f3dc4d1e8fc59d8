use crate::codec::DocumentFormat;
use crate::models::record::FileTimeRecord;
use std::path::PathBuf;

/// Result of walking a tree and querying history for every file.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub records: Vec<FileTimeRecord>,
    /// Files with no history; excluded from `records`.
    pub untracked: usize,
    /// Files whose history query errored; logged and excluded.
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Documented {
        path: PathBuf,
        format: DocumentFormat,
        count: usize,
    },
    Adjusted(ApplyReport),
    Restored {
        loaded: usize,
        skipped: usize,
        report: ApplyReport,
    },
    /// The scan found no file with history; nothing was written or touched.
    NothingToDo,
}
