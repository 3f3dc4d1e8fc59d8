use crate::analysis::history::{HistoryLookup, HistoryQuery};
use crate::models::record::{normalize_relative, FileTimeRecord};
use crate::models::report::ScanReport;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the version-control metadata directory, never descended into.
pub const METADATA_DIR: &str = ".git";

#[derive(Debug, Error)]
#[error("SCAN_FAILED: cannot read {}: {source}", .path.display())]
pub struct ScanError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Walk `root` and resolve the last history change of every regular file.
///
/// Files without history are left out of the report. A failed history query
/// is logged and counted but does not stop the walk; a failure to read the
/// tree itself does.
pub fn scan(root: &Path, history: &dyn HistoryQuery) -> Result<ScanReport, ScanError> {
    let mut report = ScanReport::default();
    let mut files = Vec::new();
    walk_files(root, &mut files)?;

    for file in files {
        let relative = match file.strip_prefix(root) {
            Ok(rel) => normalize_relative(rel),
            Err(_) => continue,
        };

        match history.last_change(&relative) {
            Ok(HistoryLookup::Found(modified)) => {
                report.records.push(FileTimeRecord::new(relative, modified));
            }
            Ok(HistoryLookup::NotTracked) => report.untracked += 1,
            Err(e) => {
                warn!("Error: cannot get git modified time of {relative}: {e}");
                report.failed += 1;
            }
        }
    }

    info!(
        "Scanned {} files: {} with history, {} untracked, {} failed",
        report.records.len() + report.untracked + report.failed,
        report.records.len(),
        report.untracked,
        report.failed
    );
    Ok(report)
}

fn walk_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), ScanError> {
    let read_error = |source| ScanError {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir)
        .map_err(read_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error)?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(|source| ScanError {
            path: path.clone(),
            source,
        })?;

        if file_type.is_dir() {
            if entry.file_name() == METADATA_DIR {
                continue;
            }
            walk_files(&path, files)?;
        } else if file_type.is_file() {
            files.push(path);
        }
    }

    Ok(())
}
