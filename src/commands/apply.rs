use crate::models::record::FileTimeRecord;
use crate::models::report::ApplyReport;
use filetime::FileTime;
use log::{info, warn};
use std::path::{Component, Path};

/// Set access and modification time of every record's file under `root`.
///
/// Never stops early: failures are logged and counted.
pub fn apply(root: &Path, records: &[FileTimeRecord]) -> ApplyReport {
    let mut report = ApplyReport::default();

    for record in records {
        match apply_one(root, record) {
            Ok(()) => {
                info!("Adjusted: {} -> {}", record.path, record.display_time());
                report.applied += 1;
            }
            Err(reason) => {
                warn!("Error: cannot adjust time of {}: {reason}", record.path);
                report.failed += 1;
            }
        }
    }

    info!(
        "Completed: adjusted {} files, failed {} files",
        report.applied, report.failed
    );
    report
}

fn apply_one(root: &Path, record: &FileTimeRecord) -> Result<(), String> {
    let relative = Path::new(&record.path);
    if !stays_inside_root(relative) {
        return Err("path escapes the target directory".to_string());
    }

    let stamp = FileTime::from_unix_time(record.unix_time(), 0);
    filetime::set_file_times(root.join(relative), stamp, stamp).map_err(|e| e.to_string())
}

fn stays_inside_root(relative: &Path) -> bool {
    relative.components().next().is_some()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
