use crate::analysis::history::{Git2Query, GitLogQuery, HistoryError, HistoryQuery};
use crate::analysis::scanner::{scan, METADATA_DIR};
use crate::codec::{read_document, write_document};
use crate::commands::apply::apply;
use crate::commands::settings::{HistoryBackend, Mode, RunSettings, DEFAULT_DOCUMENT_NAME};
use crate::error::FileTimesError;
use crate::models::record::{sort_newest_first, FileTimeRecord};
use crate::models::report::RunOutcome;
use git2::Repository;
use log::{info, warn};
use std::path::Path;

/// Run one mode end to end with the history backend named in `settings`.
pub fn run(settings: &RunSettings) -> Result<RunOutcome, FileTimesError> {
    if settings.mode == Mode::Restore {
        return restore(settings);
    }

    ensure_repository(&settings.target_dir)?;
    let history = open_history(settings.backend, &settings.target_dir)?;
    scan_repository(settings, history.as_ref())
}

/// Same as [`run`] but with a caller-supplied history source.
pub fn run_with_history(
    settings: &RunSettings,
    history: &dyn HistoryQuery,
) -> Result<RunOutcome, FileTimesError> {
    if settings.mode == Mode::Restore {
        return restore(settings);
    }

    ensure_repository(&settings.target_dir)?;
    scan_repository(settings, history)
}

// `document` and `adjust` once the target is known to be a repository.
fn scan_repository(
    settings: &RunSettings,
    history: &dyn HistoryQuery,
) -> Result<RunOutcome, FileTimesError> {
    info!("Scanning directory: {}", settings.target_dir.display());
    info!("Getting file last modified time from git...");
    let mut records = scan(&settings.target_dir, history)?.records;

    if records.is_empty() {
        warn!("Warning: no files found in git");
        return Ok(RunOutcome::NothingToDo);
    }
    info!("Found {} files", records.len());

    if settings.mode == Mode::Adjust {
        return Ok(RunOutcome::Adjusted(apply(&settings.target_dir, &records)));
    }

    sort_newest_first(&mut records);
    document(settings, &records)
}

pub fn open_history(
    backend: HistoryBackend,
    root: &Path,
) -> Result<Box<dyn HistoryQuery>, HistoryError> {
    let history: Box<dyn HistoryQuery> = match backend {
        HistoryBackend::GitCli => Box::new(GitLogQuery::new(root)),
        HistoryBackend::Libgit2 => Box::new(Git2Query::open(root)?),
    };
    Ok(history)
}

/// Cheap precondition checked before any scan: the directory exists, has a
/// `.git` entry and libgit2 can open it.
pub fn ensure_repository(target: &Path) -> Result<(), FileTimesError> {
    if !target.is_dir() {
        return Err(FileTimesError::PathNotFound(target.to_path_buf()));
    }

    if !target.join(METADATA_DIR).exists() {
        return Err(FileTimesError::NotGitRepo(target.to_path_buf()));
    }

    Repository::open(target).map_err(|_| FileTimesError::NotGitRepo(target.to_path_buf()))?;
    Ok(())
}

fn document(settings: &RunSettings, records: &[FileTimeRecord]) -> Result<RunOutcome, FileTimesError> {
    let path = settings
        .document
        .clone()
        .unwrap_or_else(|| settings.target_dir.join(DEFAULT_DOCUMENT_NAME));

    for record in records {
        info!("Documented: {} -> {}", record.path, record.display_time());
    }

    write_document(&path, settings.format, records, &settings.target_dir)?;
    info!(
        "Generated {} document: {} (total {} files)",
        settings.format,
        path.display(),
        records.len()
    );

    Ok(RunOutcome::Documented {
        path,
        format: settings.format,
        count: records.len(),
    })
}

fn restore(settings: &RunSettings) -> Result<RunOutcome, FileTimesError> {
    let input = settings
        .document
        .as_deref()
        .ok_or(FileTimesError::MissingInput)?;

    if !input.is_file() {
        return Err(FileTimesError::InputNotFound(input.to_path_buf()));
    }
    if !settings.target_dir.is_dir() {
        return Err(FileTimesError::PathNotFound(settings.target_dir.clone()));
    }

    info!("Reading from file: {}", input.display());
    let decoded = read_document(input, settings.format)?;
    if decoded.records.is_empty() {
        return Err(FileTimesError::NoRecords(input.to_path_buf()));
    }
    if decoded.skipped > 0 {
        warn!("Warning: skipped {} unreadable entries", decoded.skipped);
    }
    info!("Loaded {} files from {}", decoded.records.len(), input.display());

    let report = apply(&settings.target_dir, &decoded.records);
    Ok(RunOutcome::Restored {
        loaded: decoded.records.len(),
        skipped: decoded.skipped,
        report,
    })
}
