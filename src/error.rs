use crate::analysis::history::HistoryError;
use crate::analysis::scanner::ScanError;
use crate::codec::CodecError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors: anything here ends the run with a nonzero exit code.
#[derive(Debug, Error)]
pub enum FileTimesError {
    #[error("PATH_NOT_FOUND: target directory does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("NOT_GIT_REPO: target directory is not a git repository: {}", .0.display())]
    NotGitRepo(PathBuf),

    #[error("INVALID_PATH: cannot resolve {}: {source}", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("MISSING_INPUT: restore mode requires an input file path")]
    MissingInput,

    #[error("INPUT_NOT_FOUND: input file does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("NO_RECORDS: no file data found in input file {}", .0.display())]
    NoRecords(PathBuf),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    History(#[from] HistoryError),
}
