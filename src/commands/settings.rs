use crate::codec::DocumentFormat;
use crate::error::FileTimesError;
use std::path::{Path, PathBuf};

/// Document name used by `document` when no output path is given.
pub const DEFAULT_DOCUMENT_NAME: &str = "file_modification_times.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Set file system times from the last git change of each file.
    Adjust,
    /// Write a document listing the last git change of each file.
    Document,
    /// Set file system times from a previously written JSON or CSV document.
    Restore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum HistoryBackend {
    /// One `git log` process per file.
    #[default]
    GitCli,
    /// In-process lookups through libgit2.
    Libgit2,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub target_dir: PathBuf,
    pub mode: Mode,
    /// Output for `document`, input for `restore`, unused by `adjust`.
    pub document: Option<PathBuf>,
    pub format: DocumentFormat,
    pub backend: HistoryBackend,
}

impl RunSettings {
    pub fn resolve(
        directory: &Path,
        mode: Mode,
        document: Option<&Path>,
        format: Option<DocumentFormat>,
        backend: HistoryBackend,
    ) -> Result<Self, FileTimesError> {
        let target_dir = absolutize(directory)?;

        let document = match (mode, document) {
            (Mode::Restore, None) => return Err(FileTimesError::MissingInput),
            (Mode::Adjust, _) => None,
            (Mode::Document, None) => Some(target_dir.join(DEFAULT_DOCUMENT_NAME)),
            (_, Some(path)) => Some(absolutize(path)?),
        };

        let format = format.unwrap_or_else(|| {
            document
                .as_deref()
                .map(DocumentFormat::from_path)
                .unwrap_or(DocumentFormat::Json)
        });

        Ok(Self {
            target_dir,
            mode,
            document,
            format,
            backend,
        })
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, FileTimesError> {
    std::path::absolute(path).map_err(|source| FileTimesError::InvalidPath {
        path: path.to_path_buf(),
        source,
    })
}
