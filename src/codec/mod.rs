pub mod csv;
pub mod json;
pub mod markdown;

use crate::models::record::FileTimeRecord;
use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Document encodings. JSON and CSV can be read back, Markdown cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DocumentFormat {
    Json,
    Csv,
    Markdown,
}

impl DocumentFormat {
    /// Pick the format from the file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Self::Csv,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Json,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "JSON",
            Self::Csv => "CSV",
            Self::Markdown => "Markdown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO_ERROR: cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PARSE_FAILED: cannot parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PARSE_FAILED: cannot read CSV: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("PARSE_FAILED: CSV file is empty or missing header: {}", .0.display())]
    MissingHeader(PathBuf),

    #[error("UNSUPPORTED_FORMAT: {0} documents cannot be read back (supported: .json, .csv)")]
    WriteOnly(DocumentFormat),
}

impl CodecError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Records read back from a document, plus how many entries were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub records: Vec<FileTimeRecord>,
    pub skipped: usize,
}

/// Serialize `records` to `path`, replacing any existing file.
pub fn write_document(
    path: &Path,
    format: DocumentFormat,
    records: &[FileTimeRecord],
    target_dir: &Path,
) -> Result<(), CodecError> {
    match format {
        DocumentFormat::Json => json::write(path, records),
        DocumentFormat::Csv => csv::write(path, records),
        DocumentFormat::Markdown => {
            let body = markdown::render(records, target_dir, Utc::now());
            std::fs::write(path, body).map_err(|e| CodecError::io(path, e))
        }
    }
}

pub fn read_document(path: &Path, format: DocumentFormat) -> Result<Decoded, CodecError> {
    match format {
        DocumentFormat::Json => json::read(path),
        DocumentFormat::Csv => csv::read(path),
        DocumentFormat::Markdown => Err(CodecError::WriteOnly(format)),
    }
}
