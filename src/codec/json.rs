use super::{CodecError, Decoded};
use crate::models::record::FileTimeRecord;
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct JsonEntryOut<'a> {
    path: &'a str,
    last_modified: String,
    unix_time: i64,
}

#[derive(Deserialize)]
struct JsonEntryIn {
    path: String,
    #[serde(default)]
    last_modified: Option<String>,
    #[serde(default)]
    unix_time: Option<i64>,
}

pub fn to_string(records: &[FileTimeRecord]) -> Result<String, CodecError> {
    let entries: Vec<JsonEntryOut> = records
        .iter()
        .map(|r| JsonEntryOut {
            path: &r.path,
            last_modified: r.modified.to_rfc3339_opts(SecondsFormat::Secs, true),
            unix_time: r.unix_time(),
        })
        .collect();

    let mut raw = serde_json::to_string_pretty(&entries)?;
    raw.push('\n');
    Ok(raw)
}

pub fn from_str(raw: &str) -> Result<Decoded, CodecError> {
    let entries: Vec<JsonEntryIn> = serde_json::from_str(raw)?;
    let mut decoded = Decoded::default();

    for entry in entries {
        match resolve_entry(entry) {
            Ok(record) => decoded.records.push(record),
            Err(path) => {
                warn!("Warning: cannot parse time for {path}");
                decoded.skipped += 1;
            }
        }
    }

    Ok(decoded)
}

pub fn write(path: &Path, records: &[FileTimeRecord]) -> Result<(), CodecError> {
    let raw = to_string(records)?;
    fs::write(path, raw).map_err(|e| CodecError::io(path, e))
}

pub fn read(path: &Path) -> Result<Decoded, CodecError> {
    let raw = fs::read_to_string(path).map_err(|e| CodecError::io(path, e))?;
    from_str(&raw)
}

// `last_modified` wins when it holds a real instant; otherwise fall back to a
// non-zero `unix_time`. Returns the path back when neither is usable.
fn resolve_entry(entry: JsonEntryIn) -> Result<FileTimeRecord, String> {
    let stamped = entry
        .last_modified
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| !is_zero_instant(dt));

    if let Some(modified) = stamped {
        return Ok(FileTimeRecord::new(entry.path, modified));
    }

    match entry.unix_time {
        Some(secs) if secs != 0 => FileTimeRecord::from_unix(entry.path.clone(), secs).ok_or(entry.path),
        _ => Err(entry.path),
    }
}

// Documents written by other tools mark "no time" with 0001-01-01T00:00:00Z.
fn is_zero_instant(dt: &DateTime<Utc>) -> bool {
    dt.year() <= 1
}
