use super::{CodecError, Decoded};
use crate::models::record::{FileTimeRecord, DISPLAY_FORMAT};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::warn;
use std::io::{Read, Write};
use std::path::Path;

pub const HEADER: [&str; 3] = ["path", "last_modified", "unix_time"];

/// `last_modified` is written as a naive `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn write_to<W: Write>(out: W, records: &[FileTimeRecord]) -> Result<(), CodecError> {
    let mut writer = ::csv::Writer::from_writer(out);
    writer.write_record(HEADER)?;

    for record in records {
        writer.write_record([
            record.path.clone(),
            record.display_time(),
            record.unix_time().to_string(),
        ])?;
    }

    writer.flush().map_err(::csv::Error::from)?;
    Ok(())
}

pub fn read_from<R: Read>(input: R, origin: &Path) -> Result<Decoded, CodecError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input);

    if reader.headers()?.is_empty() {
        return Err(CodecError::MissingHeader(origin.to_path_buf()));
    }

    let mut decoded = Decoded::default();
    for (index, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Warning: skipping CSV row {}: {e}", index + 1);
                decoded.skipped += 1;
                continue;
            }
        };

        if row.len() < HEADER.len() {
            warn!("Warning: skipping CSV row {}: expected {} fields", index + 1, HEADER.len());
            decoded.skipped += 1;
            continue;
        }

        match parse_row(&row[0], &row[1], &row[2]) {
            Some(record) => decoded.records.push(record),
            None => {
                warn!("Warning: cannot parse time for {}", &row[0]);
                decoded.skipped += 1;
            }
        }
    }

    Ok(decoded)
}

pub fn write(path: &Path, records: &[FileTimeRecord]) -> Result<(), CodecError> {
    let file = std::fs::File::create(path).map_err(|e| CodecError::io(path, e))?;
    write_to(file, records)
}

pub fn read(path: &Path) -> Result<Decoded, CodecError> {
    let file = std::fs::File::open(path).map_err(|e| CodecError::io(path, e))?;
    read_from(file, path)
}

// `unix_time` is authoritative when it is an integer; the text column is
// only consulted when it is not.
fn parse_row(path: &str, last_modified: &str, unix_time: &str) -> Option<FileTimeRecord> {
    if let Ok(secs) = unix_time.trim().parse::<i64>() {
        return FileTimeRecord::from_unix(path, secs);
    }

    parse_last_modified(last_modified.trim()).map(|modified| FileTimeRecord::new(path, modified))
}

fn parse_last_modified(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, DISPLAY_FORMAT) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
