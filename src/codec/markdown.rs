use crate::models::record::{FileTimeRecord, DISPLAY_FORMAT};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Human-readable report. There is no reader for this format.
pub fn render(records: &[FileTimeRecord], target_dir: &Path, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str("# File modification times document\n\n");
    out.push_str(&format!("Generated time: {} UTC\n\n", generated_at.format(DISPLAY_FORMAT)));
    out.push_str(&format!("Target directory: {}\n\n", target_dir.display()));
    out.push_str(&format!("Total files: {}\n\n", records.len()));
    out.push_str("## File list\n\n");
    out.push_str("| File path | Last modified time | Unix time |\n");
    out.push_str("|-----------|--------------------|-----------|\n");

    for record in records {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            record.path.replace('|', "\\|"),
            record.display_time(),
            record.unix_time()
        ));
    }

    out
}
