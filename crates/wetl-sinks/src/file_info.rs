//! Inspection helpers for exported CSV files

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// What is currently on disk at an export path
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvFileInfo {
    pub exists: bool,
    pub size_bytes: u64,
    /// Data rows, i.e. lines minus the header
    pub record_count: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl CsvFileInfo {
    fn missing() -> Self {
        Self {
            exists: false,
            size_bytes: 0,
            record_count: 0,
            last_modified: None,
        }
    }
}

pub fn csv_file_info(path: &Path) -> std::io::Result<CsvFileInfo> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CsvFileInfo::missing()),
        Err(e) => return Err(e),
    };

    let mut lines = 0u64;
    for line in BufReader::new(fs::File::open(path)?).lines() {
        line?;
        lines += 1;
    }

    Ok(CsvFileInfo {
        exists: true,
        size_bytes: metadata.len(),
        record_count: lines.saturating_sub(1),
        last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
    })
}

/// Remove an exported file; `false` if there was nothing to remove or removal failed
pub fn delete_csv_file(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "Deleted CSV file");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to delete CSV file");
            false
        }
    }
}

/// Whether an export to `path` could create or replace the file
///
/// Checks the closest existing ancestor directory.
pub fn is_writable(path: &Path) -> bool {
    if let Ok(metadata) = fs::metadata(path) {
        if metadata.is_file() {
            return !metadata.permissions().readonly();
        }
    }

    let mut dir = path.parent();
    while let Some(candidate) = dir {
        let candidate = if candidate.as_os_str().is_empty() {
            Path::new(".")
        } else {
            candidate
        };
        if let Ok(metadata) = fs::metadata(candidate) {
            return metadata.is_dir() && !metadata.permissions().readonly();
        }
        dir = candidate.parent();
    }
    false
}
