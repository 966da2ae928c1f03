//! One-off CSV cleanup: duplicate removal by ISBN
//!
//! Operator tool meant to run before an import, not part of the import
//! pipeline itself. Keeps the first occurrence of each `isbn13`, drops rows
//! without one, and rewrites the file in place after renaming the original
//! to `<file>.backup`. The whole file is held in memory; catalog exports are
//! small enough that streaming is not worth the bookkeeping.

use bookdb_common::{BookdbError, Result};
use csv::StringRecord;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

/// Outcome of one cleanup pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupReport {
    pub initial_records: usize,
    pub kept_records: usize,
    pub backup_path: PathBuf,
}

impl DedupReport {
    /// Rows dropped as duplicates or for lacking an ISBN.
    pub fn removed(&self) -> usize {
        self.initial_records - self.kept_records
    }
}

/// Deduplicate a books CSV by `isbn13`, first occurrence wins.
pub fn dedup_by_isbn(csv_path: &Path) -> Result<DedupReport> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .map_err(|e| BookdbError::Parse(format!("failed to open input file: {e}")))?;

    let headers = reader
        .headers()
        .map_err(|e| BookdbError::Parse(format!("failed to read CSV header row: {e}")))?
        .clone();

    let isbn_column = headers
        .iter()
        .position(|h| h == "isbn13")
        .ok_or_else(|| BookdbError::Parse("input has no isbn13 column".to_string()))?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut kept: Vec<StringRecord> = Vec::new();
    let mut initial_records = 0usize;

    for row in reader.records() {
        let row = row.map_err(|e| BookdbError::Parse(format!("failed to parse CSV record: {e}")))?;
        initial_records += 1;

        let isbn = row.get(isbn_column).unwrap_or("").trim();
        if isbn.is_empty() {
            continue;
        }
        if seen.insert(isbn.to_string()) {
            kept.push(row);
        }
    }

    info!(
        initial_records,
        kept = kept.len(),
        "Deduplicated records, rewriting file"
    );

    // Keep the original around; the rewrite below is destructive.
    let backup_path = backup_path_for(csv_path);
    std::fs::rename(csv_path, &backup_path)?;

    let mut writer = csv::Writer::from_path(csv_path)
        .map_err(|e| BookdbError::Parse(format!("failed to open output file: {e}")))?;
    writer
        .write_record(&headers)
        .map_err(|e| BookdbError::Parse(format!("failed to write header row: {e}")))?;
    for row in &kept {
        writer
            .write_record(row)
            .map_err(|e| BookdbError::Parse(format!("failed to write record: {e}")))?;
    }
    writer
        .flush()
        .map_err(BookdbError::Io)?;

    Ok(DedupReport {
        initial_records,
        kept_records: kept.len(),
        backup_path,
    })
}

/// `books.csv` -> `books.csv.backup`, appended rather than replacing the
/// extension so the original name stays recognizable.
fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".backup");
    PathBuf::from(name)
}
