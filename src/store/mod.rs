//! Flat-file record store.
//!
//! Every collected date lives in its own `<dir>/<YYYY-MM-DD>.csv` with a
//! `date,query,count` header. Writing a date replaces its file wholesale.

use crate::models::{DailyRecord, DayCounts, RecordRow};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory of per-date CSV record files.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for a date.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.csv", date.format("%Y-%m-%d")))
    }

    /// Whether a record file already exists for a date.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.path_for(date).is_file()
    }

    /// Write a record, replacing any previous file for the same date.
    ///
    /// The rows are written to a temporary file first and renamed into place,
    /// so an interrupted write never leaves a truncated record behind.
    pub fn write(&self, record: &DailyRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create store directory {}", self.dir.display()))?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in record.to_rows() {
            writer.serialize(&row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to encode record for {}: {}", record.date, e))?;

        let path = self.path_for(record.date);
        let tmp = path.with_extension("csv.tmp");
        fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move record into place at {}", path.display()))?;

        debug!("Wrote record {}", path.display());
        Ok(path)
    }

    /// Load every record in the store, one entry per date, ascending.
    ///
    /// Files that cannot be parsed and rows with invalid dates are skipped
    /// with a warning. A missing store directory yields no records.
    pub fn load_all(&self) -> Result<Vec<DayCounts>> {
        if !self.dir.is_dir() {
            warn!("Record store {} does not exist", self.dir.display());
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("csv"))
            .collect();
        files.sort();

        let mut days: BTreeMap<NaiveDate, DayCounts> = BTreeMap::new();

        for path in &files {
            let rows = match read_rows(path) {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("Skipping unreadable record {}: {:#}", path.display(), e);
                    continue;
                }
            };

            for row in rows {
                let Ok(date) = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d") else {
                    warn!("Skipping row with invalid date '{}' in {}", row.date, path.display());
                    continue;
                };

                days.entry(date)
                    .or_insert_with(|| DayCounts::new(date))
                    .counts
                    .insert(row.query, row.count);
            }
        }

        debug!("Loaded {} dates from {} files", days.len(), files.len());
        Ok(days.into_values().collect())
    }
}

fn read_rows(path: &Path) -> Result<Vec<RecordRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    reader
        .deserialize()
        .collect::<Result<Vec<RecordRow>, _>>()
        .with_context(|| format!("Failed to parse {}", path.display()))
}
