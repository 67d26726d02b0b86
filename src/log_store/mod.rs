pub mod decoders;

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use chrono::{Days, NaiveDate};
use log::{info, warn};
use thiserror::Error;

use crate::models::{DailyLogBreakdown, LogEntry};

use decoders::{decode_legacy_text, decode_structured_line};

const FILE_PREFIX: &str = "log_";
const FILE_EXTENSION: &str = "log";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write log {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to read log {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to encode log entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Append-only, one-file-per-day check-in log.
#[derive(Clone)]
pub struct LogStore {
    dir: Arc<PathBuf>,
    append_lock: Arc<Mutex<()>>,
}

impl LogStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir: Arc::new(dir),
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    pub fn path_for(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{FILE_PREFIX}{}.{FILE_EXTENSION}",
            day.format(DATE_FORMAT)
        ))
    }

    /// Appends `entry` as a single JSON line to the file for `day`.
    pub fn append(&self, entry: &LogEntry, day: NaiveDate) -> Result<(), LogStoreError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let path = self.path_for(day);
        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        fs::create_dir_all(self.dir.as_path()).map_err(|source| LogStoreError::CreateDir {
            path: self.dir.to_path_buf(),
            source,
        })?;

        let write_err = |source: io::Error| LogStoreError::Write {
            path: path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(write_err)?;
        file.write_all(line.as_bytes()).map_err(write_err)?;
        file.flush().map_err(write_err)?;

        Ok(())
    }

    /// Reads every decodable entry for `day`. A missing file is an empty day;
    /// undecodable lines are skipped.
    pub fn read_day(&self, day: NaiveDate) -> Result<Vec<LogEntry>, LogStoreError> {
        let path = self.path_for(day);
        let text = match fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(LogStoreError::Read { path, source }),
        };

        Ok(parse_log_text(&text))
    }

    /// Exactly `days` breakdowns, oldest first, ending with `today`.
    pub fn recent_daily_breakdown(&self, days: u32, today: NaiveDate) -> Vec<DailyLogBreakdown> {
        (0..days)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
            .map(|date| match self.read_day(date) {
                Ok(entries) => DailyLogBreakdown::from_entries(date, &entries),
                Err(err) => {
                    warn!("Counting {date} as empty: {err}");
                    DailyLogBreakdown::empty(date)
                }
            })
            .collect()
    }

    /// Days that have a log file, ascending.
    pub fn list_days(&self) -> Result<Vec<NaiveDate>, LogStoreError> {
        let read_dir = match fs::read_dir(self.dir.as_path()) {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LogStoreError::Read {
                    path: self.dir.to_path_buf(),
                    source,
                })
            }
        };

        let mut days: Vec<NaiveDate> = read_dir
            .filter_map(|item| item.ok())
            .filter_map(|item| day_from_file_name(&item.file_name().to_string_lossy()))
            .collect();
        days.sort_unstable();
        days.dedup();

        info!("Found {} day logs in {}", days.len(), self.dir.display());
        Ok(days)
    }
}

fn day_from_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_EXTENSION)?
        .strip_suffix('.')?;
    NaiveDate::parse_from_str(stem, DATE_FORMAT).ok()
}

fn parse_log_text(text: &str) -> Vec<LogEntry> {
    let structured: Vec<LogEntry> = text.lines().filter_map(decode_structured_line).collect();
    if !structured.is_empty() {
        return structured;
    }
    decode_legacy_text(text)
}
