//! # Record Logger
//!
//! Appends published records to JSONL files and rotates them.
//!
//! Each line holds the wall-clock time of logging, the topic and the record:
//!
//! ```text
//! {"logged_at":"2024-05-01T12:00:00Z","topic":"status","msg":{...}}
//! ```
//!
//! A new file is started after `max_records_per_file` lines. Only the newest
//! `max_files_to_keep` files are retained.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::error::Result;

/// File name prefix of record log files
const FILE_PREFIX: &str = "records_";

/// File name extension of record log files
const FILE_EXTENSION: &str = "jsonl";

#[derive(Serialize)]
struct LogLine<'a, T: Serialize> {
    logged_at: DateTime<Utc>,
    topic: &'a str,
    msg: &'a T,
}

/// Rotating JSONL writer for published records.
pub struct RecordLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    files_opened: u64,
}

impl std::fmt::Debug for RecordLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordLogger")
            .field("dir", &self.dir)
            .field("current_path", &self.current_path)
            .field("records_in_file", &self.records_in_file)
            .finish_non_exhaustive()
    }
}

impl RecordLogger {
    /// Creates a logger writing into `config.log_dir`.
    ///
    /// The directory is created if missing. No file is opened until the first
    /// record.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&dir)?;
        info!("Recording published records to {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file: config.max_records_per_file.max(1),
            max_files_to_keep: config.max_files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            files_opened: 0,
        })
    }

    /// Appends one record.
    ///
    /// # Arguments
    ///
    /// * `topic` - Topic the record was published on
    /// * `msg` - The record
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be serialized or written.
    pub fn record<T: Serialize>(&mut self, topic: &str, msg: &T) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let line = LogLine {
            logged_at: Utc::now(),
            topic,
            msg,
        };

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, &line)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            self.records_in_file += 1;
        }

        Ok(())
    }

    /// Path of the file currently written, if any.
    #[must_use]
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:06}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S_%3f"),
            self.files_opened,
            FILE_EXTENSION
        );
        let path = self.dir.join(name);

        let file = File::create(&path)?;
        debug!("Opened record log {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;
        self.files_opened += 1;

        self.prune();
        Ok(())
    }

    /// Deletes the oldest log files beyond the retention limit.
    ///
    /// The file being written always counts as the newest and is never
    /// deleted.
    fn prune(&self) {
        let mut files = match list_log_files(&self.dir) {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to list {}: {}", self.dir.display(), e);
                return;
            }
        };
        files.retain(|path| Some(path.as_path()) != self.current_path.as_deref());

        let keep_others = self.max_files_to_keep - 1;
        if files.len() <= keep_others {
            return;
        }

        files.sort();
        let excess = files.len() - keep_others;
        for path in files.into_iter().take(excess) {
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }
}

/// Record log files in `dir`, unsorted.
fn list_log_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_EXTENSION))
            .unwrap_or(false);
        if is_log {
            files.push(path);
        }
    }
    Ok(files)
}
