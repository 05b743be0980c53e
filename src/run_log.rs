//! Append-only, timestamped run log (`organizer.log`).
//!
//! Each event with a log message becomes one line:
//! `2025-11-09 14:30:52 Moved a.jpg → Images.`

use crate::events::{EventSink, OrganizeEvent};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File name used when no log path is given.
pub const DEFAULT_LOG_FILE: &str = "organizer.log";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default log location: `organizer.log` next to the running executable, or in
/// the current directory if the executable path is unknown.
pub fn default_log_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_LOG_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

/// Event sink appending to a log file.
///
/// A failed write is reported once through `tracing` and disables the log for
/// the rest of the run; the organizer itself is never interrupted by logging.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: Option<File>,
}

impl RunLog {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a timestamped line.
    pub fn write_line(&mut self, message: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
        if let Err(e) = writeln!(file, "{} {}", timestamp, message) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "could not write to run log, logging disabled for this run"
            );
            self.file = None;
        }
    }
}

impl EventSink for RunLog {
    fn emit(&mut self, event: &OrganizeEvent) {
        if let Some(message) = event.log_message() {
            self.write_line(&message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::CategoryTable;
    use crate::file_organizer::RunSummary;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_appends_timestamped_lines() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(DEFAULT_LOG_FILE);

        let mut log = RunLog::open(&path).unwrap();
        log.emit(&OrganizeEvent::RunStarted {
            folder: temp_dir.path().to_path_buf(),
            dry_run: false,
            categories: vec![],
        });
        log.emit(&OrganizeEvent::FilesDiscovered {
            files: 0,
            entries: 0,
        });
        log.emit(&OrganizeEvent::RunFinished {
            summary: RunSummary::new(&CategoryTable::default()),
            dry_run: false,
        });
        drop(log);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" === New run started (real mode)"));
        assert!(lines[1].contains(" Summary of Files Moved: {'Images': 0"));

        // "YYYY-MM-DD HH:MM:SS " prefix
        let stamp = &lines[0][..19];
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_reopening_appends() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("runs.log");

        RunLog::open(&path).unwrap().write_line("first");
        RunLog::open(&path).unwrap().write_line("second");

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().next().unwrap().ends_with(" first"));
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("nope").join("organizer.log");
        assert!(RunLog::open(&path).is_err());
    }
}
