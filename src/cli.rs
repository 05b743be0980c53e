//! Command-line interface for filesort.
//!
//! Parses arguments with `clap`, loads the optional configuration, wires the
//! terminal reporter and the run log together and runs the organizer.

use crate::config::{ConfigError, OrganizerConfig};
use crate::events::Broadcast;
use crate::file_organizer::{FileOrganizer, OnMoveError, OrganizeError, RunSummary};
use crate::output::{TerminalReporter, Verbosity};
use crate::run_log::{RunLog, default_log_path};
use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sort the files of a folder into category subfolders by extension.
#[derive(Debug, Clone, Parser)]
#[command(name = "filesort", version, about)]
pub struct Cli {
    /// Folder to organize (defaults to the current working directory)
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Show what would be moved without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the category table, skipped entries and debug diagnostics
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long)]
    pub quiet: bool,

    /// TOML file with custom categories and exclude filters
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Leave files matching this glob in place (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Continue with the next file when a move fails
    #[arg(long)]
    pub keep_going: bool,

    /// Append the run log to FILE instead of organizer.log next to the executable
    #[arg(long, value_name = "FILE", conflicts_with = "no_log")]
    pub log_file: Option<PathBuf>,

    /// Do not write a run log
    #[arg(long)]
    pub no_log: bool,

    /// Print the summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

/// Everything that can make the command fail.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Organize(#[from] OrganizeError),

    #[error("Could not open log file {}: {source}", .path.display())]
    LogFile { path: PathBuf, source: io::Error },

    #[error("Could not determine the current working directory: {0}")]
    CurrentDir(io::Error),

    #[error("Could not serialize summary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{failed} file(s) could not be moved")]
    Incomplete { failed: usize },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::LogFile { .. } => 2,
            Self::Incomplete { .. } => 3,
            _ => 1,
        }
    }
}

/// Runs one organize pass as described by `cli`.
///
/// # Errors
///
/// Configuration and log-file problems are reported before anything is
/// touched. Organizer errors are passed through. A keep-going run that
/// recorded failures returns [`CliError::Incomplete`] after printing its summary.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use filesort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["filesort", "--path", "/home/me/Downloads", "--dry-run"]);
/// let summary = run_cli(&cli)?;
/// assert_eq!(summary.total(), 0);
/// # Ok::<(), filesort::cli::CliError>(())
/// ```
pub fn run_cli(cli: &Cli) -> Result<RunSummary, CliError> {
    let config = match &cli.config {
        Some(path) => OrganizerConfig::load(path)?,
        None => OrganizerConfig::default(),
    };
    let table = config.category_table()?;
    for (extension, owners) in table.overlaps() {
        tracing::warn!(
            extension = %extension,
            winner = %owners[0],
            claimants = %owners.join(", "),
            "extension claimed by several categories, the first one wins"
        );
    }

    // Keep stdout clean for the JSON document.
    let verbosity = if cli.json {
        Verbosity::Quiet
    } else {
        cli.verbosity()
    };
    let reporter = TerminalReporter::new(verbosity);

    let folder = match &cli.path {
        Some(path) => path.clone(),
        None => {
            let cwd = std::env::current_dir().map_err(CliError::CurrentDir)?;
            reporter.using_current_dir(&cwd);
            cwd
        }
    };

    let run_log = open_run_log(cli)?;

    let mut excludes = cli.exclude.clone();
    if let Some(name) = run_log
        .as_ref()
        .and_then(|log| log_name_inside(&folder, log.path()))
    {
        tracing::debug!(file = %name, "run log lives in the target folder, excluding it");
        excludes.push(glob::Pattern::escape(&name));
    }
    let filters = config.compile_filters(&excludes)?;

    let mut sink = Broadcast::new();
    sink.push(reporter);
    if let Some(log) = run_log {
        sink.push(log);
    }

    let on_error = if cli.keep_going {
        OnMoveError::Continue
    } else {
        OnMoveError::Abort
    };
    let organizer = FileOrganizer::new(table)
        .dry_run(cli.dry_run)
        .filters(filters)
        .on_error(on_error);

    let summary = organizer.run(&folder, &mut sink)?;

    if cli.json {
        let report = serde_json::json!({
            "folder": folder.display().to_string(),
            "dry_run": cli.dry_run,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if !summary.is_complete() {
        return Err(CliError::Incomplete {
            failed: summary.failures().len(),
        });
    }
    Ok(summary)
}

/// Opens the run log selected by the flags.
///
/// An explicit `--log-file` that cannot be opened is an error. The default
/// location is best effort: failing to open it only produces a warning.
fn open_run_log(cli: &Cli) -> Result<Option<RunLog>, CliError> {
    if cli.no_log {
        return Ok(None);
    }

    match &cli.log_file {
        Some(path) => RunLog::open(path)
            .map(Some)
            .map_err(|source| CliError::LogFile {
                path: path.clone(),
                source,
            }),
        None => {
            let path = default_log_path();
            match RunLog::open(&path) {
                Ok(log) => Ok(Some(log)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "run log disabled");
                    Ok(None)
                }
            }
        }
    }
}

/// File name of `log_path` if it sits directly inside `folder`.
///
/// A relative `log_path` is taken relative to the current directory.
fn log_name_inside(folder: &Path, log_path: &Path) -> Option<String> {
    let log_path = std::path::absolute(log_path).ok()?;
    let log_dir = log_path.parent()?.canonicalize().ok()?;
    let folder = folder.canonicalize().ok()?;
    if log_dir != folder {
        return None;
    }
    log_path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["filesort"]).unwrap();
        assert!(cli.path.is_none());
        assert!(!cli.dry_run);
        assert!(!cli.keep_going);
        assert!(cli.exclude.is_empty());
        assert_eq!(cli.verbosity(), Verbosity::Normal);
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "filesort",
            "--path",
            "/tmp/downloads",
            "--dry-run",
            "-v",
            "--exclude",
            "*.part",
            "--exclude",
            "desktop.ini",
            "--keep-going",
            "--log-file",
            "/tmp/run.log",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.path, Some(PathBuf::from("/tmp/downloads")));
        assert!(cli.dry_run);
        assert_eq!(cli.verbosity(), Verbosity::Verbose);
        assert_eq!(cli.exclude, vec!["*.part", "desktop.ini"]);
        assert!(cli.keep_going);
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/run.log")));
        assert!(cli.json);
    }

    #[test]
    fn test_conflicting_flags_are_rejected() {
        assert!(Cli::try_parse_from(["filesort", "--verbose", "--quiet"]).is_err());
        assert!(Cli::try_parse_from(["filesort", "--no-log", "--log-file", "x.log"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let config = CliError::Config(ConfigError::NotFound(PathBuf::from("x.toml")));
        assert_eq!(config.exit_code(), 2);
        assert_eq!(CliError::Incomplete { failed: 1 }.exit_code(), 3);

        let invalid = CliError::Organize(OrganizeError::InvalidTarget {
            path: PathBuf::from("/nope"),
            reason: "Path does not exist".to_string(),
        });
        assert_eq!(invalid.exit_code(), 1);
        assert_eq!(invalid.to_string(), "Path does not exist: /nope");
    }

    #[test]
    fn test_explicit_log_file_must_open() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log_path = temp_dir.path().join("missing").join("run.log");
        let cli = Cli::try_parse_from([
            "filesort",
            "--path",
            temp_dir.path().to_str().unwrap(),
            "--log-file",
            log_path.to_str().unwrap(),
        ])
        .unwrap();

        assert!(matches!(run_cli(&cli), Err(CliError::LogFile { .. })));
    }

    #[test]
    fn test_log_inside_target_is_not_moved() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("notes.txt"), "n").unwrap();
        let log_path = temp_dir.path().join("organizer.log");
        let cli = Cli::try_parse_from([
            "filesort",
            "-q",
            "--path",
            temp_dir.path().to_str().unwrap(),
            "--log-file",
            log_path.to_str().unwrap(),
        ])
        .unwrap();

        let summary = run_cli(&cli).unwrap();
        assert_eq!(summary.total(), 1);
        assert!(log_path.is_file());
        assert!(temp_dir.path().join("Documents").join("notes.txt").is_file());
    }

    #[test]
    fn test_log_name_inside() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let inside = temp_dir.path().join("organizer.log");
        assert_eq!(
            log_name_inside(temp_dir.path(), &inside).as_deref(),
            Some("organizer.log")
        );

        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            log_name_inside(&cwd, Path::new("organizer.log")).as_deref(),
            Some("organizer.log")
        );
        assert!(log_name_inside(temp_dir.path(), Path::new("organizer.log")).is_none());

        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        let elsewhere = temp_dir.path().join("sub").join("organizer.log");
        assert!(log_name_inside(temp_dir.path(), &elsewhere).is_none());
    }
}
