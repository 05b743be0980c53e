//! Output formatting and styling module.
//!
//! [`OutputFormatter`] holds the styled building blocks (colors, progress bar,
//! summary table). [`TerminalReporter`] turns organizer events into terminal
//! output at the selected [`Verbosity`].

use crate::events::{EventSink, OrganizeEvent, rename_note};
use crate::file_category::Category;
use crate::file_organizer::RunSummary;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// How much the terminal reporter prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    #[default]
    Normal,
    /// Also the category table, skipped entries and created folders.
    Verbose,
}

impl Verbosity {
    /// `--quiet` wins over `--verbose` if both are somehow set.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// Styled output primitives shared by the reporter and `main`.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints an error message in red to stderr.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filesort::output::OutputFormatter;
    /// OutputFormatter::error("Error: Path does not exist: /nope");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{}", message.red());
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a verbose-level message in blue.
    pub fn detail(message: &str) {
        println!("{}", message.blue());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints the dry-run banner.
    pub fn dry_run_banner() {
        println!("{}", "DRY RUN MODE — No files will be moved.".yellow().bold());
    }

    /// Creates a progress bar for `total` files.
    ///
    /// ```no_run
    /// use filesort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the per-category summary in table order.
    pub fn summary_table(summary: &RunSummary) {
        Self::header(&format!("Summary of Files Moved: {} file(s)", summary.total()));
        for line in summary_lines(summary) {
            println!("{}", line);
        }
        if !summary.is_complete() {
            println!(
                "{}",
                format!("{} file(s) could not be moved:", summary.failures().len()).red()
            );
            for failure in summary.failures() {
                println!(
                    "{}",
                    format!("  - {}: {}", failure.source.display(), failure.error).red()
                );
            }
        }
    }
}

/// Plain summary rows, `  Category: count` per category.
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let width = summary
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);

    summary
        .iter()
        .map(|(category, count)| {
            format!(
                "  {:<width$} {}",
                format!("{}:", category),
                count,
                width = width + 1
            )
        })
        .collect()
}

/// One row per category with its extensions, `(fallback)` for the catch-all.
pub fn category_lines(categories: &[Category]) -> Vec<String> {
    categories
        .iter()
        .map(|category| {
            if category.is_fallback() {
                format!("  {}: (fallback)", category.name())
            } else {
                format!("  {}: {}", category.name(), category.extensions().join(", "))
            }
        })
        .collect()
}

/// Event sink printing a run to the terminal.
pub struct TerminalReporter {
    verbosity: Verbosity,
    progress_enabled: bool,
    progress: Option<ProgressBar>,
}

impl TerminalReporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            progress_enabled: verbosity == Verbosity::Normal,
            progress: None,
        }
    }

    /// Turns the progress bar off (it is only ever shown at normal verbosity).
    pub fn without_progress(mut self) -> Self {
        self.progress_enabled = false;
        self
    }

    /// Announces that no folder was given and `cwd` is used instead.
    pub fn using_current_dir(&self, cwd: &Path) {
        if self.verbosity >= Verbosity::Normal {
            OutputFormatter::info(&format!(
                "No --path provided. Using current working directory: {}",
                cwd.display()
            ));
        }
    }

    /// Runs `print` without the progress bar getting in the way.
    fn print(&self, print: impl FnOnce()) {
        match &self.progress {
            Some(pb) => pb.suspend(print),
            None => print(),
        }
    }

    fn tick(&self) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }

    fn finish_progress(&mut self) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
    }
}

impl EventSink for TerminalReporter {
    fn emit(&mut self, event: &OrganizeEvent) {
        let normal = self.verbosity >= Verbosity::Normal;
        let verbose = self.verbosity >= Verbosity::Verbose;

        match event {
            OrganizeEvent::RunStarted {
                folder,
                dry_run,
                categories,
            } => {
                if normal {
                    if *dry_run {
                        OutputFormatter::dry_run_banner();
                    }
                    OutputFormatter::info(&format!("Organizing folder: {}", folder.display()));
                }
                if verbose {
                    OutputFormatter::detail("Categories:");
                    for line in category_lines(categories) {
                        OutputFormatter::detail(&line);
                    }
                }
            }
            OrganizeEvent::CategoryDirCreated { path, .. } => {
                if verbose {
                    OutputFormatter::detail(&format!("Created folder {}", path.display()));
                }
            }
            OrganizeEvent::FilesDiscovered { files, entries } => {
                if verbose {
                    OutputFormatter::detail(&format!(
                        "Found {} file(s) among {} entries",
                        files, entries
                    ));
                }
                if self.progress_enabled && *files > 0 {
                    self.progress = Some(OutputFormatter::create_progress_bar(*files as u64));
                }
            }
            OrganizeEvent::Skipped { name, reason } => {
                if verbose {
                    let line = format!("  Skipping {} ({})", name, reason.describe());
                    self.print(|| OutputFormatter::detail(&line));
                }
            }
            OrganizeEvent::WouldMove { plan } => {
                if normal {
                    let line = format!(
                        "  [DRY RUN] Would move {} → {}{}",
                        plan.source_name(),
                        plan.category,
                        rename_note(plan)
                    );
                    self.print(|| println!("{}", line.yellow()));
                }
                self.tick();
            }
            OrganizeEvent::Moved { plan } => {
                if normal {
                    let line = format!(
                        "  - {:<30} -> {}{}",
                        plan.source_name(),
                        plan.category,
                        rename_note(plan)
                    );
                    self.print(|| println!("{}", line.green()));
                }
                self.tick();
            }
            OrganizeEvent::MoveFailed { plan, error } => {
                let line = format!(
                    "  Failed to move {} -> {}: {}",
                    plan.source_name(),
                    plan.category,
                    error
                );
                self.print(|| OutputFormatter::error(&line));
                self.tick();
            }
            OrganizeEvent::RunAborted { .. } => {
                // The error itself is printed once by the caller.
                self.finish_progress();
            }
            OrganizeEvent::RunFinished { summary, dry_run } => {
                self.finish_progress();
                if normal {
                    if !*dry_run {
                        OutputFormatter::info(&format!("File(s) moved: {}", summary.total()));
                    }
                    OutputFormatter::summary_table(summary);
                } else if !summary.is_complete() {
                    OutputFormatter::error(&format!(
                        "{} file(s) could not be moved",
                        summary.failures().len()
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::CategoryTable;
    use crate::file_organizer::MoveFailureRecord;
    use std::path::PathBuf;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert!(Verbosity::Verbose > Verbosity::Normal);
    }

    #[test]
    fn test_summary_lines_follow_table_order() {
        let table = CategoryTable::default();
        let mut summary = RunSummary::new(&table);
        summary.record_move("Other");
        summary.record_move("Images");
        summary.record_move("Images");

        let lines = summary_lines(&summary);
        assert_eq!(lines.len(), table.categories().len());
        assert!(lines[0].starts_with("  Images:"));
        assert!(lines[0].ends_with(" 2"));
        assert!(lines[6].starts_with("  Other:"));
        assert!(lines[6].ends_with(" 1"));
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_category_lines_list_extensions() {
        let table = CategoryTable::default();
        let lines = category_lines(table.categories());

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[2], "  PDFs: .pdf");
        assert!(lines[0].starts_with("  Images: .jpg, .jpeg, .png"));
        assert_eq!(lines[6], "  Other: (fallback)");
    }

    #[test]
    fn test_reporter_handles_full_run_without_progress() {
        let table = CategoryTable::default();
        let mut summary = RunSummary::new(&table);
        summary.record_failure(MoveFailureRecord {
            source: PathBuf::from("/tmp/x/a.jpg"),
            destination: PathBuf::from("/tmp/x/Images/a.jpg"),
            error: "denied".to_string(),
        });

        for verbosity in [Verbosity::Quiet, Verbosity::Normal, Verbosity::Verbose] {
            let mut reporter = TerminalReporter::new(verbosity).without_progress();
            reporter.emit(&OrganizeEvent::RunStarted {
                folder: PathBuf::from("/tmp/x"),
                dry_run: false,
                categories: table.categories().to_vec(),
            });
            reporter.emit(&OrganizeEvent::FilesDiscovered {
                files: 1,
                entries: 2,
            });
            reporter.emit(&OrganizeEvent::RunFinished {
                summary: summary.clone(),
                dry_run: false,
            });
            assert!(reporter.progress.is_none());
        }
    }

    #[test]
    fn test_progress_bar_created_and_cleared() {
        let mut reporter = TerminalReporter::new(Verbosity::Normal);
        reporter.emit(&OrganizeEvent::FilesDiscovered {
            files: 3,
            entries: 3,
        });
        assert!(reporter.progress.is_some());

        reporter.emit(&OrganizeEvent::RunAborted {
            error: "boom".to_string(),
        });
        assert!(reporter.progress.is_none());
    }

    #[test]
    fn test_no_progress_bar_when_quiet() {
        let mut reporter = TerminalReporter::new(Verbosity::Quiet);
        reporter.emit(&OrganizeEvent::FilesDiscovered {
            files: 3,
            entries: 3,
        });
        assert!(reporter.progress.is_none());
    }
}
