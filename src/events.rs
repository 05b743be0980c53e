//! Events emitted by the organizer while it works.
//!
//! The organizer never prints or writes logs itself. It reports every step as an
//! [`OrganizeEvent`] to an [`EventSink`]; the terminal reporter and the run log
//! are both sinks, and tests can simply collect events into a `Vec`.

use crate::file_category::Category;
use crate::file_organizer::{MovePlan, RunSummary};
use std::path::PathBuf;

/// Why an entry of the target folder was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The entry is a directory (category folders included).
    Directory,
    /// Symlink, socket, device or anything else that is not a regular file.
    NotRegularFile,
    /// Matched an exclude filter.
    Excluded,
    /// The file name is not valid UTF-8 and cannot be classified reliably.
    NonUtf8Name,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::Directory => "directory",
            SkipReason::NotRegularFile => "not a regular file",
            SkipReason::Excluded => "excluded by filter",
            SkipReason::NonUtf8Name => "file name is not valid UTF-8",
        }
    }
}

/// A single step of an organize run.
#[derive(Debug, Clone)]
pub enum OrganizeEvent {
    /// The run passed its preconditions and is about to start.
    RunStarted {
        folder: PathBuf,
        dry_run: bool,
        categories: Vec<Category>,
    },
    /// A category folder did not exist and was created.
    CategoryDirCreated { category: String, path: PathBuf },
    /// The folder was listed; `files` entries are regular files to process.
    FilesDiscovered { files: usize, entries: usize },
    /// An entry was not processed.
    Skipped { name: String, reason: SkipReason },
    /// Dry run: the file would be moved according to `plan`.
    WouldMove { plan: MovePlan },
    /// The file was moved according to `plan`.
    Moved { plan: MovePlan },
    /// Moving the file failed and the run continues (keep-going policy).
    MoveFailed { plan: MovePlan, error: String },
    /// The run stopped on a fatal error after it had started.
    RunAborted { error: String },
    /// The run is over.
    RunFinished { summary: RunSummary, dry_run: bool },
}

impl OrganizeEvent {
    /// Plain-text message for the run log, or `None` for events the log ignores.
    pub fn log_message(&self) -> Option<String> {
        match self {
            OrganizeEvent::RunStarted { dry_run, .. } => Some(if *dry_run {
                "=== New run started (dry-run mode)".to_string()
            } else {
                "=== New run started (real mode)".to_string()
            }),
            OrganizeEvent::WouldMove { plan } => Some(format!(
                "[DRY RUN] Would move {} → {}{}.",
                plan.source_name(),
                plan.category,
                rename_note(plan)
            )),
            OrganizeEvent::Moved { plan } => Some(format!(
                "Moved {} → {}{}.",
                plan.source_name(),
                plan.category,
                rename_note(plan)
            )),
            OrganizeEvent::MoveFailed { plan, error } => Some(format!(
                "Failed to move {} → {}: {}",
                plan.source_name(),
                plan.category,
                error
            )),
            OrganizeEvent::RunAborted { error } => Some(format!("Run aborted: {}", error)),
            OrganizeEvent::RunFinished { summary, .. } => {
                let counts: Vec<String> = summary
                    .iter()
                    .map(|(category, count)| format!("'{}': {}", category, count))
                    .collect();
                Some(format!("Summary of Files Moved: {{{}}}", counts.join(", ")))
            }
            OrganizeEvent::CategoryDirCreated { .. }
            | OrganizeEvent::FilesDiscovered { .. }
            | OrganizeEvent::Skipped { .. } => None,
        }
    }
}

/// ` (renamed to NAME)` when the plan had to dodge a collision.
pub(crate) fn rename_note(plan: &MovePlan) -> String {
    if plan.renamed {
        format!(" (renamed to {})", plan.dest_name)
    } else {
        String::new()
    }
}

/// Receives organizer events.
pub trait EventSink {
    fn emit(&mut self, event: &OrganizeEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &OrganizeEvent) {}
}

impl EventSink for Vec<OrganizeEvent> {
    fn emit(&mut self, event: &OrganizeEvent) {
        self.push(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &OrganizeEvent) {
        (**self).emit(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: &OrganizeEvent) {
        (**self).emit(event);
    }
}

/// Forwards each event to every inner sink, in insertion order.
#[derive(Default)]
pub struct Broadcast {
    sinks: Vec<Box<dyn EventSink>>,
}

impl Broadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }
}

impl EventSink for Broadcast {
    fn emit(&mut self, event: &OrganizeEvent) {
        for sink in &mut self.sinks {
            sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::CategoryTable;
    use std::path::Path;

    fn plan(name: &str, dest: &str, category: &str) -> MovePlan {
        MovePlan {
            source: Path::new("/tmp/in").join(name),
            dest_dir: Path::new("/tmp/in").join(category),
            dest_name: dest.to_string(),
            renamed: name != dest,
            category: category.to_string(),
        }
    }

    #[test]
    fn test_log_messages() {
        let started = OrganizeEvent::RunStarted {
            folder: PathBuf::from("/tmp/in"),
            dry_run: true,
            categories: vec![],
        };
        assert_eq!(
            started.log_message().as_deref(),
            Some("=== New run started (dry-run mode)")
        );

        let moved = OrganizeEvent::Moved {
            plan: plan("a.jpg", "a (1).jpg", "Images"),
        };
        assert_eq!(
            moved.log_message().as_deref(),
            Some("Moved a.jpg → Images (renamed to a (1).jpg).")
        );

        let would = OrganizeEvent::WouldMove {
            plan: plan("b.pdf", "b.pdf", "PDFs"),
        };
        assert_eq!(
            would.log_message().as_deref(),
            Some("[DRY RUN] Would move b.pdf → PDFs.")
        );

        let skipped = OrganizeEvent::Skipped {
            name: "Images".to_string(),
            reason: SkipReason::Directory,
        };
        assert!(skipped.log_message().is_none());
    }

    #[test]
    fn test_summary_log_message_keeps_table_order() {
        let table = CategoryTable::default();
        let mut summary = RunSummary::new(&table);
        summary.record_move("PDFs");
        let finished = OrganizeEvent::RunFinished {
            summary,
            dry_run: false,
        };
        assert_eq!(
            finished.log_message().as_deref(),
            Some(
                "Summary of Files Moved: {'Images': 0, 'Documents': 0, 'PDFs': 1, \
                 'Videos': 0, 'Audio': 0, 'Archives': 0, 'Other': 0}"
            )
        );
    }

    #[test]
    fn test_broadcast_reaches_every_sink() {
        struct Counter(std::rc::Rc<std::cell::Cell<usize>>);
        impl EventSink for Counter {
            fn emit(&mut self, _event: &OrganizeEvent) {
                self.0.set(self.0.get() + 1);
            }
        }

        let count = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut broadcast = Broadcast::new();
        broadcast.push(Counter(count.clone()));
        broadcast.push(Counter(count.clone()));
        broadcast.push(NullSink);

        broadcast.emit(&OrganizeEvent::FilesDiscovered {
            files: 0,
            entries: 0,
        });
        assert_eq!(count.get(), 2);
    }
}
