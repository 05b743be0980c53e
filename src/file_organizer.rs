//! Moving files into their category folders.
//!
//! [`FileOrganizer::run`] validates the target folder, creates one subfolder per
//! category (real runs only), lists the folder once and then classifies,
//! plans and moves every regular file. Name collisions inside a category folder
//! are resolved by probing `stem (1).ext`, `stem (2).ext`, ... against the live
//! filesystem.
//!
//! Dry runs probe the same live filesystem and never touch it, so a suggested
//! rename is only a preview: if the folder changes before the real run, the real
//! run can pick a different suffix.
use crate::config::CompiledFilters;
use crate::events::{EventSink, OrganizeEvent, SkipReason};
use crate::file_category::{CategoryTable, split_name};
use serde::Serialize;
use serde::ser::SerializeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during an organize run.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The target folder is missing or is not a directory. Nothing was touched.
    #[error("{reason}: {}", .path.display())]
    InvalidTarget { path: PathBuf, reason: String },

    /// A category folder could not be created.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// The target folder could not be listed.
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDirFailed { path: PathBuf, source: io::Error },

    /// Moving a single file failed.
    #[error("Failed to move {} to {}: {source}", .source_path.display(), .destination.display())]
    MoveFailure {
        source_path: PathBuf,
        destination: PathBuf,
        source: io::Error,
    },
}

/// Result type for organize operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// What to do when moving a single file fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnMoveError {
    /// Stop the run and return the error.
    #[default]
    Abort,
    /// Record the failure in the summary and carry on with the next file.
    Continue,
}

/// The planned move of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// Current location of the file.
    pub source: PathBuf,
    /// Category folder the file goes into.
    pub dest_dir: PathBuf,
    /// File name inside `dest_dir`, possibly with a ` (n)` suffix.
    pub dest_name: String,
    /// True if `dest_name` differs from the original name because of a collision.
    pub renamed: bool,
    /// Category the file was classified into.
    pub category: String,
}

impl MovePlan {
    /// Plans moving `source` into `folder/category` under a free name.
    pub fn resolve(folder: &Path, source: &Path, file_name: &str, category: &str) -> Self {
        let dest_dir = folder.join(category);
        let (dest_name, renamed) = resolve_destination(&dest_dir, file_name);
        Self {
            source: source.to_path_buf(),
            dest_dir,
            dest_name,
            renamed,
            category: category.to_string(),
        }
    }

    /// Full destination path.
    pub fn dest_path(&self) -> PathBuf {
        self.dest_dir.join(&self.dest_name)
    }

    /// Original file name of the source.
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A file that could not be moved during a keep-going run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveFailureRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub error: String,
}

/// Per-category count of files actually moved during one run.
///
/// Every category of the table is present, in table order, starting at zero.
/// Dry runs leave all counts at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    counts: Vec<(String, usize)>,
    failures: Vec<MoveFailureRecord>,
}

impl RunSummary {
    /// A zeroed summary for every category of `table`.
    pub fn new(table: &CategoryTable) -> Self {
        Self {
            counts: table.names().map(|name| (name.to_string(), 0)).collect(),
            failures: Vec::new(),
        }
    }

    /// Counts one moved file for `category`.
    pub fn record_move(&mut self, category: &str) {
        match self.counts.iter_mut().find(|(name, _)| name == category) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((category.to_string(), 1)),
        }
    }

    pub fn record_failure(&mut self, failure: MoveFailureRecord) {
        self.failures.push(failure);
    }

    /// Moved-file count for `category`, `None` if the category is unknown.
    pub fn get(&self, category: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, count)| *count)
    }

    /// `(category, count)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Total number of files moved.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    /// Files that failed to move in a keep-going run.
    pub fn failures(&self) -> &[MoveFailureRecord] {
        &self.failures
    }

    /// True if no move failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

struct OrderedCounts<'a>(&'a [(String, usize)]);

impl Serialize for OrderedCounts<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

impl Serialize for RunSummary {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("moved", &OrderedCounts(&self.counts))?;
        map.serialize_entry("total", &self.total())?;
        map.serialize_entry("failures", &self.failures)?;
        map.end()
    }
}

/// Finds a free file name for `file_name` inside `category_dir`.
///
/// Returns `(file_name, false)` if nothing exists at `category_dir/file_name`,
/// otherwise the first of `stem (1)ext`, `stem (2)ext`, ... that is free, with
/// `true`. Every candidate is checked against the filesystem; any entry counts
/// as taken, dangling symlinks included. There is no upper bound on the suffix.
///
/// ```no_run
/// use filesort::file_organizer::resolve_destination;
/// use std::path::Path;
///
/// // With Documents/report.txt already present:
/// let (name, renamed) = resolve_destination(Path::new("Downloads/Documents"), "report.txt");
/// assert_eq!(name, "report (1).txt");
/// assert!(renamed);
/// ```
pub fn resolve_destination(category_dir: &Path, file_name: &str) -> (String, bool) {
    if !entry_exists(&category_dir.join(file_name)) {
        return (file_name.to_string(), false);
    }

    let (stem, ext) = split_name(file_name);
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{} ({}){}", stem, n, ext);
        if !entry_exists(&category_dir.join(&candidate)) {
            tracing::debug!(
                original = file_name,
                resolved = %candidate,
                probes = n,
                "resolved name collision"
            );
            return (candidate, true);
        }
        n += 1;
    }
}

fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Creates a subfolder of `folder` for every category that lacks one.
///
/// Existing folders are left untouched, so calling this twice is harmless.
/// Returns the folders that were created.
///
/// # Errors
///
/// Fails if a category name is taken by something that is not a directory, or
/// if creating a folder fails.
pub fn ensure_category_dirs(folder: &Path, table: &CategoryTable) -> OrganizeResult<Vec<PathBuf>> {
    let mut created = Vec::new();
    for name in table.names() {
        let path = folder.join(name);
        if path.is_dir() {
            continue;
        }
        if entry_exists(&path) {
            return Err(OrganizeError::DirectoryCreationFailed {
                path,
                source: io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "an entry that is not a directory already uses this name",
                ),
            });
        }
        match fs::create_dir(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "created category directory");
                created.push(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => {}
            Err(e) => {
                return Err(OrganizeError::DirectoryCreationFailed { path, source: e });
            }
        }
    }
    Ok(created)
}

/// Moves `source` to `destination`.
///
/// Uses a plain rename. When the rename fails because the two paths are on
/// different filesystems, falls back to [`copy_then_remove`].
pub fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                source = %source.display(),
                destination = %destination.display(),
                "rename crosses devices, falling back to copy and remove"
            );
            copy_then_remove(source, destination)
        }
        Err(e) => Err(e),
    }
}

/// Copies `source` to `destination` (content and permissions), then removes
/// `source`. If the source cannot be removed the copy is deleted again, so a
/// failed move never leaves two files behind.
fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)?;
    if let Err(e) = fs::remove_file(source) {
        if let Err(cleanup) = fs::remove_file(destination) {
            tracing::warn!(
                destination = %destination.display(),
                error = %cleanup,
                "could not remove copy after failed move, file now exists twice"
            );
        }
        return Err(e);
    }
    Ok(())
}

/// An entry of the target folder as listed at the start of the run.
struct ListedEntry {
    path: PathBuf,
    name: Option<String>,
    display_name: String,
    kind: EntryKind,
}

enum EntryKind {
    File,
    Directory,
    Other,
}

/// Organizes the top level of a folder into category subfolders.
///
/// # Examples
///
/// ```no_run
/// use filesort::events::NullSink;
/// use filesort::file_category::CategoryTable;
/// use filesort::file_organizer::FileOrganizer;
/// use std::path::Path;
///
/// let organizer = FileOrganizer::new(CategoryTable::default()).dry_run(true);
/// let summary = organizer.run(Path::new("/home/me/Downloads"), &mut NullSink)?;
/// assert_eq!(summary.total(), 0);
/// # Ok::<(), filesort::file_organizer::OrganizeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileOrganizer {
    table: CategoryTable,
    filters: CompiledFilters,
    dry_run: bool,
    on_error: OnMoveError,
}

impl FileOrganizer {
    /// An organizer using `table`, with no filters, in real mode, failing fast.
    pub fn new(table: CategoryTable) -> Self {
        Self {
            table,
            filters: CompiledFilters::default(),
            dry_run: false,
            on_error: OnMoveError::Abort,
        }
    }

    /// Only report what would happen, never touch the filesystem.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Files matching these filters are left in place.
    pub fn filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn on_error(mut self, on_error: OnMoveError) -> Self {
        self.on_error = on_error;
        self
    }

    /// Organizes `folder`, reporting each step to `sink`.
    ///
    /// # Errors
    ///
    /// * [`OrganizeError::InvalidTarget`] before anything is touched if `folder`
    ///   is missing or not a directory. `RunStarted` and `RunAborted` are still
    ///   emitted so the run log records the attempt.
    /// * [`OrganizeError::DirectoryCreationFailed`] if a category folder cannot
    ///   be created; no file has been moved at that point.
    /// * [`OrganizeError::ReadDirFailed`] if the folder cannot be listed.
    /// * [`OrganizeError::MoveFailure`] on the first failed move when the policy
    ///   is [`OnMoveError::Abort`]. Files moved before it stay moved.
    pub fn run(&self, folder: &Path, sink: &mut dyn EventSink) -> OrganizeResult<RunSummary> {
        sink.emit(&OrganizeEvent::RunStarted {
            folder: folder.to_path_buf(),
            dry_run: self.dry_run,
            categories: self.table.categories().to_vec(),
        });

        validate_target(folder).inspect_err(|e| {
            sink.emit(&OrganizeEvent::RunAborted {
                error: e.to_string(),
            })
        })?;

        if !self.dry_run {
            let created = ensure_category_dirs(folder, &self.table).inspect_err(|e| {
                sink.emit(&OrganizeEvent::RunAborted {
                    error: e.to_string(),
                })
            })?;
            for path in created {
                let category = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                sink.emit(&OrganizeEvent::CategoryDirCreated { category, path });
            }
        }

        let entries = list_entries(folder).inspect_err(|e| {
            sink.emit(&OrganizeEvent::RunAborted {
                error: e.to_string(),
            })
        })?;
        let files = entries
            .iter()
            .filter(|e| matches!(e.kind, EntryKind::File))
            .count();
        sink.emit(&OrganizeEvent::FilesDiscovered {
            files,
            entries: entries.len(),
        });

        let mut summary = RunSummary::new(&self.table);
        for entry in entries {
            let name = match (&entry.kind, entry.name) {
                (EntryKind::Directory, _) => {
                    self.skip(sink, entry.display_name, SkipReason::Directory);
                    continue;
                }
                (EntryKind::Other, _) => {
                    self.skip(sink, entry.display_name, SkipReason::NotRegularFile);
                    continue;
                }
                (EntryKind::File, None) => {
                    self.skip(sink, entry.display_name, SkipReason::NonUtf8Name);
                    continue;
                }
                (EntryKind::File, Some(name)) => name,
            };

            if self.filters.is_excluded(&name) {
                self.skip(sink, name, SkipReason::Excluded);
                continue;
            }

            let category = self.table.classify(&name);
            let plan = MovePlan::resolve(folder, &entry.path, &name, category);

            if self.dry_run {
                sink.emit(&OrganizeEvent::WouldMove { plan });
                continue;
            }

            let destination = plan.dest_path();
            match move_file(&plan.source, &destination) {
                Ok(()) => {
                    summary.record_move(category);
                    sink.emit(&OrganizeEvent::Moved { plan });
                }
                Err(e) => match self.on_error {
                    OnMoveError::Abort => {
                        let error = OrganizeError::MoveFailure {
                            source_path: plan.source,
                            destination,
                            source: e,
                        };
                        sink.emit(&OrganizeEvent::RunAborted {
                            error: error.to_string(),
                        });
                        return Err(error);
                    }
                    OnMoveError::Continue => {
                        tracing::warn!(file = %name, error = %e, "move failed, continuing");
                        summary.record_failure(MoveFailureRecord {
                            source: plan.source.clone(),
                            destination,
                            error: e.to_string(),
                        });
                        sink.emit(&OrganizeEvent::MoveFailed {
                            plan,
                            error: e.to_string(),
                        });
                    }
                },
            }
        }

        sink.emit(&OrganizeEvent::RunFinished {
            summary: summary.clone(),
            dry_run: self.dry_run,
        });
        Ok(summary)
    }

    fn skip(&self, sink: &mut dyn EventSink, name: String, reason: SkipReason) {
        sink.emit(&OrganizeEvent::Skipped { name, reason });
    }
}

/// Checks that `folder` exists and is a directory.
pub fn validate_target(folder: &Path) -> OrganizeResult<()> {
    match fs::metadata(folder) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(OrganizeError::InvalidTarget {
            path: folder.to_path_buf(),
            reason: "Path is not a directory".to_string(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(OrganizeError::InvalidTarget {
            path: folder.to_path_buf(),
            reason: "Path does not exist".to_string(),
        }),
        Err(e) => Err(OrganizeError::InvalidTarget {
            path: folder.to_path_buf(),
            reason: format!("Path is not accessible ({})", e),
        }),
    }
}

/// Lists `folder` once. Symlinks are not followed.
fn list_entries(folder: &Path) -> OrganizeResult<Vec<ListedEntry>> {
    let read_err = |source: io::Error| OrganizeError::ReadDirFailed {
        path: folder.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(folder).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let file_type = entry.file_type().map_err(read_err)?;
        let kind = if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        };
        let os_name = entry.file_name();
        entries.push(ListedEntry {
            path: entry.path(),
            display_name: os_name.to_string_lossy().into_owned(),
            name: os_name.into_string().ok(),
            kind,
        });
    }
    Ok(entries)
}
