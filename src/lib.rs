//! filesort - sort the files of a folder into category subfolders
//!
//! Every regular file at the top level of the target folder is classified by
//! its extension against a [`CategoryTable`] and moved into a subfolder named
//! after its category. Name collisions get a ` (n)` suffix, dry runs preview
//! the moves without touching anything, and every step is reported as an
//! [`OrganizeEvent`] to the terminal and to an append-only run log.

pub mod cli;
pub mod config;
pub mod events;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod run_log;

pub use config::{CompiledFilters, ConfigError, OrganizerConfig};
pub use events::{Broadcast, EventSink, NullSink, OrganizeEvent, SkipReason};
pub use file_category::{Category, CategoryTable, CategoryTableError, classify};
pub use file_organizer::{
    FileOrganizer, MovePlan, OnMoveError, OrganizeError, OrganizeResult, RunSummary,
    resolve_destination,
};
pub use run_log::RunLog;

pub use cli::{Cli, CliError, run_cli};
