//! Optional TOML configuration: a custom category table and exclude filters.
//!
//! Nothing is read unless a file is passed explicitly, and nothing is ever
//! written. Without a file the built-in category table is used and every
//! regular file is eligible.
//!
//! # Configuration File Format
//!
//! ```toml
//! [[categories]]
//! name = "Images"
//! extensions = [".jpg", "png"]
//!
//! [[categories]]
//! name = "Other"
//! extensions = []
//!
//! [filters]
//! exclude = ["*.part", "desktop.ini"]
//! exclude_regex = ["^~\\$"]
//! ```
//!
//! Extensions may omit the leading dot and are matched case-insensitively.
//! Exactly one category must have an empty extension list; it is the fallback.

use crate::file_category::{Category, CategoryTable, CategoryTableError};
use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Could not read configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid category table: {0}")]
    InvalidCategoryTable(#[from] CategoryTableError),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
}

/// Root of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrganizerConfig {
    /// Replaces the built-in table when present.
    #[serde(default)]
    pub categories: Option<Vec<CategoryDef>>,

    #[serde(default)]
    pub filters: FilterRules,
}

/// One `[[categories]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryDef {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Files to leave in place, matched against the file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterRules {
    /// Glob patterns (e.g. `*.part`, `Thumbs.db`).
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Regular expressions.
    #[serde(default)]
    pub exclude_regex: Vec<String>,
}

impl OrganizerConfig {
    /// Loads configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file does not exist,
    /// `ConfigError::Io` if it cannot be read and `ConfigError::Parse` if it is
    /// not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The configured category table, or the built-in one.
    pub fn category_table(&self) -> Result<CategoryTable, ConfigError> {
        match &self.categories {
            None => Ok(CategoryTable::builtin()),
            Some(defs) => {
                let categories = defs
                    .iter()
                    .map(|def| Category::new(def.name.clone(), def.extensions.as_slice()))
                    .collect();
                Ok(CategoryTable::new(categories)?)
            }
        }
    }

    /// Compiles the configured filters plus `extra_globs` (from the command line).
    pub fn compile_filters(&self, extra_globs: &[String]) -> Result<CompiledFilters, ConfigError> {
        let mut globs = self.filters.exclude.clone();
        globs.extend(extra_globs.iter().cloned());
        CompiledFilters::new(&globs, &self.filters.exclude_regex)
    }
}

/// Pre-compiled exclude filters.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    /// Compiles glob and regex exclude patterns.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first pattern that does not compile.
    pub fn new(globs: &[String], regexes: &[String]) -> Result<Self, ConfigError> {
        let exclude_patterns = globs
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = regexes
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// True if `file_name` matches any glob or regex.
    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.exclude_patterns.iter().any(|p| p.matches(file_name))
            || self.exclude_regexes.iter().any(|r| r.is_match(file_name))
    }

    pub fn is_empty(&self) -> bool {
        self.exclude_patterns.is_empty() && self.exclude_regexes.is_empty()
    }
}
