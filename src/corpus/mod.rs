//! Tooling for running the migration over a corpus of downloaded books.
//!
//! The pipeline has three steps, each reading the previous step's JSON:
//!
//! 1. [`group_stylesheets`]: collect stylesheets into groups of identical
//!    content;
//! 2. [`filter_groups`]: keep the groups with interfering `.marginBox` rules;
//! 3. [`create_migrations`]: write a draft migration folder for each.

pub mod filter;
pub mod group;
pub mod migrations;

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

pub use filter::{FilterOutput, FilterSummary, ProblemRecord, filter_groups, probably_interferes};
pub use group::{CssGroup, group_stylesheets, strip_boilerplate};
pub use migrations::{MigrationInfo, Outcome, create_migrations};

/// Read a JSON file written by an earlier step.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
    Ok(serde_json::from_str(&json)?)
}

/// Write `value` as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io_at(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| Error::io_at(path, e))
}
