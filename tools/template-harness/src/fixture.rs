//! Fixture lookup
//!
//! Fixtures are recorded device output stored as
//! `{root}/{vendor}/{directory}/*.{extension}`. Directory names usually equal
//! the command name derived from the template, but drift between template
//! and fixture authors is common, so lookup runs in two phases:
//!
//! 1. exact: `{root}/{vendor}/{command}/` holding at least one fixture
//! 2. fuzzy: any vendor subdirectory whose name contains the command name or
//!    is contained in it, scanned in name order
//!
//! Every listing is sorted by name, so the same directory snapshot always
//! yields the same fixture. When several fuzzy candidates qualify, the first
//! one in name order that holds a fixture wins.
//!
//! ## Expected output
//!
//! A fixture may have a YAML sidecar with the same stem (`show_version.yml`
//! next to `show_version.raw`). It is either a list of records or a mapping
//! with a `parsed_sample` list.

use crate::Result;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Finds fixture files for command names
#[derive(Debug, Clone)]
pub struct FixtureLocator {
    root: PathBuf,
    extension: String,
}

impl FixtureLocator {
    /// Create a locator over `root`, matching files ending in `.{extension}`
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fixture for `command_name`, or `None` if nothing qualifies.
    ///
    /// An unreadable vendor directory is treated as "not found". An empty
    /// command name never matches.
    pub fn locate(&self, vendor: &str, command_name: &str) -> Option<PathBuf> {
        if command_name.trim().is_empty() {
            return None;
        }
        let vendor_dir = self.root.join(vendor);

        let exact_dir = vendor_dir.join(command_name);
        if let Some(fixture) = self.first_fixture_in(&exact_dir) {
            tracing::debug!(command = command_name, fixture = %fixture.display(), "exact fixture match");
            return Some(fixture);
        }

        let subdirs = match sorted_entries(&vendor_dir) {
            Ok(entries) => entries.into_iter().filter(|p| p.is_dir()),
            Err(err) => {
                tracing::warn!(dir = %vendor_dir.display(), error = %err, "vendor fixture directory unreadable");
                return None;
            }
        };

        for dir in subdirs {
            let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !(command_name.contains(name) || name.contains(command_name)) {
                continue;
            }
            if let Some(fixture) = self.first_fixture_in(&dir) {
                tracing::debug!(command = command_name, dir = name, fixture = %fixture.display(), "fuzzy fixture match");
                return Some(fixture);
            }
        }

        tracing::debug!(command = command_name, "no fixture found");
        None
    }

    /// Lexicographically first fixture file directly inside `dir`.
    fn first_fixture_in(&self, dir: &Path) -> Option<PathBuf> {
        let suffix = format!(".{}", self.extension);
        sorted_entries(dir).ok()?.into_iter().find(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(&suffix))
        })
    }

    /// Expected-output sidecar for `fixture` (`<stem>.yml`, then `<stem>.yaml`).
    pub fn locate_expected(fixture: &Path) -> Option<PathBuf> {
        ["yml", "yaml"]
            .iter()
            .map(|ext| fixture.with_extension(ext))
            .find(|candidate| candidate.is_file())
    }
}

/// Directory entries sorted by file name.
fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

/// Number of records an expected-output sidecar declares.
///
/// Returns `None` when the document is neither a list nor a mapping with a
/// `parsed_sample` list.
pub fn expected_record_count(path: &Path) -> Result<Option<usize>> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_yaml_ng::from_str(&content)
        .map_err(|e| crate::Error::Config(format!("Invalid expected output {}: {}", path.display(), e)))?;

    Ok(match value {
        Value::Array(records) => Some(records.len()),
        Value::Object(map) => map.get("parsed_sample").and_then(Value::as_array).map(Vec::len),
        _ => None,
    })
}
