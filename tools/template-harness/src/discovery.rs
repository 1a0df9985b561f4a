//! Template enumeration
//!
//! Templates live flat in one directory and are named
//! `{prefix}_{command}.{extension}`; the command name is what the fixture
//! locator searches for.

use crate::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A template file selected for a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateDescriptor {
    /// File name, e.g. `cisco_ios_show_version.textfsm`
    pub file_name: String,

    /// File name without prefix and extension, e.g. `show_version`
    pub command_name: String,

    pub path: PathBuf,
}

impl TemplateDescriptor {
    pub fn new(path: PathBuf, prefix: &str, extension: &str) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let command_name = command_name(&file_name, prefix, extension);
        Some(Self {
            file_name,
            command_name,
            path,
        })
    }
}

/// Strip `.{extension}` and `{prefix}_` from a template file name.
///
/// A stem without the `{prefix}_` separator is kept whole, so
/// `cisco_ios.textfsm` keeps the command name `cisco_ios`.
pub fn command_name(file_name: &str, prefix: &str, extension: &str) -> String {
    let stem = file_name
        .strip_suffix(extension)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(file_name);

    let underscored = format!("{}_", prefix);
    stem.strip_prefix(underscored.as_str())
        .filter(|command| !command.is_empty())
        .unwrap_or(stem)
        .to_string()
}

/// List templates in `dir` named `{prefix}*.{extension}`, sorted by file name.
///
/// `filter` narrows the list: an exact file or command name selects that one
/// template, otherwise every template whose file name contains the filter is
/// kept.
///
/// # Errors
///
/// - [`Error::DiscoveryEmpty`] if the directory is missing or holds no match
/// - [`Error::TemplateNotFound`] if `filter` matches nothing
pub fn discover_templates(
    dir: &Path,
    prefix: &str,
    extension: &str,
    filter: Option<&str>,
) -> Result<Vec<TemplateDescriptor>> {
    let empty = || Error::DiscoveryEmpty {
        dir: dir.to_path_buf(),
        prefix: prefix.to_string(),
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "template directory unreadable");
            return Err(empty());
        }
    };

    let suffix = format!(".{}", extension);
    let mut templates: Vec<TemplateDescriptor> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with(prefix) || !name.ends_with(&suffix) {
            continue;
        }
        if let Some(descriptor) = TemplateDescriptor::new(path.clone(), prefix, extension) {
            templates.push(descriptor);
        }
    }

    if templates.is_empty() {
        return Err(empty());
    }
    templates.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    let Some(filter) = filter else {
        tracing::info!(count = templates.len(), dir = %dir.display(), "discovered templates");
        return Ok(templates);
    };

    if let Some(exact) = templates
        .iter()
        .find(|t| t.file_name == filter || t.command_name == filter)
    {
        return Ok(vec![exact.clone()]);
    }

    let matching: Vec<TemplateDescriptor> = templates
        .into_iter()
        .filter(|t| t.file_name.contains(filter))
        .collect();
    if matching.is_empty() {
        return Err(Error::TemplateNotFound(filter.to_string()));
    }
    Ok(matching)
}
