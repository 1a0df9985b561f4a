//! The engine contract shared by every template backend.
//!
//! Backends are stored as `Arc<dyn TemplateEngine>` and may be called from
//! several worker threads at once, so implementations must be `Send + Sync`
//! and keep no per-call state on `self`.

use crate::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Family a backend belongs to.
///
/// Only used to pick display defaults and built-in examples; the processing
/// path never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    TextFsm,
    Ttp,
    Jinja2,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::TextFsm => "textfsm",
            EngineKind::Ttp => "ttp",
            EngineKind::Jinja2 => "jinja2",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows produced by a parsing engine, aligned with `header`.
///
/// Cells are JSON values: plain captures are strings, `List` captures are
/// arrays (of strings, or of objects when the value regex has nested groups).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ParsedTable {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Rows as header-keyed objects, in row order.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.header
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<Map<String, Value>>()
            })
            .collect()
    }
}

/// Output of a successful engine call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum RenderedOutput {
    /// Structured rows from a parsing engine (TextFSM, TTP).
    Table(ParsedTable),
    /// Free text from a substitution engine (Jinja2).
    Text(String),
}

impl RenderedOutput {
    /// Number of structured rows produced.
    ///
    /// Text output counts its non-blank lines.
    pub fn record_count(&self) -> usize {
        match self {
            RenderedOutput::Table(table) => table.rows.len(),
            RenderedOutput::Text(text) => text.lines().filter(|line| !line.trim().is_empty()).count(),
        }
    }

    pub fn as_table(&self) -> Option<&ParsedTable> {
        match self {
            RenderedOutput::Table(table) => Some(table),
            RenderedOutput::Text(_) => None,
        }
    }

    /// Header-keyed records; text output has none.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.as_table().map(ParsedTable::to_records).unwrap_or_default()
    }
}

/// A text-template backend.
///
/// `process` must report every failure as an [`crate::EngineError`]; it is
/// called with raw source text and raw template text and owns nothing beyond
/// the call.
pub trait TemplateEngine: Send + Sync {
    /// Stable engine name (kebab-case).
    fn name(&self) -> &str;

    fn kind(&self) -> EngineKind;

    /// Apply `template` to `source`.
    fn process(&self, source: &str, template: &str) -> Result<RenderedOutput>;

    /// A fixed `(source, template)` pair that this engine processes cleanly.
    fn example(&self) -> (String, String);
}
