//! Text rendering of engine output for the interactive shell.
//!
//! Formatting only: the variant never changes what an engine produced.

use crate::engine::{ParsedTable, RenderedOutput};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayVariant {
    /// Header line then one bracketed row per record.
    Table,
    /// One block per record with a `name: value` line per field.
    Detail,
}

impl DisplayVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayVariant::Table => "table",
            DisplayVariant::Detail => "detail",
        }
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn bracketed(items: impl Iterator<Item = String>) -> String {
    format!("[{}]", items.collect::<Vec<_>>().join(", "))
}

fn render_table(table: &ParsedTable) -> String {
    let mut out = format!("Header: {}\n\nData:\n", bracketed(table.header.iter().cloned()));
    for row in &table.rows {
        out.push_str(&bracketed(row.iter().map(cell_text)));
        out.push('\n');
    }
    out
}

fn render_detail(table: &ParsedTable) -> String {
    let mut out = format!("Header: {}\n", bracketed(table.header.iter().cloned()));
    for (idx, row) in table.rows.iter().enumerate() {
        let _ = write!(out, "\nRecord {}:\n", idx + 1);
        for (name, cell) in table.header.iter().zip(row) {
            let _ = writeln!(out, "  {}: {}", name, cell_text(cell));
        }
    }
    out
}

/// Render `output` for display.
///
/// Text output is returned unchanged whatever the variant. Tables without a
/// variant are rendered as pretty-printed JSON records.
pub fn render_output(output: &RenderedOutput, variant: Option<DisplayVariant>) -> String {
    match (output, variant) {
        (RenderedOutput::Text(text), _) => text.clone(),
        (RenderedOutput::Table(table), Some(DisplayVariant::Table)) => render_table(table),
        (RenderedOutput::Table(table), Some(DisplayVariant::Detail)) => render_detail(table),
        (RenderedOutput::Table(table), None) => {
            serde_json::to_string_pretty(&table.to_records()).unwrap_or_else(|_| render_table(table))
        }
    }
}
