//! TextFSM-compatible state machine engine.
//!
//! A template is a block of `Value` declarations, a blank line, then one or
//! more states. Each state is a name line followed by rules indented with
//! whitespace and starting with `^`. Parsing starts in `Start`; reaching `End`
//! stops processing, and unless an `EOF` state is declared the pending record
//! is saved when input runs out.
//!
//! ```rust
//! use templanator::engines::textfsm::TextFsm;
//!
//! let template = "Value Name (\\S+)\n\nStart\n  ^${Name} -> Record\n";
//! let fsm = TextFsm::new(template)?;
//! let table = fsm.parse_text("alpha\nbeta\n")?;
//! assert_eq!(table.rows.len(), 2);
//! # Ok::<(), templanator::EngineError>(())
//! ```

mod rule;
mod value;

pub use rule::{LineOp, RecordOp, Rule};
pub use value::{MAX_NAME_LEN, ValueDef, ValueOption};

use crate::engine::{EngineKind, ParsedTable, RenderedOutput, TemplateEngine};
use crate::samples;
use crate::{EngineError, Result};
use indexmap::IndexMap;
use rule::{LINE_OPS, RECORD_OPS, is_valid_state_name};
use serde_json::Value;
use value::{SkipRecord, ValueState, is_empty_cell};

/// A compiled template. Immutable; every parse gets fresh state.
#[derive(Debug, Clone)]
pub struct TextFsm {
    values: Vec<ValueDef>,
    states: IndexMap<String, Vec<Rule>>,
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

impl TextFsm {
    pub fn new(template: &str) -> Result<Self> {
        if template.is_empty() {
            return Err(EngineError::template("Null template."));
        }

        let mut lines = template.lines().enumerate().map(|(idx, line)| (idx + 1, line));

        let (values, value_templates) = Self::parse_values(&mut lines)?;

        let mut states: IndexMap<String, Vec<Rule>> = IndexMap::new();
        while Self::parse_state(&mut lines, &value_templates, &mut states)? {}

        let mut fsm = Self { values, states };
        fsm.validate()?;
        Ok(fsm)
    }

    fn parse_values<'a>(
        lines: &mut impl Iterator<Item = (usize, &'a str)>,
    ) -> Result<(Vec<ValueDef>, IndexMap<String, String>)> {
        let mut values: Vec<ValueDef> = Vec::new();
        let mut value_templates = IndexMap::new();

        for (line_num, line) in lines {
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if is_comment(line) {
                continue;
            }

            if line.starts_with("Value ") {
                let def = ValueDef::parse(line)
                    .map_err(|e| EngineError::template(format!("{} Line {}.", e.message(), line_num)))?;

                if values.iter().any(|existing| existing.name == def.name) {
                    return Err(EngineError::template(format!(
                        "Duplicate declarations for Value '{}'. Line: {}.",
                        def.name, line_num
                    )));
                }

                value_templates.insert(def.name.clone(), def.template.clone());
                values.push(def);
            } else if values.is_empty() {
                return Err(EngineError::template("No Value definitions found."));
            } else {
                return Err(EngineError::template(format!(
                    "Expected blank line after last Value entry. Line: {}.",
                    line_num
                )));
            }
        }

        Ok((values, value_templates))
    }

    /// Parse one state block. Returns `false` once the template is exhausted.
    fn parse_state<'a>(
        lines: &mut impl Iterator<Item = (usize, &'a str)>,
        value_templates: &IndexMap<String, String>,
        states: &mut IndexMap<String, Vec<Rule>>,
    ) -> Result<bool> {
        let mut state_name = None;

        for (line_num, line) in lines.by_ref() {
            let line = line.trim_end();
            if line.is_empty() || is_comment(line) {
                continue;
            }

            if !is_valid_state_name(line)
                || line.len() > MAX_NAME_LEN
                || LINE_OPS.contains(&line)
                || RECORD_OPS.contains(&line)
            {
                return Err(EngineError::template(format!(
                    "Invalid state name: '{}'. Line: {}",
                    line, line_num
                )));
            }

            if states.contains_key(line) {
                return Err(EngineError::template(format!(
                    "Duplicate state name: '{}'. Line: {}",
                    line, line_num
                )));
            }

            states.insert(line.to_string(), Vec::new());
            state_name = Some(line.to_string());
            break;
        }

        let Some(state_name) = state_name else {
            return Ok(false);
        };

        let mut rules = Vec::new();
        for (line_num, line) in lines.by_ref() {
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if is_comment(line) {
                continue;
            }
            if !(line.starts_with(" ^") || line.starts_with("  ^") || line.starts_with("\t^")) {
                return Err(EngineError::template(format!(
                    "Missing white space or carat ('^') before rule. Line: {}",
                    line_num
                )));
            }
            rules.push(Rule::parse(line, line_num, value_templates)?);
        }

        states.insert(state_name, rules);
        Ok(true)
    }

    fn validate(&mut self) -> Result<()> {
        if !self.states.contains_key("Start") {
            return Err(EngineError::template("Missing state 'Start'."));
        }

        for reserved in ["End", "EOF"] {
            if self.states.get(reserved).is_some_and(|rules| !rules.is_empty()) {
                return Err(EngineError::template(format!("Non-Empty '{}' state.", reserved)));
            }
        }

        self.states.shift_remove("End");

        for (state, rules) in &self.states {
            for rule in rules {
                if rule.line_op == LineOp::Error {
                    continue;
                }
                let Some(target) = rule.new_state.as_deref() else {
                    continue;
                };
                if target == "End" || target == "EOF" {
                    continue;
                }
                if !self.states.contains_key(target) {
                    return Err(EngineError::template(format!(
                        "State '{}' not found, referenced in state '{}'",
                        target, state
                    )));
                }
            }
        }

        Ok(())
    }

    /// Value names in declaration order.
    pub fn header(&self) -> Vec<String> {
        self.values.iter().map(|v| v.name.clone()).collect()
    }

    pub fn values(&self) -> &[ValueDef] {
        &self.values
    }

    /// Names of values carrying `option`.
    pub fn values_with_option(&self, option: ValueOption) -> Vec<String> {
        self.values
            .iter()
            .filter(|v| v.has_option(option))
            .map(|v| v.name.clone())
            .collect()
    }

    pub fn state_names(&self) -> Vec<String> {
        self.states.keys().cloned().collect()
    }

    /// Run the state machine over `text`.
    pub fn parse_text(&self, text: &str) -> Result<ParsedTable> {
        let mut run = Run::new(self);

        for line in text.lines() {
            run.check_line(line)?;
            if run.state == "End" || run.state == "EOF" {
                break;
            }
        }

        if run.state != "End" && !self.states.contains_key("EOF") {
            run.append_record();
        }

        Ok(ParsedTable {
            header: self.header(),
            rows: run.rows,
        })
    }
}

/// Mutable state of a single parse.
struct Run<'a> {
    fsm: &'a TextFsm,
    state: &'a str,
    values: Vec<ValueState>,
    rows: Vec<Vec<Value>>,
}

impl<'a> Run<'a> {
    fn new(fsm: &'a TextFsm) -> Self {
        Self {
            fsm,
            state: "Start",
            values: vec![ValueState::default(); fsm.values.len()],
            rows: Vec::new(),
        }
    }

    fn check_line(&mut self, line: &str) -> Result<()> {
        let fsm = self.fsm;
        let Some(rules) = fsm.states.get(self.state) else {
            return Ok(());
        };

        for rule in rules {
            let Some(caps) = rule.regex.captures(line) else {
                continue;
            };

            for group in rule.regex.capture_names().flatten() {
                if let Some(idx) = fsm.values.iter().position(|v| v.name == group) {
                    self.assign(idx, caps.name(group).map(|m| m.as_str()));
                }
            }

            if self.operations(rule, line)? {
                if let Some(target) = rule.new_state.as_deref() {
                    self.state = fsm
                        .states
                        .get_key_value(target)
                        .map(|(name, _)| name.as_str())
                        .unwrap_or(if target == "EOF" { "EOF" } else { "End" });
                }
                break;
            }
        }

        Ok(())
    }

    fn assign(&mut self, idx: usize, captured: Option<&str>) {
        let fsm = self.fsm;
        let def = &fsm.values[idx];
        self.values[idx].assign(def, captured);

        if def.has_option(ValueOption::Fillup) && !is_empty_cell(self.values[idx].current.as_ref()) {
            let filled = self.values[idx].current.clone().unwrap_or(Value::Null);
            for row in self.rows.iter_mut().rev() {
                if !is_empty_cell(Some(&row[idx])) {
                    break;
                }
                row[idx] = filled.clone();
            }
        }
    }

    /// Apply the rule's record and line operators. `false` means `Continue`.
    fn operations(&mut self, rule: &Rule, line: &str) -> Result<bool> {
        match rule.record_op {
            RecordOp::Record => self.append_record(),
            RecordOp::Clear => self.clear_record(),
            RecordOp::Clearall => self.clear_all_record(),
            RecordOp::NoRecord => {}
        }

        match rule.line_op {
            LineOp::Error => Err(EngineError::parse(match &rule.new_state {
                Some(message) => format!(
                    "Error: {}. Rule Line: {}. Input Line: {}.",
                    message, rule.line_num, line
                ),
                None => format!("State Error raised. Rule Line: {}. Input Line: {}.", rule.line_num, line),
            })),
            LineOp::Continue => Ok(false),
            LineOp::Next => Ok(true),
        }
    }

    fn append_record(&mut self) {
        let fsm = self.fsm;
        if fsm.values.is_empty() {
            return;
        }

        let mut record = Vec::with_capacity(self.values.len());
        let mut skipped = false;
        for (def, state) in fsm.values.iter().zip(self.values.iter_mut()) {
            if state.on_save_record(def) == Err(SkipRecord) {
                skipped = true;
                break;
            }
            record.push(state.current.clone());
        }
        if skipped {
            self.clear_record();
            return;
        }

        let all_empty = record.iter().all(|cell| match cell {
            None | Some(Value::Null) => true,
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        });
        if all_empty {
            return;
        }

        self.rows.push(
            record
                .into_iter()
                .map(|cell| match cell {
                    None | Some(Value::Null) => Value::String(String::new()),
                    Some(cell) => cell,
                })
                .collect(),
        );
        self.clear_record();
    }

    fn clear_record(&mut self) {
        let fsm = self.fsm;
        for (def, state) in fsm.values.iter().zip(self.values.iter_mut()) {
            state.clear(def);
        }
    }

    fn clear_all_record(&mut self) {
        let fsm = self.fsm;
        for (def, state) in fsm.values.iter().zip(self.values.iter_mut()) {
            state.clear_all(def);
        }
    }
}

/// [`TemplateEngine`] backed by [`TextFsm`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFsmEngine;

impl TextFsmEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for TextFsmEngine {
    fn name(&self) -> &str {
        "textfsm"
    }

    fn kind(&self) -> EngineKind {
        EngineKind::TextFsm
    }

    fn process(&self, source: &str, template: &str) -> Result<RenderedOutput> {
        let fsm = TextFsm::new(template)?;
        let table = fsm.parse_text(source)?;
        tracing::trace!(rows = table.rows.len(), "textfsm parse complete");
        Ok(RenderedOutput::Table(table))
    }

    fn example(&self) -> (String, String) {
        (
            samples::IP_INTERFACE_BRIEF.to_string(),
            samples::TEXTFSM_IP_INTERFACE_BRIEF.to_string(),
        )
    }
}
