//! State rules: `^regex -> LineOp.RecordOp NewState`.

use crate::{EngineError, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static MATCH_ACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<match>.*)(\s->(?P<action>.*))$").expect("valid rule action regex"));

const LINE_OP_RE: &str = r"(?P<ln_op>Continue|Next|Error)";
const RECORD_OP_RE: &str = r"(?P<rec_op>Clear|Clearall|Record|NoRecord)";
const NEW_STATE_RE: &str = r#"(?P<new_state>\w+|".*")"#;

static ACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s+{LINE_OP_RE}(\.{RECORD_OP_RE})?(\s+{NEW_STATE_RE})?$")).expect("valid action regex")
});
static ACTION2_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^\s+{RECORD_OP_RE}(\s+{NEW_STATE_RE})?$")).expect("valid action regex"));
static ACTION3_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(\s+{NEW_STATE_RE})?$")).expect("valid action regex"));
static STATE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").expect("valid state name regex"));

pub const LINE_OPS: [&str; 3] = ["Continue", "Next", "Error"];
pub const RECORD_OPS: [&str; 4] = ["Clear", "Clearall", "Record", "NoRecord"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineOp {
    #[default]
    Next,
    Continue,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordOp {
    #[default]
    NoRecord,
    Record,
    Clear,
    Clearall,
}

#[derive(Debug, Clone)]
pub struct Rule {
    /// Match part as written, before substitution.
    pub pattern: String,
    /// Compiled, start-anchored regex with value templates substituted.
    pub regex: Regex,
    pub line_op: LineOp,
    pub record_op: RecordOp,
    /// Target state, or the quoted message for an `Error` action.
    pub new_state: Option<String>,
    pub line_num: usize,
}

pub fn is_valid_state_name(name: &str) -> bool {
    STATE_NAME_RE.is_match(name)
}

impl Rule {
    pub fn parse(line: &str, line_num: usize, value_templates: &IndexMap<String, String>) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Err(EngineError::template(format!("Null data in FSMRule. Line: {}", line_num)));
        }

        let split = MATCH_ACTION.captures(line);
        let pattern = match &split {
            Some(caps) => caps["match"].to_string(),
            None => line.to_string(),
        };

        let substituted = substitute(&pattern, value_templates, line_num)?;
        let regex = Regex::new(&format!("^(?:{})", substituted)).map_err(|_| {
            EngineError::template(format!(
                "Invalid regular expression: '{}'. Line: {}.",
                substituted, line_num
            ))
        })?;

        let mut rule = Self {
            pattern,
            regex,
            line_op: LineOp::default(),
            record_op: RecordOp::default(),
            new_state: None,
            line_num,
        };

        let Some(caps) = split else {
            return Ok(rule);
        };

        let action = &caps["action"];
        let action_caps = ACTION_RE
            .captures(action)
            .or_else(|| ACTION2_RE.captures(action))
            .or_else(|| ACTION3_RE.captures(action))
            .ok_or_else(|| {
                EngineError::template(format!("Badly formatted rule '{}'. Line: {}.", line, line_num))
            })?;

        if let Some(op) = action_caps.name("ln_op") {
            rule.line_op = match op.as_str() {
                "Continue" => LineOp::Continue,
                "Error" => LineOp::Error,
                _ => LineOp::Next,
            };
        }

        if let Some(op) = action_caps.name("rec_op") {
            rule.record_op = match op.as_str() {
                "Record" => RecordOp::Record,
                "Clear" => RecordOp::Clear,
                "Clearall" => RecordOp::Clearall,
                _ => RecordOp::NoRecord,
            };
        }

        rule.new_state = action_caps.name("new_state").map(|m| m.as_str().to_string());

        if let Some(state) = &rule.new_state {
            if rule.line_op == LineOp::Continue {
                return Err(EngineError::template(format!(
                    "Action 'Continue' with new state {} specified. Line: {}.",
                    state, line_num
                )));
            }

            if rule.line_op != LineOp::Error && !is_valid_state_name(state) {
                return Err(EngineError::template(format!(
                    "Alphanumeric characters only in state names. Line: {}.",
                    line_num
                )));
            }
        }

        Ok(rule)
    }
}

/// Expand `$$`, `$name` and `${name}` against the declared value templates.
fn substitute(pattern: &str, value_templates: &IndexMap<String, String>, line_num: usize) -> Result<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let name = match chars.peek().map(|&(_, next)| next) {
            Some('$') => {
                chars.next();
                out.push('$');
                continue;
            }
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    name.push(next);
                }
                if !closed || !is_identifier(&name) {
                    return Err(invalid_placeholder(line_num));
                }
                name
            }
            Some(next) if next == '_' || next.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if next == '_' || next.is_ascii_alphanumeric() {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                name
            }
            _ => return Err(invalid_placeholder(line_num)),
        };

        let template = value_templates.get(&name).ok_or_else(|| {
            EngineError::template(format!(
                "Duplicate or invalid variable substitution: '{}'. Line: {}.",
                name, line_num
            ))
        })?;
        out.push_str(template);
    }

    Ok(out)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn invalid_placeholder(line_num: usize) -> EngineError {
    EngineError::template(format!("Invalid placeholder in rule. Line: {}.", line_num))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> IndexMap<String, String> {
        let mut map = IndexMap::new();
        map.insert("Interface".to_string(), r"(?P<Interface>\S+)".to_string());
        map.insert("Status".to_string(), r"(?P<Status>up|down)".to_string());
        map
    }

    #[test]
    fn test_plain_rule_defaults() {
        let rule = Rule::parse(r"  ^${Interface}\s+${Status}", 5, &templates()).unwrap();
        assert_eq!(rule.line_op, LineOp::Next);
        assert_eq!(rule.record_op, RecordOp::NoRecord);
        assert!(rule.new_state.is_none());
        assert!(rule.regex.is_match("Gi0/1 up"));
    }

    #[test]
    fn test_double_dollar_is_literal_end_anchor() {
        let rule = Rule::parse(r"  ^${Interface}\s*$$ -> Record", 3, &templates()).unwrap();
        assert_eq!(rule.record_op, RecordOp::Record);
        assert!(rule.regex.is_match("Gi0/1"));
        assert!(!rule.regex.is_match("Gi0/1 trailing"));
    }

    #[test]
    fn test_rule_is_anchored_at_line_start() {
        let rule = Rule::parse(r"  ^Interface", 1, &templates()).unwrap();
        assert!(rule.regex.is_match("Interface x"));
        assert!(!rule.regex.is_match("  Interface"));
    }

    #[test]
    fn test_action_forms() {
        let rule = Rule::parse(r"  ^x -> Continue.Record", 1, &templates()).unwrap();
        assert_eq!((rule.line_op, rule.record_op), (LineOp::Continue, RecordOp::Record));

        let rule = Rule::parse(r"  ^x -> Clearall", 1, &templates()).unwrap();
        assert_eq!(rule.record_op, RecordOp::Clearall);

        let rule = Rule::parse(r"  ^x -> Detail", 1, &templates()).unwrap();
        assert_eq!(rule.new_state.as_deref(), Some("Detail"));

        let rule = Rule::parse(r#"  ^x -> Error "bad line""#, 1, &templates()).unwrap();
        assert_eq!(rule.line_op, LineOp::Error);
        assert_eq!(rule.new_state.as_deref(), Some("\"bad line\""));
    }

    #[test]
    fn test_continue_with_state_rejected() {
        let err = Rule::parse(r"  ^x -> Continue Detail", 7, &templates()).unwrap_err();
        assert_eq!(err.message(), "Action 'Continue' with new state Detail specified. Line: 7.");
    }

    #[test]
    fn test_unknown_substitution_rejected() {
        let err = Rule::parse(r"  ^${Missing}", 9, &templates()).unwrap_err();
        assert!(err.message().contains("'Missing'"));
    }

    #[test]
    fn test_badly_formatted_action() {
        assert!(Rule::parse(r"  ^x -> Record Next Extra", 2, &templates()).is_err());
    }
}
