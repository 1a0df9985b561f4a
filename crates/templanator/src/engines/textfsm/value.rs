//! `Value` declarations and their per-record state.

use crate::{EngineError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Longest accepted Value or state name.
pub const MAX_NAME_LEN: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOption {
    /// Record is only saved if this value is non-empty.
    Required,
    /// Value survives a record save and is cleared only by `Clearall`.
    Filldown,
    /// A newly assigned value is copied into earlier records lacking one.
    Fillup,
    /// Marks the value as part of the row identity. No runtime effect.
    Key,
    /// Every match is appended to a list instead of replacing the value.
    List,
}

impl ValueOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueOption::Required => "Required",
            ValueOption::Filldown => "Filldown",
            ValueOption::Fillup => "Fillup",
            ValueOption::Key => "Key",
            ValueOption::List => "List",
        }
    }
}

impl FromStr for ValueOption {
    type Err = EngineError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "Required" => Ok(ValueOption::Required),
            "Filldown" => Ok(ValueOption::Filldown),
            "Fillup" => Ok(ValueOption::Fillup),
            "Key" => Ok(ValueOption::Key),
            "List" => Ok(ValueOption::List),
            other => Err(EngineError::template(format!("Unknown option \"{}\"", other))),
        }
    }
}

/// A parsed `Value [Options] Name (regex)` line.
#[derive(Debug, Clone)]
pub struct ValueDef {
    pub name: String,
    pub options: Vec<ValueOption>,
    /// Regex exactly as declared, including the outer parentheses.
    pub regex: String,
    /// Regex with the outer group renamed to the value name, spliced into rules.
    pub template: String,
    /// Anchored form of `regex`, present when it declares nested groups.
    nested: Option<Regex>,
}

impl ValueDef {
    /// Parse a declaration line. Tokens are split on single spaces.
    pub fn parse(line: &str) -> Result<Self> {
        let tokens: Vec<&str> = line.split(' ').collect();
        if tokens.len() < 3 {
            return Err(EngineError::template("Expect at least 3 tokens on line."));
        }

        let (options, name, regex) = if tokens[2].starts_with('(') {
            (Vec::new(), tokens[1], tokens[2..].join(" "))
        } else {
            let mut options: Vec<ValueOption> = Vec::new();
            for option in tokens[1].split(',') {
                let option: ValueOption = option.parse()?;
                if options.contains(&option) {
                    return Err(EngineError::template(format!("Duplicate option \"{}\"", option.as_str())));
                }
                options.push(option);
            }
            (options, tokens[2], tokens[3..].join(" "))
        };

        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(EngineError::template(format!(
                "Invalid Value name '{}' or name too long.",
                name
            )));
        }

        if !regex.starts_with('(') || !regex.ends_with(')') || regex.ends_with("\\)") {
            return Err(EngineError::template(format!(
                "Value '{}' must be contained within a '()' pair.",
                regex
            )));
        }

        let compiled = Regex::new(&regex).map_err(|e| EngineError::template(e.to_string()))?;
        let nested = if compiled.captures_len() > 2 {
            Some(
                Regex::new(&format!("^(?:{})", regex)).map_err(|e| EngineError::template(e.to_string()))?,
            )
        } else {
            None
        };

        let template = format!("(?P<{}>{}", name, &regex[1..]);

        Ok(Self {
            name: name.to_string(),
            options,
            regex,
            template,
            nested,
        })
    }

    pub fn has_option(&self, option: ValueOption) -> bool {
        self.options.contains(&option)
    }
}

/// Returned by [`ValueState::on_save_record`] when a `Required` value is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipRecord;

/// Mutable per-parse state of one value.
#[derive(Debug, Clone, Default)]
pub struct ValueState {
    pub current: Option<Value>,
    filldown: Option<Value>,
    list: Vec<Value>,
}

/// Truthiness used by `Required` and `Fillup`: unset, `""` and `[]` are empty.
pub fn is_empty_cell(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

impl ValueState {
    pub fn assign(&mut self, def: &ValueDef, captured: Option<&str>) {
        self.current = captured.map(|s| Value::String(s.to_string()));

        for option in &def.options {
            match option {
                ValueOption::Filldown => self.filldown = self.current.clone(),
                ValueOption::List => self.push_list_item(def, captured),
                _ => {}
            }
        }
    }

    fn push_list_item(&mut self, def: &ValueDef, captured: Option<&str>) {
        let Some(text) = captured else {
            self.list.push(Value::Null);
            return;
        };

        if let Some(nested) = &def.nested {
            if let Some(caps) = nested.captures(text) {
                let groups: Map<String, Value> = nested
                    .capture_names()
                    .flatten()
                    .map(|group| {
                        let cell = caps
                            .name(group)
                            .map(|m| Value::String(m.as_str().to_string()))
                            .unwrap_or(Value::Null);
                        (group.to_string(), cell)
                    })
                    .collect();
                if !groups.is_empty() {
                    self.list.push(Value::Object(groups));
                    return;
                }
            }
        }

        self.list.push(Value::String(text.to_string()));
    }

    pub fn clear(&mut self, def: &ValueDef) {
        self.current = None;

        for option in &def.options {
            match option {
                ValueOption::Filldown => self.current = self.filldown.clone(),
                ValueOption::List if !def.has_option(ValueOption::Filldown) => self.list.clear(),
                _ => {}
            }
        }
    }

    pub fn clear_all(&mut self, def: &ValueDef) {
        self.current = None;

        for option in &def.options {
            match option {
                ValueOption::Filldown => self.filldown = None,
                ValueOption::List => self.list.clear(),
                _ => {}
            }
        }
    }

    pub fn on_save_record(&mut self, def: &ValueDef) -> std::result::Result<(), SkipRecord> {
        for option in &def.options {
            match option {
                ValueOption::Required if is_empty_cell(self.current.as_ref()) => return Err(SkipRecord),
                ValueOption::List => self.current = Some(Value::Array(self.list.clone())),
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_without_options() {
        let def = ValueDef::parse(r"Value Interface (\S+)").unwrap();
        assert_eq!(def.name, "Interface");
        assert!(def.options.is_empty());
        assert_eq!(def.regex, r"(\S+)");
        assert_eq!(def.template, r"(?P<Interface>\S+)");
    }

    #[test]
    fn test_parse_with_options_and_spaces_in_regex() {
        let def = ValueDef::parse(r"Value Required,Filldown Status (up|administratively down)").unwrap();
        assert_eq!(def.name, "Status");
        assert_eq!(def.options, vec![ValueOption::Required, ValueOption::Filldown]);
        assert_eq!(def.regex, "(up|administratively down)");
    }

    #[test]
    fn test_parse_rejects_unknown_and_duplicate_options() {
        let err = ValueDef::parse(r"Value Sticky Name (\S+)").unwrap_err();
        assert_eq!(err.message(), "Unknown option \"Sticky\"");

        let err = ValueDef::parse(r"Value Key,Key Name (\S+)").unwrap_err();
        assert_eq!(err.message(), "Duplicate option \"Key\"");
    }

    #[test]
    fn test_parse_rejects_unwrapped_regex() {
        let err = ValueDef::parse(r"Value Key Name \S+").unwrap_err();
        assert!(err.message().contains("must be contained within a '()' pair"));
    }

    #[test]
    fn test_parse_rejects_short_line() {
        assert!(ValueDef::parse("Value Name").is_err());
    }

    #[test]
    fn test_filldown_survives_clear_but_not_clear_all() {
        let def = ValueDef::parse(r"Value Filldown Chassis (\S+)").unwrap();
        let mut state = ValueState::default();
        state.assign(&def, Some("c1"));
        state.clear(&def);
        assert_eq!(state.current, Some(json!("c1")));
        state.clear_all(&def);
        assert_eq!(state.current, None);
    }

    #[test]
    fn test_required_skips_empty() {
        let def = ValueDef::parse(r"Value Required Name (\S+)").unwrap();
        let mut state = ValueState::default();
        assert_eq!(state.on_save_record(&def), Err(SkipRecord));
        state.assign(&def, Some("x"));
        assert_eq!(state.on_save_record(&def), Ok(()));
    }

    #[test]
    fn test_list_collects_and_nested_groups_become_objects() {
        let plain = ValueDef::parse(r"Value List Vlan (\d+)").unwrap();
        let mut state = ValueState::default();
        state.assign(&plain, Some("10"));
        state.assign(&plain, Some("20"));
        state.on_save_record(&plain).unwrap();
        assert_eq!(state.current, Some(json!(["10", "20"])));

        let nested = ValueDef::parse(r"Value List Peer ((?P<ip>\S+) as (?P<asn>\d+))").unwrap();
        let mut state = ValueState::default();
        state.assign(&nested, Some("10.0.0.1 as 65000"));
        state.on_save_record(&nested).unwrap();
        assert_eq!(state.current, Some(json!([{"ip": "10.0.0.1", "asn": "65000"}])));
    }
}
