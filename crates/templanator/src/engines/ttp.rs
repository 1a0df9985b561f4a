//! Token-pattern templates in the TTP style.
//!
//! Supported subset:
//!
//! - `<group name="...">` ... `</group>` blocks (not nested). Lines outside
//!   any group form an anonymous group.
//! - `{{ var }}` placeholders, optionally piped through match indicators
//!   (`WORD`, `PHRASE`, `ORPHRASE`, `DIGIT`, `IP`, `PREFIX`, `MAC`,
//!   `re("...")`) and `to_int`.
//! - Whitespace between tokens matches any run of spaces or tabs; every
//!   template line must match a whole input line.
//! - The first line of a group starts a new result; other lines fill in the
//!   current one.

use crate::engine::{EngineKind, ParsedTable, RenderedOutput, TemplateEngine};
use crate::samples;
use crate::{EngineError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static GROUP_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^<group(?:\s+name\s*=\s*"(?P<name>[^"]*)")?\s*>$"#).expect("valid group regex"));
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("valid placeholder regex"));
static RE_INDICATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^re\(\s*["'](?P<pattern>.*)["']\s*\)$"#).expect("valid re() regex"));

const ANONYMOUS_GROUP: &str = "_anonymous_";

fn indicator_pattern(name: &str) -> Option<&'static str> {
    Some(match name {
        "WORD" => r"\S+",
        "PHRASE" => r"\S+(?: \S+)+",
        "ORPHRASE" => r"\S+(?: \S+)*",
        "DIGIT" => r"\d+",
        "IP" => r"(?:[0-9]{1,3}\.){3}[0-9]{1,3}",
        "PREFIX" => r"(?:[0-9]{1,3}\.){3}[0-9]{1,3}/[0-9]{1,2}",
        "MAC" => {
            r"(?:[0-9a-fA-F]{2}(?:[:-][0-9a-fA-F]{2}){5}|[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}|[0-9a-fA-F]{12})"
        }
        _ => return None,
    })
}

#[derive(Debug, Clone)]
struct Variable {
    name: String,
    to_int: bool,
}

#[derive(Debug, Clone)]
struct PatternLine {
    regex: Regex,
    /// Variable behind each `v{index}` capture group.
    variables: Vec<Variable>,
}

impl PatternLine {
    fn compile(line: &str, line_num: usize) -> Result<Self> {
        let mut pattern = String::from(r"^[\t ]*");
        let mut variables = Vec::new();
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(line) {
            let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            pattern.push_str(&literal(&line[last..whole.start()]));
            last = whole.end();

            let (variable, regex) = parse_placeholder(body.as_str(), line_num)?;
            pattern.push_str(&format!("(?P<v{}>{})", variables.len(), regex));
            variables.push(variable);
        }
        pattern.push_str(&literal(&line[last..]));
        pattern.push_str(r"[\t ]*$");

        let regex = Regex::new(&pattern).map_err(|e| {
            EngineError::template(format!("Invalid pattern on template line {}: {}", line_num, e))
        })?;

        Ok(Self { regex, variables })
    }

    fn captures(&self, line: &str) -> Option<Vec<(String, Value)>> {
        let caps = self.regex.captures(line)?;
        Some(
            self.variables
                .iter()
                .enumerate()
                .filter_map(|(idx, variable)| {
                    let text = caps.name(&format!("v{}", idx))?.as_str();
                    let value = match text.parse::<i64>() {
                        Ok(number) if variable.to_int => Value::from(number),
                        _ => Value::String(text.to_string()),
                    };
                    Some((variable.name.clone(), value))
                })
                .collect(),
        )
    }
}

/// Escape literal text, letting any whitespace run match one or more blanks.
fn literal(text: &str) -> String {
    let mut out = String::new();
    let mut in_space = false;
    for c in text.chars() {
        if c == ' ' || c == '\t' {
            if !in_space {
                out.push_str(r"[\t ]+");
                in_space = true;
            }
        } else {
            in_space = false;
            out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
        }
    }
    out
}

/// Split on `|` outside quotes, so `re("a|b")` stays whole.
fn split_pipes(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (idx, c) in body.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '|') => {
                parts.push(body[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(body[start..].trim());
    parts
}

fn parse_placeholder(body: &str, line_num: usize) -> Result<(Variable, String)> {
    let mut parts = split_pipes(body).into_iter();
    let name = parts.next().unwrap_or_default();
    if name.is_empty() || !name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric()) {
        return Err(EngineError::template(format!(
            "Invalid variable name '{}' on template line {}",
            name, line_num
        )));
    }

    let mut variable = Variable {
        name: name.to_string(),
        to_int: false,
    };
    let mut regex = r"\S+".to_string();

    for item in parts {
        if item == "to_int" {
            variable.to_int = true;
        } else if let Some(pattern) = indicator_pattern(item) {
            regex = pattern.to_string();
        } else if let Some(caps) = RE_INDICATOR.captures(item) {
            regex = format!("(?:{})", &caps["pattern"]);
        } else {
            return Err(EngineError::template(format!(
                "Unsupported function '{}' for variable '{}' on template line {}",
                item, name, line_num
            )));
        }
    }

    Ok((variable, regex))
}

#[derive(Debug, Clone)]
struct Group {
    name: String,
    lines: Vec<PatternLine>,
}

impl Group {
    fn parse_into(&self, text: &str, header: &[String], rows: &mut Vec<Vec<Value>>) {
        let Some((start, rest)) = self.lines.split_first() else {
            return;
        };

        let mut current: Option<Vec<Value>> = None;
        let empty_row = || vec![Value::String(String::new()); header.len()];
        let fill = |row: &mut Vec<Value>, captured: Vec<(String, Value)>| {
            for (name, value) in captured {
                if let Some(idx) = header.iter().position(|h| *h == name) {
                    row[idx] = value;
                }
            }
        };

        for line in text.lines() {
            if let Some(captured) = start.captures(line) {
                if let Some(done) = current.take() {
                    rows.push(done);
                }
                let mut row = empty_row();
                fill(&mut row, captured);
                current = Some(row);
                continue;
            }

            let Some(row) = current.as_mut() else {
                continue;
            };
            if let Some(captured) = rest.iter().find_map(|pattern| pattern.captures(line)) {
                fill(row, captured);
            }
        }

        if let Some(done) = current {
            rows.push(done);
        }
    }
}

/// A compiled TTP template.
#[derive(Debug, Clone)]
pub struct TtpTemplate {
    groups: Vec<Group>,
    header: Vec<String>,
}

impl TtpTemplate {
    pub fn new(template: &str) -> Result<Self> {
        let mut groups: Vec<Group> = Vec::new();
        let mut anonymous = Group {
            name: ANONYMOUS_GROUP.to_string(),
            lines: Vec::new(),
        };
        let mut open: Option<Group> = None;

        for (idx, raw) in template.lines().enumerate() {
            let line_num = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(caps) = GROUP_OPEN.captures(line) {
                if open.is_some() {
                    return Err(EngineError::template(format!(
                        "Nested groups are not supported. Line: {}",
                        line_num
                    )));
                }
                let name = caps.name("name").map(|m| m.as_str()).unwrap_or(ANONYMOUS_GROUP);
                open = Some(Group {
                    name: name.to_string(),
                    lines: Vec::new(),
                });
                continue;
            }

            if line == "</group>" {
                let group = open.take().ok_or_else(|| {
                    EngineError::template(format!("Closing </group> without opening tag. Line: {}", line_num))
                })?;
                groups.push(group);
                continue;
            }

            let pattern = PatternLine::compile(line, line_num)?;
            match open.as_mut() {
                Some(group) => group.lines.push(pattern),
                None => anonymous.lines.push(pattern),
            }
        }

        if let Some(group) = open {
            return Err(EngineError::template(format!("Unclosed <group name=\"{}\">", group.name)));
        }
        if !anonymous.lines.is_empty() {
            groups.insert(0, anonymous);
        }
        if groups.iter().all(|group| group.lines.is_empty()) {
            return Err(EngineError::template("Template has no pattern lines."));
        }

        let mut header: Vec<String> = Vec::new();
        for variable in groups.iter().flat_map(|g| g.lines.iter()).flat_map(|l| l.variables.iter()) {
            if !header.contains(&variable.name) {
                header.push(variable.name.clone());
            }
        }

        Ok(Self { groups, header })
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    /// Results of every group, in group order.
    pub fn parse_text(&self, text: &str) -> ParsedTable {
        let mut table = ParsedTable::new(self.header.clone());
        for group in &self.groups {
            group.parse_into(text, &self.header, &mut table.rows);
        }
        table
    }
}

/// [`TemplateEngine`] backed by [`TtpTemplate`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TtpEngine;

impl TtpEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for TtpEngine {
    fn name(&self) -> &str {
        "ttp"
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Ttp
    }

    fn process(&self, source: &str, template: &str) -> Result<RenderedOutput> {
        let compiled = TtpTemplate::new(template)?;
        Ok(RenderedOutput::Table(compiled.parse_text(source)))
    }

    fn example(&self) -> (String, String) {
        (
            samples::IP_INTERFACE_BRIEF.to_string(),
            samples::TTP_IP_INTERFACE_BRIEF.to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_start_line_opens_new_result() {
        let template = r#"
<group name="interfaces">
interface {{ name }}
 description {{ description | ORPHRASE }}
 ip address {{ ip | IP }} {{ mask | IP }}
</group>
"#;
        let source = "\
interface Gi0/0
 description Uplink to core
 ip address 10.0.0.1 255.255.255.252
interface Gi0/1
 ip address 10.0.1.1 255.255.255.0
";
        let table = TtpTemplate::new(template).unwrap().parse_text(source);
        assert_eq!(table.header, vec!["name", "description", "ip", "mask"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], json!("Uplink to core"));
        assert_eq!(table.rows[1], vec![json!("Gi0/1"), json!(""), json!("10.0.1.1"), json!("255.255.255.0")]);
    }

    #[test]
    fn test_indicators_and_to_int() {
        let template = "{{ port }} vlan {{ vlan | DIGIT | to_int }} mac {{ mac | MAC }}";
        let table = TtpTemplate::new(template)
            .unwrap()
            .parse_text("Gi1 vlan 10 mac 0011.2233.4455\nGi2 vlan ten mac 0011.2233.4455\n");
        assert_eq!(table.rows, vec![vec![json!("Gi1"), json!(10), json!("0011.2233.4455")]]);
    }

    #[test]
    fn test_re_indicator() {
        let template = r#"{{ interface }} {{ state | re("up|down") }}"#;
        let table = TtpTemplate::new(template)
            .unwrap()
            .parse_text("Gi1 up\nGi2 testing\nGi3 down\n");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][0], json!("Gi3"));
    }

    #[test]
    fn test_literal_punctuation_is_escaped() {
        let template = "Port ID (outgoing port): {{ port }}";
        let table = TtpTemplate::new(template).unwrap().parse_text("Port ID (outgoing port): Gi1/0/1\n");
        assert_eq!(table.rows, vec![vec![json!("Gi1/0/1")]]);
    }

    #[test]
    fn test_template_errors() {
        assert!(TtpTemplate::new("<group name=\"x\">\n{{ a }}\n").is_err());
        assert!(TtpTemplate::new("</group>").is_err());
        assert!(TtpTemplate::new("{{ a | BOGUS }}").is_err());
        assert_eq!(
            TtpTemplate::new("\n\n").unwrap_err().message(),
            "Template has no pattern lines."
        );
    }

    #[test]
    fn test_engine_example_parses() {
        let engine = TtpEngine::new();
        let (source, template) = engine.example();
        let output = engine.process(&source, &template).unwrap();
        assert_eq!(output.record_count(), 3);
    }
}
