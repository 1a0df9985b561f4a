//! Jinja2 text substitution through `minijinja`.
//!
//! The source text is the render context: a YAML mapping (JSON is accepted
//! since it is valid YAML). An empty source renders with an empty context.

use crate::engine::{EngineKind, RenderedOutput, TemplateEngine};
use crate::samples;
use crate::{EngineError, Result};
use minijinja::Environment;
use serde_json::{Map, Value};

/// Decode `source` into a render context.
pub fn parse_context(source: &str) -> Result<Map<String, Value>> {
    if source.trim().is_empty() {
        return Ok(Map::new());
    }

    let value: Value = serde_yaml_ng::from_str(source)
        .map_err(|e| EngineError::context(format!("Invalid YAML/JSON context: {}", e)))?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(EngineError::context(format!(
            "Render context must be a mapping, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Jinja2Engine;

impl Jinja2Engine {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for Jinja2Engine {
    fn name(&self) -> &str {
        "jinja2"
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Jinja2
    }

    fn process(&self, source: &str, template: &str) -> Result<RenderedOutput> {
        let context = parse_context(source)?;

        let env = Environment::new();
        let compiled = env
            .template_from_str(template)
            .map_err(|e| EngineError::template(e.to_string()))?;
        let rendered = compiled
            .render(minijinja::Value::from_serialize(&context))
            .map_err(|e| EngineError::render(e.to_string()))?;

        Ok(RenderedOutput::Text(rendered))
    }

    fn example(&self) -> (String, String) {
        (
            samples::JINJA_INTERFACES_CONTEXT.to_string(),
            samples::JINJA_INTERFACES_TEMPLATE.to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_yaml_context() {
        let output = Jinja2Engine::new()
            .process("name: Gi0/1\nvlans: [10, 20]\n", "interface {{ name }}\n{% for v in vlans %}vlan {{ v }}\n{% endfor %}")
            .unwrap();
        assert_eq!(output, RenderedOutput::Text("interface Gi0/1\nvlan 10\nvlan 20\n".to_string()));
    }

    #[test]
    fn test_json_context_and_empty_source() {
        let engine = Jinja2Engine::new();
        let output = engine.process(r#"{"host": "r1"}"#, "hostname {{ host }}").unwrap();
        assert_eq!(output, RenderedOutput::Text("hostname r1".to_string()));

        let output = engine.process("", "static").unwrap();
        assert_eq!(output, RenderedOutput::Text("static".to_string()));
    }

    #[test]
    fn test_non_mapping_context_rejected() {
        let err = Jinja2Engine::new().process("- a\n- b\n", "x").unwrap_err();
        assert!(matches!(err, EngineError::Context { .. }));
        assert!(err.message().contains("a list"));
    }

    #[test]
    fn test_syntax_error_is_template_error() {
        let err = Jinja2Engine::new().process("a: 1", "{% for x in %}").unwrap_err();
        assert!(matches!(err, EngineError::Template { .. }));
    }

    #[test]
    fn test_example_renders() {
        let engine = Jinja2Engine::new();
        let (source, template) = engine.example();
        let output = engine.process(&source, &template).unwrap();
        assert!(output.record_count() > 0);
    }
}
