//! Mode registry: user-facing labels mapped to engines and display variants.
//!
//! Labels keep insertion order so listings match the order modes were
//! registered. Several labels may share one engine instance.

use crate::display::DisplayVariant;
use crate::engine::{EngineKind, TemplateEngine};
use crate::engines::{Jinja2Engine, TextFsmEngine, TtpEngine};
use crate::samples;
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

pub const TEXTFSM_TABLE: &str = "TextFSM_Table";
pub const TEXTFSM_DETAIL: &str = "TextFSM_Detail";
pub const TTP_TABLE: &str = "TTP_Table";
pub const TTP_DETAIL: &str = "TTP_Detail";
pub const JINJA2: &str = "Jinja2";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Mode label '{0}' must be non-empty and contain no whitespace")]
    InvalidLabel(String),

    #[error("Unknown mode '{label}'. Available modes: {available}")]
    UnknownMode { label: String, available: String },
}

/// One registered mode.
#[derive(Clone)]
pub struct ModeEntry {
    pub kind: EngineKind,
    pub engine: Arc<dyn TemplateEngine>,
    pub variant: Option<DisplayVariant>,
}

impl ModeEntry {
    pub fn new(engine: Arc<dyn TemplateEngine>, variant: Option<DisplayVariant>) -> Self {
        Self {
            kind: engine.kind(),
            engine,
            variant,
        }
    }
}

impl std::fmt::Debug for ModeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeEntry")
            .field("kind", &self.kind)
            .field("engine", &self.engine.name())
            .field("variant", &self.variant)
            .finish()
    }
}

fn validate_label(label: &str) -> Result<(), RegistryError> {
    if label.is_empty() || label.contains(char::is_whitespace) {
        return Err(RegistryError::InvalidLabel(label.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ModeRegistry {
    modes: IndexMap<String, ModeEntry>,
}

impl ModeRegistry {
    /// Registry with the five built-in modes.
    pub fn new() -> Self {
        let textfsm: Arc<dyn TemplateEngine> = Arc::new(TextFsmEngine::new());
        let ttp: Arc<dyn TemplateEngine> = Arc::new(TtpEngine::new());
        let jinja: Arc<dyn TemplateEngine> = Arc::new(Jinja2Engine::new());

        let mut modes = IndexMap::new();
        modes.insert(
            TEXTFSM_TABLE.to_string(),
            ModeEntry::new(Arc::clone(&textfsm), Some(DisplayVariant::Table)),
        );
        modes.insert(
            TEXTFSM_DETAIL.to_string(),
            ModeEntry::new(textfsm, Some(DisplayVariant::Detail)),
        );
        modes.insert(TTP_TABLE.to_string(), ModeEntry::new(Arc::clone(&ttp), Some(DisplayVariant::Table)));
        modes.insert(TTP_DETAIL.to_string(), ModeEntry::new(ttp, Some(DisplayVariant::Detail)));
        modes.insert(JINJA2.to_string(), ModeEntry::new(jinja, None));

        Self { modes }
    }

    /// Registry without any modes.
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Register or replace a mode.
    pub fn register(
        &mut self,
        label: &str,
        engine: Arc<dyn TemplateEngine>,
        variant: Option<DisplayVariant>,
    ) -> Result<(), RegistryError> {
        validate_label(label)?;
        tracing::debug!(label, engine = engine.name(), "registering mode");
        self.modes.insert(label.to_string(), ModeEntry::new(engine, variant));
        Ok(())
    }

    pub fn get(&self, label: &str) -> Option<&ModeEntry> {
        self.modes.get(label)
    }

    /// Like [`get`](Self::get) but reports the available labels on a miss.
    pub fn resolve(&self, label: &str) -> Result<&ModeEntry, RegistryError> {
        self.modes.get(label).ok_or_else(|| RegistryError::UnknownMode {
            label: label.to_string(),
            available: self.labels().join(", "),
        })
    }

    pub fn labels(&self) -> Vec<&str> {
        self.modes.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModeEntry)> {
        self.modes.iter().map(|(label, entry)| (label.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Example `(source, template)` for a mode.
    ///
    /// Parsing engines with a display variant get the CDP neighbor example for
    /// that variant; everything else falls back to the engine's own example.
    pub fn example_for(&self, label: &str) -> Result<(String, String), RegistryError> {
        let entry = self.resolve(label)?;
        let cdp = entry.variant.and_then(|variant| samples::cdp_example(entry.kind, variant));
        Ok(match cdp {
            Some((source, template)) => (source.to_string(), template.to_string()),
            None => entry.engine.example(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::render_output;

    #[test]
    fn test_default_labels_in_order() {
        let registry = ModeRegistry::new();
        assert_eq!(
            registry.labels(),
            vec!["TextFSM_Table", "TextFSM_Detail", "TTP_Table", "TTP_Detail", "Jinja2"]
        );
    }

    #[test]
    fn test_table_and_detail_share_engine() {
        let registry = ModeRegistry::new();
        let table = registry.get(TEXTFSM_TABLE).unwrap();
        let detail = registry.get(TEXTFSM_DETAIL).unwrap();
        assert!(Arc::ptr_eq(&table.engine, &detail.engine));
        assert_eq!(detail.variant, Some(DisplayVariant::Detail));
        assert_eq!(registry.get(JINJA2).unwrap().variant, None);
    }

    #[test]
    fn test_every_example_processes() {
        let registry = ModeRegistry::new();
        for (label, entry) in registry.iter() {
            let (source, template) = registry.example_for(label).unwrap();
            let output = entry.engine.process(&source, &template).unwrap();
            assert!(output.record_count() > 0, "{label} example produced nothing");
            assert!(!render_output(&output, entry.variant).is_empty());
        }
    }

    #[test]
    fn test_unknown_mode_lists_available() {
        let err = ModeRegistry::new().resolve("Mako").unwrap_err();
        assert!(err.to_string().contains("TextFSM_Table"));
    }

    #[test]
    fn test_register_validates_label() {
        let mut registry = ModeRegistry::new_empty();
        let engine: Arc<dyn TemplateEngine> = Arc::new(TtpEngine::new());
        assert!(registry.register("bad label", Arc::clone(&engine), None).is_err());
        registry.register("TTP_Raw", engine, None).unwrap();
        assert_eq!(registry.len(), 1);
    }
}
