//! Harness configuration
//!
//! Loaded from `template-harness.toml` (discovered in the current directory or
//! any parent), then overridden by command-line flags.
//!
//! ```toml
//! template_dir = "templates"
//! fixture_dir = "tests"
//! vendor = "cisco_ios"
//! template_prefix = "cisco_ios"
//! mode = "TextFSM_Table"
//! execution = "pooled"
//! max_workers = 8
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name searched for by [`HarnessConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "template-harness.toml";

/// How templates are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One template at a time, results in input order
    #[default]
    Sequential,
    /// Bounded worker pool, results in completion order
    Pooled,
}

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory holding the templates
    pub template_dir: PathBuf,

    /// Root of the fixture tree (`{fixture_dir}/{vendor}/{command}/*.{fixture_extension}`)
    pub fixture_dir: PathBuf,

    /// Vendor subdirectory under `fixture_dir`
    pub vendor: String,

    /// Template file name prefix; `{prefix}_` is stripped to get the command name
    pub template_prefix: String,

    /// Template file extension, without the dot
    pub template_extension: String,

    /// Fixture file extension, without the dot
    pub fixture_extension: String,

    /// Engine mode label used to process every template
    pub mode: String,

    pub execution: ExecutionMode,

    /// Worker count for pooled execution
    pub max_workers: usize,

    /// Compare record counts against `<fixture>.yml` sidecars when present
    pub check_expected: bool,

    /// Optional JSON summary path
    pub output: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("templates"),
            fixture_dir: PathBuf::from("tests"),
            vendor: "cisco_ios".to_string(),
            template_prefix: "cisco_ios".to_string(),
            template_extension: "textfsm".to_string(),
            fixture_extension: "raw".to_string(),
            mode: templanator::registry::TEXTFSM_TABLE.to_string(),
            execution: ExecutionMode::Sequential,
            max_workers: num_cpus::get(),
            check_expected: false,
            output: None,
        }
    }
}

impl HarnessConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any configuration value is invalid
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("vendor", &self.vendor),
            ("template_prefix", &self.template_prefix),
            ("template_extension", &self.template_extension),
            ("fixture_extension", &self.fixture_extension),
            ("mode", &self.mode),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} cannot be empty", field)));
            }
        }

        for (field, value) in [
            ("template_extension", &self.template_extension),
            ("fixture_extension", &self.fixture_extension),
        ] {
            if value.starts_with('.') {
                return Err(Error::Config(format!(
                    "{} must not start with '.', got '{}'",
                    field, value
                )));
            }
        }

        if self.max_workers == 0 {
            return Err(Error::Config("max_workers must be > 0".to_string()));
        }

        Ok(())
    }

    /// Workers actually used: sequential execution always runs one.
    pub fn effective_workers(&self) -> usize {
        match self.execution {
            ExecutionMode::Sequential => 1,
            ExecutionMode::Pooled => self.max_workers,
        }
    }

    /// Directory holding this vendor's fixture subdirectories.
    pub fn vendor_dir(&self) -> PathBuf {
        self.fixture_dir.join(&self.vendor)
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
        Ok(toml::from_str(&content)?)
    }

    /// Discover `template-harness.toml` in the current directory or a parent.
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir()?;
        Self::discover_from(&current)
    }

    /// Like [`discover`](Self::discover), starting at `start`.
    ///
    /// Relative paths in a discovered file are resolved against the
    /// directory holding it.
    pub fn discover_from(start: &Path) -> Result<Option<Self>> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "using harness config");
                let mut config = Self::from_toml_file(&candidate)?;
                config.resolve_relative_to(dir);
                return Ok(Some(config));
            }
        }
        Ok(None)
    }

    /// Anchor relative directory and output paths at `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let anchor = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        anchor(&mut self.template_dir);
        anchor(&mut self.fixture_dir);
        if let Some(output) = self.output.as_mut() {
            anchor(output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.vendor, "cisco_ios");
        assert_eq!(config.template_extension, "textfsm");
        assert_eq!(config.fixture_extension, "raw");
        assert_eq!(config.mode, "TextFSM_Table");
        assert_eq!(config.execution, ExecutionMode::Sequential);
        assert_eq!(config.effective_workers(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = HarnessConfig {
            max_workers: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("max_workers"));

        let config = HarnessConfig {
            vendor: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("vendor"));

        let config = HarnessConfig {
            fixture_extension: ".raw".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pooled_uses_max_workers() {
        let config = HarnessConfig {
            execution: ExecutionMode::Pooled,
            max_workers: 3,
            ..Default::default()
        };
        assert_eq!(config.effective_workers(), 3);
    }

    #[test]
    fn test_from_toml_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "vendor = \"arista_eos\"\nexecution = \"pooled\"\nmax_workers = 2\n").unwrap();

        let config = HarnessConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.vendor, "arista_eos");
        assert_eq!(config.execution, ExecutionMode::Pooled);
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.template_prefix, "cisco_ios");
    }

    #[test]
    fn test_from_toml_file_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "execution = \"parallel\"\n").unwrap();
        assert!(matches!(HarnessConfig::from_toml_file(&path), Err(Error::Toml(_))));
    }

    #[test]
    fn test_discover_walks_parents() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "vendor = \"juniper_junos\"\n").unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let config = HarnessConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.vendor, "juniper_junos");
    }

    #[test]
    fn test_discovered_paths_resolve_against_config_dir() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "template_dir = \"templates\"\nfixture_dir = \"/srv/fixtures\"\noutput = \"out/summary.json\"\n",
        )
        .unwrap();
        let nested = dir.path().join("sub");
        fs::create_dir_all(&nested).unwrap();

        let config = HarnessConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.template_dir, dir.path().join("templates"));
        assert_eq!(config.fixture_dir, PathBuf::from("/srv/fixtures"));
        assert_eq!(config.output, Some(dir.path().join("out/summary.json")));
    }
}
