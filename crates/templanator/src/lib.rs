//! Templanator - interchangeable text-template engines behind one contract
//!
//! Parsing engines (TextFSM, TTP) turn device output into rows; the Jinja2
//! engine renders text from a YAML context. All of them implement
//! [`TemplateEngine`], report failures as [`EngineError`], and are selected at
//! runtime through the [`ModeRegistry`].
//!
//! # Quick Start
//!
//! ```rust
//! use templanator::{ModeRegistry, render_output};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ModeRegistry::new();
//! let entry = registry.resolve("TextFSM_Table")?;
//! let (source, template) = registry.example_for("TextFSM_Table")?;
//! let output = entry.engine.process(&source, &template)?;
//! println!("{}", render_output(&output, entry.variant));
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Engine contract** (`engine`): `TemplateEngine`, `RenderedOutput`, `ParsedTable`
//! - **Engines** (`engines`): TextFSM state machine, TTP token patterns, Jinja2 via minijinja
//! - **Display** (`display`): table/detail formatting of engine output
//! - **Registry** (`registry`): ordered mode labels and built-in examples

#![deny(unsafe_code)]

pub mod display;
pub mod engine;
pub mod engines;
pub mod error;
pub mod registry;
pub mod samples;

pub use display::{DisplayVariant, render_output};
pub use engine::{EngineKind, ParsedTable, RenderedOutput, TemplateEngine};
pub use engines::{Jinja2Engine, TextFsm, TextFsmEngine, TtpEngine, TtpTemplate};
pub use error::{EngineError, Result};
pub use registry::{ModeEntry, ModeRegistry, RegistryError};
