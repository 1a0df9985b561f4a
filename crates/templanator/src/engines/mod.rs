//! Built-in engine backends.

pub mod jinja;
pub mod textfsm;
pub mod ttp;

pub use jinja::Jinja2Engine;
pub use textfsm::{TextFsm, TextFsmEngine};
pub use ttp::{TtpEngine, TtpTemplate};
