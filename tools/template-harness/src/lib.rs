//! Batch verification of parsing templates against recorded device output
//!
//! Templates are discovered by name, paired with fixture files through a
//! tolerant lookup, processed by one templanator engine, and summarized as
//! pass/fail/skip counts with timing figures.

pub mod config;
pub mod discovery;
pub mod error;
pub mod fixture;
pub mod output;
pub mod report;
pub mod runner;
pub mod stats;

pub use config::{CONFIG_FILE_NAME, ExecutionMode, HarnessConfig};
pub use discovery::{TemplateDescriptor, command_name, discover_templates};
pub use error::{Error, Result, error_chain};
pub use fixture::{FixtureLocator, expected_record_count};
pub use output::write_json;
pub use report::{Banner, Summary, report};
pub use runner::{BatchRunner, Evaluation, NO_FIXTURE_REASON, ProgressSink};
pub use stats::{
    ErrorRecord, ExpectedMismatch, MismatchRecord, RunOutcome, RunStatistics, TemplateReport, TimingRecord,
};
