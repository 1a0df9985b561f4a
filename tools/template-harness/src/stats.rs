//! Per-template outcomes and the batch statistics they accumulate into

use crate::discovery::TemplateDescriptor;
use serde::Serialize;
use std::path::PathBuf;

/// Classification of one template run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    Success {
        record_count: usize,
        /// Wall-clock time of the engine call only
        elapsed_ms: f64,
    },
    Failure {
        error_message: String,
        /// Cause chain or panic payload, when there is more than the message
        trace: Option<String>,
    },
    Skipped {
        reason: String,
    },
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Success { .. } => "PASS",
            RunOutcome::Failure { .. } => "FAIL",
            RunOutcome::Skipped { .. } => "SKIP",
        }
    }
}

/// Record count differs from the expected-output sidecar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectedMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// Everything known about one finished template
#[derive(Debug, Clone, Serialize)]
pub struct TemplateReport {
    pub template: TemplateDescriptor,
    pub fixture: Option<PathBuf>,
    pub outcome: RunOutcome,
    pub mismatch: Option<ExpectedMismatch>,
}

impl TemplateReport {
    /// One progress line, e.g. `[PASS] show_version: Parsed 3 records in 0.42ms`
    pub fn progress_line(&self) -> String {
        let command = &self.template.command_name;
        let line = match &self.outcome {
            RunOutcome::Success {
                record_count,
                elapsed_ms,
            } => format!("[PASS] {}: Parsed {} records in {:.2}ms", command, record_count, elapsed_ms),
            RunOutcome::Failure { error_message, .. } => format!("[FAIL] {}: {}", command, error_message),
            RunOutcome::Skipped { reason } => format!("[SKIP] {}: {}", command, reason),
        };
        match &self.mismatch {
            Some(m) => format!("{} (expected {} records)", line, m.expected),
            None => line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingRecord {
    pub template: String,
    pub command: String,
    pub elapsed_ms: f64,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub template: String,
    pub command: String,
    pub error_message: String,
    pub trace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MismatchRecord {
    pub template: String,
    pub command: String,
    pub expected: usize,
    pub actual: usize,
}

/// Aggregate of a batch; `total == success + failed + skipped` always holds.
///
/// `timings` and `errors` are in recording order: input order for sequential
/// runs, completion order for pooled runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatistics {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub timings: Vec<TimingRecord>,
    pub errors: Vec<ErrorRecord>,
    pub mismatches: Vec<MismatchRecord>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: &TemplateReport) {
        let template = report.template.file_name.clone();
        let command = report.template.command_name.clone();
        self.total += 1;

        match &report.outcome {
            RunOutcome::Success {
                record_count,
                elapsed_ms,
            } => {
                self.success += 1;
                if let Some(mismatch) = &report.mismatch {
                    self.mismatches.push(MismatchRecord {
                        template: template.clone(),
                        command: command.clone(),
                        expected: mismatch.expected,
                        actual: mismatch.actual,
                    });
                }
                self.timings.push(TimingRecord {
                    template,
                    command,
                    elapsed_ms: *elapsed_ms,
                    record_count: *record_count,
                });
            }
            RunOutcome::Failure { error_message, trace } => {
                self.failed += 1;
                self.errors.push(ErrorRecord {
                    template,
                    command,
                    error_message: error_message.clone(),
                    trace: trace.clone(),
                });
            }
            RunOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(command: &str, outcome: RunOutcome) -> TemplateReport {
        TemplateReport {
            template: TemplateDescriptor {
                file_name: format!("cisco_ios_{}.textfsm", command),
                command_name: command.to_string(),
                path: PathBuf::from(format!("templates/cisco_ios_{}.textfsm", command)),
            },
            fixture: None,
            outcome,
            mismatch: None,
        }
    }

    #[test]
    fn test_record_keeps_counts_consistent() {
        let mut stats = RunStatistics::new();
        stats.record(&report(
            "a",
            RunOutcome::Success {
                record_count: 2,
                elapsed_ms: 1.5,
            },
        ));
        stats.record(&report(
            "b",
            RunOutcome::Failure {
                error_message: "boom".to_string(),
                trace: None,
            },
        ));
        stats.record(&report(
            "c",
            RunOutcome::Skipped {
                reason: "No matching fixture file found".to_string(),
            },
        ));

        assert_eq!(stats.total, 3);
        assert_eq!(stats.total, stats.success + stats.failed + stats.skipped);
        assert_eq!(stats.timings.len(), 1);
        assert_eq!(stats.errors[0].error_message, "boom");
    }

    #[test]
    fn test_progress_lines() {
        let pass = report(
            "show_clock",
            RunOutcome::Success {
                record_count: 1,
                elapsed_ms: 0.123,
            },
        );
        assert_eq!(pass.progress_line(), "[PASS] show_clock: Parsed 1 records in 0.12ms");

        let mut partial = pass.clone();
        partial.mismatch = Some(ExpectedMismatch { expected: 2, actual: 1 });
        assert_eq!(
            partial.progress_line(),
            "[PASS] show_clock: Parsed 1 records in 0.12ms (expected 2 records)"
        );

        let skip = report(
            "show_clock",
            RunOutcome::Skipped {
                reason: "No matching fixture file found".to_string(),
            },
        );
        assert_eq!(skip.progress_line(), "[SKIP] show_clock: No matching fixture file found");
    }

    #[test]
    fn test_mismatch_counts_as_success() {
        let mut stats = RunStatistics::new();
        let mut r = report(
            "a",
            RunOutcome::Success {
                record_count: 1,
                elapsed_ms: 1.0,
            },
        );
        r.mismatch = Some(ExpectedMismatch { expected: 3, actual: 1 });
        stats.record(&r);
        assert_eq!(stats.success, 1);
        assert_eq!(stats.mismatches.len(), 1);
        assert_eq!(stats.mismatches[0].expected, 3);
    }
}
