//! Batch summary
//!
//! [`report`] turns [`RunStatistics`] into a [`Summary`]: rates, timing
//! figures, the fastest and slowest templates, every failure, and a one-line
//! verdict. The summary serializes to JSON and renders as plain text.

use crate::stats::{ErrorRecord, MismatchRecord, RunStatistics, TimingRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Templates listed in the fastest and slowest sections.
pub const RANKED_COUNT: usize = 5;

const RULE_WIDTH: usize = 50;

/// Overall verdict, chosen from the success rate alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Banner {
    AllPassed,
    MostlyWorking,
    MajorityWorking,
    NeedsAttention,
}

impl Banner {
    /// 100 → all passed, [90, 100) → mostly, [75, 90) → majority, below → attention.
    pub fn from_success_rate(rate: f64) -> Self {
        if rate >= 100.0 {
            Banner::AllPassed
        } else if rate >= 90.0 {
            Banner::MostlyWorking
        } else if rate >= 75.0 {
            Banner::MajorityWorking
        } else {
            Banner::NeedsAttention
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Banner::AllPassed => "All templates passed!",
            Banner::MostlyWorking => "Most templates are working correctly.",
            Banner::MajorityWorking => "The majority of templates are working, but some need attention.",
            Banner::NeedsAttention => "Several templates need attention.",
        }
    }
}

/// Final report of a batch
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub generated_at: DateTime<Utc>,
    /// Engine mode label the batch ran with
    pub mode: Option<String>,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub skip_rate: f64,
    pub total_parse_ms: f64,
    pub average_parse_ms: f64,
    pub median_parse_ms: f64,
    pub p95_parse_ms: f64,
    pub fastest: Vec<TimingRecord>,
    /// Slowest first
    pub slowest: Vec<TimingRecord>,
    pub failures: Vec<ErrorRecord>,
    pub mismatches: Vec<MismatchRecord>,
    pub banner: Banner,
}

impl Summary {
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Plain-text report, as printed at the end of a run.
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Value at `percentile` (0.0..=1.0) of `values`, nearest rank rounding down.
fn percentile(mut values: Vec<f64>, percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(f64::total_cmp);
    let index = ((values.len() as f64 - 1.0) * percentile).max(0.0) as usize;
    values[index]
}

/// Summarize a finished batch.
pub fn report(stats: &RunStatistics) -> Summary {
    let success_rate = rate(stats.success, stats.total);

    let elapsed: Vec<f64> = stats.timings.iter().map(|t| t.elapsed_ms).collect();
    let total_parse_ms: f64 = elapsed.iter().sum();
    let average_parse_ms = if elapsed.is_empty() {
        0.0
    } else {
        total_parse_ms / elapsed.len() as f64
    };

    // Stable: equal times keep recording order.
    let mut ranked = stats.timings.clone();
    ranked.sort_by(|a, b| a.elapsed_ms.total_cmp(&b.elapsed_ms));
    let fastest = ranked.iter().take(RANKED_COUNT).cloned().collect();
    let slowest = ranked.iter().rev().take(RANKED_COUNT).cloned().collect();

    Summary {
        generated_at: Utc::now(),
        mode: None,
        total: stats.total,
        success: stats.success,
        failed: stats.failed,
        skipped: stats.skipped,
        success_rate,
        failure_rate: rate(stats.failed, stats.total),
        skip_rate: rate(stats.skipped, stats.total),
        total_parse_ms,
        average_parse_ms,
        median_parse_ms: percentile(elapsed.clone(), 0.50),
        p95_parse_ms: percentile(elapsed, 0.95),
        fastest,
        slowest,
        failures: stats.errors.clone(),
        mismatches: stats.mismatches.clone(),
        banner: Banner::from_success_rate(success_rate),
    }
}

fn write_ranked(f: &mut fmt::Formatter<'_>, title: &str, records: &[TimingRecord]) -> fmt::Result {
    writeln!(f, "\n{}", title)?;
    for record in records {
        writeln!(
            f,
            "  {}: {:.2}ms ({} records)",
            record.command, record.elapsed_ms, record.record_count
        )?;
    }
    Ok(())
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f, "{}", rule)?;
        match &self.mode {
            Some(mode) => writeln!(f, "Template Testing Summary ({})", mode)?,
            None => writeln!(f, "Template Testing Summary")?,
        }
        writeln!(f, "{}", rule)?;

        writeln!(f, "\nTotal templates tested: {}", self.total)?;
        writeln!(f, "Successful: {} ({:.1}%)", self.success, self.success_rate)?;
        writeln!(f, "Failed: {} ({:.1}%)", self.failed, self.failure_rate)?;
        writeln!(f, "Skipped: {} ({:.1}%)", self.skipped, self.skip_rate)?;

        if !self.fastest.is_empty() {
            writeln!(f, "\nAverage parse time: {:.2}ms", self.average_parse_ms)?;
            writeln!(
                f,
                "Median: {:.2}ms, p95: {:.2}ms, total: {:.2}ms",
                self.median_parse_ms, self.p95_parse_ms, self.total_parse_ms
            )?;
            write_ranked(f, "Fastest templates:", &self.fastest)?;
            write_ranked(f, "Slowest templates:", &self.slowest)?;
        }

        if !self.failures.is_empty() {
            writeln!(f, "\nFailed templates:")?;
            for failure in &self.failures {
                writeln!(f, "  {}: {}", failure.command, failure.error_message)?;
            }
        }

        if !self.mismatches.is_empty() {
            writeln!(f, "\nRecord count mismatches:")?;
            for mismatch in &self.mismatches {
                writeln!(
                    f,
                    "  {}: expected {}, got {}",
                    mismatch.command, mismatch.expected, mismatch.actual
                )?;
            }
        }

        writeln!(f, "\n{}", rule)?;
        writeln!(f, "{}", self.banner.message())?;
        writeln!(f, "{}", rule)
    }
}
