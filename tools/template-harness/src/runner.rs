//! Batch runner for verifying templates against fixtures
//!
//! Each template is located, read and processed on tokio's blocking pool, so
//! a panicking engine is caught at the template boundary like any other
//! failure. Only the engine call is timed.
//!
//! Two schedules share one contract:
//!
//! - sequential: one template at a time, statistics in input order
//! - pooled: at most `workers` templates in flight; finished reports flow
//!   through a channel into a single aggregating task, so statistics are in
//!   completion order and have exactly one writer

use crate::config::{ExecutionMode, HarnessConfig};
use crate::discovery::TemplateDescriptor;
use crate::fixture::{FixtureLocator, expected_record_count};
use crate::stats::{ExpectedMismatch, RunOutcome, RunStatistics, TemplateReport};
use crate::{Result, error_chain};
use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use templanator::{ModeRegistry, RenderedOutput, TemplateEngine};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinError;

/// Skip reason for templates without a fixture.
pub const NO_FIXTURE_REASON: &str = "No matching fixture file found";

/// Called once per finished template, in the order results are recorded.
pub type ProgressSink = Arc<dyn Fn(&TemplateReport) + Send + Sync>;

/// A finished template together with the engine output it produced.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub report: TemplateReport,
    pub output: Option<RenderedOutput>,
}

struct RunContext {
    engine: Arc<dyn TemplateEngine>,
    locator: FixtureLocator,
    vendor: String,
    check_expected: bool,
}

fn read_failure(path: &Path, err: &std::io::Error) -> RunOutcome {
    RunOutcome::Failure {
        error_message: format!("Failed to read {}: {}", path.display(), err),
        trace: Some(error_chain(err)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn join_failure(err: JoinError) -> RunOutcome {
    if err.is_panic() {
        let message = panic_message(err.into_panic().as_ref());
        RunOutcome::Failure {
            error_message: format!("Engine panicked: {}", message),
            trace: Some(message),
        }
    } else {
        RunOutcome::Failure {
            error_message: "Template task was cancelled".to_string(),
            trace: None,
        }
    }
}

fn expected_mismatch(fixture: &Path, actual: usize) -> Option<ExpectedMismatch> {
    let sidecar = FixtureLocator::locate_expected(fixture)?;
    match expected_record_count(&sidecar) {
        Ok(Some(expected)) if expected != actual => Some(ExpectedMismatch { expected, actual }),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!(path = %sidecar.display(), error = %err, "ignoring unreadable expected output");
            None
        }
    }
}

/// Locate, read and process one template. Runs on the blocking pool.
fn evaluate_blocking(ctx: &RunContext, template: &TemplateDescriptor) -> Evaluation {
    let finish = |fixture: Option<PathBuf>,
                  outcome: RunOutcome,
                  mismatch: Option<ExpectedMismatch>,
                  output: Option<RenderedOutput>| Evaluation {
        report: TemplateReport {
            template: template.clone(),
            fixture,
            outcome,
            mismatch,
        },
        output,
    };

    let Some(fixture) = ctx.locator.locate(&ctx.vendor, &template.command_name) else {
        let skipped = RunOutcome::Skipped {
            reason: NO_FIXTURE_REASON.to_string(),
        };
        return finish(None, skipped, None, None);
    };

    let template_text = match fs::read_to_string(&template.path) {
        Ok(text) => text,
        Err(err) => return finish(Some(fixture), read_failure(&template.path, &err), None, None),
    };
    let source_text = match fs::read_to_string(&fixture) {
        Ok(text) => text,
        Err(err) => {
            let outcome = read_failure(&fixture, &err);
            return finish(Some(fixture), outcome, None, None);
        }
    };

    let start = Instant::now();
    let result = ctx.engine.process(&source_text, &template_text);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(output) => {
            let record_count = output.record_count();
            let mismatch = if ctx.check_expected {
                expected_mismatch(&fixture, record_count)
            } else {
                None
            };
            let outcome = RunOutcome::Success {
                record_count,
                elapsed_ms,
            };
            finish(Some(fixture), outcome, mismatch, Some(output))
        }
        Err(err) => {
            let outcome = RunOutcome::Failure {
                error_message: err.message().to_string(),
                trace: Some(format!("{} error: {}", err.category(), err.message())),
            };
            finish(Some(fixture), outcome, None, None)
        }
    }
}

async fn evaluate(ctx: Arc<RunContext>, template: TemplateDescriptor) -> Evaluation {
    let task_template = template.clone();
    match tokio::task::spawn_blocking(move || evaluate_blocking(&ctx, &task_template)).await {
        Ok(evaluation) => evaluation,
        Err(err) => {
            tracing::error!(template = %template.file_name, "template task failed: {}", err);
            Evaluation {
                report: TemplateReport {
                    template,
                    fixture: None,
                    outcome: join_failure(err),
                    mismatch: None,
                },
                output: None,
            }
        }
    }
}

/// Runs templates through one engine and aggregates the outcomes
pub struct BatchRunner {
    config: HarnessConfig,
    context: Arc<RunContext>,
    progress: Option<ProgressSink>,
}

impl BatchRunner {
    /// Create a runner that processes every template with `engine`
    pub fn new(config: HarnessConfig, engine: Arc<dyn TemplateEngine>) -> Self {
        let context = RunContext {
            engine,
            locator: FixtureLocator::new(&config.fixture_dir, &config.fixture_extension),
            vendor: config.vendor.clone(),
            check_expected: config.check_expected,
        };
        Self {
            config,
            context: Arc::new(context),
            progress: None,
        }
    }

    /// Create a runner using the engine registered under `config.mode`
    pub fn from_registry(config: HarnessConfig, registry: &ModeRegistry) -> Result<Self> {
        let engine = Arc::clone(&registry.resolve(&config.mode)?.engine);
        Ok(Self::new(config, engine))
    }

    /// Report each template as it finishes
    pub fn with_progress(mut self, sink: impl Fn(&TemplateReport) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn locator(&self) -> &FixtureLocator {
        &self.context.locator
    }

    /// Evaluate a single template, keeping the engine output.
    pub async fn evaluate(&self, template: &TemplateDescriptor) -> Evaluation {
        evaluate(Arc::clone(&self.context), template.clone()).await
    }

    /// Run every template. Per-template problems never abort the batch.
    pub async fn run_all(&self, templates: &[TemplateDescriptor]) -> RunStatistics {
        let workers = self.config.effective_workers();
        tracing::info!(
            templates = templates.len(),
            mode = %self.config.mode,
            workers,
            "starting batch"
        );

        let stats = match self.config.execution {
            ExecutionMode::Sequential => self.run_sequential(templates).await,
            ExecutionMode::Pooled => self.run_pooled(templates, workers).await,
        };

        tracing::info!(
            total = stats.total,
            success = stats.success,
            failed = stats.failed,
            skipped = stats.skipped,
            "batch finished"
        );
        stats
    }

    async fn run_sequential(&self, templates: &[TemplateDescriptor]) -> RunStatistics {
        let mut stats = RunStatistics::new();
        for template in templates {
            let evaluation = evaluate(Arc::clone(&self.context), template.clone()).await;
            if let Some(sink) = &self.progress {
                sink(&evaluation.report);
            }
            stats.record(&evaluation.report);
        }
        stats
    }

    async fn run_pooled(&self, templates: &[TemplateDescriptor], workers: usize) -> RunStatistics {
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let (tx, mut rx) = mpsc::channel::<TemplateReport>(workers.max(1) * 2);

        let progress = self.progress.clone();
        let aggregator = tokio::spawn(async move {
            let mut stats = RunStatistics::new();
            while let Some(report) = rx.recv().await {
                if let Some(sink) = &progress {
                    sink(&report);
                }
                stats.record(&report);
            }
            stats
        });

        for template in templates {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    tracing::error!("worker pool closed: {}", err);
                    break;
                }
            };
            let context = Arc::clone(&self.context);
            let template = template.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let evaluation = evaluate(context, template).await;
                drop(permit);
                if tx.send(evaluation.report).await.is_err() {
                    tracing::error!("statistics aggregator stopped early");
                }
            });
        }
        drop(tx);

        match aggregator.await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::error!("statistics aggregator failed: {}", err);
                RunStatistics::new()
            }
        }
    }
}
