//! Template harness CLI

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use template_harness::{
    BatchRunner, Error, ExecutionMode, FixtureLocator, HarnessConfig, RunOutcome, TemplateDescriptor,
    discover_templates, report, write_json,
};
use templanator::ModeRegistry;
use tracing_subscriber::EnvFilter;

/// CLI enum for execution mode
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliExecution {
    /// One template at a time
    Sequential,
    /// Bounded worker pool
    Pooled,
}

impl From<CliExecution> for ExecutionMode {
    fn from(mode: CliExecution) -> Self {
        match mode {
            CliExecution::Sequential => ExecutionMode::Sequential,
            CliExecution::Pooled => ExecutionMode::Pooled,
        }
    }
}

#[derive(Parser)]
#[command(name = "template-harness")]
#[command(about = "Verify parsing templates against recorded device output", long_about = None)]
struct Cli {
    /// Configuration file (default: discover template-harness.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

/// Values that override the configuration file
#[derive(Args)]
struct Overrides {
    /// Directory holding the templates
    #[arg(long, global = true)]
    template_dir: Option<PathBuf>,

    /// Root of the fixture tree
    #[arg(long, global = true)]
    fixture_dir: Option<PathBuf>,

    /// Vendor subdirectory under the fixture root
    #[arg(long, global = true)]
    vendor: Option<String>,

    /// Template file name prefix
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Engine mode label (e.g. TextFSM_Table, TTP_Detail)
    #[arg(short, long, global = true)]
    mode: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every matching template against its fixture
    Run {
        /// Only run templates matching this name
        #[arg(short, long)]
        filter: Option<String>,

        /// Execution mode
        #[arg(short = 'x', long, value_enum)]
        execution: Option<CliExecution>,

        /// Worker count for pooled execution
        #[arg(short = 'j', long)]
        max_workers: Option<usize>,

        /// Compare record counts against expected-output sidecars
        #[arg(long)]
        check_expected: bool,

        /// Write the summary as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the templates a run would process
    ListTemplates {
        /// Only list templates matching this name
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show which fixture a command name resolves to
    Locate {
        /// Command name, e.g. show_ip_interface_brief
        command: String,
    },

    /// Run one template and show its output in detail
    Inspect {
        /// Template file name or command name
        template: String,
    },
}

fn load_config(path: Option<PathBuf>, overrides: Overrides) -> Result<HarnessConfig> {
    let mut config = match path {
        Some(path) => HarnessConfig::from_toml_file(&path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => HarnessConfig::discover()?.unwrap_or_default(),
    };

    if let Some(dir) = overrides.template_dir {
        config.template_dir = dir;
    }
    if let Some(dir) = overrides.fixture_dir {
        config.fixture_dir = dir;
    }
    if let Some(vendor) = overrides.vendor {
        config.vendor = vendor;
    }
    if let Some(prefix) = overrides.prefix {
        config.template_prefix = prefix;
    }
    if let Some(mode) = overrides.mode {
        config.mode = mode;
    }
    Ok(config)
}

fn discover(config: &HarnessConfig, filter: Option<&str>) -> template_harness::Result<Vec<TemplateDescriptor>> {
    discover_templates(
        &config.template_dir,
        &config.template_prefix,
        &config.template_extension,
        filter,
    )
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config, cli.overrides)?;
    let registry = ModeRegistry::new();

    match cli.command {
        Commands::Run {
            filter,
            execution,
            max_workers,
            check_expected,
            output,
        } => {
            if let Some(execution) = execution {
                config.execution = execution.into();
            }
            if let Some(workers) = max_workers {
                config.max_workers = workers;
            }
            config.check_expected |= check_expected;
            if output.is_some() {
                config.output = output;
            }
            config.validate()?;

            println!("=== {} Batch Testing ===", config.mode);
            let templates = discover(&config, filter.as_deref())?;
            println!("Found {} templates", templates.len());

            let runner = BatchRunner::from_registry(config.clone(), &registry)?
                .with_progress(|report| println!("{}", report.progress_line()));
            let stats = runner.run_all(&templates).await;

            let summary = report(&stats).with_mode(config.mode.clone());
            println!();
            print!("{}", summary.render_text());

            if let Some(path) = &config.output {
                write_json(&summary, path)
                    .with_context(|| format!("Failed to write summary to '{}'", path.display()))?;
                println!("\nSummary written to {}", path.display());
            }
            Ok(())
        }

        Commands::ListTemplates { filter } => {
            let templates = discover(&config, filter.as_deref())?;
            println!("Found {} templates in {}", templates.len(), config.template_dir.display());
            for template in &templates {
                println!("  {} ({})", template.file_name, template.command_name);
            }
            Ok(())
        }

        Commands::Locate { command } => {
            let locator = FixtureLocator::new(&config.fixture_dir, &config.fixture_extension);
            match locator.locate(&config.vendor, &command) {
                Some(fixture) => println!("{}", fixture.display()),
                None => println!("No fixture found for '{}' under {}", command, config.vendor_dir().display()),
            }
            Ok(())
        }

        Commands::Inspect { template } => {
            let templates = discover(&config, Some(&template))?;
            let runner = BatchRunner::from_registry(config.clone(), &registry)?;

            for descriptor in &templates {
                let evaluation = runner.evaluate(descriptor).await;
                let report = &evaluation.report;

                println!("Template: {}", descriptor.path.display());
                match &report.fixture {
                    Some(fixture) => println!("Fixture:  {}", fixture.display()),
                    None => println!("Fixture:  none"),
                }

                match &report.outcome {
                    RunOutcome::Success {
                        record_count,
                        elapsed_ms,
                    } => {
                        println!("Records:  {}", record_count);
                        println!("Elapsed:  {:.2}ms", elapsed_ms);
                        if let Some(table) = evaluation.output.as_ref().and_then(|o| o.as_table()) {
                            println!("Fields:   {}", table.header.join(", "));
                        }
                        if let Some(first) = evaluation.output.as_ref().and_then(|o| o.to_records().into_iter().next()) {
                            println!("First record:");
                            println!("{}", serde_json::to_string_pretty(&first)?);
                        }
                    }
                    RunOutcome::Failure { error_message, trace } => {
                        println!("Error:    {}", error_message);
                        if let Some(trace) = trace {
                            println!("Trace:\n{}", trace);
                        }
                    }
                    RunOutcome::Skipped { reason } => println!("Skipped:  {}", reason),
                }
                if let Some(mismatch) = &report.mismatch {
                    println!("Expected {} records, got {}", mismatch.expected, mismatch.actual);
                }
                println!();
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(Error::DiscoveryEmpty { .. }) = err.downcast_ref::<Error>() {
                eprintln!("{}. Exiting.", err);
            } else {
                eprintln!("Error: {:#}", err);
            }
            ExitCode::FAILURE
        }
    }
}
