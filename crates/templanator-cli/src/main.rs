//! Templanator CLI
//!
//! Try a template against source text with any registered engine mode.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use templanator::{ModeRegistry, render_output};
use tracing_subscriber::EnvFilter;

/// Output format for `render`
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Formatted for reading, using the mode's display variant
    Text,
    /// Engine output as JSON
    Json,
}

#[derive(Parser)]
#[command(name = "templanator")]
#[command(about = "Run TextFSM, TTP and Jinja2 templates against source text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available engine modes
    Modes,

    /// Print the built-in example source and template for a mode
    Example {
        /// Engine mode label (see `modes`)
        #[arg(short, long, default_value = "TextFSM_Table")]
        mode: String,

        /// Process the example and print the result as well
        #[arg(long)]
        run: bool,
    },

    /// Apply a template to source text
    Render {
        /// Engine mode label (see `modes`)
        #[arg(short, long, default_value = "TextFSM_Table")]
        mode: String,

        /// File holding the source text (device output, or YAML context for Jinja2)
        #[arg(short, long)]
        source: PathBuf,

        /// File holding the template
        #[arg(short, long)]
        template: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn read_text(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {} file '{}'", what, path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = ModeRegistry::new();

    match cli.command {
        Commands::Modes => {
            for (label, entry) in registry.iter() {
                let variant = entry.variant.map(|v| v.as_str()).unwrap_or("-");
                println!("{:<16} {:<8} {}", label, entry.engine.name(), variant);
            }
            Ok(())
        }

        Commands::Example { mode, run } => {
            let entry = registry.resolve(&mode)?;
            let (source, template) = registry.example_for(&mode)?;

            println!("# Source");
            println!("{}", source.trim_end());
            println!();
            println!("# Template");
            println!("{}", template.trim_end());

            if run {
                let output = entry
                    .engine
                    .process(&source, &template)
                    .with_context(|| format!("{} example failed", mode))?;
                println!();
                println!("# Result");
                println!("{}", render_output(&output, entry.variant).trim_end());
            }
            Ok(())
        }

        Commands::Render {
            mode,
            source,
            template,
            format,
        } => {
            let entry = registry.resolve(&mode)?;
            let source_text = read_text(&source, "source")?;
            let template_text = read_text(&template, "template")?;

            tracing::debug!(mode = %mode, engine = entry.engine.name(), "processing template");
            let output = entry
                .engine
                .process(&source_text, &template_text)
                .with_context(|| format!("{} error", entry.kind))?;

            match format {
                OutputFormat::Text => println!("{}", render_output(&output, entry.variant).trim_end()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
            }
            Ok(())
        }
    }
}
