//! Typed Query Generator CLI
//!
//! Loads a schema model, derives generation plans and writes either Rust
//! traits or the plans themselves.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use typed_query_gen::codegen::{self, rust, RustEmitter};
use typed_query_gen::config::{GeneratorConfig, OutputFormat};
use typed_query_gen::graph::{self, StrictnessConfig};

#[derive(Parser)]
#[command(name = "typed-query-gen")]
#[command(about = "Generate typed query abstractions from a schema model")]
struct Cli {
    /// Configuration file (added on top of the default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Schema document or directory of documents
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Treat duplicate definitions and unresolved interfaces as errors
    #[arg(long)]
    strict: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Rust trait declarations
    Rust,
    /// Generation plans as JSON
    Plan,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = GeneratorConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(schema) = cli.schema {
        config.input.schema = schema;
    }
    if let Some(output) = cli.output {
        config.output.dir = output;
    }
    if let Some(format) = cli.format {
        config.output.format = match format {
            Format::Rust => OutputFormat::Rust,
            Format::Plan => OutputFormat::Plan,
        };
    }
    if cli.strict {
        config.strictness = StrictnessConfig::strict();
    }

    let schema_path = config.schema_path();
    let output_dir = config.output_dir();

    let graph = graph::load_from_path(&schema_path, &config.load_config())
        .with_context(|| format!("failed to load schema from {}", schema_path.display()))?;

    for warning in graph.diagnostics().warnings() {
        println!("⚠️  {}", warning);
    }

    // Everything is rendered in memory before the first file is written
    let files = match config.output.format {
        OutputFormat::Rust => {
            codegen::build(&graph, &config.layout, RustEmitter::new(&config.layout))?
        }
        OutputFormat::Plan => {
            let plans = codegen::generate(&graph, &config.layout)?;
            vec![rust::GeneratedFile {
                path: PathBuf::from("plans.json"),
                contents: serde_json::to_string_pretty(&plans)?,
            }]
        }
    };

    rust::write_files(&output_dir, &files)
        .with_context(|| format!("failed to write output to {}", output_dir.display()))?;

    println!(
        "✅ {} types -> {} files in {}",
        graph.len(),
        files.len(),
        output_dir.display()
    );
    Ok(())
}
