//! CCStokener CLI - token-based semantic clone detection.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use ccstokener_rs::core::config::{DetectionConfig, RunContext};
use ccstokener_rs::core::pipeline::DetectionPipeline;

/// Detect near-duplicate code blocks across a pre-tokenized corpus.
#[derive(Parser, Debug)]
#[command(name = "ccstokener", version, about)]
struct Cli {
    /// Directory of token-record files produced by the tokenizer
    #[arg(long, default_value = "tokens")]
    tokens_dir: PathBuf,

    /// Root directory for run outputs
    #[arg(long, default_value = "report")]
    output_root: PathBuf,

    /// Run identifier; defaults to a timestamp
    #[arg(long)]
    run_id: Option<String>,

    /// Optional YAML configuration file with detection thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => DetectionConfig::from_yaml_file(path)?,
        None => DetectionConfig::default(),
    };

    let run_id = cli
        .run_id
        .unwrap_or_else(|| chrono::Utc::now().format("%Y%m%d-%H%M%S").to_string());
    let run = RunContext::new(cli.output_root, run_id);

    let pipeline = DetectionPipeline::new(config, run);
    let outcome = pipeline.run(&cli.tokens_dir)?;

    info!(
        blocks = outcome.blocks_loaded,
        pairs = outcome.clone_pairs,
        result = %outcome.result_path.display(),
        "detection complete"
    );
    println!(
        "{} clone pairs across {} blocks -> {}",
        outcome.clone_pairs,
        outcome.blocks_loaded,
        outcome.result_path.display()
    );

    Ok(())
}
