use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use platefile::config::{
    RunConfig, DEFAULT_CONCURRENCY, DEFAULT_GROUP_THRESHOLD_SECS, DEFAULT_INITIAL_DELAY_MS,
    DEFAULT_MAX_RETRIES, DEFAULT_TEXT_MODEL, DEFAULT_VISION_MODEL,
};
use platefile::export::{csv, text, ExportError};
use platefile::intake::IntakeError;
use platefile::report::ConsoleReporter;
use platefile::service::gemini::GeminiClient;

/// Turn a folder of photographed recipe cards into an importable CSV.
#[derive(Parser, Debug)]
#[command(name = "platefile", version, about)]
struct Cli {
    /// Folder containing the recipe photos.
    input_dir: PathBuf,

    /// Path of the CSV to write.
    #[arg(short, long, default_value = "recipes.csv")]
    output: PathBuf,

    /// Gemini API key; falls back to the environment.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// How many groups to process in parallel.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Attempts per service call, including the first.
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Backoff before the first retry, in milliseconds (doubles per retry).
    #[arg(long, default_value_t = DEFAULT_INITIAL_DELAY_MS)]
    initial_delay_ms: u64,

    /// Shots within this many seconds of each other form one group.
    #[arg(long, default_value_t = DEFAULT_GROUP_THRESHOLD_SECS)]
    group_threshold: i64,

    /// Tags appended to every extracted recipe (repeatable).
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Also write one plain-text file per recipe into this folder.
    #[arg(long)]
    text_export: Option<PathBuf>,

    /// Model used for photo-to-text extraction.
    #[arg(long, default_value = DEFAULT_VISION_MODEL)]
    vision_model: String,

    /// Model used for classification, structuring and enrichment.
    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    text_model: String,
}

#[derive(Error, Debug)]
enum AppError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(platefile::config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = RunConfig::new(cli.api_key, cli.input_dir, cli.output);
    config.concurrency = cli.concurrency.max(1);
    config.max_retries = cli.max_retries.max(1);
    config.initial_delay = Duration::from_millis(cli.initial_delay_ms);
    config.group_threshold_secs = cli.group_threshold;
    config.batch_tags = cli.tags;
    config.text_export_dir = cli.text_export;
    config.vision_model = cli.vision_model;
    config.text_model = cli.text_model;

    let transport = Arc::new(GeminiClient::new(&config.api_key));
    let reporter = ConsoleReporter::new();

    let summary = platefile::run_batch(&config, transport, &reporter).await?;

    csv::write_csv(&config.output_csv, &summary.records)?;
    if let Some(dir) = &config.text_export_dir {
        text::write_text_files(dir, &summary.records)?;
    }

    Ok(())
}
