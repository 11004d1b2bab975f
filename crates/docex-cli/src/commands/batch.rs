//! Batch command - run the pipeline over many files.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use docex_core::ingest::is_supported;
use docex_core::{DocType, Pipeline};

use super::run::save_json;
use super::{load_config, parse_expected};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern
    #[arg(required = true)]
    input: String,

    /// Comma-separated list of field names to extract
    #[arg(short, long)]
    expect: Option<String>,

    /// Skip routing and use this document type for every file
    #[arg(long, value_parser = DocType::from_str)]
    doc_type: Option<DocType>,

    /// Output directory
    #[arg(long, default_value = "outputs")]
    out_dir: PathBuf,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Result of processing a single file.
struct FileOutcome {
    path: PathBuf,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(model_dir) = &args.model_dir {
        config.ocr.model_dir = Some(model_dir.clone());
    }

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let pipeline = Pipeline::from_config(&config)?;
    let expected = parse_expected(args.expect.as_deref());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let pipeline = &pipeline;
    let expected = expected.as_deref();
    let doc_type = args.doc_type;
    let out_dir = &args.out_dir;
    let pb_ref = &pb;

    let mut outcomes = stream::iter(files)
        .map(|path| async move {
            let outcome = match pipeline.run_pipeline(&path, expected, doc_type).await {
                Ok(result) => save_json(&result, &path, out_dir).err().map(|e| e.to_string()),
                Err(e) => Some(e.to_string()),
            };
            pb_ref.inc(1);
            FileOutcome { path, error: outcome }
        })
        .buffer_unordered(args.jobs.max(1));

    let mut results = Vec::new();
    while let Some(outcome) = outcomes.next().await {
        if let Some(error_msg) = &outcome.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", outcome.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", outcome.path.display(), error_msg);
                pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", outcome.path.display(), error_msg);
            }
        }
        results.push(outcome);
    }

    pb.finish_with_message("Complete");

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, results in {}",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red(),
        out_dir.display()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}
