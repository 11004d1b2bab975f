//! Run command - extract fields from a single document.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docex_core::{DocType, ExtractionResult, Pipeline};

use super::{OutputFormat, format_result, load_config, parse_expected};

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Input file (PDF, image or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Comma-separated list of field names to extract
    #[arg(short, long)]
    expect: Option<String>,

    /// Skip routing and use this document type
    #[arg(long, value_parser = DocType::from_str)]
    doc_type: Option<DocType>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory where the JSON result is saved
    #[arg(long, default_value = "outputs")]
    out_dir: PathBuf,

    /// Do not save the JSON result
    #[arg(long)]
    no_save: bool,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

pub async fn run(args: RunArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(model_dir) = &args.model_dir {
        config.ocr.model_dir = Some(model_dir.clone());
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pipeline = Pipeline::from_config(&config)?;
    let expected = parse_expected(args.expect.as_deref());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Extracting fields with {}", config.llm.model));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = pipeline
        .run_pipeline(&args.input, expected.as_deref(), args.doc_type)
        .await;
    pb.finish_and_clear();
    let result = result?;

    if !args.no_save {
        let saved = save_json(&result, &args.input, &args.out_dir)?;
        debug!("Saved result to {}", saved.display());
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    eprintln!(
        "{} {} fields, overall confidence {:.1}% in {:?}",
        style("ℹ").blue(),
        result.fields.len(),
        result.overall_confidence * 100.0,
        start.elapsed()
    );

    Ok(())
}

/// Write `<out_dir>/<input stem>.json`.
pub fn save_json(result: &ExtractionResult, input: &Path, out_dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(out_dir)?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let path = out_dir.join(format!("{}.json", stem));

    fs::write(&path, result.to_json_pretty()?)?;
    Ok(path)
}
