//! Batch processing command for many page images.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use manai_core::{create_engine_from_dir, ManaiConfig, OcrEngine, OrtBackend, PageOcr};

use super::ocr::{format_page, OutputFormat};
use super::{is_image_path, load_config_with_model_dir};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching page images
    #[arg(required = true)]
    input: String,

    /// Output directory for per-page results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each page
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    page: Option<PageOcr>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config_with_model_dir(config_path, args.model_dir.clone())?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_image_path(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let continue_on_error = args.continue_on_error;
    let pb = overall_pb.clone();
    let results = tokio::task::spawn_blocking(move || {
        process_files(files, &config, continue_on_error, &pb)
    })
    .await??;

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.page.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(page) = &result.page {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("page");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_page(page, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
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

/// Run every file through one engine, loaded once.
fn process_files(
    files: Vec<PathBuf>,
    config: &ManaiConfig,
    continue_on_error: bool,
    pb: &ProgressBar,
) -> anyhow::Result<Vec<ProcessResult>> {
    let engine = create_engine_from_dir(config).context("Failed to load OCR models")?;
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = process_single_file(&path, &engine);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(page) => results.push(ProcessResult {
                path,
                page: Some(page),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = format!("{:#}", e);
                if !continue_on_error {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
                warn!("Failed to process {}: {}", path.display(), error_msg);
                results.push(ProcessResult {
                    path,
                    page: None,
                    error: Some(error_msg),
                    processing_time_ms,
                });
            }
        }

        pb.inc(1);
    }

    Ok(results)
}

fn process_single_file(path: &Path, engine: &OcrEngine<OrtBackend>) -> anyhow::Result<PageOcr> {
    let image = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(engine.process(&image)?)
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let wtr = csv::Writer::from_path(path)?;
    write_summary_to(wtr, results)
}

fn write_summary_to<W: std::io::Write>(
    mut wtr: csv::Writer<W>,
    results: &[ProcessResult],
) -> anyhow::Result<()> {
    wtr.write_record([
        "filename",
        "status",
        "regions",
        "failed_regions",
        "characters",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(page) = &result.page {
            let characters: usize = page.results.iter().map(|r| r.text.chars().count()).sum();
            wtr.write_record([
                filename,
                "success",
                &page.results.len().to_string(),
                &page.failed_regions.to_string(),
                &characters.to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
