//! OCR command - run the full pipeline over a single page image.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::{debug, info};

use manai_core::{create_engine_from_dir, ManaiConfig, PageOcr};

use super::{load_config_with_model_dir, spinner};

/// Arguments for the ocr command.
#[derive(Args)]
pub struct OcrArgs {
    /// Input page image
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Re-run the full decoder each step instead of using the key/value cache
    #[arg(long)]
    no_cache: bool,

    /// Recognize regions one at a time
    #[arg(long)]
    sequential: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output with regions and text
    Json,
    /// Recognized text only, one region per line
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: OcrArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = load_config_with_model_dir(config_path, args.model_dir.clone())?;
    if args.no_cache {
        config.ocr.use_decoder_cache = false;
    }
    if args.sequential {
        config.ocr.parallel_recognition = false;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = spinner("Running OCR...")?;
    let input = args.input.clone();
    let page = tokio::task::spawn_blocking(move || run_ocr(&input, &config)).await?;
    pb.finish_and_clear();
    let page = page?;

    if page.failed_regions > 0 {
        eprintln!(
            "{} {} of {} regions could not be read",
            style("⚠").yellow(),
            page.failed_regions,
            page.failed_regions + page.results.len()
        );
    }

    let output = format_page(&page, args.format)?;

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

    debug!("Total processing time: {}ms", page.processing_time_ms);

    Ok(())
}

/// Load the models and process one image.
pub fn run_ocr(path: &Path, config: &ManaiConfig) -> anyhow::Result<PageOcr> {
    let image = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let engine = create_engine_from_dir(config).context("Failed to load OCR models")?;
    Ok(engine.process(&image)?)
}

/// Render a page result in the requested format.
pub fn format_page(page: &PageOcr, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(page)?,
        OutputFormat::Text => page.text(),
    })
}
