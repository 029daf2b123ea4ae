//! Detect command - locate text regions without recognizing them.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::info;

use manai_core::ocr::TextDetector;
use manai_core::{ManaiConfig, OcrError, OrtBackend, TextRegion};

use super::load_config_with_model_dir;

/// Arguments for the detect command.
#[derive(Args)]
pub struct DetectArgs {
    /// Input page image
    #[arg(required = true)]
    input: PathBuf,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Override the detection confidence threshold
    #[arg(long)]
    confidence: Option<f32>,
}

/// Regions found on one page.
#[derive(Debug, Serialize)]
struct DetectOutput {
    image_size: (u32, u32),
    regions: Vec<TextRegion>,
}

pub async fn run(args: DetectArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = load_config_with_model_dir(config_path, args.model_dir.clone())?;
    if let Some(confidence) = args.confidence {
        config.ocr.confidence_threshold = confidence;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let input = args.input.clone();
    let output = tokio::task::spawn_blocking(move || detect(&input, &config)).await??;

    info!("Detected {} text regions", output.regions.len());
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn detect(path: &Path, config: &ManaiConfig) -> anyhow::Result<DetectOutput> {
    let image = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let model_path = config.model_path(&config.models.detector_model);
    if !model_path.is_file() {
        return Err(OcrError::MissingAsset(model_path).into());
    }
    let backend = OrtBackend::from_file_with_threads(&model_path, config.models.detector_threads)
        .context("Failed to load detector model")?;

    let detector = TextDetector::new(backend)
        .with_input_size(config.ocr.detector_input_size)
        .with_confidence_threshold(config.ocr.confidence_threshold)
        .with_iou_threshold(config.ocr.iou_threshold);

    Ok(DetectOutput {
        image_size: (image.width(), image.height()),
        regions: detector.detect(&image)?,
    })
}
