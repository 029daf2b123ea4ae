//! Subcommands of the `manai` binary and the helpers they share.

pub mod batch;
pub mod config;
pub mod detect;
pub mod models;
pub mod ocr;

use std::path::{Path, PathBuf};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use manai_core::ManaiConfig;

/// Image extensions the pipeline accepts.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tif", "tiff"];

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("manai")
        .join("config.json")
}

/// Resolve the configuration file: `--config` if given, else the default.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(default_config_path)
}

/// Load configuration from `--config`, the default file, or defaults.
///
/// An explicitly named file must exist; the default one is optional.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<ManaiConfig> {
    match explicit {
        Some(path) => ManaiConfig::from_file(path)
            .with_context(|| format!("Failed to read config file {}", path.display())),
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Using config file {}", path.display());
                ManaiConfig::from_file(&path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))
            } else {
                Ok(ManaiConfig::default())
            }
        }
    }
}

/// Load configuration and apply a `--model-dir` override.
pub fn load_config_with_model_dir(
    explicit: Option<&Path>,
    model_dir: Option<PathBuf>,
) -> anyhow::Result<ManaiConfig> {
    let mut config = load_config(explicit)?;
    if let Some(dir) = model_dir {
        config.models.model_dir = dir;
    }
    Ok(config)
}

/// Whether `path` has one of [`IMAGE_EXTENSIONS`].
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Spinner shown while a blocking OCR task runs.
pub fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}
