//! Model asset discovery, installation and session loading.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{OcrError, Result};
use crate::models::config::{ModelConfig, OcrConfig};
use manai_inference::InferenceBackend;

use super::detector::TextDetector;
use super::engine::OcrEngine;
use super::recognizer::TextRecognizer;
use super::vocabulary::Vocabulary;

/// Presence of one model asset on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetStatus {
    pub name: String,
    pub path: PathBuf,
    pub present: bool,
    /// Whether the pipeline refuses to start without it.
    pub required: bool,
}

/// Report every configured asset in configuration order.
pub fn asset_status(config: &ModelConfig) -> Vec<AssetStatus> {
    config
        .asset_names()
        .into_iter()
        .map(|(name, required)| {
            let path = config.model_path(name);
            AssetStatus {
                name: name.to_string(),
                present: path.is_file(),
                path,
                required,
            }
        })
        .collect()
}

/// Fail with [`OcrError::MissingAsset`] on the first absent required asset.
pub fn ensure_required_assets(config: &ModelConfig) -> std::result::Result<(), OcrError> {
    match asset_status(config)
        .into_iter()
        .find(|asset| asset.required && !asset.present)
    {
        Some(asset) => Err(OcrError::MissingAsset(asset.path)),
        None => Ok(()),
    }
}

/// Copy model assets from `source_dir` into the configured model directory.
///
/// Files already present in the model directory are left alone. A missing
/// required source file is an error; the optional cached decoder is skipped
/// when the source does not ship it. Returns the paths written.
pub fn install_models(source_dir: &Path, config: &ModelConfig) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&config.model_dir)?;

    let mut installed = Vec::new();
    for asset in asset_status(config) {
        if asset.present {
            debug!("{} already installed", asset.name);
            continue;
        }

        let source = source_dir.join(&asset.name);
        if !source.is_file() {
            if asset.required {
                return Err(OcrError::MissingAsset(source).into());
            }
            debug!("Optional asset {} not found in {}", asset.name, source_dir.display());
            continue;
        }

        std::fs::copy(&source, &asset.path)?;
        info!("Installed {} to {}", asset.name, asset.path.display());
        installed.push(asset.path);
    }

    Ok(installed)
}

/// Loaded model sessions and vocabulary.
///
/// Created once and handed to the engine; sessions are never reloaded.
pub struct OcrModels<B: InferenceBackend> {
    pub detector: B,
    pub encoder: B,
    pub decoder_first: B,
    pub decoder_with_past: Option<B>,
    pub vocabulary: Arc<Vocabulary>,
}

impl<B: InferenceBackend> OcrModels<B> {
    /// Wire the sessions into an engine configured by `config`.
    pub fn into_engine(
        self,
        config: OcrConfig,
        past_key_count: usize,
    ) -> std::result::Result<OcrEngine<B>, OcrError> {
        let mut recognizer = TextRecognizer::new(self.encoder, self.decoder_first, self.vocabulary)
            .with_past_key_count(past_key_count);
        if let Some(decoder) = self.decoder_with_past {
            recognizer = recognizer.with_decoder_with_past(decoder);
        }

        OcrEngine::builder()
            .with_detector(TextDetector::new(self.detector))
            .with_recognizer(recognizer)
            .with_config(config)
            .build()
    }
}

#[cfg(feature = "native")]
impl OcrModels<crate::OrtBackend> {
    /// Load every session named by `config`.
    ///
    /// Fails before loading anything if a required asset is missing. The
    /// cached decoder is optional; without it recognition re-runs the first
    /// decoder on the full prefix each step.
    pub fn load(config: &ModelConfig) -> std::result::Result<Self, OcrError> {
        ensure_required_assets(config)?;

        let detector = load_session(config, &config.detector_model, config.detector_threads)?;
        let encoder = load_session(config, &config.encoder_model, config.recognizer_threads)?;
        let decoder_first =
            load_session(config, &config.decoder_first_model, config.recognizer_threads)?;

        let decoder_with_past = if config.model_path(&config.decoder_with_past_model).is_file() {
            Some(load_session(
                config,
                &config.decoder_with_past_model,
                config.recognizer_threads,
            )?)
        } else {
            info!("No cached decoder found, decoding without key/value cache");
            None
        };

        let vocabulary = Vocabulary::from_file(&config.model_path(&config.vocabulary))?;

        info!("Loaded OCR models from {}", config.model_dir.display());
        Ok(Self {
            detector,
            encoder,
            decoder_first,
            decoder_with_past,
            vocabulary: Arc::new(vocabulary),
        })
    }
}

#[cfg(feature = "native")]
fn load_session(
    config: &ModelConfig,
    name: &str,
    threads: usize,
) -> std::result::Result<crate::OrtBackend, OcrError> {
    let path = config.model_path(name);
    let backend = crate::OrtBackend::from_file_with_threads(&path, threads)
        .map_err(|e| OcrError::ModelLoad(format!("Failed to load {}: {}", name, e)))?;
    debug!("Loaded {} ({} threads)", path.display(), threads);
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ManaiError;
    use pretty_assertions::assert_eq;

    fn config_in(dir: &Path) -> ModelConfig {
        ModelConfig {
            model_dir: dir.to_path_buf(),
            ..ModelConfig::default()
        }
    }

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), name.as_bytes()).unwrap();
        }
    }

    #[test]
    fn test_asset_status_reports_required_flags() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["encoder.onnx"]);

        let status = asset_status(&config_in(dir.path()));
        let summary: Vec<(&str, bool, bool)> = status
            .iter()
            .map(|a| (a.name.as_str(), a.present, a.required))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("textdetector.onnx", false, true),
                ("encoder.onnx", true, true),
                ("decoder_first.onnx", false, true),
                ("vocab.txt", false, true),
                ("decoder_with_past.onnx", false, false),
            ]
        );
        assert_eq!(status[1].path, dir.path().join("encoder.onnx"));
    }

    #[test]
    fn test_missing_required_asset_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["textdetector.onnx", "encoder.onnx", "vocab.txt"]);

        let err = ensure_required_assets(&config_in(dir.path())).unwrap_err();
        match err {
            OcrError::MissingAsset(path) => {
                assert_eq!(path, dir.path().join("decoder_first.onnx"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cached_decoder_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["textdetector.onnx", "encoder.onnx", "decoder_first.onnx", "vocab.txt"],
        );

        assert!(ensure_required_assets(&config_in(dir.path())).is_ok());
    }

    #[test]
    fn test_install_copies_missing_assets_only() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let model_dir = target.path().join("models");
        touch(
            source.path(),
            &[
                "textdetector.onnx",
                "encoder.onnx",
                "decoder_first.onnx",
                "decoder_with_past.onnx",
                "vocab.txt",
            ],
        );
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(model_dir.join("vocab.txt"), "existing").unwrap();

        let config = config_in(&model_dir);
        let installed = install_models(source.path(), &config).unwrap();

        assert_eq!(installed.len(), 4);
        assert!(!installed.contains(&model_dir.join("vocab.txt")));
        assert_eq!(
            std::fs::read_to_string(model_dir.join("vocab.txt")).unwrap(),
            "existing"
        );
        assert!(asset_status(&config).iter().all(|a| a.present));

        let again = install_models(source.path(), &config).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_install_without_required_source_fails() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        touch(source.path(), &["textdetector.onnx"]);

        let err = install_models(source.path(), &config_in(target.path())).unwrap_err();
        assert!(matches!(err, ManaiError::Ocr(OcrError::MissingAsset(_))));
    }

    #[test]
    fn test_install_skips_absent_optional_decoder() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        touch(
            source.path(),
            &["textdetector.onnx", "encoder.onnx", "decoder_first.onnx", "vocab.txt"],
        );

        let installed = install_models(source.path(), &config_in(target.path())).unwrap();
        assert_eq!(installed.len(), 4);
        assert!(!target.path().join("decoder_with_past.onnx").exists());
    }
}
