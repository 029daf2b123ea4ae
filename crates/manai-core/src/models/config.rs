//! Configuration structures for the OCR pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the manai pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManaiConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Model configuration.
    pub models: ModelConfig,
}

/// OCR pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Side of the square detector input, in pixels.
    pub detector_input_size: u32,

    /// Minimum anchor score (exclusive) for a detection proposal.
    pub confidence_threshold: f32,

    /// IoU above which a lower-scoring proposal is suppressed.
    pub iou_threshold: f32,

    /// Side of the square recognizer input, in pixels.
    pub recognizer_input_size: u32,

    /// Thread the decoder key/value cache between decode steps.
    pub use_decoder_cache: bool,

    /// Recognize the regions of a page on the rayon thread pool.
    pub parallel_recognition: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            detector_input_size: 640,
            confidence_threshold: 0.5,
            iou_threshold: 0.45,
            recognizer_input_size: 224,
            use_decoder_cache: true,
            parallel_recognition: true,
        }
    }
}

/// Model file names and session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text region detector model file name.
    pub detector_model: String,

    /// Recognizer image encoder model file name.
    pub encoder_model: String,

    /// Decoder model run on the first step (no cache input).
    pub decoder_first_model: String,

    /// Decoder model consuming the previous step's key/value cache.
    pub decoder_with_past_model: String,

    /// Vocabulary file name, one token per line.
    pub vocabulary: String,

    /// Number of `past_*` cache tensors exchanged between decoder steps.
    pub past_key_count: usize,

    /// Intra-op threads for the detector session.
    pub detector_threads: usize,

    /// Intra-op threads for each recognizer session.
    pub recognizer_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detector_model: "textdetector.onnx".to_string(),
            encoder_model: "encoder.onnx".to_string(),
            decoder_first_model: "decoder_first.onnx".to_string(),
            decoder_with_past_model: "decoder_with_past.onnx".to_string(),
            vocabulary: "vocab.txt".to_string(),
            past_key_count: 8,
            detector_threads: 4,
            recognizer_threads: 2,
        }
    }
}

impl ModelConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }

    /// All asset file names, each paired with whether the pipeline needs it.
    pub fn asset_names(&self) -> [(&str, bool); 5] {
        [
            (&self.detector_model, true),
            (&self.encoder_model, true),
            (&self.decoder_first_model, true),
            (&self.vocabulary, true),
            (&self.decoder_with_past_model, false),
        ]
    }
}

impl ManaiConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.models.model_path(model_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_model_path_joins_model_dir() {
        let mut config = ManaiConfig::default();
        config.models.model_dir = PathBuf::from("/data/app/models");

        assert_eq!(
            config.model_path("encoder.onnx"),
            PathBuf::from("/data/app/models/encoder.onnx")
        );
        assert_eq!(
            config.model_path("decoder_first.onnx"),
            PathBuf::from("/data/app/models/decoder_first.onnx")
        );
    }

    #[test]
    fn test_only_cached_decoder_is_optional() {
        let models = ModelConfig {
            decoder_with_past_model: "kv_decoder.onnx".to_string(),
            ..ModelConfig::default()
        };

        let optional: Vec<&str> = models
            .asset_names()
            .into_iter()
            .filter(|(_, required)| !required)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(optional, vec!["kv_decoder.onnx"]);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ManaiConfig =
            serde_json::from_str(r#"{"ocr": {"confidence_threshold": 0.7}}"#).unwrap();

        assert_eq!(config.ocr.confidence_threshold, 0.7);
        assert_eq!(config.ocr.iou_threshold, 0.45);
        assert_eq!(config.ocr.detector_input_size, 640);
        assert_eq!(config.models, ModelConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ManaiConfig::default();
        config.ocr.parallel_recognition = false;
        config.models.detector_threads = 1;
        config.save(&path).unwrap();

        let loaded = ManaiConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_json_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = ManaiConfig::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
