//! Core library for on-device manga page OCR.
//!
//! This crate provides:
//! - Text region detection with a YOLO-style detector (letterboxing,
//!   box decoding, non-maximum suppression)
//! - Text recognition with an image encoder and an autoregressive decoder
//!   driven by greedy decoding, with or without a key/value cache
//! - Model asset management and pipeline configuration

pub mod error;
pub mod models;
pub mod ocr;

#[cfg(test)]
mod test_util;

pub use error::{ManaiError, OcrError, Result};
pub use models::{ManaiConfig, ModelConfig, OcrConfig};
pub use ocr::{OcrEngine, OcrModels, OcrResult, PageOcr, TextRegion};
#[cfg(feature = "native")]
pub use ocr::create_engine_from_dir;

/// Re-export inference types.
pub use manai_inference::{InferenceBackend, InputTensor, OutputTensor};

#[cfg(feature = "native")]
pub use manai_inference::OrtBackend;
