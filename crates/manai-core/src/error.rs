//! Error types for the manai-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the manai library.
#[derive(Error, Debug)]
pub enum ManaiError {
    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to OCR processing.
///
/// Detection and recognition failures are scoped to one image or one
/// region; callers treat them as "no text found" or "unreadable region".
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// A required model asset is not where the configuration says it is.
    #[error("missing model asset: {}", .0.display())]
    MissingAsset(PathBuf),

    /// The inference engine failed (missing session, bad tensor shape, ...).
    #[error("inference failed: {0}")]
    Inference(#[from] manai_inference::InferenceError),

    /// Detector output could not be interpreted.
    #[error("text detection failed: {0}")]
    Detection(String),

    /// Encoder or decoder output could not be interpreted.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Result type for the manai library.
pub type Result<T> = std::result::Result<T, ManaiError>;
