//! OCR pipeline: YOLO-style text region detection followed by
//! encoder/decoder text recognition.

mod decoding;
mod detector;
mod engine;
mod geometry;
mod letterbox;
mod preprocessing;
mod recognizer;
mod sessions;
mod vocabulary;

pub use decoding::{argmax, greedy_decode, BOS_TOKEN, EOS_TOKEN, MAX_DECODE_LENGTH};
pub use detector::{postprocess_yolo_output, TextDetector, DETECTOR_INPUT_SIZE};
pub use engine::{OcrEngine, OcrEngineBuilder};
pub use geometry::{apply_nms, compute_iou, AxisAlignedBox, Proposal};
pub use letterbox::{compute_letterbox_params, LetterboxParams};
pub use preprocessing::{normalize_recognition_pixels, ImagePreprocessor, PAD_VALUE};
pub use recognizer::{
    OnnxStepDecoder, TextRecognizer, DEFAULT_PAST_KEY_COUNT, RECOGNIZER_INPUT_SIZE,
};
pub use sessions::{
    asset_status, ensure_required_assets, install_models, AssetStatus, OcrModels,
};
pub use vocabulary::{Vocabulary, FIRST_REAL_TOKEN};

#[cfg(feature = "native")]
pub use engine::create_engine_from_dir;

use serde::{Deserialize, Serialize};

/// A detected text region in original image pixel coordinates.
///
/// Regions are clamped to the image but never re-filtered, so a region may
/// be empty (`x1 == x2`) when the model predicted a box inside the padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Detection confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextRegion {
    /// Width of the region, zero for degenerate regions.
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    /// Height of the region, zero for degenerate regions.
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Check if the region encloses no area.
    pub fn is_degenerate(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }
}

/// Recognized text paired with the region it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    /// Recognized text content.
    pub text: String,

    /// Region the text was read from.
    pub region: TextRegion,
}

/// Result of running the whole pipeline over one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageOcr {
    /// One result per successfully recognized region, in detection order.
    pub results: Vec<OcrResult>,

    /// Number of regions whose recognition failed.
    pub failed_regions: usize,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl PageOcr {
    /// Create an empty result.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            results: Vec::new(),
            failed_regions: 0,
            processing_time_ms: 0,
            image_size: (width, height),
        }
    }

    /// Full text, one region per line.
    pub fn text(&self) -> String {
        self.results
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
