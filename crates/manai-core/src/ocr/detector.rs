//! Text region detection with a YOLO-style single-class detector.

use image::{DynamicImage, RgbImage};
use ndarray::{ArrayView2, Axis, Ix2};
use tracing::{debug, trace};

use crate::error::OcrError;
use manai_inference::{InferenceBackend, InputTensor};

use super::geometry::{apply_nms, Proposal};
use super::letterbox::{compute_letterbox_params, LetterboxParams};
use super::preprocessing::ImagePreprocessor;
use super::TextRegion;

/// Side of the square detector input in the reference model.
pub const DETECTOR_INPUT_SIZE: u32 = 640;

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// Input name used when the model does not declare one.
const FALLBACK_INPUT_NAME: &str = "images";

/// Rows per anchor: x_center, y_center, width, height, score.
const YOLO_ROWS: usize = 5;

/// Text region detector.
pub struct TextDetector<B: InferenceBackend> {
    backend: B,
    preprocessor: ImagePreprocessor,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl<B: InferenceBackend> TextDetector<B> {
    /// Create a new text detector with the given backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            preprocessor: ImagePreprocessor::new(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }

    /// Set the minimum anchor score (exclusive).
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the NMS IoU threshold.
    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    /// Set the side of the square model input.
    pub fn with_input_size(mut self, size: u32) -> Self {
        self.preprocessor = self.preprocessor.with_detector_input_size(size);
        self
    }

    /// Detect text regions in an image.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<TextRegion>, OcrError> {
        self.detect_rgb(&image.to_rgb8())
    }

    /// Detect text regions in an RGB image.
    pub fn detect_rgb(&self, image: &RgbImage) -> Result<Vec<TextRegion>, OcrError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!(
                "image has zero size: {}x{}",
                width, height
            )));
        }

        let letterbox =
            compute_letterbox_params(width, height, self.preprocessor.detector_input_size());
        let tensor = self.preprocessor.preprocess_for_detection(image, &letterbox)?;

        debug!(
            "Detection input shape: {:?}, scale: {}, padding: ({}, {})",
            tensor.shape(),
            letterbox.scale,
            letterbox.pad_left,
            letterbox.pad_top
        );

        let input_name = self
            .backend
            .input_names()
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_INPUT_NAME);
        let outputs = self
            .backend
            .run(&[(input_name, InputTensor::Float32(tensor.into_dyn()))])?;

        let (_, output) = outputs
            .into_iter()
            .next()
            .ok_or_else(|| OcrError::Detection("No output from model".to_string()))?;
        let output = output
            .as_f32()
            .ok_or_else(|| OcrError::Detection("Unexpected output type".to_string()))?;

        debug!("Detection output shape: {:?}", output.shape());

        let shape = output.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[1] < YOLO_ROWS {
            return Err(OcrError::Detection(format!(
                "Invalid output shape: {:?}",
                shape
            )));
        }

        let rows = output
            .index_axis(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .map_err(|e| OcrError::Detection(e.to_string()))?;

        let regions = postprocess_yolo_output(
            rows,
            &letterbox,
            self.confidence_threshold,
            self.iou_threshold,
        )?;

        debug!("Detected {} text regions", regions.len());
        Ok(regions)
    }
}

/// Decode raw detector output into text regions.
///
/// `output` has one column per anchor and at least five rows
/// (`x_center, y_center, width, height, score`) in model space. Anchors
/// scoring strictly above `confidence_threshold` are mapped back through
/// the letterbox, clamped into the original image and passed through NMS.
/// Boxes that collapse to zero area after clamping are kept.
pub fn postprocess_yolo_output(
    output: ArrayView2<'_, f32>,
    letterbox: &LetterboxParams,
    confidence_threshold: f32,
    iou_threshold: f32,
) -> Result<Vec<TextRegion>, OcrError> {
    if output.nrows() < YOLO_ROWS {
        return Err(OcrError::Detection(format!(
            "Expected at least {} output rows, got {}",
            YOLO_ROWS,
            output.nrows()
        )));
    }

    let proposals: Vec<Proposal> = output
        .axis_iter(Axis(1))
        .filter(|anchor| anchor[4] > confidence_threshold)
        .map(|anchor| {
            let (cx, cy, w, h) = (anchor[0], anchor[1], anchor[2], anchor[3]);
            Proposal {
                x1: letterbox.to_original_x(cx - w / 2.0),
                y1: letterbox.to_original_y(cy - h / 2.0),
                x2: letterbox.to_original_x(cx + w / 2.0),
                y2: letterbox.to_original_y(cy + h / 2.0),
                score: anchor[4],
            }
        })
        .collect();

    trace!(
        "{} of {} anchors above threshold {}",
        proposals.len(),
        output.ncols(),
        confidence_threshold
    );

    Ok(apply_nms(proposals, iou_threshold)
        .into_iter()
        .map(TextRegion::from)
        .collect())
}
