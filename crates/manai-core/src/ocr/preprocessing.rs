//! Image preprocessing for the detector and the recognizer.

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use tracing::trace;

use crate::error::OcrError;

use super::letterbox::LetterboxParams;
use super::TextRegion;

/// Fill value for letterbox padding (114/255, the YOLO grey).
pub const PAD_VALUE: f32 = 114.0 / 255.0;

/// Image preprocessor for the OCR pipeline.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Side of the square detector input.
    det_input_size: u32,
    /// Side of the square recognizer input.
    rec_input_size: u32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            det_input_size: super::DETECTOR_INPUT_SIZE,
            rec_input_size: super::RECOGNIZER_INPUT_SIZE,
        }
    }

    /// Set the detector input size.
    pub fn with_detector_input_size(mut self, size: u32) -> Self {
        self.det_input_size = size;
        self
    }

    /// Set the recognizer input size.
    pub fn with_recognizer_input_size(mut self, size: u32) -> Self {
        self.rec_input_size = size;
        self
    }

    /// Detector input size.
    pub fn detector_input_size(&self) -> u32 {
        self.det_input_size
    }

    /// Build the `(1, 3, S, S)` detector input.
    ///
    /// Content pixels are nearest-neighbour samples of the source divided by
    /// 255; padding pixels are [`PAD_VALUE`] on every channel.
    pub fn preprocess_for_detection(
        &self,
        image: &RgbImage,
        letterbox: &LetterboxParams,
    ) -> Result<Array4<f32>, OcrError> {
        let (orig_width, orig_height) = image.dimensions();
        if (orig_width, orig_height) != (letterbox.orig_width, letterbox.orig_height) {
            return Err(OcrError::Preprocessing(format!(
                "letterbox computed for {}x{} but image is {}x{}",
                letterbox.orig_width, letterbox.orig_height, orig_width, orig_height
            )));
        }
        if orig_width == 0 || orig_height == 0 {
            return Err(OcrError::InvalidImage(format!(
                "image has zero size: {}x{}",
                orig_width, orig_height
            )));
        }

        let size = self.det_input_size as usize;
        let plane = size * size;
        let mut data = vec![PAD_VALUE; 3 * plane];

        let pad_left = letterbox.pad_left;
        let pad_top = letterbox.pad_top;
        let right = letterbox.content_right().min(self.det_input_size);
        let bottom = letterbox.content_bottom().min(self.det_input_size);

        for out_y in pad_top..bottom {
            let src_y = (((out_y - pad_top) as f32 / letterbox.scale) as u32).min(orig_height - 1);
            let row = out_y as usize * size;

            for out_x in pad_left..right {
                let src_x = (((out_x - pad_left) as f32 / letterbox.scale) as u32).min(orig_width - 1);
                let pixel = image.get_pixel(src_x, src_y);
                let idx = row + out_x as usize;

                data[idx] = pixel[0] as f32 / 255.0;
                data[plane + idx] = pixel[1] as f32 / 255.0;
                data[2 * plane + idx] = pixel[2] as f32 / 255.0;
            }
        }

        Array4::from_shape_vec((1, 3, size, size), data)
            .map_err(|e| OcrError::Preprocessing(e.to_string()))
    }

    /// Crop a text region out of the image.
    ///
    /// Each bound is truncated and clamped into the image independently and
    /// the crop is at least one pixel in each direction, so any region
    /// (including a degenerate one) yields a usable crop.
    pub fn crop_region(&self, image: &RgbImage, region: &TextRegion) -> Result<RgbImage, OcrError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!(
                "image has zero size: {}x{}",
                width, height
            )));
        }

        let max_x = width as i64 - 1;
        let max_y = height as i64 - 1;
        let x1 = (region.x1 as i64).clamp(0, max_x);
        let y1 = (region.y1 as i64).clamp(0, max_y);
        let x2 = (region.x2 as i64).clamp(0, max_x);
        let y2 = (region.y2 as i64).clamp(0, max_y);
        let crop_w = (x2 - x1).max(1);
        let crop_h = (y2 - y1).max(1);

        trace!("Cropping region at ({}, {}) size {}x{}", x1, y1, crop_w, crop_h);

        Ok(imageops::crop_imm(image, x1 as u32, y1 as u32, crop_w as u32, crop_h as u32).to_image())
    }

    /// Build the `(1, 3, S, S)` recognizer input for one region.
    pub fn preprocess_for_recognition(
        &self,
        image: &RgbImage,
        region: &TextRegion,
    ) -> Result<Array4<f32>, OcrError> {
        let crop = self.crop_region(image, region)?;
        let size = self.rec_input_size;
        let scaled = imageops::resize(&crop, size, size, FilterType::Triangle);

        let data = normalize_recognition_pixels(&scaled);
        Array4::from_shape_vec((1, 3, size as usize, size as usize), data)
            .map_err(|e| OcrError::Preprocessing(e.to_string()))
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize pixels to `[-1, 1]` with `(c / 255 - 0.5) / 0.5`, laid out
/// planar: every R value, then every G value, then every B value.
pub fn normalize_recognition_pixels(image: &RgbImage) -> Vec<f32> {
    let plane = image.width() as usize * image.height() as usize;
    let mut data = vec![0.0f32; 3 * plane];

    for (i, pixel) in image.pixels().enumerate() {
        for c in 0..3 {
            data[c * plane + i] = (pixel[c] as f32 / 255.0 - 0.5) / 0.5;
        }
    }

    data
}
