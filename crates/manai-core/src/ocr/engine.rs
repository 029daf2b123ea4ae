//! OCR engine orchestrating detection and recognition over a page.

use std::time::Instant;

use image::{DynamicImage, RgbImage};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::config::OcrConfig;
use manai_inference::InferenceBackend;

use super::{detector::TextDetector, recognizer::TextRecognizer, OcrResult, PageOcr, TextRegion};

/// OCR engine combining a text detector and a text recognizer.
pub struct OcrEngine<B: InferenceBackend> {
    detector: TextDetector<B>,
    recognizer: TextRecognizer<B>,
    config: OcrConfig,
}

/// Builder for OcrEngine.
pub struct OcrEngineBuilder<B: InferenceBackend> {
    detector: Option<TextDetector<B>>,
    recognizer: Option<TextRecognizer<B>>,
    config: OcrConfig,
}

impl<B: InferenceBackend> OcrEngineBuilder<B> {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            detector: None,
            recognizer: None,
            config: OcrConfig::default(),
        }
    }

    /// Set the text detector.
    pub fn with_detector(mut self, detector: TextDetector<B>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Set the text recognizer.
    pub fn with_recognizer(mut self, recognizer: TextRecognizer<B>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Set configuration.
    pub fn with_config(mut self, config: OcrConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the OCR engine, applying the configuration to both stages.
    pub fn build(self) -> Result<OcrEngine<B>, OcrError> {
        let config = self.config;
        let detector = self
            .detector
            .ok_or_else(|| OcrError::ModelLoad("No detector configured".to_string()))?
            .with_input_size(config.detector_input_size)
            .with_confidence_threshold(config.confidence_threshold)
            .with_iou_threshold(config.iou_threshold);
        let recognizer = self
            .recognizer
            .ok_or_else(|| OcrError::ModelLoad("No recognizer configured".to_string()))?
            .with_input_size(config.recognizer_input_size)
            .with_cache(config.use_decoder_cache);

        Ok(OcrEngine {
            detector,
            recognizer,
            config,
        })
    }
}

impl<B: InferenceBackend> Default for OcrEngineBuilder<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: InferenceBackend> OcrEngine<B> {
    /// Create a new builder.
    pub fn builder() -> OcrEngineBuilder<B> {
        OcrEngineBuilder::new()
    }

    /// Active configuration.
    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Detect text regions without recognizing them.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<TextRegion>, OcrError> {
        self.detector.detect(image)
    }

    /// Recognize the text of a single region.
    pub fn recognize(&self, image: &DynamicImage, region: &TextRegion) -> Result<OcrResult, OcrError> {
        self.recognizer.recognize(image, region)
    }

    /// Detect every region of the page, then recognize each one.
    ///
    /// A region whose recognition fails is logged and counted in
    /// [`PageOcr::failed_regions`]; the remaining regions are unaffected.
    /// Results keep detection order.
    pub fn process(&self, image: &DynamicImage) -> Result<PageOcr, OcrError> {
        let start = Instant::now();
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        info!("Processing image: {}x{}", width, height);

        let regions = self.detector.detect_rgb(&rgb)?;
        if regions.is_empty() {
            debug!("No text regions detected");
            let mut page = PageOcr::empty(width, height);
            page.processing_time_ms = start.elapsed().as_millis() as u64;
            return Ok(page);
        }

        let outcomes = self.recognize_all(&rgb, &regions);

        let mut page = PageOcr::empty(width, height);
        for (region, outcome) in regions.iter().zip(outcomes) {
            match outcome {
                Ok(result) => page.results.push(result),
                Err(e) => {
                    warn!(
                        "Recognition failed for region ({:.0}, {:.0})-({:.0}, {:.0}): {}",
                        region.x1, region.y1, region.x2, region.y2, e
                    );
                    page.failed_regions += 1;
                }
            }
        }
        page.processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "OCR complete: {} regions recognized, {} failed in {}ms",
            page.results.len(),
            page.failed_regions,
            page.processing_time_ms
        );

        Ok(page)
    }

    fn recognize_all(
        &self,
        image: &RgbImage,
        regions: &[TextRegion],
    ) -> Vec<Result<OcrResult, OcrError>> {
        debug!(
            "Recognizing {} regions ({})",
            regions.len(),
            if self.config.parallel_recognition {
                "parallel"
            } else {
                "sequential"
            }
        );

        if self.config.parallel_recognition {
            regions
                .par_iter()
                .map(|region| self.recognizer.recognize_rgb(image, region))
                .collect()
        } else {
            regions
                .iter()
                .map(|region| self.recognizer.recognize_rgb(image, region))
                .collect()
        }
    }
}

/// Create an OCR engine with models from the configured model directory.
#[cfg(feature = "native")]
pub fn create_engine_from_dir(
    config: &crate::models::config::ManaiConfig,
) -> Result<OcrEngine<crate::OrtBackend>, OcrError> {
    super::sessions::OcrModels::load(&config.models)?
        .into_engine(config.ocr.clone(), config.models.past_key_count)
}
