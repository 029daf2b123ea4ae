//! Text recognition with an image encoder and an autoregressive decoder.

use std::sync::Arc;

use image::{DynamicImage, RgbImage};
use ndarray::{Array4, Axis};
use tracing::trace;

use crate::error::OcrError;
use manai_inference::{InferenceBackend, InputTensor, OutputTensor};

use super::decoding::greedy_decode;
use super::preprocessing::ImagePreprocessor;
use super::vocabulary::Vocabulary;
use super::{OcrResult, TextRegion};

/// Side of the square recognizer input in the reference model.
pub const RECOGNIZER_INPUT_SIZE: u32 = 224;

/// Key/value cache tensors exchanged between decoder steps.
pub const DEFAULT_PAST_KEY_COUNT: usize = 8;

const PIXEL_VALUES: &str = "pixel_values";
const INPUT_IDS: &str = "input_ids";
const ENCODER_HIDDEN_STATES: &str = "encoder_hidden_states";

/// Single-step decoder over ONNX decoder sessions.
///
/// With a `decoder_with_past` session the first step runs `decoder_first`
/// on the start token and every later step feeds only the newest token plus
/// the `past_*` tensors returned by the previous call. Without one, every
/// step re-runs `decoder_first` on the whole token prefix. Both paths score
/// the same tokens.
pub struct OnnxStepDecoder<'a, B: InferenceBackend> {
    decoder_first: &'a B,
    decoder_with_past: Option<&'a B>,
    encoder_states: InputTensor,
    past_names: Vec<String>,
    past: Vec<OutputTensor>,
    history: Vec<i64>,
}

impl<'a, B: InferenceBackend> OnnxStepDecoder<'a, B> {
    pub fn new(
        decoder_first: &'a B,
        decoder_with_past: Option<&'a B>,
        encoder_states: InputTensor,
        past_key_count: usize,
    ) -> Self {
        Self {
            decoder_first,
            decoder_with_past,
            encoder_states,
            past_names: (0..past_key_count).map(|i| format!("past_{}", i)).collect(),
            past: Vec::with_capacity(past_key_count),
            history: Vec::new(),
        }
    }

    /// Scores over the vocabulary for the token following `token_id`.
    pub fn step(&mut self, token_id: i64, step: usize) -> Result<Vec<f32>, OcrError> {
        self.history.push(token_id);

        match self.decoder_with_past {
            Some(with_past) if step > 0 => self.step_with_past(with_past, token_id),
            Some(_) => self.step_first(token_id),
            None => self.step_uncached(),
        }
    }

    fn step_first(&mut self, token_id: i64) -> Result<Vec<f32>, OcrError> {
        let inputs = [
            (INPUT_IDS, InputTensor::from_i64(vec![token_id], &[1, 1])?),
            (ENCODER_HIDDEN_STATES, self.encoder_states.clone()),
        ];
        let outputs = self.decoder_first.run(&inputs)?;
        self.store_past(outputs)
    }

    fn step_with_past(&mut self, with_past: &B, token_id: i64) -> Result<Vec<f32>, OcrError> {
        let mut inputs: Vec<(&str, InputTensor)> = Vec::with_capacity(2 + self.past_names.len());
        inputs.push((INPUT_IDS, InputTensor::from_i64(vec![token_id], &[1, 1])?));
        inputs.push((ENCODER_HIDDEN_STATES, self.encoder_states.clone()));
        for (name, tensor) in self.past_names.iter().zip(self.past.drain(..)) {
            inputs.push((name.as_str(), tensor.into()));
        }

        let outputs = with_past.run(&inputs)?;
        self.store_past(outputs)
    }

    fn step_uncached(&mut self) -> Result<Vec<f32>, OcrError> {
        let len = self.history.len();
        let inputs = [
            (INPUT_IDS, InputTensor::from_i64(self.history.clone(), &[1, len])?),
            (ENCODER_HIDDEN_STATES, self.encoder_states.clone()),
        ];
        let outputs = self.decoder_first.run(&inputs)?;
        last_position_logits(&outputs)
    }

    /// Keep outputs `1..=N` as the next step's cache and return the logits.
    fn store_past(&mut self, outputs: Vec<(String, OutputTensor)>) -> Result<Vec<f32>, OcrError> {
        let expected = 1 + self.past_names.len();
        if outputs.len() < expected {
            return Err(OcrError::Recognition(format!(
                "decoder returned {} outputs, expected logits and {} cache tensors",
                outputs.len(),
                self.past_names.len()
            )));
        }

        let logits = last_position_logits(&outputs)?;
        self.past = outputs
            .into_iter()
            .skip(1)
            .take(self.past_names.len())
            .map(|(_, tensor)| tensor)
            .collect();
        Ok(logits)
    }
}

/// Last sequence position of a `(1, seq, vocab)` logits output.
fn last_position_logits(outputs: &[(String, OutputTensor)]) -> Result<Vec<f32>, OcrError> {
    let (_, logits) = outputs
        .first()
        .ok_or_else(|| OcrError::Recognition("No output from decoder".to_string()))?;
    let logits = logits
        .as_f32()
        .ok_or_else(|| OcrError::Recognition("Unexpected logits type".to_string()))?;

    match logits.shape() {
        [_, seq, _] if *seq > 0 => Ok(logits
            .index_axis(Axis(0), 0)
            .index_axis(Axis(0), seq - 1)
            .iter()
            .copied()
            .collect()),
        shape => Err(OcrError::Recognition(format!(
            "Invalid logits shape: {:?}",
            shape
        ))),
    }
}

/// Encoder/decoder text recognizer.
pub struct TextRecognizer<B: InferenceBackend> {
    encoder: B,
    decoder_first: B,
    decoder_with_past: Option<B>,
    vocabulary: Arc<Vocabulary>,
    preprocessor: ImagePreprocessor,
    use_cache: bool,
    past_key_count: usize,
}

impl<B: InferenceBackend> TextRecognizer<B> {
    /// Create a recognizer. Decoding is uncached until a
    /// `decoder_with_past` session is added.
    pub fn new(encoder: B, decoder_first: B, vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            encoder,
            decoder_first,
            decoder_with_past: None,
            vocabulary,
            preprocessor: ImagePreprocessor::new(),
            use_cache: true,
            past_key_count: DEFAULT_PAST_KEY_COUNT,
        }
    }

    /// Add the cached decoder session.
    pub fn with_decoder_with_past(mut self, decoder: B) -> Self {
        self.decoder_with_past = Some(decoder);
        self
    }

    /// Enable or disable the key/value cache.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Set the number of `past_*` tensors the cached decoder exchanges.
    pub fn with_past_key_count(mut self, count: usize) -> Self {
        self.past_key_count = count;
        self
    }

    /// Set the side of the square encoder input.
    pub fn with_input_size(mut self, size: u32) -> Self {
        self.preprocessor = self.preprocessor.with_recognizer_input_size(size);
        self
    }

    /// Recognize the text inside `region`.
    pub fn recognize(&self, image: &DynamicImage, region: &TextRegion) -> Result<OcrResult, OcrError> {
        self.recognize_rgb(&image.to_rgb8(), region)
    }

    /// Recognize the text inside `region` of an RGB image.
    pub fn recognize_rgb(&self, image: &RgbImage, region: &TextRegion) -> Result<OcrResult, OcrError> {
        let tokens = self.decode_tokens(image, region)?;
        let text = self.vocabulary.decode(&tokens);

        trace!("Recognized: '{}' ({} tokens)", text, tokens.len());

        Ok(OcrResult {
            text,
            region: *region,
        })
    }

    /// Token ids selected for `region`, EOS excluded.
    pub fn decode_tokens(&self, image: &RgbImage, region: &TextRegion) -> Result<Vec<i64>, OcrError> {
        let pixels = self.preprocessor.preprocess_for_recognition(image, region)?;
        let encoder_states = self.encode(pixels)?;

        let mut decoder = OnnxStepDecoder::new(
            &self.decoder_first,
            self.cached_decoder(),
            encoder_states,
            self.past_key_count,
        );

        greedy_decode(
            |token_id, step| decoder.step(token_id, step),
            |step| OcrError::Recognition(format!("decoder returned no scores at step {}", step)),
        )
    }

    fn cached_decoder(&self) -> Option<&B> {
        if self.use_cache {
            self.decoder_with_past.as_ref()
        } else {
            None
        }
    }

    fn encode(&self, pixels: Array4<f32>) -> Result<InputTensor, OcrError> {
        let outputs = self
            .encoder
            .run(&[(PIXEL_VALUES, InputTensor::Float32(pixels.into_dyn()))])?;

        let (_, states) = outputs
            .into_iter()
            .next()
            .ok_or_else(|| OcrError::Recognition("No output from encoder".to_string()))?;
        if states.as_f32().is_none() {
            return Err(OcrError::Recognition(
                "Unexpected encoder output type".to_string(),
            ));
        }

        Ok(states.into())
    }
}
