//! Inference backend implementations.

#[cfg(feature = "native")]
pub mod ort;

use std::sync::Arc;

use crate::{InputTensor, OutputTensor, Result};

/// Trait for ONNX inference backends.
///
/// A backend wraps one loaded model. Implementations must be shareable
/// across threads because recognition of independent regions may run in
/// parallel against the same sessions.
pub trait InferenceBackend: Send + Sync {
    /// Run inference with the given inputs.
    ///
    /// # Arguments
    /// * `inputs` - Named input tensors
    ///
    /// # Returns
    /// Named output tensors from the model, in declaration order
    fn run(&self, inputs: &[(&str, InputTensor)]) -> Result<Vec<(String, OutputTensor)>>;

    /// Get the input names expected by the model.
    fn input_names(&self) -> &[String];

    /// Get the output names produced by the model.
    fn output_names(&self) -> &[String];
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for Box<B> {
    fn run(&self, inputs: &[(&str, InputTensor)]) -> Result<Vec<(String, OutputTensor)>> {
        (**self).run(inputs)
    }

    fn input_names(&self) -> &[String] {
        (**self).input_names()
    }

    fn output_names(&self) -> &[String] {
        (**self).output_names()
    }
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for Arc<B> {
    fn run(&self, inputs: &[(&str, InputTensor)]) -> Result<Vec<(String, OutputTensor)>> {
        (**self).run(inputs)
    }

    fn input_names(&self) -> &[String] {
        (**self).input_names()
    }

    fn output_names(&self) -> &[String] {
        (**self).output_names()
    }
}
