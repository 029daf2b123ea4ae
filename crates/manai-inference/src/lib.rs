//! ONNX inference abstraction layer for manai.
//!
//! The OCR pipeline never talks to a runtime directly. It hands named
//! tensors to an [`InferenceBackend`] and reads named tensors back, so the
//! numeric pre/post-processing can be exercised without any model present.
//!
//! - `ort` with the XNNPACK execution provider for native platforms
//!   (feature `native`)

mod backend;
mod error;
mod tensor;

pub use backend::InferenceBackend;
pub use error::InferenceError;
pub use tensor::{InputTensor, OutputTensor, TensorType};

#[cfg(feature = "native")]
pub use backend::ort::OrtBackend;

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
