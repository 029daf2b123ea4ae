//! Test doubles for [`InferenceBackend`].

use std::sync::Mutex;

use manai_inference::{InferenceBackend, InferenceError, InputTensor, OutputTensor};
use ndarray::{ArrayD, IxDyn};

type Handler = dyn Fn(&[(&str, InputTensor)]) -> manai_inference::Result<Vec<(String, OutputTensor)>>
    + Send
    + Sync;

/// Backend whose outputs come from a closure, recording every call.
pub struct FakeBackend {
    input_names: Vec<String>,
    output_names: Vec<String>,
    handler: Box<Handler>,
    calls: Mutex<Vec<Vec<(String, InputTensor)>>>,
}

impl FakeBackend {
    pub fn new<F>(input_names: &[&str], handler: F) -> Self
    where
        F: Fn(&[(&str, InputTensor)]) -> manai_inference::Result<Vec<(String, OutputTensor)>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            input_names: input_names.iter().map(|s| s.to_string()).collect(),
            output_names: Vec::new(),
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Backend that always fails with `InferenceFailed`.
    pub fn failing(input_names: &[&str]) -> Self {
        Self::new(input_names, |_| {
            Err(InferenceError::InferenceFailed("session closed".to_string()))
        })
    }

    /// Inputs of every call so far, in call order.
    pub fn calls(&self) -> Vec<Vec<(String, InputTensor)>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl InferenceBackend for FakeBackend {
    fn run(&self, inputs: &[(&str, InputTensor)]) -> manai_inference::Result<Vec<(String, OutputTensor)>> {
        self.calls.lock().unwrap().push(
            inputs
                .iter()
                .map(|(name, tensor)| (name.to_string(), tensor.clone()))
                .collect(),
        );
        (self.handler)(inputs)
    }

    fn input_names(&self) -> &[String] {
        &self.input_names
    }

    fn output_names(&self) -> &[String] {
        &self.output_names
    }
}

/// Float output tensor from data and shape.
pub fn f32_output(name: &str, data: Vec<f32>, shape: &[usize]) -> (String, OutputTensor) {
    let arr = ArrayD::from_shape_vec(IxDyn(shape), data).unwrap();
    (name.to_string(), OutputTensor::Float32(arr))
}

/// Logits over `vocab_size` tokens peaking at `target`.
pub fn one_hot_logits(target: usize, vocab_size: usize) -> Vec<f32> {
    (0..vocab_size)
        .map(|i| if i == target { 8.0 } else { -8.0 })
        .collect()
}
