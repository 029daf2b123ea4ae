//! Configuration models.

pub mod config;

pub use config::{ManaiConfig, ModelConfig, OcrConfig};
