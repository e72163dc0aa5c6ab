//! Configuration for DTrOCR, a document OCR model that reads image patches
//! with a Florence-2 vision front end and decodes text with GPT-2.
//!
//! [`DTrOCRConfig`] is the hyperparameter record; [`Gpt2DecoderConfig`] and
//! [`VisionEncoderConfig`] are the views model assembly builds from it.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod hf_config;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{AttnImplementation, DTrOCRConfig};
pub use decoder::Gpt2DecoderConfig;
pub use encoder::VisionEncoderConfig;
pub use error::ConfigError;
pub use hf_config::ModelConfig;
