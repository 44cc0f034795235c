//! # ABSA Inference
//!
//! [`InferenceProvider`](absa_analysis::InferenceProvider) implementations backed by two
//! fine-tuned sequence classifiers exported to ONNX:
//!
//! ```text
//! <model_dir>/
//!   aspect/     model.onnx, tokenizer.json, labels.json | config.json   (multi-label, sigmoid)
//!   sentiment/  model.onnx, tokenizer.json, labels.json | config.json   (softmax, argmax)
//! ```
//!
//! `ABSA_INFERENCE_MODE=stub` swaps both heads for deterministic hash-based logits, which is
//! what the test suites run against.

mod activation;
mod backend;
mod error;
mod labels;
mod paths;
mod service;
mod stub;

pub use activation::{all_finite, argmax, sigmoid, softmax};
pub use backend::{OrtClassifier, MAX_SEQUENCE_LENGTH, MODEL_FILE, TOKENIZER_FILE};
pub use error::{InferenceError, Result};
pub use labels::{LabelMap, CONFIG_FILE, LABELS_FILE};
pub use paths::{
    find_models_upwards, model_dir, ASPECT_MODEL_DIR, MODEL_DIR_ENV, SENTIMENT_MODEL_DIR,
};
pub use service::{enrich, AbsaService, InferenceMode, ServiceDescription, INFERENCE_MODE_ENV};
pub use stub::{StubClassifier, STUB_ASPECT_LABELS, STUB_SENTIMENT_LABELS};
