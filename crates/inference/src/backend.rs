use crate::error::{InferenceError, Result};
use crate::labels::LabelMap;
use ndarray::{Array, Dimension, Ix2};
use ort::session::{builder::GraphOptimizationLevel, Input, Session, SessionInputs};
use ort::tensor::TensorElementType;
use ort::value::{DynTensor, Tensor, ValueType};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const MAX_SEQUENCE_LENGTH: usize = 256;

/// One sequence-classification head exported to ONNX, with its tokenizer and labels.
pub struct OrtClassifier {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: LabelMap,
    max_length: usize,
    model_path: PathBuf,
}

impl OrtClassifier {
    pub fn load(model_dir: &Path) -> Result<Self> {
        if !model_dir.is_dir() {
            return Err(InferenceError::ModelNotFound(format!(
                "Model directory {} does not exist (set ABSA_MODEL_DIR or use --model-dir)",
                model_dir.display()
            )));
        }
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        if !model_path.is_file() || !tokenizer_path.is_file() {
            return Err(InferenceError::ModelNotFound(format!(
                "Expected ONNX at {} and tokenizer at {}",
                model_path.display(),
                tokenizer_path.display()
            )));
        }

        let labels = LabelMap::load(model_dir)?;

        if !tokenizers::utils::parallelism::is_parallelism_configured() {
            tokenizers::utils::parallelism::set_parallelism(false);
        }
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            InferenceError::Tokenization(format!("Tokenizer load failed: {e}"))
        })?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..PaddingParams::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..TruncationParams::default()
            }))
            .map_err(|e| {
                InferenceError::Tokenization(format!("Tokenizer truncation failed: {e}"))
            })?;

        let session = Session::builder()
            .map_err(InferenceError::runtime)?
            .with_intra_threads(default_intra_threads())
            .map_err(|e| InferenceError::Runtime(format!("Failed to set ORT intra threads: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| {
                InferenceError::Runtime(format!("Failed to set optimization level: {e}"))
            })?
            .commit_from_file(&model_path)
            .map_err(|e| InferenceError::Runtime(format!("Failed to load ONNX model: {e}")))?;

        log::info!(
            "Loaded ONNX model {} ({} labels, max_length {})",
            model_path.display(),
            labels.class_count(),
            MAX_SEQUENCE_LENGTH
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            max_length: MAX_SEQUENCE_LENGTH,
            model_path,
        })
    }

    pub const fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Raw logits, one row per input, each as wide as the label map.
    pub fn logits_blocking(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let encodings = self
            .tokenizer
            .encode_batch(inputs.to_vec(), true)
            .map_err(|e| InferenceError::Tokenization(format!("Tokenization failed: {e}")))?;

        let seq_len = encodings.first().map_or(0, Encoding::len);
        if seq_len > self.max_length {
            return Err(InferenceError::Tokenization(format!(
                "Tokenized length {seq_len} exceeds max_length {}",
                self.max_length
            )));
        }
        if encodings.iter().any(|e| e.len() != seq_len) {
            return Err(InferenceError::Tokenization(
                "Inconsistent sequence lengths after padding".to_string(),
            ));
        }

        let (ids, masks, type_ids) = build_flat_tensors(&encodings, seq_len);
        let rows = encodings.len();
        let ids_array = Array::from_shape_vec((rows, seq_len), ids)
            .map_err(|e| InferenceError::Runtime(format!("IDs shape error: {e}")))?;
        let mask_array = Array::from_shape_vec((rows, seq_len), masks)
            .map_err(|e| InferenceError::Runtime(format!("Mask shape error: {e}")))?;
        let type_array = Array::from_shape_vec((rows, seq_len), type_ids)
            .map_err(|e| InferenceError::Runtime(format!("Types shape error: {e}")))?;
        let shape = ids_array.raw_dim().into_dyn();

        let mut available: HashMap<&str, DynTensor> = HashMap::new();
        available.insert(
            "input_ids",
            Tensor::from_array(ids_array.into_dyn())
                .map_err(InferenceError::runtime)?
                .upcast(),
        );
        available.insert(
            "attention_mask",
            Tensor::from_array(mask_array.into_dyn())
                .map_err(InferenceError::runtime)?
                .upcast(),
        );
        available.insert(
            "token_type_ids",
            Tensor::from_array(type_array.into_dyn())
                .map_err(InferenceError::runtime)?
                .upcast(),
        );

        let logits = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| InferenceError::Runtime("Failed to lock ONNX session".into()))?;

            let mut feed: HashMap<String, DynTensor> = HashMap::new();
            for input in &session.inputs {
                let tensor = match available.remove(input.name.as_str()) {
                    Some(tensor) => tensor,
                    None => zero_tensor(&shape, input)?,
                };
                feed.insert(input.name.clone(), tensor);
            }

            let outputs = session
                .run(SessionInputs::from(feed))
                .map_err(|e| InferenceError::Runtime(format!("ONNX forward failed: {e}")))?;
            if outputs.len() == 0 {
                return Err(InferenceError::Runtime("ONNX returned no outputs".into()));
            }
            let array = outputs[0]
                .try_extract_array::<f32>()
                .map_err(|e| InferenceError::Runtime(format!("Failed to decode ONNX output: {e}")))?
                .to_owned();

            drop(outputs);
            drop(session);
            array
        };

        let logits = logits
            .into_dimensionality::<Ix2>()
            .map_err(|e| InferenceError::Runtime(format!("Expected [batch, labels] logits: {e}")))?;
        let width = logits.ncols();
        if width != self.labels.class_count() {
            return Err(InferenceError::Runtime(format!(
                "{} emits {width} logits but {} labels are configured",
                self.model_path.display(),
                self.labels.class_count()
            )));
        }

        Ok(logits.outer_iter().map(|row| row.to_vec()).collect())
    }
}

fn default_intra_threads() -> usize {
    let cpus = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    if cpus <= 4 {
        1
    } else if cpus <= 12 {
        2
    } else {
        4
    }
}

fn build_flat_tensors(encodings: &[Encoding], seq_len: usize) -> (Vec<i64>, Vec<i64>, Vec<i64>) {
    let mut ids = Vec::with_capacity(encodings.len() * seq_len);
    let mut masks = Vec::with_capacity(encodings.len() * seq_len);
    let mut type_ids = Vec::with_capacity(encodings.len() * seq_len);

    for encoding in encodings {
        let (enc_ids, enc_masks, enc_types) = (
            encoding.get_ids(),
            encoding.get_attention_mask(),
            encoding.get_type_ids(),
        );
        for idx in 0..seq_len {
            ids.push(i64::from(enc_ids.get(idx).copied().unwrap_or(0)));
            masks.push(i64::from(enc_masks.get(idx).copied().unwrap_or(0)));
            type_ids.push(i64::from(enc_types.get(idx).copied().unwrap_or(0)));
        }
    }

    (ids, masks, type_ids)
}

/// Zero-filled tensor for a declared input the tokenizer does not produce.
fn zero_tensor(shape: &ndarray::IxDyn, input: &Input) -> Result<DynTensor> {
    let unsupported = |detail: String| {
        InferenceError::Runtime(format!("Unsupported ONNX input '{}': {detail}", input.name))
    };
    match &input.input_type {
        ValueType::Tensor { ty, .. } => match ty {
            TensorElementType::Int64 => Ok(Tensor::from_array(Array::<i64, _>::zeros(shape.clone()))
                .map_err(InferenceError::runtime)?
                .upcast()),
            TensorElementType::Bool => Ok(Tensor::from_array(Array::from_elem(shape.clone(), false))
                .map_err(InferenceError::runtime)?
                .upcast()),
            TensorElementType::Float32 => {
                Ok(Tensor::from_array(Array::<f32, _>::zeros(shape.clone()))
                    .map_err(InferenceError::runtime)?
                    .upcast())
            }
            other => Err(unsupported(format!("cannot zero-fill {other:?}"))),
        },
        other => Err(unsupported(format!("{other:?}"))),
    }
}
