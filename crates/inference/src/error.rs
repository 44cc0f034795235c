use absa_analysis::AnalysisError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InferenceError>;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Label configuration error: {0}")]
    Labels(String),

    #[error("Tokenization error: {0}")]
    Tokenization(String),

    #[error("ONNX runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl InferenceError {
    pub fn runtime(error: impl std::fmt::Display) -> Self {
        Self::Runtime(error.to_string())
    }

    pub fn labels(msg: impl Into<String>) -> Self {
        Self::Labels(msg.into())
    }
}

impl From<InferenceError> for AnalysisError {
    fn from(error: InferenceError) -> Self {
        Self::Inference(error.to_string())
    }
}
