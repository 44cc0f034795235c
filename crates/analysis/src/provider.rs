use crate::error::Result;
use crate::types::{AspectScores, SentimentPrediction};
use async_trait::async_trait;

/// Pretrained-model inference consumed by the analysis pipeline.
///
/// Implementations own tokenization, the forward pass and label-id mapping. Errors are returned
/// as-is; the pipeline never substitutes a fallback prediction.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Independent per-label aspect probabilities, in the provider's label order.
    async fn predict_aspect_scores(&self, text: &str) -> Result<AspectScores>;

    /// Top sentiment class for `text`, optionally conditioned on an aspect label.
    async fn predict_sentiment(&self, text: &str, aspect: Option<&str>)
        -> Result<SentimentPrediction>;
}
