use crate::error::Result;
use crate::provider::InferenceProvider;
use crate::types::{AspectPrediction, SentimentPrediction};

/// Requests aspect-conditioned sentiment for detected aspects.
pub struct AspectSentimentScorer<'a, P: InferenceProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: InferenceProvider + ?Sized> AspectSentimentScorer<'a, P> {
    pub const fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Sentiment of `text` conditioned on `aspect`. Provider failures are returned unchanged.
    pub async fn score(
        &self,
        text: &str,
        aspect: &AspectPrediction,
    ) -> Result<SentimentPrediction> {
        self.provider
            .predict_sentiment(text, Some(aspect.label.as_str()))
            .await
    }

    /// Score every aspect, one independent provider call each, preserving order.
    pub async fn score_all(
        &self,
        text: &str,
        aspects: &[AspectPrediction],
    ) -> Result<Vec<AspectPrediction>> {
        let mut scored = Vec::with_capacity(aspects.len());
        for aspect in aspects {
            let sentiment = self.score(text, aspect).await?;
            log::debug!("aspect {} -> {sentiment}", aspect.label);
            scored.push(aspect.with_sentiment(sentiment));
        }
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::types::AspectScores;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<Option<String>>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl InferenceProvider for RecordingProvider {
        async fn predict_aspect_scores(&self, _text: &str) -> Result<AspectScores> {
            Ok(AspectScores::default())
        }

        async fn predict_sentiment(
            &self,
            _text: &str,
            aspect: Option<&str>,
        ) -> Result<SentimentPrediction> {
            self.calls
                .lock()
                .unwrap()
                .push(aspect.map(ToString::to_string));
            if aspect == self.fail_on {
                return Err(AnalysisError::inference("model unavailable"));
            }
            Ok(SentimentPrediction::new("POS", 0.7))
        }
    }

    #[tokio::test]
    async fn scores_each_aspect_with_its_label() {
        let provider = RecordingProvider::default();
        let scorer = AspectSentimentScorer::new(&provider);
        let aspects = vec![
            AspectPrediction::detected("PRICE", 0.8),
            AspectPrediction::detected("BATTERY", 0.6),
        ];

        let scored = scorer.score_all("text", &aspects).await.unwrap();

        assert_eq!(scored.len(), 2);
        assert!(scored.iter().all(|a| a.sentiment().is_some()));
        assert_eq!(scored[0].label, "PRICE");
        assert_eq!(
            *provider.calls.lock().unwrap(),
            vec![Some("PRICE".to_string()), Some("BATTERY".to_string())]
        );
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = RecordingProvider {
            fail_on: Some("BATTERY"),
            ..RecordingProvider::default()
        };
        let scorer = AspectSentimentScorer::new(&provider);
        let aspects = vec![
            AspectPrediction::detected("PRICE", 0.8),
            AspectPrediction::detected("BATTERY", 0.6),
        ];

        let err = scorer.score_all("text", &aspects).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Inference(_)));
    }
}
