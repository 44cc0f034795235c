use crate::aggregator::SentimentAggregator;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::provider::InferenceProvider;
use crate::scorer::AspectSentimentScorer;
use crate::selector::AspectSelector;
use crate::types::AnalysisResult;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs the per-text pipeline: selection → aspect scoring → aggregation.
pub struct Analyzer<P: InferenceProvider + ?Sized> {
    provider: Arc<P>,
    config: AnalysisConfig,
}

impl<P: InferenceProvider + ?Sized> Clone for Analyzer<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            config: self.config,
        }
    }
}

impl<P: InferenceProvider + ?Sized> Analyzer<P> {
    pub fn new(provider: Arc<P>, config: AnalysisConfig) -> Self {
        Self { provider, config }
    }

    pub const fn config(&self) -> AnalysisConfig {
        self.config
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Analyze one text against this analyzer's configuration.
    pub async fn analyze_text(&self, text: &str) -> Result<AnalysisResult> {
        analyze_one(self.provider.as_ref(), text, self.config).await
    }
}

impl<P: InferenceProvider + ?Sized + 'static> Analyzer<P> {
    /// Analyze many texts, one result per input, in input order.
    ///
    /// Missing rows (`None`) are analyzed as empty strings. Up to `config.workers` texts are in
    /// flight at once. Per-row provider failures are returned, not skipped.
    pub async fn analyze_batch<I>(&self, rows: I) -> Vec<Result<AnalysisResult>>
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let started = Instant::now();
        let texts: Vec<String> = rows.into_iter().map(Option::unwrap_or_default).collect();
        let total = texts.len();
        let permits = Arc::new(Semaphore::new(self.config.workers.max(1)));

        let mut tasks = JoinSet::new();
        for (idx, text) in texts.into_iter().enumerate() {
            let provider = self.provider.clone();
            let config = self.config;
            let permits = permits.clone();
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => analyze_one(provider.as_ref(), &text, config).await,
                    Err(err) => Err(AnalysisError::Other(format!("worker pool closed: {err}"))),
                };
                (idx, result)
            });
        }

        let mut slots: Vec<Option<Result<AnalysisResult>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    if let Some(slot) = slots.get_mut(idx) {
                        *slot = Some(result);
                    }
                }
                Err(err) => log::error!("analysis task failed to join: {err}"),
            }
        }

        let results: Vec<Result<AnalysisResult>> = slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| Err(AnalysisError::Other("analysis task aborted".into())))
            })
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        log::info!(
            "Analyzed {total} texts ({failed} failed) in {} ms with {} worker(s)",
            started.elapsed().as_millis(),
            self.config.workers.max(1)
        );
        results
    }
}

async fn analyze_one<P: InferenceProvider + ?Sized>(
    provider: &P,
    text: &str,
    config: AnalysisConfig,
) -> Result<AnalysisResult> {
    let threshold = config.aspect_threshold.value();

    let scores = provider.predict_aspect_scores(text).await?;
    let detected = AspectSelector::select(&scores, threshold);
    log::debug!(
        "{} of {} aspects at threshold {threshold:.2}",
        detected.len(),
        scores.len()
    );

    let global = provider.predict_sentiment(text, None).await?;
    let aspects = AspectSentimentScorer::new(provider)
        .score_all(text, &detected)
        .await?;
    let sentiment = SentimentAggregator::aggregate(&aspects, &global);

    Ok(AnalysisResult {
        text: text.to_string(),
        aspects,
        sentiment,
    })
}
