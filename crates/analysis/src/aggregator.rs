use crate::types::{descending, AspectPrediction, SentimentPrediction};

/// Combines aspect-level sentiments with the whole-text sentiment into one verdict.
pub struct SentimentAggregator;

impl SentimentAggregator {
    /// Overall sentiment for a text.
    ///
    /// - no aspects: `global`, unchanged
    /// - aspects but none scored: `NEU` with zero confidence
    /// - otherwise the aspect-derived sentiment when its confidence is at least the global
    ///   confidence, else `global`
    pub fn aggregate(
        aspects: &[AspectPrediction],
        global: &SentimentPrediction,
    ) -> SentimentPrediction {
        if aspects.is_empty() {
            return global.clone();
        }

        let Some(derived) = Self::aspect_derived(aspects) else {
            return SentimentPrediction::neutral_default();
        };

        if derived.score() >= global.score() {
            log::debug!("aspect-derived {derived} preferred over global {global}");
            derived
        } else {
            log::debug!("global {global} preferred over aspect-derived {derived}");
            global.clone()
        }
    }

    /// Sentiment of the strongest scored aspect.
    ///
    /// Strength is `aspect.score * sentiment.score`. Equal weights are ordered by polarity
    /// priority (NEG, POS, NEU, then unrecognized labels) and finally by detection order.
    /// The winner's label and confidence are returned verbatim, not the weight.
    pub fn aspect_derived(aspects: &[AspectPrediction]) -> Option<SentimentPrediction> {
        let mut weighted: Vec<(usize, f32, &SentimentPrediction)> = aspects
            .iter()
            .enumerate()
            .filter_map(|(idx, aspect)| {
                aspect
                    .sentiment()
                    .map(|sentiment| (idx, aspect.score * sentiment.score(), sentiment))
            })
            .collect();

        weighted.sort_by(|a, b| {
            descending(a.1, b.1)
                .then_with(|| a.2.priority().cmp(&b.2.priority()))
                .then_with(|| a.0.cmp(&b.0))
        });

        weighted.first().map(|(_, _, sentiment)| (*sentiment).clone())
    }
}
