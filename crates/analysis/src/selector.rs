use crate::types::{descending, AspectPrediction, AspectScores};

/// Threshold-gated selection over independent per-label aspect probabilities.
pub struct AspectSelector;

impl AspectSelector {
    /// Keep every label with `probability >= threshold`, highest probability first.
    ///
    /// The sort is stable, so exact ties keep the provider's label order. An empty result is a
    /// valid outcome.
    pub fn select(scores: &AspectScores, threshold: f32) -> Vec<AspectPrediction> {
        let mut selected: Vec<AspectPrediction> = scores
            .iter()
            .filter(|(_, score)| *score >= threshold)
            .map(|(label, score)| AspectPrediction::detected(label, score))
            .collect();

        selected.sort_by(|a, b| descending(a.score, b.score));
        selected
    }
}
