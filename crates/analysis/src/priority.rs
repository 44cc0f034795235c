use crate::types::{AnalysisResult, Polarity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Weight of the negativity ratio in the priority score
pub const NEG_RATIO_WEIGHT: f64 = 0.7;
/// Weight of the relative mention volume in the priority score
pub const VOLUME_WEIGHT: f64 = 0.3;

/// One aspect mention flattened out of a corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct AspectMention {
    pub aspect: String,
    pub polarity: Option<Polarity>,
    /// Sentiment confidence; `None` counts as 0 in averages
    pub sentiment_score: Option<f32>,
}

/// Per-aspect corpus statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectStatistics {
    pub aspect: String,
    pub mentions: usize,
    pub neg: usize,
    pub pos: usize,
    pub avg_score: f64,
    pub neg_ratio: f64,
    pub pos_ratio: f64,
    pub priority_score: f64,
}

impl AspectStatistics {
    pub fn severity(&self) -> Severity {
        Severity::from_neg_ratio(self.neg_ratio)
    }
}

/// Display tier of an aspect's negativity ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_neg_ratio(neg_ratio: f64) -> Self {
        if neg_ratio >= 0.6 {
            Self::Critical
        } else if neg_ratio >= 0.4 {
            Self::High
        } else if neg_ratio >= 0.25 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranking requested from [`PriorityScorer::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    /// Most urgent first: `priority_score` descending
    Priority,
    /// Strongest praise first: `pos_ratio` then `mentions`, descending
    Opportunity,
}

/// Corpus-level aspect statistics and rankings.
pub struct PriorityScorer;

impl PriorityScorer {
    /// Statistics for every aspect mentioned anywhere in `corpus`, keyed by aspect label.
    pub fn compute_statistics(corpus: &[AnalysisResult]) -> BTreeMap<String, AspectStatistics> {
        Self::compute_statistics_from_mentions(corpus.iter().flat_map(|result| {
            result.aspects.iter().map(|aspect| {
                let sentiment = aspect.sentiment();
                AspectMention {
                    aspect: aspect.label.clone(),
                    polarity: sentiment.and_then(|s| s.polarity()),
                    sentiment_score: sentiment.map(|s| s.score()),
                }
            })
        }))
    }

    pub fn compute_statistics_from_mentions<I>(mentions: I) -> BTreeMap<String, AspectStatistics>
    where
        I: IntoIterator<Item = AspectMention>,
    {
        #[derive(Default)]
        struct Tally {
            mentions: usize,
            neg: usize,
            pos: usize,
            score_sum: f64,
        }

        let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
        for mention in mentions {
            let tally = tallies.entry(mention.aspect).or_default();
            tally.mentions += 1;
            match mention.polarity {
                Some(Polarity::Negative) => tally.neg += 1,
                Some(Polarity::Positive) => tally.pos += 1,
                _ => {}
            }
            tally.score_sum += f64::from(mention.sentiment_score.unwrap_or(0.0));
        }

        let max_mentions = tallies.values().map(|t| t.mentions).max().unwrap_or(0);

        tallies
            .into_iter()
            .filter(|(_, tally)| tally.mentions > 0)
            .map(|(aspect, tally)| {
                let mentions = tally.mentions as f64;
                let neg_ratio = tally.neg as f64 / mentions;
                let pos_ratio = tally.pos as f64 / mentions;
                let stats = AspectStatistics {
                    aspect: aspect.clone(),
                    mentions: tally.mentions,
                    neg: tally.neg,
                    pos: tally.pos,
                    avg_score: tally.score_sum / mentions,
                    neg_ratio,
                    pos_ratio,
                    priority_score: priority_score(neg_ratio, tally.mentions, max_mentions),
                };
                (aspect, stats)
            })
            .collect()
    }

    /// Entries with at least `min_mentions` mentions, ordered per `by`, at most `top_n` long.
    ///
    /// Equal keys keep aspect-label order.
    pub fn rank(
        stats: &BTreeMap<String, AspectStatistics>,
        min_mentions: usize,
        top_n: usize,
        by: RankBy,
    ) -> Vec<AspectStatistics> {
        let mut ranked: Vec<AspectStatistics> = Self::filter(stats, min_mentions);

        match by {
            RankBy::Priority => {
                ranked.sort_by(|a, b| descending_f64(a.priority_score, b.priority_score));
            }
            RankBy::Opportunity => {
                ranked.sort_by(|a, b| {
                    descending_f64(a.pos_ratio, b.pos_ratio)
                        .then_with(|| b.mentions.cmp(&a.mentions))
                });
            }
        }

        ranked.truncate(top_n);
        ranked
    }

    /// Entries with at least `min_mentions` mentions, in aspect-label order.
    pub fn filter(
        stats: &BTreeMap<String, AspectStatistics>,
        min_mentions: usize,
    ) -> Vec<AspectStatistics> {
        stats
            .values()
            .filter(|s| s.mentions >= min_mentions)
            .cloned()
            .collect()
    }
}

/// `0.7 * neg_ratio + 0.3 * (mentions / max_mentions)`, or `neg_ratio` for an empty corpus.
pub fn priority_score(neg_ratio: f64, mentions: usize, max_mentions: usize) -> f64 {
    if max_mentions == 0 {
        return neg_ratio;
    }
    NEG_RATIO_WEIGHT * neg_ratio + VOLUME_WEIGHT * (mentions as f64 / max_mentions as f64)
}

fn descending_f64(a: f64, b: f64) -> std::cmp::Ordering {
    b.total_cmp(&a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AspectPrediction, SentimentPrediction};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn mention(aspect: &str, label: Option<&str>, score: Option<f32>) -> AspectMention {
        AspectMention {
            aspect: aspect.to_string(),
            polarity: label.and_then(Polarity::from_label),
            sentiment_score: score,
        }
    }

    fn result_with(aspects: &[(&str, &str)]) -> AnalysisResult {
        AnalysisResult {
            text: String::new(),
            aspects: aspects
                .iter()
                .map(|(label, sentiment)| {
                    AspectPrediction::detected(*label, 0.9)
                        .with_sentiment(SentimentPrediction::new(*sentiment, 0.8))
                })
                .collect(),
            sentiment: SentimentPrediction::new("NEU", 0.5),
        }
    }

    #[test]
    fn severity_boundaries() {
        assert_eq!(Severity::from_neg_ratio(0.6), Severity::Critical);
        assert_eq!(Severity::from_neg_ratio(0.599_999), Severity::High);
        assert_eq!(Severity::from_neg_ratio(0.4), Severity::High);
        assert_eq!(Severity::from_neg_ratio(0.25), Severity::Medium);
        assert_eq!(Severity::from_neg_ratio(0.24), Severity::Low);
        assert_eq!(Severity::from_neg_ratio(0.0), Severity::Low);
    }

    #[test]
    fn priority_is_maximal_for_all_negative_top_aspect() {
        assert!((priority_score(1.0, 7, 7) - 1.0).abs() < 1e-12);
        assert!((priority_score(0.5, 0, 0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn battery_corpus_scenario() {
        let mut corpus = vec![
            result_with(&[("BATTERY", "NEG"), ("PRICE", "POS")]),
            result_with(&[("BATTERY", "NEG")]),
            result_with(&[("BATTERY", "NEG"), ("CAMERA", "POS")]),
            result_with(&[("BATTERY", "POS"), ("PRICE", "NEU")]),
        ];
        for _ in 0..6 {
            corpus.push(result_with(&[]));
        }

        let stats = PriorityScorer::compute_statistics(&corpus);
        let battery = &stats["BATTERY"];
        assert_eq!(battery.mentions, 4);
        assert_eq!(battery.neg, 3);
        assert_eq!(battery.pos, 1);
        assert!((battery.neg_ratio - 0.75).abs() < 1e-12);
        assert_eq!(battery.severity(), Severity::Critical);
        assert!((battery.priority_score - 0.825).abs() < 1e-9);

        let price = &stats["PRICE"];
        assert!((price.priority_score - 0.15).abs() < 1e-9);
    }

    #[test]
    fn avg_score_counts_missing_as_zero() {
        let stats = PriorityScorer::compute_statistics_from_mentions(vec![
            mention("SCREEN", Some("negative"), Some(0.8)),
            mention("SCREEN", None, None),
        ]);
        let screen = &stats["SCREEN"];
        assert_eq!(screen.mentions, 2);
        assert_eq!(screen.neg, 1);
        assert!((screen.avg_score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn rankings_filter_and_truncate() {
        let mentions = vec![
            mention("PRICE", Some("POS"), Some(0.9)),
            mention("PRICE", Some("POS"), Some(0.9)),
            mention("PRICE", Some("NEG"), Some(0.9)),
            mention("BATTERY", Some("NEG"), Some(0.9)),
            mention("BATTERY", Some("NEG"), Some(0.9)),
            mention("CAMERA", Some("POS"), Some(0.9)),
            mention("CAMERA", Some("POS"), Some(0.9)),
            mention("DESIGN", Some("POS"), Some(0.9)),
        ];
        let stats = PriorityScorer::compute_statistics_from_mentions(mentions);

        let urgent = PriorityScorer::rank(&stats, 2, 2, RankBy::Priority);
        let urgent: Vec<&str> = urgent.iter().map(|s| s.aspect.as_str()).collect();
        assert_eq!(urgent, vec!["BATTERY", "PRICE"]);

        let opportunity = PriorityScorer::rank(&stats, 1, 3, RankBy::Opportunity);
        let opportunity: Vec<&str> = opportunity.iter().map(|s| s.aspect.as_str()).collect();
        assert_eq!(opportunity, vec!["CAMERA", "DESIGN", "PRICE"]);
    }

    #[test]
    fn empty_inputs_rank_to_nothing() {
        let stats = PriorityScorer::compute_statistics(&[]);
        assert!(stats.is_empty());
        assert!(PriorityScorer::rank(&stats, 1, 5, RankBy::Priority).is_empty());

        let stats = PriorityScorer::compute_statistics_from_mentions(vec![mention(
            "PRICE",
            Some("NEG"),
            Some(0.5),
        )]);
        assert!(PriorityScorer::rank(&stats, 2, 5, RankBy::Opportunity).is_empty());
    }

    proptest! {
        #[test]
        fn proptest_severity_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(Severity::from_neg_ratio(lo) <= Severity::from_neg_ratio(hi));
        }

        #[test]
        fn proptest_ratios_stay_in_unit_range(
            labels in proptest::collection::vec(0usize..4, 1..40),
        ) {
            let names = [Some("NEG"), Some("POS"), Some("NEU"), None];
            let mentions = labels
                .iter()
                .enumerate()
                .map(|(idx, l)| {
                    let aspect = if idx % 2 == 0 { "A" } else { "B" };
                    mention(aspect, names[*l], Some(0.5))
                });
            let stats = PriorityScorer::compute_statistics_from_mentions(mentions);
            for s in stats.values() {
                prop_assert!(s.neg + s.pos <= s.mentions);
                prop_assert!((0.0..=1.0).contains(&s.neg_ratio));
                prop_assert!((0.0..=1.0).contains(&s.pos_ratio));
                prop_assert!((0.0..=1.0 + 1e-12).contains(&s.priority_score));
            }
        }
    }
}
