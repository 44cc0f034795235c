use crate::report::BatchRecord;
use crate::types::Polarity;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PolarityCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    /// Labels outside NEG/POS/NEU
    pub other: usize,
}

impl PolarityCounts {
    fn record(&mut self, polarity: Option<Polarity>) {
        match polarity {
            Some(Polarity::Positive) => self.positive += 1,
            Some(Polarity::Neutral) => self.neutral += 1,
            Some(Polarity::Negative) => self.negative += 1,
            None => self.other += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AspectCount {
    pub aspect: String,
    pub count: usize,
}

/// Corpus-wide sentiment and aspect distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusOverview {
    pub total: usize,
    pub sentiment: PolarityCounts,
    /// Most mentioned first, ties by aspect label
    pub aspects: Vec<AspectCount>,
    /// aspect → sentiment label → mentions; unscored aspects count as `NEU`
    pub breakdown: BTreeMap<String, BTreeMap<String, usize>>,
}

impl CorpusOverview {
    pub fn from_records(records: &[BatchRecord]) -> Self {
        let mut sentiment = PolarityCounts::default();
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut breakdown: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();

        for record in records {
            sentiment.record(Polarity::from_label(&record.sentiment_label));
            for detail in &record.aspects_detail {
                *counts.entry(detail.aspect.as_str()).or_default() += 1;
                let label = detail
                    .sentiment
                    .clone()
                    .unwrap_or_else(|| Polarity::Neutral.as_str().to_string());
                *breakdown
                    .entry(detail.aspect.clone())
                    .or_default()
                    .entry(label)
                    .or_default() += 1;
            }
        }

        let mut aspects: Vec<AspectCount> = counts
            .into_iter()
            .map(|(aspect, count)| AspectCount {
                aspect: aspect.to_string(),
                count,
            })
            .collect();
        aspects.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            total: records.len(),
            sentiment,
            aspects,
            breakdown,
        }
    }
}
