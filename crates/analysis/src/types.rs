use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Polarity class of a sentiment label.
///
/// Providers report free-form labels; the three known classes are recognized once, when a
/// [`SentimentPrediction`] is constructed, so later comparisons never touch raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Negative,
    Positive,
    Neutral,
}

impl Polarity {
    /// Recognize `NEG`/`NEGATIVE`, `POS`/`POSITIVE`, `NEU`/`NEUTRAL` (any case).
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("neg") || label.eq_ignore_ascii_case("negative") {
            Some(Self::Negative)
        } else if label.eq_ignore_ascii_case("pos") || label.eq_ignore_ascii_case("positive") {
            Some(Self::Positive)
        } else if label.eq_ignore_ascii_case("neu") || label.eq_ignore_ascii_case("neutral") {
            Some(Self::Neutral)
        } else {
            None
        }
    }

    /// Tie-break rank: lower wins. Negative evidence is surfaced first.
    pub const fn priority(self) -> u8 {
        match self {
            Self::Negative => 0,
            Self::Positive => 1,
            Self::Neutral => 2,
        }
    }

    /// Short canonical label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "NEG",
            Self::Positive => "POS",
            Self::Neutral => "NEU",
        }
    }
}

/// Rank used for labels outside the known polarity classes.
pub const UNRECOGNIZED_PRIORITY: u8 = 3;

/// Top class of a sentiment classifier together with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SentimentWire", into = "SentimentWire")]
pub struct SentimentPrediction {
    label: String,
    score: f32,
    polarity: Option<Polarity>,
}

#[derive(Serialize, Deserialize)]
struct SentimentWire {
    label: String,
    score: f32,
}

impl From<SentimentWire> for SentimentPrediction {
    fn from(wire: SentimentWire) -> Self {
        Self::new(wire.label, wire.score)
    }
}

impl From<SentimentPrediction> for SentimentWire {
    fn from(prediction: SentimentPrediction) -> Self {
        Self {
            label: prediction.label,
            score: prediction.score,
        }
    }
}

impl SentimentPrediction {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        let label = label.into();
        let polarity = Polarity::from_label(&label);
        Self {
            label,
            score,
            polarity,
        }
    }

    /// `NEU` with zero confidence; returned when no aspect carries usable evidence.
    pub fn neutral_default() -> Self {
        Self::new(Polarity::Neutral.as_str(), 0.0)
    }

    /// Provider label, untouched.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub const fn score(&self) -> f32 {
        self.score
    }

    /// Recognized polarity, `None` for labels outside NEG/POS/NEU.
    pub const fn polarity(&self) -> Option<Polarity> {
        self.polarity
    }

    pub fn is_negative(&self) -> bool {
        self.polarity == Some(Polarity::Negative)
    }

    pub fn is_positive(&self) -> bool {
        self.polarity == Some(Polarity::Positive)
    }

    pub fn priority(&self) -> u8 {
        self.polarity.map_or(UNRECOGNIZED_PRIORITY, Polarity::priority)
    }
}

impl fmt::Display for SentimentPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:.2}", self.label, self.score)
    }
}

/// Sentiment state of a detected aspect.
///
/// `Absent` is the state between selection and scoring; it is distinct from an aspect that was
/// scored as neutral.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    from = "Option<SentimentPrediction>",
    into = "Option<SentimentPrediction>"
)]
pub enum AspectSentiment {
    #[default]
    Absent,
    Scored(SentimentPrediction),
}

impl AspectSentiment {
    pub const fn as_scored(&self) -> Option<&SentimentPrediction> {
        match self {
            Self::Absent => None,
            Self::Scored(sentiment) => Some(sentiment),
        }
    }
}

impl From<Option<SentimentPrediction>> for AspectSentiment {
    fn from(value: Option<SentimentPrediction>) -> Self {
        value.map_or(Self::Absent, Self::Scored)
    }
}

impl From<AspectSentiment> for Option<SentimentPrediction> {
    fn from(value: AspectSentiment) -> Self {
        match value {
            AspectSentiment::Absent => None,
            AspectSentiment::Scored(sentiment) => Some(sentiment),
        }
    }
}

/// A detected aspect with its detection probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectPrediction {
    pub label: String,
    pub score: f32,
    #[serde(default)]
    pub sentiment: AspectSentiment,
}

impl AspectPrediction {
    /// Freshly selected aspect, not yet scored.
    pub fn detected(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
            sentiment: AspectSentiment::Absent,
        }
    }

    /// New prediction carrying `sentiment`; `self` is left as it was.
    #[must_use]
    pub fn with_sentiment(&self, sentiment: SentimentPrediction) -> Self {
        Self {
            label: self.label.clone(),
            score: self.score,
            sentiment: AspectSentiment::Scored(sentiment),
        }
    }

    pub const fn sentiment(&self) -> Option<&SentimentPrediction> {
        self.sentiment.as_scored()
    }
}

/// Per-label aspect probabilities in the provider's label order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AspectScores(Vec<(String, f32)>);

impl AspectScores {
    pub fn new(scores: Vec<(String, f32)>) -> Self {
        Self(scores)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(label, score)| (label.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<f32> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == label)
            .map(|(_, score)| *score)
    }
}

impl<S: Into<String>> FromIterator<(S, f32)> for AspectScores {
    fn from_iter<T: IntoIterator<Item = (S, f32)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(label, score)| (label.into(), score))
                .collect(),
        )
    }
}

/// Outcome of analyzing one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub text: String,
    /// Sorted by detection score, highest first.
    pub aspects: Vec<AspectPrediction>,
    /// Aggregated overall verdict.
    pub sentiment: SentimentPrediction,
}

/// Descending order on scores; NaN sorts last.
pub(crate) fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}
