//! # ABSA Analysis
//!
//! Aspect-based sentiment analysis core: turns raw classifier outputs into per-aspect verdicts,
//! one overall sentiment per text, and corpus-level priorities.
//!
//! ## Pipeline
//!
//! ```text
//! text
//!   │
//!   ├──> InferenceProvider::predict_aspect_scores
//!   │      └─> AspectSelector (threshold, sorted desc)
//!   │
//!   ├──> InferenceProvider::predict_sentiment(text, None)        global
//!   ├──> AspectSentimentScorer                                    one call per aspect
//!   │
//!   └──> SentimentAggregator ──> AnalysisResult
//!
//! AnalysisResult[] ──> PriorityScorer ──> ActionCenter
//! ```
//!
//! Inference itself lives behind [`InferenceProvider`]; this crate never loads a model.
//!
//! ## Example
//!
//! ```no_run
//! use absa_analysis::{AnalysisConfig, Analyzer, InferenceProvider};
//! use std::sync::Arc;
//!
//! async fn run(provider: Arc<dyn InferenceProvider>) -> absa_analysis::Result<()> {
//!     let analyzer = Analyzer::new(provider, AnalysisConfig::default());
//!     let result = analyzer.analyze_text("Giá rẻ nhưng pin yếu").await?;
//!     for aspect in &result.aspects {
//!         println!("{} {:.2}", aspect.label, aspect.score);
//!     }
//!     Ok(())
//! }
//! ```

mod actions;
mod aggregator;
mod analyzer;
mod config;
mod error;
mod overview;
mod priority;
mod provider;
mod report;
mod scorer;
mod selector;
mod types;

pub use actions::{
    default_min_mentions, default_top_n, ActionCenter, ActionItem, Focus, OwnerMap,
    ResolvedFilters, UrgentAspect, DEFAULT_OWNER,
};
pub use aggregator::SentimentAggregator;
pub use analyzer::Analyzer;
pub use config::{
    AbsaProfile, ActionCenterConfig, AnalysisConfig, AspectThreshold, DEFAULT_ASPECT_THRESHOLD,
    DEFAULT_TEXT_COLUMN, MAX_ASPECT_THRESHOLD, MIN_ASPECT_THRESHOLD,
};
pub use error::{AnalysisError, Result};
pub use overview::{AspectCount, CorpusOverview, PolarityCounts};
pub use priority::{
    priority_score, AspectMention, AspectStatistics, PriorityScorer, RankBy, Severity,
};
pub use provider::InferenceProvider;
pub use report::{
    example_complaint, format_aspects_display, mentions_from_records, read_text_column,
    write_priority_csv, AspectDetail, BatchCsv, BatchRecord,
};
pub use scorer::AspectSentimentScorer;
pub use selector::AspectSelector;
pub use types::{
    AnalysisResult, AspectPrediction, AspectScores, AspectSentiment, Polarity,
    SentimentPrediction, UNRECOGNIZED_PRIORITY,
};
