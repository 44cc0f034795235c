use crate::error::{AnalysisError, Result};
use crate::priority::{AspectMention, AspectStatistics};
use crate::types::{AnalysisResult, Polarity};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const SENTIMENT_LABEL: &str = "sentiment_label";
const SENTIMENT_SCORE: &str = "sentiment_score";
const ASPECTS_DISPLAY: &str = "aspects_display";
const ASPECTS_DETAIL: &str = "aspects_detail";
const RESULT_COLUMNS: [&str; 4] = [
    SENTIMENT_LABEL,
    SENTIMENT_SCORE,
    ASPECTS_DISPLAY,
    ASPECTS_DETAIL,
];

/// Flat view of one detected aspect, as stored in the batch report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectDetail {
    pub aspect: String,
    pub aspect_score: f32,
    pub sentiment: Option<String>,
    pub sentiment_score: Option<f32>,
}

impl AspectDetail {
    pub fn polarity(&self) -> Option<Polarity> {
        self.sentiment.as_deref().and_then(Polarity::from_label)
    }
}

/// One row of the batch report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub original_text: String,
    pub sentiment_label: String,
    pub sentiment_score: f32,
    pub aspects_display: String,
    pub aspects_detail: Vec<AspectDetail>,
}

impl BatchRecord {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let aspects_detail: Vec<AspectDetail> = result
            .aspects
            .iter()
            .map(|aspect| AspectDetail {
                aspect: aspect.label.clone(),
                aspect_score: aspect.score,
                sentiment: aspect.sentiment().map(|s| s.label().to_string()),
                sentiment_score: aspect.sentiment().map(|s| s.score()),
            })
            .collect();

        Self {
            original_text: result.text.clone(),
            sentiment_label: result.sentiment.label().to_string(),
            sentiment_score: result.sentiment.score(),
            aspects_display: format_aspects_display(&aspects_detail),
            aspects_detail,
        }
    }

    pub fn mentions(&self) -> impl Iterator<Item = AspectMention> + '_ {
        self.aspects_detail.iter().map(|detail| AspectMention {
            aspect: detail.aspect.clone(),
            polarity: detail.polarity(),
            sentiment_score: detail.sentiment_score,
        })
    }

    pub fn has_negative_aspect(&self) -> bool {
        self.aspects_detail
            .iter()
            .any(|detail| detail.polarity() == Some(Polarity::Negative))
    }
}

/// `"PRICE (POS, 0.90); BATTERY (NEG, 0.85)"`, or `"-"` without aspects.
pub fn format_aspects_display(details: &[AspectDetail]) -> String {
    if details.is_empty() {
        return "-".to_string();
    }
    details
        .iter()
        .map(|d| {
            format!(
                "{} ({}, {:.2})",
                d.aspect,
                d.sentiment.as_deref().unwrap_or("-"),
                d.sentiment_score.unwrap_or(0.0)
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Flatten every record into per-aspect mentions.
pub fn mentions_from_records(records: &[BatchRecord]) -> Vec<AspectMention> {
    records.iter().flat_map(BatchRecord::mentions).collect()
}

/// Text of the first record carrying a negative aspect.
pub fn example_complaint(records: &[BatchRecord]) -> Option<&str> {
    records
        .iter()
        .find(|record| record.has_negative_aspect())
        .map(|record| record.original_text.as_str())
}

/// Reads a single text column out of an input CSV.
///
/// Missing cells and cells that are not valid UTF-8 come back as `None`; the caller decides
/// how to coerce them.
pub fn read_text_column<R: Read>(input: R, column: &str) -> Result<Vec<Option<String>>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let headers = reader.headers()?.clone();
    let idx = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| {
            AnalysisError::invalid_config(format!("Column '{column}' not found in input"))
        })?;

    let mut rows = Vec::new();
    for (row, record) in reader.byte_records().enumerate() {
        let record = record?;
        let cell = record.get(idx).and_then(|bytes| match std::str::from_utf8(bytes) {
            Ok(text) => Some(text.to_string()),
            Err(err) => {
                log::warn!("Row {}: '{column}' is not valid UTF-8 ({err})", row + 1);
                None
            }
        });
        rows.push(cell);
    }
    Ok(rows)
}

/// Batch report CSV codec. The text column header is configurable.
#[derive(Debug, Clone)]
pub struct BatchCsv {
    text_column: String,
}

impl BatchCsv {
    pub fn new(text_column: impl Into<String>) -> Self {
        Self {
            text_column: text_column.into(),
        }
    }

    pub fn text_column(&self) -> &str {
        &self.text_column
    }

    pub fn write<W: Write>(&self, output: W, records: &[BatchRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(output);
        let mut header = vec![self.text_column.as_str()];
        header.extend(RESULT_COLUMNS);
        writer.write_record(&header)?;

        for record in records {
            let detail = serde_json::to_string(&record.aspects_detail)?;
            let score = record.sentiment_score.to_string();
            writer.write_record([
                record.original_text.as_str(),
                record.sentiment_label.as_str(),
                score.as_str(),
                record.aspects_display.as_str(),
                detail.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a previously exported batch report.
    ///
    /// When the configured text column is absent, the first column that is not a result column
    /// holds the text.
    pub fn read<R: Read>(&self, input: R) -> Result<Vec<BatchRecord>> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
        let headers = reader.headers()?.clone();
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let text_idx = find(&self.text_column).or_else(|| {
            headers
                .iter()
                .position(|h| !RESULT_COLUMNS.contains(&h.trim()))
        });
        let label_idx = find(SENTIMENT_LABEL);
        let score_idx = find(SENTIMENT_SCORE);
        let display_idx = find(ASPECTS_DISPLAY);
        let detail_idx = find(ASPECTS_DETAIL).ok_or_else(|| {
            AnalysisError::invalid_config(format!(
                "Batch report has no '{ASPECTS_DETAIL}' column"
            ))
        })?;

        let mut records = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

            let detail_raw = cell(Some(detail_idx)).trim();
            let aspects_detail: Vec<AspectDetail> = if detail_raw.is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(detail_raw).map_err(|err| {
                    AnalysisError::Other(format!(
                        "Row {}: invalid {ASPECTS_DETAIL} cell: {err}",
                        row + 1
                    ))
                })?
            };
            let sentiment_score = cell(score_idx).trim().parse::<f32>().unwrap_or(0.0);
            let aspects_display = match cell(display_idx) {
                "" => format_aspects_display(&aspects_detail),
                display => display.to_string(),
            };

            records.push(BatchRecord {
                original_text: cell(text_idx).to_string(),
                sentiment_label: cell(label_idx).to_string(),
                sentiment_score,
                aspects_display,
                aspects_detail,
            });
        }
        Ok(records)
    }
}

/// Priority report: one row per aspect, statistics in column order.
pub fn write_priority_csv<W: Write>(output: W, stats: &[AspectStatistics]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    if stats.is_empty() {
        writer.write_record([
            "aspect",
            "mentions",
            "neg",
            "pos",
            "avg_score",
            "neg_ratio",
            "pos_ratio",
            "priority_score",
        ])?;
    }
    for row in stats {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
