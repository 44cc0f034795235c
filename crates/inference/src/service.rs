use crate::activation::{all_finite, argmax, sigmoid, softmax};
use crate::backend::OrtClassifier;
use crate::error::{InferenceError, Result};
use crate::labels::LabelMap;
use crate::paths::{model_dir, ASPECT_MODEL_DIR, SENTIMENT_MODEL_DIR};
use crate::stub::{StubClassifier, STUB_ASPECT_LABELS, STUB_SENTIMENT_LABELS};
use absa_analysis::{AspectScores, InferenceProvider, SentimentPrediction};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::spawn_blocking;

pub const INFERENCE_MODE_ENV: &str = "ABSA_INFERENCE_MODE";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    Onnx,
    Stub,
}

impl InferenceMode {
    pub fn from_env() -> Result<Self> {
        std::env::var(INFERENCE_MODE_ENV)
            .map_or(Ok(Self::Onnx), |raw| raw.parse())
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Onnx => "onnx",
            Self::Stub => "stub",
        }
    }
}

impl FromStr for InferenceMode {
    type Err = InferenceError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(Self::Onnx),
            "stub" => Ok(Self::Stub),
            other => Err(InferenceError::Other(format!(
                "Unsupported {INFERENCE_MODE_ENV} '{other}' (expected 'onnx' or 'stub')"
            ))),
        }
    }
}

impl fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
enum Head {
    Onnx(Arc<OrtClassifier>),
    Stub(StubClassifier),
}

impl Head {
    fn load(mode: InferenceMode, dir: &Path, name: &str, fallback: &[&str]) -> Result<Self> {
        match mode {
            InferenceMode::Onnx => Ok(Self::Onnx(Arc::new(OrtClassifier::load(dir)?))),
            InferenceMode::Stub => {
                let labels = if dir.is_dir() {
                    LabelMap::load(dir)?
                } else {
                    log::debug!("{} missing, stub {name} head uses built-in labels", dir.display());
                    LabelMap::from_names(fallback.iter().copied())
                };
                Ok(Self::Stub(StubClassifier::new(name, labels)))
            }
        }
    }

    fn labels(&self) -> &LabelMap {
        match self {
            Self::Onnx(classifier) => classifier.labels(),
            Self::Stub(classifier) => classifier.labels(),
        }
    }

    async fn logits(&self, input: String) -> Result<Vec<f32>> {
        match self {
            Self::Stub(classifier) => Ok(classifier.logits(&input)),
            Self::Onnx(classifier) => {
                let classifier = classifier.clone();
                let mut rows = spawn_blocking(move || classifier.logits_blocking(&[input]))
                    .await
                    .map_err(|e| {
                        InferenceError::Runtime(format!("Inference task panicked: {e}"))
                    })??;
                rows.pop()
                    .ok_or_else(|| InferenceError::Runtime("ONNX returned an empty batch".into()))
            }
        }
    }
}

/// Provider description reported by `doctor`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDescription {
    pub mode: InferenceMode,
    pub model_dir: PathBuf,
    pub aspect_labels: Vec<String>,
    pub sentiment_labels: Vec<String>,
}

/// Aspect detector plus aspect-conditioned sentiment classifier behind one provider.
#[derive(Clone)]
pub struct AbsaService {
    mode: InferenceMode,
    model_dir: PathBuf,
    aspect: Head,
    sentiment: Head,
}

impl AbsaService {
    /// Build with `ABSA_INFERENCE_MODE` and the resolved model directory.
    pub fn from_env() -> Result<Self> {
        Self::new(InferenceMode::from_env()?, model_dir())
    }

    pub fn new(mode: InferenceMode, model_dir: PathBuf) -> Result<Self> {
        if mode == InferenceMode::Onnx && !model_dir.is_dir() {
            return Err(InferenceError::ModelNotFound(format!(
                "Model directory {} does not exist (set ABSA_MODEL_DIR or use --model-dir)",
                model_dir.display()
            )));
        }
        let aspect = Head::load(
            mode,
            &model_dir.join(ASPECT_MODEL_DIR),
            ASPECT_MODEL_DIR,
            &STUB_ASPECT_LABELS,
        )?;
        let sentiment = Head::load(
            mode,
            &model_dir.join(SENTIMENT_MODEL_DIR),
            SENTIMENT_MODEL_DIR,
            &STUB_SENTIMENT_LABELS,
        )?;

        log::info!(
            "ABSA service ready: mode={mode}, models={}, {} aspect labels, {} sentiment labels",
            model_dir.display(),
            aspect.labels().class_count(),
            sentiment.labels().class_count()
        );

        Ok(Self {
            mode,
            model_dir,
            aspect,
            sentiment,
        })
    }

    pub const fn mode(&self) -> InferenceMode {
        self.mode
    }

    pub fn describe(&self) -> ServiceDescription {
        ServiceDescription {
            mode: self.mode,
            model_dir: self.model_dir.clone(),
            aspect_labels: self.aspect.labels().names(),
            sentiment_labels: self.sentiment.labels().names(),
        }
    }

    /// Per-label aspect probabilities (sigmoid over the multi-label head).
    pub async fn aspect_scores(&self, text: &str) -> Result<AspectScores> {
        let logits = self.aspect.logits(text.to_string()).await?;
        let labels = self.aspect.labels();
        Ok(aspect_probabilities(&logits)?
            .into_iter()
            .enumerate()
            .map(|(idx, prob)| (labels.label(idx), prob))
            .collect())
    }

    /// Top sentiment class; with an aspect the input is `"aspect: {aspect} text: {text}"`.
    pub async fn sentiment(&self, text: &str, aspect: Option<&str>) -> Result<SentimentPrediction> {
        let input = match aspect {
            Some(aspect) if !aspect.is_empty() => enrich(text, aspect),
            _ => text.to_string(),
        };
        let logits = self.sentiment.logits(input).await?;
        let (idx, score) = top_class(&logits)?;
        Ok(SentimentPrediction::new(self.sentiment.labels().label(idx), score))
    }
}

fn aspect_probabilities(logits: &[f32]) -> Result<Vec<f32>> {
    if !all_finite(logits) {
        return Err(InferenceError::runtime("Aspect model produced non-finite logits"));
    }
    Ok(sigmoid(logits))
}

fn top_class(logits: &[f32]) -> Result<(usize, f32)> {
    if logits.is_empty() {
        return Err(InferenceError::runtime("Sentiment model produced no classes"));
    }
    softmax(logits)
        .and_then(|probs| argmax(&probs))
        .ok_or_else(|| InferenceError::runtime("Sentiment model produced non-finite logits"))
}

pub fn enrich(text: &str, aspect: &str) -> String {
    format!("aspect: {aspect} text: {text}")
}

#[async_trait]
impl InferenceProvider for AbsaService {
    async fn predict_aspect_scores(&self, text: &str) -> absa_analysis::Result<AspectScores> {
        Ok(self.aspect_scores(text).await?)
    }

    async fn predict_sentiment(
        &self,
        text: &str,
        aspect: Option<&str>,
    ) -> absa_analysis::Result<SentimentPrediction> {
        Ok(self.sentiment(text, aspect).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stub() -> AbsaService {
        let missing = tempfile::tempdir().unwrap().path().join("absent");
        AbsaService::new(InferenceMode::Stub, missing).unwrap()
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("STUB".parse::<InferenceMode>().unwrap(), InferenceMode::Stub);
        assert_eq!(" onnx ".parse::<InferenceMode>().unwrap(), InferenceMode::Onnx);
        assert!("gpu".parse::<InferenceMode>().is_err());
    }

    #[test]
    fn enriched_input_format() {
        assert_eq!(enrich("pin yếu", "BATTERY"), "aspect: BATTERY text: pin yếu");
    }

    #[test]
    fn top_class_fails_on_non_finite_logits() {
        let err = top_class(&[f32::NAN, 0.0, 1.0]).unwrap_err();
        assert!(err.to_string().contains("non-finite"));
        assert!(top_class(&[0.0, f32::INFINITY]).is_err());
        assert!(top_class(&[]).is_err());
        assert_eq!(top_class(&[0.0, 2.0, 1.0]).unwrap().0, 1);
    }

    #[test]
    fn aspect_probabilities_fail_on_non_finite_logits() {
        assert!(aspect_probabilities(&[0.0, f32::NAN]).is_err());
        assert!(aspect_probabilities(&[f32::NEG_INFINITY]).is_err());
        assert_eq!(aspect_probabilities(&[0.0]).unwrap(), vec![0.5]);
    }

    #[tokio::test]
    async fn stub_scores_every_builtin_label() {
        let service = stub();
        let scores = service.aspect_scores("Giá rẻ nhưng pin yếu").await.unwrap();
        assert_eq!(scores.len(), STUB_ASPECT_LABELS.len());
        assert!(scores.iter().all(|(_, p)| (0.0..=1.0).contains(&p)));
        assert!(scores.get("SER&ACC").is_some());

        let again = service.aspect_scores("Giá rẻ nhưng pin yếu").await.unwrap();
        assert_eq!(scores, again);
    }

    #[tokio::test]
    async fn stub_sentiment_is_a_known_label() {
        let service = stub();
        let global = service.sentiment("Giá rẻ", None).await.unwrap();
        let conditioned = service.sentiment("Giá rẻ", Some("PRICE")).await.unwrap();
        for prediction in [global, conditioned] {
            assert!(STUB_SENTIMENT_LABELS.contains(&prediction.label()));
            assert!(prediction.score() >= 1.0 / 3.0);
            assert!(prediction.polarity().is_some());
        }
    }

    #[test]
    fn stub_reads_label_files_when_present() {
        let root = tempfile::tempdir().unwrap();
        let aspect = root.path().join(ASPECT_MODEL_DIR);
        std::fs::create_dir_all(&aspect).unwrap();
        std::fs::write(aspect.join("labels.json"), r#"["PRICE", "BATTERY"]"#).unwrap();

        let service = AbsaService::new(InferenceMode::Stub, root.path().to_path_buf()).unwrap();
        let description = service.describe();
        assert_eq!(description.aspect_labels, vec!["PRICE", "BATTERY"]);
        assert_eq!(description.sentiment_labels, vec!["NEG", "NEU", "POS"]);
    }

    #[test]
    fn onnx_mode_requires_model_dir() {
        let root = tempfile::tempdir().unwrap();
        let err = AbsaService::new(InferenceMode::Onnx, root.path().join("nope"))
            .err()
            .unwrap();
        assert!(matches!(err, InferenceError::ModelNotFound(_)));

        let err = AbsaService::new(InferenceMode::Onnx, root.path().to_path_buf())
            .err()
            .unwrap();
        assert!(matches!(err, InferenceError::ModelNotFound(_)));
    }
}
