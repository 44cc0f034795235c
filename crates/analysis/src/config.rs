use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_ASPECT_THRESHOLD: f32 = 0.3;
pub const MIN_ASPECT_THRESHOLD: f32 = 0.1;
pub const MAX_ASPECT_THRESHOLD: f32 = 0.9;
pub const DEFAULT_TEXT_COLUMN: &str = "text";

/// Aspect detection threshold, validated to lie in `[0.1, 0.9]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct AspectThreshold(f32);

impl AspectThreshold {
    pub fn new(value: f32) -> Result<Self> {
        if !(MIN_ASPECT_THRESHOLD..=MAX_ASPECT_THRESHOLD).contains(&value) {
            let (min, max) = (MIN_ASPECT_THRESHOLD, MAX_ASPECT_THRESHOLD);
            return Err(AnalysisError::invalid_config(format!(
                "aspect_threshold {value} is outside [{min}, {max}]"
            )));
        }
        Ok(Self(value))
    }

    pub const fn value(self) -> f32 {
        self.0
    }
}

impl Default for AspectThreshold {
    fn default() -> Self {
        Self(DEFAULT_ASPECT_THRESHOLD)
    }
}

impl<'de> Deserialize<'de> for AspectThreshold {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let value = f32::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

/// Per-analysis parameters. Copied into every analysis so a text is always processed against
/// a single threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    pub aspect_threshold: AspectThreshold,
    /// Maximum number of texts analyzed concurrently in a batch (1 = sequential)
    pub workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            aspect_threshold: AspectThreshold::default(),
            workers: 1,
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub const fn with_threshold(mut self, threshold: AspectThreshold) -> Self {
        self.aspect_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Apply `ABSA_ASPECT_THRESHOLD` when set.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var("ABSA_ASPECT_THRESHOLD") {
            let value: f32 = raw.trim().parse().map_err(|err| {
                let message = format!("Invalid ABSA_ASPECT_THRESHOLD '{raw}': {err}");
                AnalysisError::invalid_config(message)
            })?;
            cfg.aspect_threshold = AspectThreshold::new(value)?;
        }
        Ok(cfg)
    }
}

/// Filters for the action center; `None` means "derive from the corpus".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionCenterConfig {
    pub min_mentions: Option<usize>,
    pub top_n: Option<usize>,
}

/// Settings loaded from a profile file (JSON or TOML).
#[derive(Debug, Clone, PartialEq)]
pub struct AbsaProfile {
    pub analysis: AnalysisConfig,
    pub actions: ActionCenterConfig,
    pub text_column: String,
    /// Aspect label → owning team overrides
    pub owners: BTreeMap<String, String>,
}

impl Default for AbsaProfile {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            actions: ActionCenterConfig::default(),
            text_column: DEFAULT_TEXT_COLUMN.to_string(),
            owners: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProfile {
    aspect_threshold: Option<AspectThreshold>,
    workers: Option<usize>,
    min_mentions: Option<usize>,
    top_n: Option<usize>,
    text_column: Option<String>,
    #[serde(default)]
    owners: BTreeMap<String, String>,
}

impl AbsaProfile {
    /// Load a profile file, layering its values over `base`.
    pub fn load(path: &Path, base: Self) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let raw = parse_raw(&bytes).map_err(|err| {
            AnalysisError::invalid_config(format!("{}: {err}", path.display()))
        })?;
        Self::merge(base, raw)
    }

    /// Parse a profile from bytes, layering its values over the defaults.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::merge(Self::default(), parse_raw(bytes)?)
    }

    fn merge(base: Self, raw: RawProfile) -> Result<Self> {
        let mut profile = base;
        if let Some(threshold) = raw.aspect_threshold {
            profile.analysis.aspect_threshold = threshold;
        }
        if let Some(workers) = raw.workers {
            if workers == 0 {
                return Err(AnalysisError::invalid_config("workers must be > 0"));
            }
            profile.analysis.workers = workers;
        }
        if let Some(min_mentions) = raw.min_mentions {
            if min_mentions == 0 {
                return Err(AnalysisError::invalid_config("min_mentions must be > 0"));
            }
            profile.actions.min_mentions = Some(min_mentions);
        }
        if let Some(top_n) = raw.top_n {
            if top_n == 0 {
                return Err(AnalysisError::invalid_config("top_n must be > 0"));
            }
            profile.actions.top_n = Some(top_n);
        }
        if let Some(column) = raw.text_column.filter(|c| !c.trim().is_empty()) {
            profile.text_column = column;
        }
        for (aspect, owner) in raw.owners {
            profile.owners.insert(aspect.to_ascii_uppercase(), owner);
        }
        Ok(profile)
    }
}

fn parse_raw(bytes: &[u8]) -> Result<RawProfile> {
    match serde_json::from_slice::<RawProfile>(bytes) {
        Ok(raw) => Ok(raw),
        Err(json_err) => {
            let utf8 = std::str::from_utf8(bytes)
                .map_err(|err| AnalysisError::invalid_config(format!("{json_err}; {err}")))?;
            toml::from_str::<RawProfile>(utf8).map_err(|toml_err| {
                AnalysisError::invalid_config(format!(
                    "Profile is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}"
                ))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn threshold_bounds_are_inclusive() {
        assert!(AspectThreshold::new(0.1).is_ok());
        assert!(AspectThreshold::new(0.9).is_ok());
        assert!(AspectThreshold::new(0.05).is_err());
        assert!(AspectThreshold::new(0.95).is_err());
        assert!(AspectThreshold::new(f32::NAN).is_err());
        assert_eq!(AspectThreshold::default().value(), 0.3);
    }

    #[test]
    fn parses_json_profile() {
        let profile = AbsaProfile::from_slice(
            br#"{"aspect_threshold": 0.45, "workers": 4, "owners": {"price": "Finance"}}"#,
        )
        .unwrap();
        assert_eq!(profile.analysis.aspect_threshold.value(), 0.45);
        assert_eq!(profile.analysis.workers, 4);
        assert_eq!(profile.owners.get("PRICE").map(String::as_str), Some("Finance"));
        assert_eq!(profile.text_column, "text");
    }

    #[test]
    fn parses_toml_profile() {
        let profile = AbsaProfile::from_slice(
            b"min_mentions = 3\ntop_n = 4\ntext_column = \"review\"\n",
        )
        .unwrap();
        assert_eq!(profile.actions.min_mentions, Some(3));
        assert_eq!(profile.actions.top_n, Some(4));
        assert_eq!(profile.text_column, "review");
    }

    #[test]
    fn rejects_unknown_keys_and_bad_threshold() {
        assert!(AbsaProfile::from_slice(br#"{"treshold": 0.3}"#).is_err());
        assert!(AbsaProfile::from_slice(br#"{"aspect_threshold": 1.5}"#).is_err());
        assert!(AbsaProfile::from_slice(b"workers = 0").is_err());
    }

    #[test]
    fn load_layers_over_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absa.toml");
        std::fs::write(&path, "top_n = 2\n").unwrap();

        let base = AbsaProfile {
            text_column: "comment".to_string(),
            ..AbsaProfile::default()
        };
        let profile = AbsaProfile::load(&path, base).unwrap();
        assert_eq!(profile.text_column, "comment");
        assert_eq!(profile.actions.top_n, Some(2));
    }
}
