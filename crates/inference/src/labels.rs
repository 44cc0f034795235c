use crate::error::{InferenceError, Result};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub const LABELS_FILE: &str = "labels.json";
pub const CONFIG_FILE: &str = "config.json";

/// Class index → label name for one classifier head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    labels: BTreeMap<usize, String>,
}

impl LabelMap {
    /// Labels in index order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: names
                .into_iter()
                .enumerate()
                .map(|(idx, name)| (idx, name.into()))
                .collect(),
        }
    }

    /// Resolve labels for a model directory: `labels.json` first, then `config.json` `id2label`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let labels_path = model_dir.join(LABELS_FILE);
        let map = if labels_path.is_file() {
            Self::from_labels_json(&std::fs::read(&labels_path)?)
        } else {
            let config_path = model_dir.join(CONFIG_FILE);
            if !config_path.is_file() {
                return Err(InferenceError::labels(format!(
                    "Neither {LABELS_FILE} nor {CONFIG_FILE} found in {}",
                    model_dir.display()
                )));
            }
            Self::from_config_json(&std::fs::read(&config_path)?)
        }
        .map_err(|err| InferenceError::labels(format!("{}: {err}", model_dir.display())))?;

        if map.labels.is_empty() {
            return Err(InferenceError::labels(format!(
                "Label mapping in {} is empty",
                model_dir.display()
            )));
        }
        Ok(map)
    }

    /// `labels.json`: a list, an index-keyed object, or a name-keyed object (values in order).
    pub fn from_labels_json(bytes: &[u8]) -> Result<Self> {
        match serde_json::from_slice::<LabelsFile>(bytes)? {
            LabelsFile::List(names) => Ok(Self::from_names(names)),
            LabelsFile::Map(OrderedEntries(entries)) => Ok(Self::from_entries(entries)),
        }
    }

    /// `config.json` with an `id2label` object.
    pub fn from_config_json(bytes: &[u8]) -> Result<Self> {
        let config: ModelConfig = serde_json::from_slice(bytes)?;
        let mut labels = BTreeMap::new();
        for (key, name) in config.id2label.map(|e| e.0).unwrap_or_default() {
            let idx = key.trim().parse::<usize>().map_err(|_| {
                InferenceError::labels(format!("id2label key '{key}' is not an index"))
            })?;
            labels.insert(idx, name);
        }
        Ok(Self { labels })
    }

    fn from_entries(entries: Vec<(String, String)>) -> Self {
        let indexed: Option<BTreeMap<usize, String>> = entries
            .iter()
            .map(|(key, name)| key.trim().parse::<usize>().ok().map(|idx| (idx, name.clone())))
            .collect();
        match indexed {
            Some(labels) => Self { labels },
            None => Self::from_names(entries.into_iter().map(|(_, name)| name)),
        }
    }

    /// Label for a class index; unmapped indices render as `LABEL_{idx}`.
    pub fn label(&self, idx: usize) -> String {
        self.labels
            .get(&idx)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{idx}"))
    }

    /// Number of classes the head is expected to emit (highest index + 1).
    pub fn class_count(&self) -> usize {
        self.labels.keys().next_back().map_or(0, |max| max + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Every class label in index order, gaps filled.
    pub fn names(&self) -> Vec<String> {
        (0..self.class_count()).map(|idx| self.label(idx)).collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelsFile {
    List(Vec<String>),
    Map(OrderedEntries),
}

#[derive(Deserialize)]
struct ModelConfig {
    #[serde(default)]
    id2label: Option<OrderedEntries>,
}

/// JSON object entries in document order.
struct OrderedEntries(Vec<(String, String)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of label names")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
