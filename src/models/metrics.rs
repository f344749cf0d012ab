use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Model performance for one demographic group (or `Overall`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMetrics {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(default)]
    pub auc_roc: Option<f64>,
    #[serde(default)]
    pub precision: Option<f64>,
    #[serde(default)]
    pub recall: Option<f64>,
    #[serde(default)]
    pub f1: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub balanced_accuracy: Option<f64>,
    #[serde(default)]
    pub auc_pr: Option<f64>,
    #[serde(default)]
    pub matthews_corrcoef: Option<f64>,
    /// Columns beyond the known metric set.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Metric columns in display order, paired with their headings.
pub const METRIC_COLUMNS: &[(&str, &str)] = &[
    ("auc_roc", "AUC-ROC"),
    ("precision", "Precision"),
    ("recall", "Recall"),
    ("f1", "F1"),
    ("accuracy", "Accuracy"),
    ("balanced_accuracy", "Balanced Acc."),
    ("auc_pr", "AUC-PR"),
    ("matthews_corrcoef", "MCC"),
];

impl GroupMetrics {
    pub fn new(group: &str) -> Self {
        Self {
            group: group.to_string(),
            ..Default::default()
        }
    }

    pub fn metric(&self, key: &str) -> Option<f64> {
        match key {
            "auc_roc" => self.auc_roc,
            "precision" => self.precision,
            "recall" => self.recall,
            "f1" => self.f1,
            "accuracy" => self.accuracy,
            "balanced_accuracy" => self.balanced_accuracy,
            "auc_pr" => self.auc_pr,
            "matthews_corrcoef" => self.matthews_corrcoef,
            _ => None,
        }
    }

    /// Set a known metric; returns false for unknown keys.
    pub fn set_metric(&mut self, key: &str, value: Option<f64>) -> bool {
        let slot = match key {
            "auc_roc" => &mut self.auc_roc,
            "precision" => &mut self.precision,
            "recall" => &mut self.recall,
            "f1" => &mut self.f1,
            "accuracy" => &mut self.accuracy,
            "balanced_accuracy" => &mut self.balanced_accuracy,
            "auc_pr" => &mut self.auc_pr,
            "matthews_corrcoef" => &mut self.matthews_corrcoef,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Aggregate performance record (`/api/metrics/performance` or `metrics.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(
        default,
        deserialize_with = "overall_or_none",
        serialize_with = "overall_or_empty"
    )]
    pub overall: Option<GroupMetrics>,
    #[serde(default)]
    pub groups: Vec<GroupMetrics>,
}

/// `metrics.json` writes `{}` for a missing overall row.
fn overall_or_none<'de, D>(deserializer: D) -> Result<Option<GroupMetrics>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
        Some(other) => serde_json::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn overall_or_empty<S>(overall: &Option<GroupMetrics>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match overall {
        Some(group) => group.serialize(serializer),
        None => serde_json::Map::new().serialize(serializer),
    }
}

/// One row of `/api/predictions/feature-importance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureImportanceResponse {
    #[serde(default)]
    pub features: Vec<FeatureImportance>,
}
