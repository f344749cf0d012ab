use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Risk band reported by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    #[serde(alias = "Medium")]
    Moderate,
    High,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One precomputed SHAP attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapContribution {
    pub feature: String,
    pub shap_value: f64,
}

/// Per-drug ADR statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugStats {
    pub adr_rate: f64,
    pub severe_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Drug-specific analysis block. `top_drugs` arrives as `[name, stats]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrugAnalysis {
    #[serde(default)]
    pub top_drugs: Vec<(String, DrugStats)>,
    /// Anything else the backend attaches, passed through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Result of one prediction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub risk_score: f64,
    pub risk_category: RiskCategory,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drug_analysis: Option<DrugAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shap_top_contributors: Option<Vec<ShapContribution>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_recommendations_md: Option<String>,
}

impl PredictionResult {
    pub fn shap_contributors(&self) -> &[ShapContribution] {
        self.shap_top_contributors.as_deref().unwrap_or_default()
    }

    pub fn recommendation_list(&self) -> &[String] {
        self.recommendations.as_deref().unwrap_or_default()
    }

    pub fn top_drugs(&self) -> &[(String, DrugStats)] {
        self.drug_analysis
            .as_ref()
            .map(|a| a.top_drugs.as_slice())
            .unwrap_or_default()
    }

    /// Recommendations joined the way they are stored with a history record.
    pub fn joined_recommendations(&self) -> Option<String> {
        let recs = self.recommendation_list();
        if recs.is_empty() {
            None
        } else {
            Some(recs.join("; "))
        }
    }
}

/// Which file format an upload carries (`?kind=json|csv`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Json,
    Csv,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::str::FromStr for UploadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown upload kind '{other}', expected json or csv")),
        }
    }
}
