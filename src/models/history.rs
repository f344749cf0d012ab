use serde::{Deserialize, Serialize};

use super::patient::PatientData;
use super::prediction::{PredictionResult, RiskCategory};

/// Persisted prediction snapshot, owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    #[serde(default)]
    pub patient_name: Option<String>,
    pub risk_score: f64,
    pub risk_category: RiskCategory,
    pub created_at: String,
    #[serde(default)]
    pub patient_data: PatientData,
    pub prediction_result: PredictionResult,
    #[serde(default)]
    pub clinical_recommendations: Option<String>,
    /// Only present on the admin listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Body of `POST /api/predictions/history`.
#[derive(Debug, Clone, Serialize)]
pub struct SaveHistoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    pub patient_data: PatientData,
    pub prediction_result: PredictionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_recommendations: Option<String>,
}

impl SaveHistoryRequest {
    /// Bundle a prediction with the patient it was made for.
    ///
    /// The display name is `Patient <age>y/<gender>`.
    pub fn new(patient_data: PatientData, prediction_result: PredictionResult) -> Self {
        let patient_name = Some(format!(
            "Patient {}y/{}",
            patient_data.anchor_age, patient_data.gender
        ));
        let clinical_recommendations = prediction_result.joined_recommendations();
        Self {
            patient_name,
            patient_data,
            prediction_result,
            clinical_recommendations,
        }
    }
}
