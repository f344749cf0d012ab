use serde::{Deserialize, Serialize};

/// Structured comorbidities captured as boolean flags on [`super::PatientData`].
///
/// Each variant owns one flag field; the human-readable label is what ends
/// up in the derived `comorbidities` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comorbidity {
    Hypertension,
    DiabetesType1,
    DiabetesType2,
    HeartFailure,
    ChronicKidneyDisease,
    AsthmaCopd,
    ChronicLiverDisease,
    Malignancy,
    Immunosuppression,
    AcuteKidneyInjury,
}

impl Comorbidity {
    pub const ALL: [Comorbidity; 10] = [
        Comorbidity::Hypertension,
        Comorbidity::DiabetesType1,
        Comorbidity::DiabetesType2,
        Comorbidity::HeartFailure,
        Comorbidity::ChronicKidneyDisease,
        Comorbidity::AsthmaCopd,
        Comorbidity::ChronicLiverDisease,
        Comorbidity::Malignancy,
        Comorbidity::Immunosuppression,
        Comorbidity::AcuteKidneyInjury,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Hypertension => "Hypertension",
            Self::DiabetesType1 => "Type 1 Diabetes",
            Self::DiabetesType2 => "Type 2 Diabetes",
            Self::HeartFailure => "Heart Failure",
            Self::ChronicKidneyDisease => "CKD",
            Self::AsthmaCopd => "Asthma/COPD",
            Self::ChronicLiverDisease => "Chronic Liver Disease",
            Self::Malignancy => "Malignancy",
            Self::Immunosuppression => "Immunosuppression",
            Self::AcuteKidneyInjury => "Acute Kidney Injury",
        }
    }

    /// Name of the boolean field in the patient payload.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Hypertension => "hypertension",
            Self::DiabetesType1 => "diabetes_type1",
            Self::DiabetesType2 => "diabetes_type2",
            Self::HeartFailure => "cad_hf",
            Self::ChronicKidneyDisease => "ckd",
            Self::AsthmaCopd => "copd_asthma",
            Self::ChronicLiverDisease => "chronic_liver_disease",
            Self::Malignancy => "malignancy",
            Self::Immunosuppression => "immunosuppressed",
            Self::AcuteKidneyInjury => "aki",
        }
    }

    /// Resolve a label or field name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim();
        Self::ALL.into_iter().find(|c| {
            c.label().eq_ignore_ascii_case(needle) || c.field().eq_ignore_ascii_case(needle)
        })
    }
}

impl std::fmt::Display for Comorbidity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
