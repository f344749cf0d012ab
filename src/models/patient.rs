//! Patient payload sent to the prediction endpoint.
//!
//! `PatientData` is the loose, serde-friendly shape (every field defaults so
//! partial uploads and stored records deserialize). `ValidatedPatient` is the
//! only thing the client will actually submit: it can only be built through
//! [`ValidatedPatient::try_from`], which rejects non-finite and implausible
//! values before anything reaches the network.

use serde::{Deserialize, Serialize};

use super::comorbidity::Comorbidity;
use super::medication::Medication;

// ═══════════════════════════════════════════════════════════
// PatientData
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientData {
    // ── Identification & context ──
    pub anchor_age: u32,
    pub gender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    /// kg
    pub weight: f64,
    /// cm
    pub height: f64,
    pub admission_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admission_location: Option<String>,
    pub ward: String,
    pub num_admissions: u32,
    pub avg_los_days: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub los_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_diagnoses: Option<u32>,
    pub total_procedures: u32,

    // ── Vitals ──
    pub vital_heart_rate: f64,
    pub vital_respiratory_rate: f64,
    pub vital_temperature_celsius: f64,
    pub vital_spo2: f64,
    pub vital_arterial_blood_pressure_systolic: f64,
    pub vital_arterial_blood_pressure_diastolic: f64,
    /// Derived from systolic/diastolic, see [`mean_arterial_pressure`].
    pub vital_arterial_blood_pressure_mean: f64,

    // ── Organ support ──
    pub on_oxygen: bool,
    pub on_ventilator: bool,
    pub on_dialysis: bool,
    pub on_vasopressors: bool,

    // ── Core labs ──
    pub lab_creatinine: f64,
    pub lab_hemoglobin: f64,
    pub lab_white_blood_cells: f64,
    pub lab_platelet_count: f64,
    pub lab_alt: f64,
    pub lab_ast: f64,
    pub lab_bilirubin: f64,
    pub lab_egfr: f64,
    pub lab_alp: f64,

    // ── Extended panel (optional) ──
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_sodium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_potassium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_magnesium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_phosphate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_glucose: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_urea_nitrogen: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_bicarbonate: Option<f64>,

    // ── Comorbidity flags ──
    pub hypertension: bool,
    pub diabetes_type1: bool,
    pub diabetes_type2: bool,
    pub cad_hf: bool,
    pub ckd: bool,
    pub copd_asthma: bool,
    pub chronic_liver_disease: bool,
    pub malignancy: bool,
    pub immunosuppressed: bool,
    pub aki: bool,

    // ── Derived lists ──
    pub comorbidities: Vec<String>,
    pub selected_drugs: Vec<String>,
    pub medications: Vec<Medication>,
}

impl Default for PatientData {
    fn default() -> Self {
        Self {
            anchor_age: 65,
            gender: "M".into(),
            race: None,
            insurance: None,
            marital_status: None,
            weight: 70.0,
            height: 170.0,
            admission_type: "Emergency".into(),
            admission_location: None,
            ward: "ICU".into(),
            num_admissions: 1,
            avg_los_days: 4.5,
            los_days: None,
            total_diagnoses: None,
            total_procedures: 0,
            vital_heart_rate: 72.0,
            vital_respiratory_rate: 16.0,
            vital_temperature_celsius: 37.0,
            vital_spo2: 98.0,
            vital_arterial_blood_pressure_systolic: 120.0,
            vital_arterial_blood_pressure_diastolic: 80.0,
            vital_arterial_blood_pressure_mean: 93.0,
            on_oxygen: false,
            on_ventilator: false,
            on_dialysis: false,
            on_vasopressors: false,
            lab_creatinine: 1.0,
            lab_hemoglobin: 13.5,
            lab_white_blood_cells: 7.5,
            lab_platelet_count: 250.0,
            lab_alt: 25.0,
            lab_ast: 30.0,
            lab_bilirubin: 0.8,
            lab_egfr: 90.0,
            lab_alp: 70.0,
            lab_sodium: None,
            lab_potassium: None,
            lab_magnesium: None,
            lab_phosphate: None,
            lab_glucose: None,
            lab_urea_nitrogen: None,
            lab_bicarbonate: None,
            hypertension: false,
            diabetes_type1: false,
            diabetes_type2: false,
            cad_hf: false,
            ckd: false,
            copd_asthma: false,
            chronic_liver_disease: false,
            malignancy: false,
            immunosuppressed: false,
            aki: false,
            comorbidities: Vec::new(),
            selected_drugs: Vec::new(),
            medications: Vec::new(),
        }
    }
}

/// `MAP = (systolic + 2 * diastolic) / 3`
pub fn mean_arterial_pressure(systolic: f64, diastolic: f64) -> f64 {
    (systolic + 2.0 * diastolic) / 3.0
}

impl PatientData {
    pub fn has_comorbidity(&self, comorbidity: Comorbidity) -> bool {
        match comorbidity {
            Comorbidity::Hypertension => self.hypertension,
            Comorbidity::DiabetesType1 => self.diabetes_type1,
            Comorbidity::DiabetesType2 => self.diabetes_type2,
            Comorbidity::HeartFailure => self.cad_hf,
            Comorbidity::ChronicKidneyDisease => self.ckd,
            Comorbidity::AsthmaCopd => self.copd_asthma,
            Comorbidity::ChronicLiverDisease => self.chronic_liver_disease,
            Comorbidity::Malignancy => self.malignancy,
            Comorbidity::Immunosuppression => self.immunosuppressed,
            Comorbidity::AcuteKidneyInjury => self.aki,
        }
    }

    pub fn set_comorbidity(&mut self, comorbidity: Comorbidity, present: bool) {
        let flag = match comorbidity {
            Comorbidity::Hypertension => &mut self.hypertension,
            Comorbidity::DiabetesType1 => &mut self.diabetes_type1,
            Comorbidity::DiabetesType2 => &mut self.diabetes_type2,
            Comorbidity::HeartFailure => &mut self.cad_hf,
            Comorbidity::ChronicKidneyDisease => &mut self.ckd,
            Comorbidity::AsthmaCopd => &mut self.copd_asthma,
            Comorbidity::ChronicLiverDisease => &mut self.chronic_liver_disease,
            Comorbidity::Malignancy => &mut self.malignancy,
            Comorbidity::Immunosuppression => &mut self.immunosuppressed,
            Comorbidity::AcuteKidneyInjury => &mut self.aki,
        };
        *flag = present;
    }

    /// Rebuild `comorbidities` from the flags.
    ///
    /// Free-text entries that do not name a structured comorbidity (e.g.
    /// "Septic Shock" from an uploaded record) are kept after the flag labels.
    pub fn derive_comorbidities(&mut self) {
        let mut derived: Vec<String> = Comorbidity::ALL
            .into_iter()
            .filter(|c| self.has_comorbidity(*c))
            .map(|c| c.label().to_string())
            .collect();

        for entry in &self.comorbidities {
            if Comorbidity::parse(entry).is_none() && !derived.contains(entry) {
                derived.push(entry.clone());
            }
        }
        self.comorbidities = derived;
    }

    /// Set flags for every structured comorbidity named in `comorbidities`.
    pub fn absorb_comorbidity_labels(&mut self) {
        let named: Vec<Comorbidity> = self
            .comorbidities
            .iter()
            .filter_map(|entry| Comorbidity::parse(entry))
            .collect();
        for c in named {
            self.set_comorbidity(c, true);
        }
    }

    /// Rebuild `selected_drugs` from the medication list.
    pub fn derive_selected_drugs(&mut self) {
        self.selected_drugs = self.medications.iter().map(|m| m.name.clone()).collect();
    }

    pub fn recompute_mean_arterial_pressure(&mut self) {
        self.vital_arterial_blood_pressure_mean = mean_arterial_pressure(
            self.vital_arterial_blood_pressure_systolic,
            self.vital_arterial_blood_pressure_diastolic,
        );
    }

    /// Value of a range-checked numeric field, `None` when absent.
    fn numeric_value(&self, field: &str) -> Option<f64> {
        match field {
            "anchor_age" => Some(f64::from(self.anchor_age)),
            "weight" => Some(self.weight),
            "height" => Some(self.height),
            "num_admissions" => Some(f64::from(self.num_admissions)),
            "avg_los_days" => Some(self.avg_los_days),
            "los_days" => self.los_days,
            "total_diagnoses" => self.total_diagnoses.map(f64::from),
            "total_procedures" => Some(f64::from(self.total_procedures)),
            "vital_heart_rate" => Some(self.vital_heart_rate),
            "vital_respiratory_rate" => Some(self.vital_respiratory_rate),
            "vital_temperature_celsius" => Some(self.vital_temperature_celsius),
            "vital_spo2" => Some(self.vital_spo2),
            "vital_arterial_blood_pressure_systolic" => {
                Some(self.vital_arterial_blood_pressure_systolic)
            }
            "vital_arterial_blood_pressure_diastolic" => {
                Some(self.vital_arterial_blood_pressure_diastolic)
            }
            "vital_arterial_blood_pressure_mean" => Some(self.vital_arterial_blood_pressure_mean),
            "lab_creatinine" => Some(self.lab_creatinine),
            "lab_hemoglobin" => Some(self.lab_hemoglobin),
            "lab_white_blood_cells" => Some(self.lab_white_blood_cells),
            "lab_platelet_count" => Some(self.lab_platelet_count),
            "lab_alt" => Some(self.lab_alt),
            "lab_ast" => Some(self.lab_ast),
            "lab_bilirubin" => Some(self.lab_bilirubin),
            "lab_egfr" => Some(self.lab_egfr),
            "lab_alp" => Some(self.lab_alp),
            "lab_sodium" => self.lab_sodium,
            "lab_potassium" => self.lab_potassium,
            "lab_magnesium" => self.lab_magnesium,
            "lab_phosphate" => self.lab_phosphate,
            "lab_glucose" => self.lab_glucose,
            "lab_urea_nitrogen" => self.lab_urea_nitrogen,
            "lab_bicarbonate" => self.lab_bicarbonate,
            _ => None,
        }
    }

    /// Check every numeric field against [`PLAUSIBLE_RANGES`].
    pub fn validate(&self) -> Result<(), PatientDataError> {
        for range in PLAUSIBLE_RANGES {
            let Some(value) = self.numeric_value(range.field) else {
                continue;
            };
            if !value.is_finite() {
                return Err(PatientDataError::NotFinite { field: range.field });
            }
            if value < range.min || value > range.max {
                return Err(PatientDataError::OutOfRange {
                    field: range.field,
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        let systolic = self.vital_arterial_blood_pressure_systolic;
        let diastolic = self.vital_arterial_blood_pressure_diastolic;
        if diastolic > systolic {
            return Err(PatientDataError::PressureInverted {
                systolic,
                diastolic,
            });
        }

        if self.gender.trim().is_empty() {
            return Err(PatientDataError::MissingGender);
        }

        if self.medications.iter().any(|m| m.name.trim().is_empty()) {
            return Err(PatientDataError::UnnamedMedication);
        }

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Plausible ranges
// ═══════════════════════════════════════════════════════════

/// Inclusive clinically plausible bounds for one numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

const fn range(field: &'static str, min: f64, max: f64) -> FieldRange {
    FieldRange { field, min, max }
}

pub const PLAUSIBLE_RANGES: &[FieldRange] = &[
    range("anchor_age", 0.0, 120.0),
    range("weight", 0.5, 400.0),
    range("height", 30.0, 250.0),
    range("num_admissions", 0.0, 500.0),
    range("avg_los_days", 0.0, 365.0),
    range("los_days", 0.0, 365.0),
    range("total_diagnoses", 0.0, 200.0),
    range("total_procedures", 0.0, 200.0),
    range("vital_heart_rate", 20.0, 300.0),
    range("vital_respiratory_rate", 4.0, 80.0),
    range("vital_temperature_celsius", 25.0, 45.0),
    range("vital_spo2", 50.0, 100.0),
    range("vital_arterial_blood_pressure_systolic", 40.0, 300.0),
    range("vital_arterial_blood_pressure_diastolic", 20.0, 200.0),
    range("vital_arterial_blood_pressure_mean", 20.0, 250.0),
    range("lab_creatinine", 0.1, 25.0),
    range("lab_hemoglobin", 2.0, 25.0),
    range("lab_white_blood_cells", 0.0, 200.0),
    range("lab_platelet_count", 1.0, 2000.0),
    range("lab_alt", 0.0, 10000.0),
    range("lab_ast", 0.0, 10000.0),
    range("lab_bilirubin", 0.0, 50.0),
    range("lab_egfr", 0.0, 200.0),
    range("lab_alp", 0.0, 5000.0),
    range("lab_sodium", 100.0, 180.0),
    range("lab_potassium", 1.0, 10.0),
    range("lab_magnesium", 0.2, 10.0),
    range("lab_phosphate", 0.5, 20.0),
    range("lab_glucose", 10.0, 2000.0),
    range("lab_urea_nitrogen", 1.0, 300.0),
    range("lab_bicarbonate", 2.0, 60.0),
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatientDataError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} = {value} is outside the plausible range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Diastolic pressure ({diastolic}) exceeds systolic pressure ({systolic})")]
    PressureInverted { systolic: f64, diastolic: f64 },

    #[error("Gender is required")]
    MissingGender,

    #[error("Every medication needs a name")]
    UnnamedMedication,
}

// ═══════════════════════════════════════════════════════════
// ValidatedPatient
// ═══════════════════════════════════════════════════════════

/// A patient payload that passed [`PatientData::validate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedPatient(PatientData);

impl ValidatedPatient {
    pub fn data(&self) -> &PatientData {
        &self.0
    }

    pub fn into_inner(self) -> PatientData {
        self.0
    }
}

impl TryFrom<PatientData> for ValidatedPatient {
    type Error = PatientDataError;

    fn try_from(data: PatientData) -> Result<Self, Self::Error> {
        data.validate()?;
        Ok(Self(data))
    }
}

impl AsRef<PatientData> for ValidatedPatient {
    fn as_ref(&self) -> &PatientData {
        &self.0
    }
}
