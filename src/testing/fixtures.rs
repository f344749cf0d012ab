use crate::models::{Medication, PatientData, User};

/// Deteriorating ICU patient on two nephrotoxic-risk drugs.
pub fn risky_patient() -> PatientData {
    let mut data = PatientData {
        anchor_age: 78,
        num_admissions: 5,
        avg_los_days: 7.0,
        los_days: Some(6.0),
        total_diagnoses: Some(8),
        total_procedures: 3,
        vital_heart_rate: 128.0,
        vital_respiratory_rate: 32.0,
        vital_temperature_celsius: 39.2,
        vital_spo2: 85.0,
        vital_arterial_blood_pressure_systolic: 85.0,
        vital_arterial_blood_pressure_diastolic: 45.0,
        vital_arterial_blood_pressure_mean: 58.0,
        on_oxygen: true,
        on_ventilator: true,
        on_dialysis: true,
        on_vasopressors: true,
        lab_creatinine: 5.2,
        lab_egfr: 10.0,
        lab_hemoglobin: 8.5,
        lab_white_blood_cells: 22.0,
        lab_platelet_count: 70.0,
        lab_sodium: Some(128.0),
        lab_potassium: Some(6.2),
        lab_alt: 120.0,
        lab_ast: 110.0,
        lab_bilirubin: 2.0,
        lab_alp: 150.0,
        lab_glucose: Some(240.0),
        aki: true,
        ckd: true,
        hypertension: true,
        medications: vec![Medication::named("Acetaminophen"), Medication::named("Cisplatin")],
        ..Default::default()
    };
    data.derive_selected_drugs();
    data.derive_comorbidities();
    data
}

pub fn clinician() -> User {
    User {
        id: 7,
        username: "dr_lee".into(),
        role: "clinician".into(),
    }
}

pub fn admin() -> User {
    User {
        id: 1,
        username: "admin".into(),
        role: "admin".into(),
    }
}

/// The fixed response the mock backend returns for every prediction.
pub const HIGH_RISK_RESULT: &str = r#"{
    "risk_score": 0.87,
    "risk_category": "High",
    "timestamp": "2026-05-01T10:00:00Z",
    "drug_analysis": {
        "top_drugs": [
            ["Cisplatin", {"adr_rate": 0.1234, "severe_rate": 0.0456, "count": 311}],
            ["Acetaminophen", {"adr_rate": 0.0211, "severe_rate": 0.0032, "count": 1204}]
        ]
    },
    "shap_top_contributors": [
        {"feature": "lab_creatinine", "shap_value": 0.3125},
        {"feature": "vital_spo2", "shap_value": 0.1874},
        {"feature": "on_dialysis", "shap_value": -0.0421}
    ],
    "recommendations": [
        "Reassess Cisplatin given eGFR 10",
        "Monitor potassium every 6 hours"
    ],
    "ai_recommendations_md": "**Renal risk**\n* Hold nephrotoxins\n- Recheck creatinine in 12h"
}"#;
