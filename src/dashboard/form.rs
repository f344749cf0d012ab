use crate::models::{Comorbidity, Medication, MedicationDraft, MedicationError, PatientData};

/// Draft patient record behind the "Patients" tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientForm {
    data: PatientData,
}

impl PatientForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &PatientData {
        &self.data
    }

    /// Direct access for fields without a dedicated setter.
    pub fn data_mut(&mut self) -> &mut PatientData {
        &mut self.data
    }

    pub fn set_systolic(&mut self, systolic: f64) {
        self.data.vital_arterial_blood_pressure_systolic = systolic;
        self.data.recompute_mean_arterial_pressure();
    }

    pub fn set_diastolic(&mut self, diastolic: f64) {
        self.data.vital_arterial_blood_pressure_diastolic = diastolic;
        self.data.recompute_mean_arterial_pressure();
    }

    pub fn set_comorbidity(&mut self, comorbidity: Comorbidity, present: bool) {
        self.data.set_comorbidity(comorbidity, present);
    }

    pub fn toggle_comorbidity(&mut self, comorbidity: Comorbidity) {
        let present = self.data.has_comorbidity(comorbidity);
        self.data.set_comorbidity(comorbidity, !present);
    }

    pub fn medications(&self) -> &[Medication] {
        &self.data.medications
    }

    /// Append a medication from the entry sub-form.
    pub fn add_medication(&mut self, draft: MedicationDraft) -> Result<(), MedicationError> {
        let medication = draft.into_medication()?;
        self.data.medications.push(medication);
        Ok(())
    }

    /// "Add Drug": append by name only. Duplicates are allowed.
    pub fn quick_add_drug(&mut self, name: &str) -> Result<(), MedicationError> {
        if name.trim().is_empty() {
            return Err(MedicationError::MissingName);
        }
        self.data.medications.push(Medication::named(name));
        Ok(())
    }

    /// Remove by list position; out-of-range indices are ignored.
    pub fn remove_medication(&mut self, index: usize) -> Option<Medication> {
        (index < self.data.medications.len()).then(|| self.data.medications.remove(index))
    }

    /// The payload to submit, with MAP and the derived lists rebuilt.
    pub fn assemble(&self) -> PatientData {
        let mut data = self.data.clone();
        data.recompute_mean_arterial_pressure();
        data.derive_selected_drugs();
        data.derive_comorbidities();
        data
    }

    /// Replace the whole draft, e.g. with a record loaded from history.
    ///
    /// Records that only carry `selected_drugs` get a named medication per
    /// drug, and comorbidity labels switch their flags on.
    pub fn load(&mut self, mut data: PatientData) {
        if data.medications.is_empty() && !data.selected_drugs.is_empty() {
            data.medications = data.selected_drugs.iter().map(|d| Medication::named(d)).collect();
        }
        data.absorb_comorbidity_labels();
        data.recompute_mean_arterial_pressure();
        self.data = data;
    }

    pub fn reset(&mut self) {
        self.data = PatientData::default();
    }
}
