use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Longest course the entry form accepts (ten years).
pub const MAX_DURATION_DAYS: u32 = 3650;

/// One entry of the medication profile. Identity is its list position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub dose: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub freq: String,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub narrow_therapeutic_index: bool,
    #[serde(default)]
    pub nephrotoxic: bool,
    #[serde(default)]
    pub hepatotoxic: bool,
    #[serde(default)]
    pub qt_prolonging: bool,
    #[serde(default)]
    pub high_risk: bool,
}

impl Medication {
    /// A medication known only by name (quick "Add Drug" entry).
    pub fn named(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            dose: String::new(),
            route: String::new(),
            freq: String::new(),
            duration_days: None,
            start_date: None,
            narrow_therapeutic_index: false,
            nephrotoxic: false,
            hepatotoxic: false,
            qt_prolonging: false,
            high_risk: false,
        }
    }

    /// Whether any of the risk flags is set.
    pub fn is_flagged(&self) -> bool {
        self.narrow_therapeutic_index
            || self.nephrotoxic
            || self.hepatotoxic
            || self.qt_prolonging
            || self.high_risk
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MedicationError {
    #[error("Medication name is required")]
    MissingName,
    #[error("Duration must be between 0 and {MAX_DURATION_DAYS} days (got {0})")]
    DurationOutOfRange(u32),
    #[error("Invalid start date '{0}', expected YYYY-MM-DD")]
    InvalidStartDate(String),
}

/// Raw values of the medication entry sub-form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicationDraft {
    pub name: String,
    pub dose: String,
    pub route: String,
    pub freq: String,
    pub duration_days: Option<u32>,
    /// YYYY-MM-DD or blank.
    pub start_date: String,
    pub narrow_therapeutic_index: bool,
    pub nephrotoxic: bool,
    pub hepatotoxic: bool,
    pub qt_prolonging: bool,
    pub high_risk: bool,
}

impl MedicationDraft {
    /// Validate the sub-form and build the list entry.
    pub fn into_medication(self) -> Result<Medication, MedicationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(MedicationError::MissingName);
        }
        if let Some(days) = self.duration_days {
            if days > MAX_DURATION_DAYS {
                return Err(MedicationError::DurationOutOfRange(days));
            }
        }
        let start_date = match self.start_date.trim() {
            "" => None,
            raw => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| MedicationError::InvalidStartDate(raw.to_string()))?,
            ),
        };

        Ok(Medication {
            name: name.to_string(),
            dose: self.dose.trim().to_string(),
            route: self.route.trim().to_string(),
            freq: self.freq.trim().to_string(),
            duration_days: self.duration_days,
            start_date,
            narrow_therapeutic_index: self.narrow_therapeutic_index,
            nephrotoxic: self.nephrotoxic,
            hepatotoxic: self.hepatotoxic,
            qt_prolonging: self.qt_prolonging,
            high_risk: self.high_risk,
        })
    }
}
