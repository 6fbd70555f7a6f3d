use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::DoseForm;
use crate::schedule::types::ScheduleSpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    pub dose_amount: f64,
    pub dose_unit: String,
    pub form: DoseForm,
    /// Free-text frequency as prescribed ("2 times per day", "every 8 hours", "as needed").
    pub frequency: String,
    pub schedule: ScheduleSpec,
    /// Entered by the patient, not matched against a known product.
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub is_herbal: bool,
}

impl Medication {
    /// Build a medication with an id derived from its name, so repeated
    /// construction of the same record yields the same id.
    pub fn new(
        name: &str,
        dose_amount: f64,
        dose_unit: &str,
        form: DoseForm,
        frequency: &str,
        schedule: ScheduleSpec,
    ) -> Self {
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, name.to_lowercase().as_bytes()),
            name: name.to_string(),
            dose_amount,
            dose_unit: dose_unit.to_string(),
            form,
            frequency: frequency.to_string(),
            schedule,
            is_custom: false,
            is_herbal: false,
        }
    }

    pub fn herbal(mut self) -> Self {
        self.is_herbal = true;
        self
    }

    pub fn custom(mut self) -> Self {
        self.is_custom = true;
        self
    }

    /// Lowercased, trimmed name used for reference lookups.
    pub fn normalized_name(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

/// Format a dose amount without a trailing ".0" for whole numbers.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        format!("{amount}")
    }
}

/// Patient-specific risk factors used to tighten dose ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientContext {
    pub age_years: Option<u32>,
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl PatientContext {
    pub fn has_condition_matching(&self, keywords: &[&str]) -> bool {
        self.conditions.iter().any(|c| {
            let lower = c.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
    }
}
