pub mod frequency;
pub mod reference;
pub mod types;
pub mod validator;

pub use frequency::Frequency;
pub use reference::{parse_unit, DoseRange, DoseReference, UnitFamily};
pub use types::{DosageError, DosageSafetyError, FrequencySafetyError, SafetyCheck};
pub use validator::{
    assess_patient_factors, check_daily_total, validate_dose, validate_dose_amount,
    validate_frequency, validate_medication_frequency,
};
