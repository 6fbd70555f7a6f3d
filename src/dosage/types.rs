use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Check result
// ---------------------------------------------------------------------------

/// Outcome of one dosage or frequency check.
///
/// `suggestions` is only populated when `ok` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyCheck {
    pub ok: bool,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl SafetyCheck {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn fail(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            suggestions,
        }
    }

    /// Failure built from a typed error; its `Display` text is the message.
    pub fn from_error(error: &impl std::fmt::Display, suggestions: Vec<String>) -> Self {
        Self::fail(error.to_string(), suggestions)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DosageSafetyError {
    #[error("{medication}: dose amount {amount} must be greater than zero")]
    NonPositive { medication: String, amount: String },

    #[error("{medication}: unit '{unit}' is not recognised")]
    UnknownUnit { medication: String, unit: String },

    #[error("{medication}: unit '{unit}' does not apply to a {form}")]
    IncompatibleUnit {
        medication: String,
        unit: String,
        form: String,
    },

    #[error("{medication}: {amount} {unit} is not a whole number")]
    NonWholeCount {
        medication: String,
        amount: String,
        unit: String,
    },

    #[error("{medication}: {dose} is outside the safe range of {min} to {max}")]
    OutOfRange {
        medication: String,
        dose: String,
        min: String,
        max: String,
    },

    #[error("{medication}: {total} per day exceeds the daily maximum of {max}")]
    DailyTotalExceeded {
        medication: String,
        total: String,
        max: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrequencySafetyError {
    #[error("{medication}: frequency '{frequency}' could not be understood")]
    Unparseable { medication: String, frequency: String },

    #[error("{medication}: frequency must be at least once per period")]
    Zero { medication: String },

    #[error("{medication}: {count} doses per day exceeds the maximum of {max}")]
    TooManyPerDay { medication: String, count: u32, max: u32 },

    #[error("{medication}: {count} doses per hour exceeds the maximum of {max}")]
    TooManyPerHour { medication: String, count: u32, max: u32 },

    #[error("{medication}: frequency says {expected} times per day but {actual} times are scheduled")]
    TimesMismatch {
        medication: String,
        expected: u32,
        actual: usize,
    },
}

/// Reference data could not be loaded.
#[derive(Error, Debug)]
pub enum DosageError {
    #[error("Reference data load failed ({0}): {1}")]
    ReferenceDataLoad(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    ReferenceDataParse(String, String),
}
