use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Meal, MealRelation};

/// Longest meal offset accepted, in minutes.
pub const MAX_MEAL_OFFSET_MINUTES: u32 = 12 * 60;

/// Every schedule kind string accepted by `ScheduleSpec::from_json`.
pub const SCHEDULE_KINDS: &[&str] = &[
    "fixed_time",
    "interval",
    "meal_based",
    "cyclic",
    "tapered",
    "complex",
    "prn",
    "sliding_scale",
];

// ---------------------------------------------------------------------------
// ScheduleSpec
// ---------------------------------------------------------------------------

/// A dosing schedule. Exactly one kind is active per schedule; each variant
/// carries only the parameters it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleSpec {
    FixedTime {
        times: Vec<NaiveTime>,
    },
    Interval {
        every_hours: u32,
    },
    MealBased {
        meal: Meal,
        #[serde(default)]
        offset_minutes: u32,
        relation: MealRelation,
    },
    Cyclic {
        days_on: u32,
        days_off: u32,
        start_date: NaiveDate,
        times: Vec<NaiveTime>,
    },
    Tapered {
        start_dose: f64,
        end_dose: f64,
        steps: u32,
        total_days: u32,
        start_date: NaiveDate,
        times: Vec<NaiveTime>,
    },
    Complex {
        entries: Vec<ComplexEntry>,
    },
    Prn {
        #[serde(default)]
        min_interval_hours: Option<u32>,
    },
    SlidingScale {
        tiers: Vec<ScaleTier>,
    },
}

/// One row of a day/time pattern table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexEntry {
    pub days: Vec<Weekday>,
    pub times: Vec<NaiveTime>,
}

/// Dose to give when an external reading falls within `[min_reading, max_reading)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleTier {
    pub min_reading: f64,
    pub max_reading: f64,
    pub dose: f64,
}

impl ScheduleSpec {
    pub fn fixed(times: &[NaiveTime]) -> Self {
        Self::FixedTime {
            times: times.to_vec(),
        }
    }

    pub fn prn() -> Self {
        Self::Prn {
            min_interval_hours: None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::FixedTime { .. } => "fixed_time",
            Self::Interval { .. } => "interval",
            Self::MealBased { .. } => "meal_based",
            Self::Cyclic { .. } => "cyclic",
            Self::Tapered { .. } => "tapered",
            Self::Complex { .. } => "complex",
            Self::Prn { .. } => "prn",
            Self::SlidingScale { .. } => "sliding_scale",
        }
    }

    /// Externally triggered schedules have no fixed occurrences.
    pub fn is_as_needed(&self) -> bool {
        matches!(self, Self::Prn { .. } | Self::SlidingScale { .. })
    }

    /// The explicit times-of-day a structured frequency must agree with.
    pub fn explicit_times(&self) -> Option<&[NaiveTime]> {
        match self {
            Self::FixedTime { times }
            | Self::Cyclic { times, .. }
            | Self::Tapered { times, .. } => Some(times),
            _ => None,
        }
    }

    /// Parse a schedule from loosely-typed JSON, mapping every failure to a
    /// `ScheduleConfigError`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ScheduleConfigError> {
        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .ok_or_else(|| ScheduleConfigError::MissingField {
                kind: "schedule".into(),
                field: "kind".into(),
            })?;

        if !SCHEDULE_KINDS.contains(&kind) {
            return Err(ScheduleConfigError::UnknownKind(kind.to_string()));
        }

        let spec: Self = serde_json::from_value(value.clone()).map_err(|e| {
            let message = e.to_string();
            match missing_field_name(&message) {
                Some(field) => ScheduleConfigError::MissingField {
                    kind: kind.to_string(),
                    field,
                },
                None => ScheduleConfigError::Malformed(message),
            }
        })?;

        spec.validate()?;
        Ok(spec)
    }

    /// Check the variant-specific invariants.
    pub fn validate(&self) -> Result<(), ScheduleConfigError> {
        let kind = self.kind_name();
        match self {
            Self::FixedTime { times } => require_times(kind, times),
            Self::Interval { every_hours } => {
                if *every_hours == 0 || *every_hours > 24 {
                    return Err(invalid(kind, "every_hours", "must be between 1 and 24"));
                }
                Ok(())
            }
            Self::MealBased { offset_minutes, .. } => {
                if *offset_minutes > MAX_MEAL_OFFSET_MINUTES {
                    return Err(invalid(
                        kind,
                        "offset_minutes",
                        &format!("must not exceed {MAX_MEAL_OFFSET_MINUTES}"),
                    ));
                }
                Ok(())
            }
            Self::Cyclic { days_on, times, .. } => {
                if *days_on == 0 {
                    return Err(invalid(kind, "days_on", "must be at least 1"));
                }
                require_times(kind, times)
            }
            Self::Tapered {
                start_dose,
                end_dose,
                steps,
                total_days,
                times,
                ..
            } => {
                if *steps == 0 {
                    return Err(invalid(kind, "steps", "must be at least 1"));
                }
                if *total_days == 0 {
                    return Err(invalid(kind, "total_days", "must be at least 1"));
                }
                if steps > total_days {
                    return Err(invalid(kind, "steps", "cannot exceed total_days"));
                }
                if !start_dose.is_finite() || !end_dose.is_finite() || *start_dose <= 0.0 || *end_dose <= 0.0 {
                    return Err(invalid(kind, "dose", "doses must be positive numbers"));
                }
                require_times(kind, times)
            }
            Self::Complex { entries } => {
                if entries.is_empty() {
                    return Err(missing(kind, "entries"));
                }
                for entry in entries {
                    if entry.days.is_empty() {
                        return Err(missing(kind, "entries.days"));
                    }
                    if entry.times.is_empty() {
                        return Err(missing(kind, "entries.times"));
                    }
                }
                Ok(())
            }
            Self::Prn { min_interval_hours } => {
                if *min_interval_hours == Some(0) {
                    return Err(invalid(kind, "min_interval_hours", "must be at least 1"));
                }
                Ok(())
            }
            Self::SlidingScale { tiers } => {
                if tiers.is_empty() {
                    return Err(missing(kind, "tiers"));
                }
                if tiers.iter().any(|t| t.min_reading >= t.max_reading || t.dose < 0.0) {
                    return Err(invalid(kind, "tiers", "each tier needs min < max and a non-negative dose"));
                }
                Ok(())
            }
        }
    }
}

fn require_times(kind: &str, times: &[NaiveTime]) -> Result<(), ScheduleConfigError> {
    if times.is_empty() {
        return Err(missing(kind, "times"));
    }
    Ok(())
}

fn missing(kind: &str, field: &str) -> ScheduleConfigError {
    ScheduleConfigError::MissingField {
        kind: kind.into(),
        field: field.into(),
    }
}

fn invalid(kind: &str, field: &str, reason: &str) -> ScheduleConfigError {
    ScheduleConfigError::InvalidValue {
        kind: kind.into(),
        field: field.into(),
        reason: reason.into(),
    }
}

/// Pull the field name out of serde's "missing field `x`" message.
fn missing_field_name(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

// ---------------------------------------------------------------------------
// DoseOccurrence
// ---------------------------------------------------------------------------

/// One concrete scheduled dose. Recomputed per date, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseOccurrence {
    pub medication_id: Uuid,
    pub medication_name: String,
    pub at: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// ScheduleConfigError
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleConfigError {
    #[error("Unknown schedule kind: {0}")]
    UnknownKind(String),

    #[error("{kind} schedule is missing required field '{field}'")]
    MissingField { kind: String, field: String },

    #[error("{kind} schedule has an invalid {field}: {reason}")]
    InvalidValue {
        kind: String,
        field: String,
        reason: String,
    },

    #[error("Malformed schedule: {0}")]
    Malformed(String),
}
