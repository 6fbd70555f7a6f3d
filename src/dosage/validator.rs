//! Dosage and frequency safety checks for a single medication.

use chrono::NaiveTime;

use crate::config::SafetyConfig;
use crate::messages::MessageTemplates;
use crate::models::medication::format_amount;
use crate::models::{DoseForm, Medication, PatientContext};

use super::frequency::Frequency;
use super::reference::{
    form_rule, format_dose_mg, parse_unit, to_mg, DoseRange, DoseReference, FamilyRange,
    UnitFamily, CONDITION_RULES,
};
use super::types::{DosageSafetyError, FrequencySafetyError, SafetyCheck};

/// Older-adult threshold for range tightening.
const OLDER_ADULT_AGE: u32 = 65;
const PEDIATRIC_AGE: u32 = 18;
const LOW_WEIGHT_KG: f64 = 50.0;
/// Multiplier on the maximum single dose for age and weight factors.
const AGE_WEIGHT_FACTOR: f64 = 0.75;

// ---------------------------------------------------------------------------
// Dose amount
// ---------------------------------------------------------------------------

pub fn validate_dose(medication: &Medication, reference: &DoseReference) -> SafetyCheck {
    validate_dose_amount(
        &medication.name,
        medication.dose_amount,
        &medication.dose_unit,
        medication.form,
        reference,
    )
}

/// Check one dose against the per-form range table and, for mass units, the
/// per-drug reference range.
pub fn validate_dose_amount(
    name: &str,
    amount: f64,
    unit_label: &str,
    form: DoseForm,
    reference: &DoseReference,
) -> SafetyCheck {
    let rule = form_rule(form);
    let unit = parse_unit(unit_label);

    if !amount.is_finite() || amount <= 0.0 {
        let err = DosageSafetyError::NonPositive {
            medication: name.to_string(),
            amount: format_amount(amount),
        };
        let range = unit
            .and_then(|u| rule.range_for(u.family))
            .unwrap_or_else(|| rule.primary());
        return SafetyCheck::from_error(&err, vec![format_quantity(range.min, range.label)]);
    }

    let Some(unit) = unit else {
        let err = DosageSafetyError::UnknownUnit {
            medication: name.to_string(),
            unit: unit_label.to_string(),
        };
        return SafetyCheck::from_error(&err, form_units(form));
    };

    if !rule.allows(unit.family) {
        tracing::debug!(medication = %name, unit = %unit_label, form = %form, "Unit does not apply to form");
        let err = DosageSafetyError::IncompatibleUnit {
            medication: name.to_string(),
            unit: unit_label.to_string(),
            form: form.to_string(),
        };
        let primary = rule.primary();
        return SafetyCheck::from_error(&err, vec![format_quantity(primary.min, primary.label)]);
    }

    let display = format!("{} {}", format_amount(amount), unit_label);

    if unit.family == UnitFamily::Mass {
        let mg = amount * unit.factor;
        return match reference.get_dose_range(name) {
            Some(range) => check_mass_range(name, &display, mg, range),
            None => SafetyCheck::pass(format!(
                "{name} {display} has no reference range; form check passed."
            )),
        };
    }

    let Some(range) = rule.range_for(unit.family) else {
        return SafetyCheck::pass(format!("{name} {display} is accepted for a {form}."));
    };
    let value = amount * unit.factor;
    check_family_range(name, &display, value, range)
}

fn check_mass_range(name: &str, display: &str, mg: f64, range: &DoseRange) -> SafetyCheck {
    if mg >= range.min_single_dose_mg && mg <= range.max_single_dose_mg {
        return SafetyCheck::pass(format!("{name} {display} is within the expected range."));
    }
    let err = DosageSafetyError::OutOfRange {
        medication: name.to_string(),
        dose: display.to_string(),
        min: format_dose_mg(range.min_single_dose_mg),
        max: format_dose_mg(range.max_single_dose_mg),
    };
    let suggestions = if range.common_doses.is_empty() {
        let bound = mg.clamp(range.min_single_dose_mg, range.max_single_dose_mg);
        vec![format_dose_mg(bound)]
    } else {
        range.common_doses.clone()
    };
    SafetyCheck::from_error(&err, suggestions)
}

fn check_family_range(name: &str, display: &str, value: f64, range: &FamilyRange) -> SafetyCheck {
    if range.whole_only && value.fract() != 0.0 {
        let err = DosageSafetyError::NonWholeCount {
            medication: name.to_string(),
            amount: format_amount(value),
            unit: range.label.to_string(),
        };
        let mut suggestions = Vec::new();
        for candidate in [value.floor(), value.ceil()] {
            let s = format_quantity(candidate.clamp(range.min, range.max), range.label);
            if !suggestions.contains(&s) {
                suggestions.push(s);
            }
        }
        return SafetyCheck::from_error(&err, suggestions);
    }

    if value < range.min || value > range.max {
        let err = DosageSafetyError::OutOfRange {
            medication: name.to_string(),
            dose: display.to_string(),
            min: format_quantity(range.min, range.label),
            max: format_quantity(range.max, range.label),
        };
        let mut suggestions = vec![format_quantity(value.clamp(range.min, range.max), range.label)];
        if value > range.max && range.min < range.max {
            suggestions.push(format_quantity(range.min, range.label));
        }
        return SafetyCheck::from_error(&err, suggestions);
    }

    SafetyCheck::pass(format!("{name} {display} is within the expected range."))
}

/// "2 tablets", "1 tablet", "7.5 ml".
fn format_quantity(value: f64, label: &str) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if label == "ml" || rounded == 1.0 {
        format!("{} {}", format_amount(rounded), label)
    } else {
        format!("{} {}s", format_amount(rounded), label)
    }
}

/// Canonical unit labels a form accepts, primary family first.
fn form_units(form: DoseForm) -> Vec<String> {
    let rule = form_rule(form);
    let mut units: Vec<String> = rule.ranges.iter().map(|r| r.label.to_string()).collect();
    if rule.mass_allowed {
        units.push("mg".to_string());
    }
    units
}

// ---------------------------------------------------------------------------
// Daily total
// ---------------------------------------------------------------------------

/// Check `dose × doses per day` against the drug's maximum daily dose.
/// Passes when the dose is not a mass or the drug has no reference range.
pub fn check_daily_total(
    name: &str,
    amount: f64,
    unit_label: &str,
    frequency: &Frequency,
    reference: &DoseReference,
) -> SafetyCheck {
    let (Some(mg), Some(range), Some(count)) = (
        to_mg(amount, unit_label),
        reference.get_dose_range(name),
        frequency.daily_count(),
    ) else {
        return SafetyCheck::pass(format!("{name}: no daily total to check."));
    };

    let total = mg * f64::from(count);
    if total <= range.max_daily_dose_mg {
        return SafetyCheck::pass(format!("{name}: {} per day is within the daily maximum.", format_dose_mg(total)));
    }

    let err = DosageSafetyError::DailyTotalExceeded {
        medication: name.to_string(),
        total: format_dose_mg(total),
        max: format_dose_mg(range.max_daily_dose_mg),
    };
    let mut suggestions = Vec::new();
    if count > 0 {
        suggestions.push(format!(
            "{} per dose",
            format_dose_mg((range.max_daily_dose_mg / f64::from(count)).floor())
        ));
    }
    let allowed_count = (range.max_daily_dose_mg / mg).floor() as u32;
    if allowed_count >= 1 {
        suggestions.push(Frequency::PerDay(allowed_count).label());
    }
    SafetyCheck::from_error(&err, suggestions)
}

// ---------------------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------------------

/// Frequency check for a medication, using its schedule's explicit times.
/// As-needed schedules always pass.
pub fn validate_medication_frequency(medication: &Medication, config: &SafetyConfig) -> SafetyCheck {
    if medication.schedule.is_as_needed() {
        return SafetyCheck::pass(format!("{} is taken as needed.", medication.name));
    }
    validate_frequency(
        &medication.name,
        &medication.frequency,
        medication.schedule.explicit_times(),
        config,
    )
}

pub fn validate_frequency(
    name: &str,
    frequency_text: &str,
    explicit_times: Option<&[NaiveTime]>,
    config: &SafetyConfig,
) -> SafetyCheck {
    let Some(frequency) = Frequency::parse(frequency_text) else {
        let err = FrequencySafetyError::Unparseable {
            medication: name.to_string(),
            frequency: frequency_text.to_string(),
        };
        return SafetyCheck::from_error(
            &err,
            vec![
                Frequency::PerDay(1).label(),
                Frequency::EveryHours(8).label(),
                Frequency::AsNeeded.label(),
            ],
        );
    };

    if frequency.is_as_needed() {
        return SafetyCheck::pass(format!("{name} is taken as needed."));
    }

    let daily = frequency.daily_count().unwrap_or(0);
    if daily == 0 {
        let err = FrequencySafetyError::Zero {
            medication: name.to_string(),
        };
        return SafetyCheck::from_error(&err, vec![Frequency::PerDay(1).label()]);
    }

    let hourly = frequency.hourly_count().unwrap_or(0);
    if hourly > config.max_doses_per_hour {
        let err = FrequencySafetyError::TooManyPerHour {
            medication: name.to_string(),
            count: hourly,
            max: config.max_doses_per_hour,
        };
        return SafetyCheck::from_error(&err, daily_ceiling_suggestions(config));
    }

    if daily > config.max_daily_doses {
        let err = FrequencySafetyError::TooManyPerDay {
            medication: name.to_string(),
            count: daily,
            max: config.max_daily_doses,
        };
        return SafetyCheck::from_error(&err, daily_ceiling_suggestions(config));
    }

    if let (Frequency::PerDay(expected), Some(times)) = (frequency, explicit_times) {
        if times.len() != expected as usize {
            let err = FrequencySafetyError::TimesMismatch {
                medication: name.to_string(),
                expected,
                actual: times.len(),
            };
            let mut suggestions = Vec::new();
            if !times.is_empty() {
                suggestions.push(Frequency::PerDay(times.len() as u32).label());
            }
            return SafetyCheck::from_error(&err, suggestions);
        }
    }

    SafetyCheck::pass(format!("{name}: {} is within limits.", frequency.label()))
}

fn daily_ceiling_suggestions(config: &SafetyConfig) -> Vec<String> {
    let max = config.max_daily_doses;
    vec![
        Frequency::PerDay(max).label(),
        Frequency::EveryHours(24u32.div_ceil(max)).label(),
    ]
}

// ---------------------------------------------------------------------------
// Patient factors
// ---------------------------------------------------------------------------

/// Tighten the single-dose range for the patient's risk factors.
///
/// Every returned check has `ok == false` and is meant to surface as a
/// warning. An empty result means no factor applies.
pub fn assess_patient_factors(
    name: &str,
    amount: f64,
    unit_label: &str,
    patient: &PatientContext,
    reference: &DoseReference,
) -> Vec<SafetyCheck> {
    let mut notices = Vec::new();
    let range = reference.get_dose_range(name);
    let mg = to_mg(amount, unit_label);
    let dose = format!("{} {}", format_amount(amount), unit_label);

    for rule in CONDITION_RULES {
        if !patient.has_condition_matching(rule.keywords) {
            continue;
        }
        match range {
            Some(r) if r.requires(rule.adjustment) => {
                if let Some(notice) = tightened(name, &dose, mg, r, rule.factor, rule.label) {
                    notices.push(notice);
                }
            }
            Some(_) => {}
            None => notices.push(SafetyCheck::fail(
                MessageTemplates::patient_caution(name, rule.label),
                Vec::new(),
            )),
        }
    }

    if let Some(r) = range {
        if patient.age_years.is_some_and(|age| age >= OLDER_ADULT_AGE) {
            if let Some(notice) = tightened(name, &dose, mg, r, AGE_WEIGHT_FACTOR, "age 65 or older") {
                notices.push(notice);
            }
        }
        if patient.weight_kg.is_some_and(|w| w < LOW_WEIGHT_KG) {
            if let Some(notice) = tightened(name, &dose, mg, r, AGE_WEIGHT_FACTOR, "body weight under 50 kg") {
                notices.push(notice);
            }
        }
    }

    if patient.age_years.is_some_and(|age| age < PEDIATRIC_AGE) {
        notices.push(SafetyCheck::fail(
            MessageTemplates::patient_caution(name, "age under 18"),
            Vec::new(),
        ));
    }

    notices
}

/// Notice when the dose exceeds `max_single × factor`. Non-mass doses cannot
/// be compared, so they get a caution instead.
fn tightened(
    name: &str,
    dose: &str,
    mg: Option<f64>,
    range: &DoseRange,
    factor: f64,
    label: &str,
) -> Option<SafetyCheck> {
    let adjusted_max = range.max_single_dose_mg * factor;
    match mg {
        Some(mg) if mg > adjusted_max => Some(SafetyCheck::fail(
            MessageTemplates::patient_factor(name, dose, label, &format_dose_mg(adjusted_max)),
            vec![format_dose_mg(adjusted_max)],
        )),
        Some(_) => None,
        None => Some(SafetyCheck::fail(MessageTemplates::patient_caution(name, label), Vec::new())),
    }
}
