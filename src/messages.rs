/// Message template builder for consistent, calm framing of safety findings.
/// Every message names the medications involved so it can stand alone in a log
/// or notification.
pub struct MessageTemplates;

impl MessageTemplates {
    /// TIME PROXIMITY description.
    pub fn time_proximity(
        medication_a: &str,
        time_a: &str,
        medication_b: &str,
        time_b: &str,
        gap_minutes: u32,
        min_gap_minutes: u32,
    ) -> String {
        format!(
            "{} at {} and {} at {} are scheduled {} apart, closer than the {} minimum.",
            medication_a,
            time_a,
            medication_b,
            time_b,
            format_gap(gap_minutes),
            format_gap(min_gap_minutes),
        )
    }

    /// TIMING INTERACTION description.
    pub fn timing_interaction(
        medication_a: &str,
        medication_b: &str,
        gap_minutes: u32,
        reason: &str,
    ) -> String {
        format!(
            "{} and {} are scheduled {} apart. {}",
            medication_a,
            medication_b,
            format_gap(gap_minutes),
            reason,
        )
    }

    /// Recommendation attached to every timing conflict.
    pub fn space_doses(medication_a: &str, medication_b: &str, min_gap_minutes: u32) -> String {
        format!(
            "Space {} and {} doses at least {} apart.",
            medication_a,
            medication_b,
            format_gap(min_gap_minutes),
        )
    }

    /// Major interaction, reported as a blocking error.
    pub fn major_interaction(medication_a: &str, medication_b: &str, sources: &[String]) -> String {
        format!(
            "{} and {} have a major interaction reported by {}. \
             This combination should be reviewed by a prescriber before use.",
            medication_a,
            medication_b,
            sources.join(", "),
        )
    }

    /// Moderate or minor interaction, reported as a warning.
    pub fn interaction_notice(
        medication_a: &str,
        medication_b: &str,
        severity: &str,
        sources: &[String],
    ) -> String {
        format!(
            "{} and {} have a {} interaction reported by {}. \
             You may want to mention this to your pharmacist.",
            medication_a,
            medication_b,
            severity,
            sources.join(", "),
        )
    }

    pub fn interaction_recommendation(medication_a: &str, medication_b: &str, major: bool) -> String {
        if major {
            format!(
                "Ask a prescriber about alternatives to taking {} with {}.",
                medication_a, medication_b,
            )
        } else {
            format!("Monitor for side effects while taking {} with {}.", medication_a, medication_b)
        }
    }

    /// Patient-factor notice for a dose above the tightened range.
    pub fn patient_factor(medication: &str, dose: &str, factor: &str, adjusted_max: &str) -> String {
        format!(
            "{} {} is above the adjusted maximum of {} for a patient with {}. \
             A reduced dose may be appropriate.",
            medication, dose, adjusted_max, factor,
        )
    }

    /// Patient-factor notice that does not depend on the dose amount.
    pub fn patient_caution(medication: &str, factor: &str) -> String {
        format!(
            "Dosing of {} for a patient with {} should be confirmed with a prescriber.",
            medication, factor,
        )
    }

    /// Custom medication notice.
    pub fn unverified_medication(medication: &str) -> String {
        format!(
            "{} was entered manually and is not matched to a known product, \
             so interaction and dose range data may be incomplete.",
            medication,
        )
    }

    pub fn suggestion(medication: &str, suggestion: &str) -> String {
        format!("Consider {} for {}.", suggestion, medication)
    }
}

/// Render a gap as "15 minutes", "1 hour" or "2 hours 30 minutes".
pub fn format_gap(minutes: u32) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    let plural = |n: u32, unit: &str| {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };
    match (hours, rest) {
        (0, m) => plural(m, "minute"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} {}", plural(h, "hour"), plural(m, "minute")),
    }
}
