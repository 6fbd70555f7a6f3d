//! Expand a dosing schedule into the concrete dose times of one calendar day.
//!
//! All arithmetic is done in minutes since local midnight so a daylight-saving
//! transition inside the day cannot shift or drop a tick.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::models::{Meal, MealRelation, Medication};

use super::types::{DoseOccurrence, ScheduleConfigError, ScheduleSpec};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Dose timestamps for `date`, in ascending order. Empty when the schedule
/// is inactive that day or has no fixed occurrences (PRN, sliding scale).
pub fn expand(spec: &ScheduleSpec, date: NaiveDate) -> Result<Vec<NaiveDateTime>, ScheduleConfigError> {
    Ok(expand_times(spec, date)?
        .into_iter()
        .map(|t| date.and_time(t))
        .collect())
}

/// Times-of-day for `date`, sorted and de-duplicated.
pub fn expand_times(spec: &ScheduleSpec, date: NaiveDate) -> Result<Vec<NaiveTime>, ScheduleConfigError> {
    spec.validate()?;

    let mut times: Vec<NaiveTime> = match spec {
        ScheduleSpec::FixedTime { times } => times.clone(),
        ScheduleSpec::Interval { every_hours } => interval_times(*every_hours),
        ScheduleSpec::MealBased {
            meal,
            offset_minutes,
            relation,
        } => meal_time(*meal, *offset_minutes, *relation).into_iter().collect(),
        ScheduleSpec::Cyclic {
            days_on,
            days_off,
            start_date,
            times,
        } => {
            if is_cyclic_active(*days_on, *days_off, *start_date, date) {
                times.clone()
            } else {
                Vec::new()
            }
        }
        ScheduleSpec::Tapered { times, .. } => {
            if tapered_dose_on(spec, date).is_some() {
                times.clone()
            } else {
                Vec::new()
            }
        }
        ScheduleSpec::Complex { entries } => {
            let weekday = date.weekday();
            entries
                .iter()
                .filter(|e| e.days.contains(&weekday))
                .flat_map(|e| e.times.iter().copied())
                .collect()
        }
        ScheduleSpec::Prn { .. } | ScheduleSpec::SlidingScale { .. } => Vec::new(),
    };

    times.sort();
    times.dedup();
    Ok(times)
}

/// Occurrences of one medication's schedule on `date`.
pub fn expand_occurrences(
    medication: &Medication,
    date: NaiveDate,
) -> Result<Vec<DoseOccurrence>, ScheduleConfigError> {
    Ok(expand(&medication.schedule, date)?
        .into_iter()
        .map(|at| DoseOccurrence {
            medication_id: medication.id,
            medication_name: medication.name.clone(),
            at,
        })
        .collect())
}

/// Whether a days-on/days-off cycle is in an "on" day. Days before the
/// cycle starts are never active.
pub fn is_cyclic_active(days_on: u32, days_off: u32, start_date: NaiveDate, date: NaiveDate) -> bool {
    let elapsed = (date - start_date).num_days();
    if elapsed < 0 {
        return false;
    }
    let period = i64::from(days_on) + i64::from(days_off);
    if period == 0 {
        return false;
    }
    elapsed % period < i64::from(days_on)
}

/// Dose amount a tapered schedule prescribes on `date`, or `None` outside
/// its duration (or for any other schedule kind).
///
/// The dose moves one equal increment per step so the final step lands on
/// `end_dose`, and is clamped so it never overshoots `end_dose`.
pub fn tapered_dose_on(spec: &ScheduleSpec, date: NaiveDate) -> Option<f64> {
    let ScheduleSpec::Tapered {
        start_dose,
        end_dose,
        steps,
        total_days,
        start_date,
        ..
    } = spec
    else {
        return None;
    };

    let days_since_start = (date - *start_date).num_days();
    if days_since_start < 0 || days_since_start >= i64::from(*total_days) || *steps == 0 {
        return None;
    }

    let step_length = f64::from(*total_days) / f64::from(*steps);
    let step_index = (days_since_start as f64 / step_length).floor();
    let increment = if *steps > 1 {
        (end_dose - start_dose) / f64::from(*steps - 1)
    } else {
        0.0
    };

    let dose = start_dose + increment * step_index;
    let clamped = if end_dose < start_dose {
        dose.max(*end_dose)
    } else {
        dose.min(*end_dose)
    };
    Some(clamped)
}

/// Typical local time for each meal.
pub fn meal_anchor(meal: Meal) -> NaiveTime {
    let (h, m) = match meal {
        Meal::Breakfast => (8, 0),
        Meal::Lunch => (12, 0),
        Meal::Dinner => (18, 0),
        Meal::Bedtime => (22, 0),
    };
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

fn meal_time(meal: Meal, offset_minutes: u32, relation: MealRelation) -> Option<NaiveTime> {
    let anchor = minutes_of_day(meal_anchor(meal));
    let minutes = match relation {
        MealRelation::Before => (anchor + MINUTES_PER_DAY - offset_minutes % MINUTES_PER_DAY) % MINUTES_PER_DAY,
        MealRelation::With => anchor,
        MealRelation::After => (anchor + offset_minutes) % MINUTES_PER_DAY,
    };
    time_from_minutes(minutes)
}

fn interval_times(every_hours: u32) -> Vec<NaiveTime> {
    let step = every_hours * 60;
    (0..MINUTES_PER_DAY)
        .step_by(step as usize)
        .filter_map(time_from_minutes)
        .collect()
}

pub fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::types::ComplexEntry;
    use chrono::Weekday;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tapered(start: f64, end: f64, steps: u32, total_days: u32) -> ScheduleSpec {
        ScheduleSpec::Tapered {
            start_dose: start,
            end_dose: end,
            steps,
            total_days,
            start_date: day(2026, 3, 1),
            times: vec![t("08:00")],
        }
    }

    #[test]
    fn fixed_time_sorted_and_deduplicated() {
        let spec = ScheduleSpec::fixed(&[t("20:00"), t("08:00"), t("08:00")]);
        let times = expand_times(&spec, day(2026, 3, 1)).unwrap();
        assert_eq!(times, vec![t("08:00"), t("20:00")]);
    }

    #[test]
    fn fixed_time_lands_on_requested_date() {
        let spec = ScheduleSpec::fixed(&[t("09:00")]);
        let stamps = expand(&spec, day(2026, 3, 29)).unwrap();
        assert_eq!(stamps, vec![day(2026, 3, 29).and_time(t("09:00"))]);
    }

    #[test]
    fn interval_starts_at_midnight_with_even_spacing() {
        let spec = ScheduleSpec::Interval { every_hours: 6 };
        let times = expand_times(&spec, day(2026, 3, 29)).unwrap();
        assert_eq!(times, vec![t("00:00"), t("06:00"), t("12:00"), t("18:00")]);
    }

    #[test]
    fn interval_that_does_not_divide_day() {
        let spec = ScheduleSpec::Interval { every_hours: 7 };
        let times = expand_times(&spec, day(2026, 3, 1)).unwrap();
        assert_eq!(times, vec![t("00:00"), t("07:00"), t("14:00"), t("21:00")]);
    }

    #[test]
    fn meal_based_offsets() {
        let before = ScheduleSpec::MealBased {
            meal: Meal::Breakfast,
            offset_minutes: 30,
            relation: MealRelation::Before,
        };
        let with = ScheduleSpec::MealBased {
            meal: Meal::Lunch,
            offset_minutes: 30,
            relation: MealRelation::With,
        };
        let after = ScheduleSpec::MealBased {
            meal: Meal::Dinner,
            offset_minutes: 60,
            relation: MealRelation::After,
        };
        let d = day(2026, 3, 1);
        assert_eq!(expand_times(&before, d).unwrap(), vec![t("07:30")]);
        assert_eq!(expand_times(&with, d).unwrap(), vec![t("12:00")]);
        assert_eq!(expand_times(&after, d).unwrap(), vec![t("19:00")]);
    }

    #[test]
    fn meal_after_bedtime_wraps_within_day() {
        let spec = ScheduleSpec::MealBased {
            meal: Meal::Bedtime,
            offset_minutes: 180,
            relation: MealRelation::After,
        };
        assert_eq!(expand_times(&spec, day(2026, 3, 1)).unwrap(), vec![t("01:00")]);
    }

    #[test]
    fn cyclic_three_on_four_off() {
        let start = day(2026, 1, 5);
        for offset in 0..21i64 {
            let date = start + chrono::Duration::days(offset);
            let expected = offset % 7 < 3;
            assert_eq!(is_cyclic_active(3, 4, start, date), expected, "day {offset}");
        }
    }

    #[test]
    fn cyclic_off_day_expands_empty() {
        let spec = ScheduleSpec::Cyclic {
            days_on: 3,
            days_off: 4,
            start_date: day(2026, 1, 5),
            times: vec![t("09:00")],
        };
        assert_eq!(expand_times(&spec, day(2026, 1, 6)).unwrap(), vec![t("09:00")]);
        assert!(expand_times(&spec, day(2026, 1, 9)).unwrap().is_empty());
        assert!(expand_times(&spec, day(2026, 1, 1)).unwrap().is_empty());
    }

    #[test]
    fn tapered_down_is_non_increasing() {
        let spec = tapered(40.0, 10.0, 4, 28);
        let mut previous = f64::MAX;
        for offset in 0..28i64 {
            let dose = tapered_dose_on(&spec, day(2026, 3, 1) + chrono::Duration::days(offset)).unwrap();
            assert!(dose <= previous, "day {offset}: {dose} > {previous}");
            assert!(dose >= 10.0);
            previous = dose;
        }
        assert_eq!(tapered_dose_on(&spec, day(2026, 3, 1)), Some(40.0));
        assert_eq!(tapered_dose_on(&spec, day(2026, 3, 28)), Some(10.0));
    }

    #[test]
    fn tapered_up_is_non_decreasing_and_clamped() {
        let spec = tapered(5.0, 20.0, 3, 10);
        let mut previous = f64::MIN;
        for offset in 0..10i64 {
            let dose = tapered_dose_on(&spec, day(2026, 3, 1) + chrono::Duration::days(offset)).unwrap();
            assert!(dose >= previous);
            assert!(dose <= 20.0);
            previous = dose;
        }
    }

    #[test]
    fn tapered_steps_stretch_when_days_do_not_divide_evenly() {
        let spec = tapered(40.0, 10.0, 4, 10);
        let doses: Vec<f64> = (0..10i64)
            .map(|offset| tapered_dose_on(&spec, day(2026, 3, 1) + chrono::Duration::days(offset)).unwrap())
            .collect();
        assert_eq!(doses, vec![40.0, 40.0, 40.0, 30.0, 30.0, 20.0, 20.0, 20.0, 10.0, 10.0]);
    }

    #[test]
    fn tapered_past_duration_is_empty() {
        let spec = tapered(40.0, 10.0, 4, 28);
        assert!(tapered_dose_on(&spec, day(2026, 3, 29)).is_none());
        assert!(expand_times(&spec, day(2026, 3, 29)).unwrap().is_empty());
        assert!(expand_times(&spec, day(2026, 2, 28)).unwrap().is_empty());
    }

    #[test]
    fn complex_matches_weekday() {
        let spec = ScheduleSpec::Complex {
            entries: vec![
                ComplexEntry {
                    days: vec![Weekday::Mon, Weekday::Wed],
                    times: vec![t("08:00")],
                },
                ComplexEntry {
                    days: vec![Weekday::Mon],
                    times: vec![t("20:00")],
                },
            ],
        };
        // 2026-03-02 is a Monday.
        assert_eq!(expand_times(&spec, day(2026, 3, 2)).unwrap(), vec![t("08:00"), t("20:00")]);
        assert_eq!(expand_times(&spec, day(2026, 3, 4)).unwrap(), vec![t("08:00")]);
        assert!(expand_times(&spec, day(2026, 3, 3)).unwrap().is_empty());
    }

    #[test]
    fn prn_and_sliding_scale_have_no_occurrences() {
        assert!(expand_times(&ScheduleSpec::prn(), day(2026, 3, 1)).unwrap().is_empty());
    }

    #[test]
    fn malformed_spec_fails() {
        let spec = ScheduleSpec::Interval { every_hours: 0 };
        assert!(matches!(
            expand(&spec, day(2026, 3, 1)),
            Err(ScheduleConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn occurrences_carry_medication_identity() {
        let med = Medication::new(
            "Metformin",
            500.0,
            "mg",
            crate::models::DoseForm::Tablet,
            "twice daily",
            ScheduleSpec::fixed(&[t("08:00"), t("20:00")]),
        );
        let occurrences = expand_occurrences(&med, day(2026, 3, 1)).unwrap();
        assert_eq!(occurrences.len(), 2);
        assert!(occurrences.iter().all(|o| o.medication_id == med.id && o.medication_name == "Metformin"));
    }
}
