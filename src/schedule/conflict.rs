//! Detect doses of two different medications scheduled too close together.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::messages::MessageTemplates;

use super::expander::{minutes_of_day, MINUTES_PER_DAY};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Any two doses closer than the general minimum gap.
    TimeProximity,
    /// A pair whose absorption or effect requires a longer separation.
    TimingInteraction,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeProximity => "time_proximity",
            Self::TimingInteraction => "timing_interaction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Minor,
    #[default]
    Moderate,
    Major,
}

/// Two doses closer together than the configured gap. `medication_a` is
/// always the lexically smaller (name, time) side, so the same pair produces
/// the same conflict whichever order it was checked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub medication_a: String,
    pub medication_b: String,
    pub time_a: NaiveTime,
    pub time_b: NaiveTime,
    /// The earlier of the two dose times, reading the clock forward across
    /// the shorter gap (23:50 for a 23:50/00:05 pair).
    pub conflict_time: NaiveTime,
    pub gap_minutes: u32,
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub description: String,
    pub recommendation: String,
}

/// A medication pair that must be separated by more than the general gap.
#[derive(Debug)]
pub struct TimingRule {
    pub first: &'static [&'static str],
    pub second: &'static [&'static str],
    pub reason: &'static str,
}

static MINERAL_BINDERS: &[&str] = &[
    "calcium",
    "antacid",
    "iron",
    "ferrous",
    "magnesium",
    "zinc",
    "aluminum hydroxide",
    "sucralfate",
];

static TIMING_RULES: &[TimingRule] = &[
    TimingRule {
        first: &["levothyroxine", "liothyronine"],
        second: MINERAL_BINDERS,
        reason: "Minerals and antacids reduce thyroid hormone absorption.",
    },
    TimingRule {
        first: &["ciprofloxacin", "levofloxacin", "moxifloxacin", "norfloxacin", "ofloxacin"],
        second: MINERAL_BINDERS,
        reason: "Minerals and antacids bind fluoroquinolones and reduce their absorption.",
    },
    TimingRule {
        first: &["tetracycline", "doxycycline", "minocycline"],
        second: MINERAL_BINDERS,
        reason: "Minerals and antacids bind tetracyclines and reduce their absorption.",
    },
    TimingRule {
        first: &["alendronate", "risedronate", "ibandronate"],
        second: MINERAL_BINDERS,
        reason: "Bisphosphonates must be taken apart from minerals to be absorbed.",
    },
];

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Distance between two times-of-day on a 24-hour clock, in minutes,
/// wrapping around midnight.
pub fn circular_gap(a: NaiveTime, b: NaiveTime) -> u32 {
    let diff = minutes_of_day(a).abs_diff(minutes_of_day(b));
    diff.min(MINUTES_PER_DAY - diff)
}

/// Every cross-medication dose pair closer than `min_gap_minutes`.
/// Output is sorted so checking (A, B) and (B, A) yields equal vectors.
pub fn detect_time_conflicts(
    a: (&str, &[NaiveTime]),
    b: (&str, &[NaiveTime]),
    min_gap_minutes: u32,
) -> Vec<ScheduleConflict> {
    scan_pairs(a, b, min_gap_minutes, ConflictType::TimeProximity, |x, tx, y, ty, gap| {
        MessageTemplates::time_proximity(x, &hhmm(tx), y, &hhmm(ty), gap, min_gap_minutes)
    })
}

/// Conflicts for pairs listed in the timing-interaction table, using the
/// longer `gap_minutes` separation. Empty for pairs with no rule.
pub fn detect_timing_interactions(
    a: (&str, &[NaiveTime]),
    b: (&str, &[NaiveTime]),
    gap_minutes: u32,
) -> Vec<ScheduleConflict> {
    let Some(rule) = timing_rule_for(a.0, b.0) else {
        return Vec::new();
    };
    scan_pairs(a, b, gap_minutes, ConflictType::TimingInteraction, |x, _, y, _, gap| {
        MessageTemplates::timing_interaction(x, y, gap, rule.reason)
    })
}

/// Find the timing rule covering this pair, in either order.
pub fn timing_rule_for(a: &str, b: &str) -> Option<&'static TimingRule> {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let matches = |name: &str, keys: &[&str]| keys.iter().any(|k| name.contains(k));
    TIMING_RULES.iter().find(|rule| {
        (matches(&a, rule.first) && matches(&b, rule.second))
            || (matches(&b, rule.first) && matches(&a, rule.second))
    })
}

fn scan_pairs<F>(
    a: (&str, &[NaiveTime]),
    b: (&str, &[NaiveTime]),
    min_gap_minutes: u32,
    conflict_type: ConflictType,
    describe: F,
) -> Vec<ScheduleConflict>
where
    F: Fn(&str, NaiveTime, &str, NaiveTime, u32) -> String,
{
    let mut conflicts = Vec::new();

    for &t1 in a.1 {
        for &t2 in b.1 {
            let gap = circular_gap(t1, t2);
            if gap >= min_gap_minutes {
                continue;
            }

            let ((name_a, time_a), (name_b, time_b)) = if (b.0, t2) < (a.0, t1) {
                ((b.0, t2), (a.0, t1))
            } else {
                ((a.0, t1), (b.0, t2))
            };

            conflicts.push(ScheduleConflict {
                medication_a: name_a.to_string(),
                medication_b: name_b.to_string(),
                time_a,
                time_b,
                conflict_time: earlier_on_clock(time_a, time_b),
                gap_minutes: gap,
                conflict_type,
                severity: ConflictSeverity::default(),
                description: describe(name_a, time_a, name_b, time_b, gap),
                recommendation: MessageTemplates::space_doses(name_a, name_b, min_gap_minutes),
            });
        }
    }

    conflicts.sort_by(|x, y| {
        (x.conflict_time, &x.medication_a, x.time_a, &x.medication_b, x.time_b).cmp(&(
            y.conflict_time,
            &y.medication_a,
            y.time_a,
            &y.medication_b,
            y.time_b,
        ))
    });
    conflicts
}

fn earlier_on_clock(a: NaiveTime, b: NaiveTime) -> NaiveTime {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if minutes_of_day(hi) - minutes_of_day(lo) > MINUTES_PER_DAY / 2 {
        hi
    } else {
        lo
    }
}

fn hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
