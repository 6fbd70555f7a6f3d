//! Free-text frequency parsing.
//!
//! Handles "2 times per day", "twice daily", "BID", "every 8 hours", "q6h",
//! "3 times per hour", "hourly" and the usual as-needed aliases.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum Frequency {
    AsNeeded,
    PerDay(u32),
    EveryHours(u32),
    PerHour(u32),
}

impl Frequency {
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.trim().to_lowercase();
        let lower = lower.trim_end_matches('.');
        if lower.is_empty() {
            return None;
        }

        if let Some(f) = alias(lower) {
            return Some(f);
        }
        if let Some(caps) = RE_EVERY.captures(lower) {
            return word_number(caps.get(1)?.as_str()).map(Frequency::EveryHours);
        }
        if let Some(caps) = RE_TIMES.captures(lower) {
            let count = word_number(caps.get(1)?.as_str())?;
            return match caps.get(2)?.as_str() {
                "hour" | "hr" | "h" => Some(Frequency::PerHour(count)),
                _ => Some(Frequency::PerDay(count)),
            };
        }
        None
    }

    /// Doses per 24 hours. `None` for as-needed.
    pub fn daily_count(&self) -> Option<u32> {
        match *self {
            Frequency::AsNeeded => None,
            Frequency::PerDay(n) => Some(n),
            Frequency::EveryHours(0) => Some(0),
            Frequency::EveryHours(h) => Some(24u32.div_ceil(h)),
            Frequency::PerHour(n) => Some(n.saturating_mul(24)),
        }
    }

    /// Doses per hour, rounded up. `None` for as-needed.
    pub fn hourly_count(&self) -> Option<u32> {
        match *self {
            Frequency::AsNeeded => None,
            Frequency::PerHour(n) => Some(n),
            Frequency::EveryHours(h) => Some(u32::from(h <= 1 && h > 0)),
            Frequency::PerDay(n) => Some(n.div_ceil(24)),
        }
    }

    pub fn is_as_needed(&self) -> bool {
        matches!(self, Frequency::AsNeeded)
    }

    /// Canonical label used in messages and suggestions.
    pub fn label(&self) -> String {
        match *self {
            Frequency::AsNeeded => "as needed".to_string(),
            Frequency::PerDay(1) => "1 time per day".to_string(),
            Frequency::PerDay(n) => format!("{n} times per day"),
            Frequency::EveryHours(1) => "every hour".to_string(),
            Frequency::EveryHours(h) => format!("every {h} hours"),
            Frequency::PerHour(1) => "1 time per hour".to_string(),
            Frequency::PerHour(n) => format!("{n} times per hour"),
        }
    }
}

static RE_EVERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:every|q)\s*(\d+|[a-z]+)\s*(?:hours?|hrs?|h)$").unwrap()
});
static RE_TIMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+|[a-z]+)\s*(?:x|times?)?\s*(?:per|a|an|each|every|/)\s*(day|d|hour|hr|h)$|^(\d+|[a-z]+)\s*(?:x|times?)\s+(daily)$")
        .unwrap()
});

fn alias(lower: &str) -> Option<Frequency> {
    let f = match lower {
        "prn" | "as needed" | "as required" | "when needed" | "if needed" | "as directed as needed" => {
            Frequency::AsNeeded
        }
        "qd" | "od" | "daily" | "once daily" | "once a day" | "every day" | "qhs" | "at bedtime"
        | "nightly" | "qam" | "every morning" => Frequency::PerDay(1),
        "bid" | "twice daily" | "twice a day" => Frequency::PerDay(2),
        "tid" | "three times daily" | "three times a day" => Frequency::PerDay(3),
        "qid" | "four times daily" | "four times a day" => Frequency::PerDay(4),
        "hourly" | "every hour" | "qh" => Frequency::EveryHours(1),
        _ => {
            if let Some(caps) = RE_TIMES.captures(lower) {
                if let (Some(n), Some(_)) = (caps.get(3), caps.get(4)) {
                    return word_number(n.as_str()).map(Frequency::PerDay);
                }
            }
            return None;
        }
    };
    Some(f)
}

fn word_number(word: &str) -> Option<u32> {
    let n = match word {
        "once" | "one" => 1,
        "twice" | "two" => 2,
        "thrice" | "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        other => return other.parse().ok(),
    };
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_per_day() {
        assert_eq!(Frequency::parse("2 times per day"), Some(Frequency::PerDay(2)));
        assert_eq!(Frequency::parse("3x/day"), Some(Frequency::PerDay(3)));
        assert_eq!(Frequency::parse("once a day"), Some(Frequency::PerDay(1)));
        assert_eq!(Frequency::parse("Twice Daily"), Some(Frequency::PerDay(2)));
        assert_eq!(Frequency::parse("5 times daily"), Some(Frequency::PerDay(5)));
    }

    #[test]
    fn latin_abbreviations_match_spelled_out() {
        assert_eq!(Frequency::parse("BID"), Frequency::parse("twice daily"));
        assert_eq!(Frequency::parse("tid"), Frequency::parse("three times daily"));
        assert_eq!(Frequency::parse("QID"), Some(Frequency::PerDay(4)));
        assert_eq!(Frequency::parse("qd"), Some(Frequency::PerDay(1)));
    }

    #[test]
    fn parses_intervals() {
        assert_eq!(Frequency::parse("every 8 hours"), Some(Frequency::EveryHours(8)));
        assert_eq!(Frequency::parse("q6h"), Some(Frequency::EveryHours(6)));
        assert_eq!(Frequency::parse("every four hours"), Some(Frequency::EveryHours(4)));
        assert_eq!(Frequency::parse("hourly"), Some(Frequency::EveryHours(1)));
    }

    #[test]
    fn parses_per_hour() {
        assert_eq!(Frequency::parse("6 times per hour"), Some(Frequency::PerHour(6)));
        assert_eq!(Frequency::parse("twice an hour"), Some(Frequency::PerHour(2)));
    }

    #[test]
    fn parses_as_needed() {
        assert_eq!(Frequency::parse("PRN"), Some(Frequency::AsNeeded));
        assert_eq!(Frequency::parse("as needed"), Some(Frequency::AsNeeded));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Frequency::parse(""), None);
        assert_eq!(Frequency::parse("whenever grandma says"), None);
    }

    #[test]
    fn daily_counts() {
        assert_eq!(Frequency::PerDay(3).daily_count(), Some(3));
        assert_eq!(Frequency::EveryHours(8).daily_count(), Some(3));
        assert_eq!(Frequency::EveryHours(5).daily_count(), Some(5));
        assert_eq!(Frequency::PerHour(2).daily_count(), Some(48));
        assert_eq!(Frequency::AsNeeded.daily_count(), None);
    }

    #[test]
    fn labels() {
        assert_eq!(Frequency::PerDay(1).label(), "1 time per day");
        assert_eq!(Frequency::EveryHours(6).label(), "every 6 hours");
        assert_eq!(Frequency::AsNeeded.label(), "as needed");
    }
}
