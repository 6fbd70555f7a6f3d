//! Keyword classification of provider free text.
//!
//! Tiers are checked from most to least severe and the first tier with a
//! match wins, so "avoid excessive caution" classifies as Major.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{Evidence, Severity};

/// Default upper bound on stored effect text, in characters.
pub const MAX_EFFECT_CHARS: usize = 500;

static MAJOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:severe(?:ly)?|dangerous|avoid(?:ed|ing)?|contraindicated|serious(?:ly)?)\b").unwrap()
});
static MODERATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:moderate(?:ly)?|caution)\b").unwrap());
static MINOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:mild(?:ly)?|minor)\b").unwrap());

static STRONG_EVIDENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bclinical\s+studies\s+show\b").unwrap());
static MODERATE_EVIDENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsome\s+evidence\s+suggests\b").unwrap());
static LIMITED_EVIDENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blimited\s+evidence\b").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn classify_severity(text: &str) -> Severity {
    if MAJOR.is_match(text) {
        Severity::Major
    } else if MODERATE.is_match(text) {
        Severity::Moderate
    } else if MINOR.is_match(text) {
        Severity::Minor
    } else {
        Severity::Unknown
    }
}

pub fn classify_evidence(text: &str) -> Evidence {
    if STRONG_EVIDENCE.is_match(text) {
        Evidence::Strong
    } else if MODERATE_EVIDENCE.is_match(text) {
        Evidence::Moderate
    } else if LIMITED_EVIDENCE.is_match(text) {
        Evidence::Limited
    } else {
        Evidence::Unknown
    }
}

/// Collapse whitespace and cut to at most `max_chars` characters.
pub fn truncate_effect(text: &str, max_chars: usize) -> String {
    let collapsed = WHITESPACE.replace_all(text.trim(), " ");
    collapsed.chars().take(max_chars).collect()
}
