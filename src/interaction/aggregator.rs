use std::collections::BTreeSet;

use super::types::{CombinedInteraction, Evidence, InteractionRecord, Severity};

/// Fold every source's record for one pair into a single verdict.
///
/// Severity and evidence are the maxima by rank. Effect fragments are
/// "[Source] text", sorted before joining, so the output does not depend
/// on the order records arrived in.
pub fn aggregate(medication_a: &str, medication_b: &str, records: &[InteractionRecord]) -> CombinedInteraction {
    if records.is_empty() {
        return CombinedInteraction::neutral(medication_a, medication_b);
    }

    let severity = records
        .iter()
        .map(|r| r.severity)
        .max()
        .unwrap_or(Severity::Unknown);
    let evidence = records
        .iter()
        .map(|r| r.evidence)
        .max()
        .unwrap_or(Evidence::Unknown);

    let fragments: BTreeSet<String> = records
        .iter()
        .filter(|r| !r.effect.trim().is_empty())
        .map(|r| format!("[{}] {}", r.source, r.effect.trim()))
        .collect();
    let sources: BTreeSet<String> = records.iter().map(|r| r.source.clone()).collect();

    CombinedInteraction {
        medication_a: medication_a.to_string(),
        medication_b: medication_b.to_string(),
        severity,
        evidence,
        effect: fragments.into_iter().collect::<Vec<_>>().join(" "),
        sources: sources.into_iter().collect(),
    }
}
