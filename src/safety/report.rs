use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::interaction::CombinedInteraction;
use crate::schedule::ScheduleConflict;

/// Where a validation run is. A returned report is always `Passed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    #[default]
    Idle,
    Validating,
    Passed,
    Failed,
}

impl ValidationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ScheduleConfig,
    Dosage,
    Frequency,
    TimingConflict,
    Interaction,
    PatientFactor,
    UnverifiedMedication,
}

/// One error or warning line in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportIssue {
    pub kind: IssueKind,
    pub medications: Vec<String>,
    pub message: String,
}

impl ReportIssue {
    pub fn new(kind: IssueKind, medications: &[&str], message: impl Into<String>) -> Self {
        Self {
            kind,
            medications: medications.iter().map(|m| m.to_string()).collect(),
            message: message.into(),
        }
    }
}

/// Result of one validation run. Built fresh per call and never mutated
/// after it is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub state: ValidationState,
    /// Blocking findings, in check order.
    pub errors: Vec<ReportIssue>,
    /// Non-blocking findings, in check order.
    pub warnings: Vec<ReportIssue>,
    /// De-duplicated, in first-seen order.
    pub recommendations: Vec<String>,
    pub conflicts: Vec<ScheduleConflict>,
    /// Pairs at least one source had data on.
    pub interactions: Vec<CombinedInteraction>,
    pub generated_at: NaiveDateTime,
}

impl ValidationReport {
    /// Equal in everything except `generated_at`.
    pub fn same_findings(&self, other: &Self) -> bool {
        self.is_valid == other.is_valid
            && self.state == other.state
            && self.errors == other.errors
            && self.warnings == other.warnings
            && self.recommendations == other.recommendations
            && self.conflicts == other.conflicts
            && self.interactions == other.interactions
    }

    pub fn errors_of(&self, kind: IssueKind) -> impl Iterator<Item = &ReportIssue> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    pub fn warnings_of(&self, kind: IssueKind) -> impl Iterator<Item = &ReportIssue> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// Collects findings while a run is in progress.
#[derive(Debug, Default)]
pub(crate) struct ReportBuilder {
    errors: Vec<ReportIssue>,
    warnings: Vec<ReportIssue>,
    recommendations: Vec<String>,
    conflicts: Vec<ScheduleConflict>,
    interactions: Vec<CombinedInteraction>,
}

impl ReportBuilder {
    pub fn error(&mut self, issue: ReportIssue) {
        self.errors.push(issue);
    }

    pub fn warning(&mut self, issue: ReportIssue) {
        self.warnings.push(issue);
    }

    pub fn recommend(&mut self, recommendation: impl Into<String>) {
        let recommendation = recommendation.into();
        if !recommendation.is_empty() && !self.recommendations.contains(&recommendation) {
            self.recommendations.push(recommendation);
        }
    }

    pub fn conflict(&mut self, conflict: ScheduleConflict) {
        self.recommend(conflict.recommendation.clone());
        self.error(ReportIssue::new(
            IssueKind::TimingConflict,
            &[conflict.medication_a.as_str(), conflict.medication_b.as_str()],
            conflict.description.clone(),
        ));
        self.conflicts.push(conflict);
    }

    pub fn interaction(&mut self, interaction: CombinedInteraction) {
        self.interactions.push(interaction);
    }

    pub fn finish(self, generated_at: NaiveDateTime) -> ValidationReport {
        let is_valid = self.errors.is_empty();
        ValidationReport {
            is_valid,
            state: if is_valid {
                ValidationState::Passed
            } else {
                ValidationState::Failed
            },
            errors: self.errors,
            warnings: self.warnings,
            recommendations: self.recommendations,
            conflicts: self.conflicts,
            interactions: self.interactions,
            generated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{ConflictSeverity, ConflictType};
    use chrono::NaiveTime;

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn conflict() -> ScheduleConflict {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let quarter = NaiveTime::from_hms_opt(9, 15, 0).unwrap();
        ScheduleConflict {
            medication_a: "Lisinopril".into(),
            medication_b: "Metformin".into(),
            time_a: quarter,
            time_b: nine,
            conflict_time: nine,
            gap_minutes: 15,
            conflict_type: ConflictType::TimeProximity,
            severity: ConflictSeverity::Moderate,
            description: "too close".into(),
            recommendation: "Space doses.".into(),
        }
    }

    #[test]
    fn empty_builder_passes() {
        let report = ReportBuilder::default().finish(now());
        assert!(report.is_valid);
        assert_eq!(report.state, ValidationState::Passed);
    }

    #[test]
    fn warnings_do_not_fail() {
        let mut builder = ReportBuilder::default();
        builder.warning(ReportIssue::new(IssueKind::Interaction, &["A", "B"], "minor"));
        let report = builder.finish(now());
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn conflict_is_blocking_and_recommends() {
        let mut builder = ReportBuilder::default();
        builder.conflict(conflict());
        builder.conflict(conflict());
        let report = builder.finish(now());
        assert!(!report.is_valid);
        assert_eq!(report.state, ValidationState::Failed);
        assert_eq!(report.errors_of(IssueKind::TimingConflict).count(), 2);
        assert_eq!(report.recommendations, vec!["Space doses."]);
    }

    #[test]
    fn same_findings_ignores_timestamp() {
        let a = ReportBuilder::default().finish(now());
        let b = ReportBuilder::default().finish(now() + chrono::Duration::seconds(5));
        assert!(a.same_findings(&b));
        assert_ne!(a, b);
    }
}
