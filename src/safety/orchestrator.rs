//! Safety orchestrator: runs interaction, timing and dosage checks across a
//! medication list and folds everything into one `ValidationReport`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, NaiveTime};
use futures_util::future::join_all;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::SafetyConfig;
use crate::dosage::{
    assess_patient_factors, check_daily_total, validate_dose_amount,
    validate_medication_frequency, DoseReference, Frequency, SafetyCheck,
};
use crate::interaction::{
    aggregate, fetch_all, parse_payloads, CombinedInteraction, InteractionCache,
    InteractionProvider, InteractionQuery, Severity,
};
use crate::messages::MessageTemplates;
use crate::models::{Medication, PatientContext};
use crate::schedule::{
    detect_time_conflicts, detect_timing_interactions, expand_times, tapered_dose_on,
};

use super::report::{IssueKind, ReportBuilder, ReportIssue, ValidationReport, ValidationState};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("Validation was cancelled")]
    Cancelled,
}

pub struct SafetyOrchestrator {
    config: SafetyConfig,
    reference: DoseReference,
    providers: Vec<Arc<dyn InteractionProvider>>,
    cache: Option<Arc<dyn InteractionCache>>,
}

impl SafetyOrchestrator {
    /// Orchestrator with the bundled dose reference and no interaction providers.
    pub fn new(config: SafetyConfig) -> Self {
        Self {
            config,
            reference: DoseReference::builtin(),
            providers: Vec::new(),
            cache: None,
        }
    }

    pub fn with_reference(mut self, reference: DoseReference) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn InteractionProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn InteractionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    /// Run every check and return the complete report. Never exits early.
    pub async fn validate(&self, medications: &[Medication], patient: &PatientContext) -> ValidationReport {
        let start = Instant::now();
        tracing::debug!(
            state = ValidationState::Validating.as_str(),
            medications = medications.len(),
            "Medication validation started"
        );

        let mut builder = ReportBuilder::default();
        let date = self.config.reference_date();

        self.check_interactions(medications, &mut builder).await;
        self.check_timing(medications, date, &mut builder);
        for medication in medications {
            self.check_medication(medication, patient, date, &mut builder);
        }

        let report = builder.finish(chrono::Local::now().naive_local());

        tracing::debug!(state = report.state.as_str(), "Medication validation finished");
        tracing::info!(
            medications = medications.len(),
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            conflicts = report.conflicts.len(),
            interactions = report.interactions.len(),
            state = report.state.as_str(),
            processing_ms = start.elapsed().as_millis() as u64,
            "Medication safety validation complete"
        );

        report
    }

    /// Like `validate`, but abandons the run when `cancel` fires. Pending
    /// provider lookups are dropped and no partial report is returned.
    pub async fn validate_with_cancel(
        &self,
        medications: &[Medication],
        patient: &PatientContext,
        cancel: &CancellationToken,
    ) -> Result<ValidationReport, OrchestratorError> {
        if cancel.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(medications = medications.len(), "Medication validation cancelled");
                Err(OrchestratorError::Cancelled)
            }
            report = self.validate(medications, patient) => Ok(report),
        }
    }

    // ---------------------------------------------------------------------------
    // Interactions
    // ---------------------------------------------------------------------------

    async fn check_interactions(&self, medications: &[Medication], builder: &mut ReportBuilder) {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for (i, a) in medications.iter().enumerate() {
            for b in &medications[i + 1..] {
                let (x, y) = (a.normalized_name(), b.normalized_name());
                if x == y {
                    continue;
                }
                let key = if x < y { (x, y) } else { (y, x) };
                if seen.insert(key) {
                    pairs.push((a, b));
                }
            }
        }

        let combined = join_all(pairs.iter().map(|(a, b)| self.lookup_pair(a, b))).await;

        for interaction in combined.into_iter().filter(CombinedInteraction::has_data) {
            let (a, b) = (interaction.medication_a.as_str(), interaction.medication_b.as_str());
            match interaction.severity {
                Severity::Major => {
                    builder.error(ReportIssue::new(
                        IssueKind::Interaction,
                        &[a, b],
                        MessageTemplates::major_interaction(a, b, &interaction.sources),
                    ));
                    builder.recommend(MessageTemplates::interaction_recommendation(a, b, true));
                }
                Severity::Moderate | Severity::Minor => {
                    builder.warning(ReportIssue::new(
                        IssueKind::Interaction,
                        &[a, b],
                        MessageTemplates::interaction_notice(
                            a,
                            b,
                            interaction.severity.as_str(),
                            &interaction.sources,
                        ),
                    ));
                    builder.recommend(MessageTemplates::interaction_recommendation(a, b, false));
                }
                Severity::Unknown => {}
            }
            builder.interaction(interaction);
        }
    }

    /// Drug-drug lookup, plus herb-drug lookups both ways when either side
    /// is herbal. All lookups for the pair run concurrently.
    async fn lookup_pair(&self, a: &Medication, b: &Medication) -> CombinedInteraction {
        let mut queries = vec![InteractionQuery::drug_drug(&a.name, &b.name)];
        if a.is_herbal || b.is_herbal {
            queries.push(InteractionQuery::herb_drug(&a.name, &b.name));
            queries.push(InteractionQuery::herb_drug(&b.name, &a.name));
        }

        let timeout = self.config.provider_timeout();
        let cache = self.cache.as_deref();
        let payloads: Vec<_> = join_all(
            queries
                .iter()
                .map(|q| fetch_all(&self.providers, q, timeout, cache)),
        )
        .await
        .into_iter()
        .flatten()
        .collect();

        let records = parse_payloads(&payloads);
        let combined = aggregate(&a.name, &b.name, &records);
        tracing::debug!(
            medication_a = %a.name,
            medication_b = %b.name,
            payloads = payloads.len(),
            records = records.len(),
            severity = combined.severity.as_str(),
            "Interaction lookup complete"
        );
        combined
    }

    // ---------------------------------------------------------------------------
    // Timing
    // ---------------------------------------------------------------------------

    fn check_timing(&self, medications: &[Medication], date: NaiveDate, builder: &mut ReportBuilder) {
        let expanded: Vec<Option<Vec<NaiveTime>>> = medications
            .iter()
            .map(|m| match expand_times(&m.schedule, date) {
                Ok(times) => Some(times),
                Err(e) => {
                    tracing::warn!(medication = %m.name, error = %e, "Schedule could not be expanded");
                    builder.error(ReportIssue::new(
                        IssueKind::ScheduleConfig,
                        &[m.name.as_str()],
                        format!("{}: {}", m.name, e),
                    ));
                    None
                }
            })
            .collect();

        for (i, a) in medications.iter().enumerate() {
            let Some(times_a) = &expanded[i] else { continue };
            for (j, b) in medications.iter().enumerate().skip(i + 1) {
                let Some(times_b) = &expanded[j] else { continue };
                if a.id == b.id {
                    continue;
                }

                let side_a = (a.name.as_str(), times_a.as_slice());
                let side_b = (b.name.as_str(), times_b.as_slice());
                for conflict in detect_time_conflicts(side_a, side_b, self.config.min_dose_gap_minutes)
                    .into_iter()
                    .chain(detect_timing_interactions(
                        side_a,
                        side_b,
                        self.config.timing_interaction_gap_minutes,
                    ))
                {
                    builder.conflict(conflict);
                }
            }
        }
    }

    // ---------------------------------------------------------------------------
    // Per-medication checks
    // ---------------------------------------------------------------------------

    fn check_medication(
        &self,
        medication: &Medication,
        patient: &PatientContext,
        date: NaiveDate,
        builder: &mut ReportBuilder,
    ) {
        let name = medication.name.as_str();

        if medication.is_custom {
            builder.warning(ReportIssue::new(
                IssueKind::UnverifiedMedication,
                &[name],
                MessageTemplates::unverified_medication(name),
            ));
        }

        // A tapered schedule is checked at the amount it prescribes on `date`.
        let amount = tapered_dose_on(&medication.schedule, date).unwrap_or(medication.dose_amount);
        let unit = medication.dose_unit.as_str();

        let dose = validate_dose_amount(name, amount, unit, medication.form, &self.reference);
        record_failure(builder, IssueKind::Dosage, name, dose);

        let frequency = validate_medication_frequency(medication, &self.config);
        record_failure(builder, IssueKind::Frequency, name, frequency);

        if !medication.schedule.is_as_needed() {
            if let Some(parsed) = Frequency::parse(&medication.frequency) {
                let daily = check_daily_total(name, amount, unit, &parsed, &self.reference);
                record_failure(builder, IssueKind::Dosage, name, daily);
            }
        }

        for notice in assess_patient_factors(name, amount, unit, patient, &self.reference) {
            for suggestion in &notice.suggestions {
                builder.recommend(MessageTemplates::suggestion(name, suggestion));
            }
            builder.warning(ReportIssue::new(IssueKind::PatientFactor, &[name], notice.message));
        }
    }
}

fn record_failure(builder: &mut ReportBuilder, kind: IssueKind, medication: &str, check: SafetyCheck) {
    if check.ok {
        return;
    }
    for suggestion in &check.suggestions {
        builder.recommend(MessageTemplates::suggestion(medication, suggestion));
    }
    builder.error(ReportIssue::new(kind, &[medication], check.message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{LookupKind, ProviderError, TtlInteractionCache};
    use crate::models::DoseForm;
    use crate::schedule::{ConflictType, ScheduleSpec};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const CONTRAINDICATED: &str = r#"{"fullInteractionTypeGroup":[{"fullInteractionType":[{"interactionPair":[
        {"description":"Concurrent use is contraindicated due to serious bleeding risk."}]}]}]}"#;
    const MODERATE: &str = r#"{"fullInteractionTypeGroup":[{"fullInteractionType":[{"interactionPair":[
        {"description":"Use with caution; some evidence suggests increased drowsiness."}]}]}]}"#;

    struct MockProvider {
        body: &'static str,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                body,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl InteractionProvider for MockProvider {
        fn source_name(&self) -> &str {
            "RxNav"
        }

        fn supports(&self, kind: LookupKind) -> bool {
            kind == LookupKind::DrugDrug
        }

        async fn fetch(&self, _query: &InteractionQuery) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.to_string())
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl InteractionProvider for HangingProvider {
        fn source_name(&self) -> &str {
            "RxNav"
        }

        async fn fetch(&self, _query: &InteractionQuery) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(CONTRAINDICATED.to_string())
        }
    }

    struct MonographProvider;

    #[async_trait]
    impl InteractionProvider for MonographProvider {
        fn source_name(&self) -> &str {
            "HerbalMonograph"
        }

        fn supports(&self, kind: LookupKind) -> bool {
            kind == LookupKind::HerbDrug
        }

        async fn fetch(&self, query: &InteractionQuery) -> Result<String, ProviderError> {
            if query.subject == "Ginkgo" {
                Ok("Interactions:\nMild bleeding has been reported with aspirin.\n".to_string())
            } else {
                Err(ProviderError::NotFound("HerbalMonograph".into()))
            }
        }
    }

    fn config() -> SafetyConfig {
        SafetyConfig {
            conflict_reference_date: NaiveDate::from_ymd_opt(2026, 3, 2),
            ..SafetyConfig::default()
        }
    }

    fn at(hhmm: &str) -> NaiveTime {
        NaiveTime::parse_from_str(hhmm, "%H:%M").unwrap()
    }

    fn make_medication(name: &str, mg: f64, times: &[&str]) -> Medication {
        let times: Vec<NaiveTime> = times.iter().map(|t| at(t)).collect();
        let frequency = format!("{} times per day", times.len());
        Medication::new(name, mg, "mg", DoseForm::Tablet, &frequency, ScheduleSpec::fixed(&times))
    }

    #[tokio::test]
    async fn close_doses_fail_with_one_conflict() {
        let orchestrator = SafetyOrchestrator::new(config());
        let meds = vec![
            make_medication("Metformin", 500.0, &["09:00"]),
            make_medication("Lisinopril", 10.0, &["09:15"]),
        ];

        let report = orchestrator.validate(&meds, &PatientContext::default()).await;

        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].conflict_type, ConflictType::TimeProximity);
        assert_eq!(report.conflicts[0].gap_minutes, 15);
        assert!(!report.is_valid);
        assert_eq!(report.state, ValidationState::Failed);
        assert!(!report.recommendations.is_empty());
    }

    #[tokio::test]
    async fn spaced_doses_pass() {
        let orchestrator = SafetyOrchestrator::new(config());
        let meds = vec![
            make_medication("Metformin", 500.0, &["09:00"]),
            make_medication("Lisinopril", 10.0, &["11:00"]),
        ];

        let report = orchestrator.validate(&meds, &PatientContext::default()).await;

        assert!(report.conflicts.is_empty());
        assert!(report.is_valid, "{:?}", report.errors);
        assert_eq!(report.state, ValidationState::Passed);
    }

    #[tokio::test]
    async fn contraindicated_pair_is_major_and_fails() {
        let provider = MockProvider::new(CONTRAINDICATED);
        let orchestrator = SafetyOrchestrator::new(config()).with_provider(provider.clone());
        let meds = vec![
            make_medication("Warfarin", 5.0, &["08:00"]),
            make_medication("Aspirin", 81.0, &["20:00"]),
        ];

        let report = orchestrator.validate(&meds, &PatientContext::default()).await;

        assert_eq!(report.interactions.len(), 1);
        assert_eq!(report.interactions[0].severity, Severity::Major);
        assert_eq!(report.errors_of(IssueKind::Interaction).count(), 1);
        assert_eq!(report.state, ValidationState::Failed);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn moderate_interaction_is_a_warning() {
        let orchestrator = SafetyOrchestrator::new(config()).with_provider(MockProvider::new(MODERATE));
        let meds = vec![
            make_medication("Sertraline", 50.0, &["08:00"]),
            make_medication("Ibuprofen", 400.0, &["20:00"]),
        ];

        let report = orchestrator.validate(&meds, &PatientContext::default()).await;

        assert!(report.is_valid, "{:?}", report.errors);
        assert_eq!(report.warnings_of(IssueKind::Interaction).count(), 1);
        assert_eq!(report.interactions[0].severity, Severity::Moderate);
    }

    #[tokio::test]
    async fn herbal_pair_runs_herb_drug_lookups() {
        let orchestrator = SafetyOrchestrator::new(config()).with_provider(Arc::new(MonographProvider));
        let meds = vec![
            make_medication("Ginkgo", 120.0, &["08:00"]).herbal(),
            make_medication("Aspirin", 81.0, &["20:00"]),
        ];

        let report = orchestrator.validate(&meds, &PatientContext::default()).await;

        assert_eq!(report.interactions.len(), 1);
        assert_eq!(report.interactions[0].severity, Severity::Minor);
        assert_eq!(report.interactions[0].sources, vec!["HerbalMonograph"]);
        assert_eq!(report.warnings_of(IssueKind::Interaction).count(), 1);
    }

    #[tokio::test]
    async fn duplicate_pairs_are_looked_up_once() {
        let provider = MockProvider::new(CONTRAINDICATED);
        let orchestrator = SafetyOrchestrator::new(config()).with_provider(provider.clone());
        let mut second_warfarin = make_medication("warfarin", 5.0, &["08:00"]);
        second_warfarin.id = uuid::Uuid::new_v4();
        let meds = vec![
            make_medication("Warfarin", 5.0, &["08:00"]),
            make_medication("Aspirin", 81.0, &["20:00"]),
            second_warfarin,
        ];

        orchestrator.validate(&meds, &PatientContext::default()).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_serves_repeat_runs() {
        let provider = MockProvider::new(CONTRAINDICATED);
        let cache = Arc::new(TtlInteractionCache::new(Duration::from_secs(60)));
        let orchestrator = SafetyOrchestrator::new(config())
            .with_provider(provider.clone())
            .with_cache(cache.clone());
        let meds = vec![
            make_medication("Warfarin", 5.0, &["08:00"]),
            make_medication("Aspirin", 81.0, &["20:00"]),
        ];

        orchestrator.validate(&meds, &PatientContext::default()).await;
        orchestrator.validate(&meds, &PatientContext::default()).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn repeated_runs_have_same_findings() {
        let orchestrator = SafetyOrchestrator::new(config()).with_provider(MockProvider::new(MODERATE));
        let meds = vec![
            make_medication("Metformin", 5000.0, &["09:00"]),
            make_medication("Lisinopril", 10.0, &["09:10"]),
            make_medication("Levothyroxine", 0.05, &["07:00"]),
            make_medication("Calcium", 500.0, &["08:00"]).custom(),
        ];
        let patient = PatientContext {
            age_years: Some(70),
            ..Default::default()
        };

        let first = orchestrator.validate(&meds, &patient).await;
        let second = orchestrator.validate(&meds, &patient).await;

        assert!(first.same_findings(&second));
    }

    #[tokio::test]
    async fn all_checks_run_after_first_failure() {
        let orchestrator = SafetyOrchestrator::new(config()).with_provider(MockProvider::new(CONTRAINDICATED));
        let meds = vec![
            make_medication("Warfarin", 5.0, &["09:00"]),
            make_medication("Aspirin", 81.0, &["09:05"]),
            make_medication("Metformin", 5000.0, &["20:00"]),
        ];

        let report = orchestrator.validate(&meds, &PatientContext::default()).await;

        assert!(report.errors_of(IssueKind::Interaction).count() >= 1);
        assert!(report.errors_of(IssueKind::TimingConflict).count() >= 1);
        assert!(report.errors_of(IssueKind::Dosage).count() >= 1);
    }

    #[tokio::test]
    async fn timing_interaction_pair_needs_longer_gap() {
        let orchestrator = SafetyOrchestrator::new(config());
        let meds = vec![
            make_medication("Levothyroxine", 0.05, &["07:00"]),
            make_medication("Calcium carbonate", 500.0, &["08:00"]),
        ];

        let report = orchestrator.validate(&meds, &PatientContext::default()).await;

        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].conflict_type, ConflictType::TimingInteraction);
        assert!(!report.is_valid);
    }

    #[tokio::test]
    async fn malformed_schedule_does_not_stop_other_checks() {
        let orchestrator = SafetyOrchestrator::new(config());
        let mut broken = make_medication("Metformin", 500.0, &["09:00"]);
        broken.schedule = ScheduleSpec::Interval { every_hours: 0 };
        let meds = vec![
            broken,
            make_medication("Lisinopril", 10.0, &["09:00"]),
            make_medication("Atorvastatin", 20.0, &["09:10"]),
        ];

        let report = orchestrator.validate(&meds, &PatientContext::default()).await;

        assert_eq!(report.errors_of(IssueKind::ScheduleConfig).count(), 1);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].medication_a, "Atorvastatin");
    }

    #[tokio::test]
    async fn tapered_schedule_checks_todays_dose() {
        let orchestrator = SafetyOrchestrator::new(config());
        let mut prednisone = make_medication("Prednisone", 40.0, &["08:00"]);
        prednisone.schedule = ScheduleSpec::Tapered {
            start_dose: 120.0,
            end_dose: 10.0,
            steps: 4,
            total_days: 28,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            times: vec![at("08:00")],
        };
        prednisone.frequency = "once daily".into();

        let report = orchestrator.validate(&[prednisone], &PatientContext::default()).await;

        // Day 1 of the taper prescribes 120 mg, above both the single-dose
        // and the daily maximum of 80 mg.
        assert_eq!(report.errors_of(IssueKind::Dosage).count(), 2);
        assert!(report.errors[0].message.contains("120 mg"));
    }

    #[tokio::test]
    async fn patient_factors_and_custom_meds_warn() {
        let orchestrator = SafetyOrchestrator::new(config());
        let meds = vec![make_medication("Metformin", 1000.0, &["08:00"]).custom()];
        let patient = PatientContext {
            conditions: vec!["renal insufficiency".into()],
            ..Default::default()
        };

        let report = orchestrator.validate(&meds, &patient).await;

        assert!(report.is_valid, "{:?}", report.errors);
        assert_eq!(report.warnings_of(IssueKind::PatientFactor).count(), 1);
        assert_eq!(report.warnings_of(IssueKind::UnverifiedMedication).count(), 1);
        assert!(report
            .recommendations
            .contains(&"Consider 500mg for Metformin.".to_string()));
    }

    #[tokio::test]
    async fn prn_medication_is_not_timed_but_is_dose_checked() {
        let orchestrator = SafetyOrchestrator::new(config());
        let ibuprofen = Medication::new(
            "Ibuprofen",
            2000.0,
            "mg",
            DoseForm::Tablet,
            "as needed",
            ScheduleSpec::prn(),
        );
        let meds = vec![ibuprofen, make_medication("Metformin", 500.0, &["09:00"])];

        let report = orchestrator.validate(&meds, &PatientContext::default()).await;

        assert!(report.conflicts.is_empty());
        assert_eq!(report.errors_of(IssueKind::Dosage).count(), 1);
        assert_eq!(report.errors_of(IssueKind::Frequency).count(), 0);
    }

    #[tokio::test]
    async fn injected_reference_replaces_builtin_ranges() {
        let orchestrator = SafetyOrchestrator::new(config()).with_reference(DoseReference::default());
        let meds = vec![make_medication("Metformin", 5000.0, &["09:00"])];

        let report = orchestrator.validate(&meds, &PatientContext::default()).await;

        assert!(report.is_valid, "{:?}", report.errors);
        assert_eq!(orchestrator.config().min_dose_gap_minutes, 30);
    }

    #[tokio::test]
    async fn cancelled_run_returns_no_report() {
        let orchestrator = SafetyOrchestrator::new(config()).with_provider(Arc::new(HangingProvider));
        let meds = vec![
            make_medication("Warfarin", 5.0, &["08:00"]),
            make_medication("Aspirin", 81.0, &["20:00"]),
        ];
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = orchestrator
            .validate_with_cancel(&meds, &PatientContext::default(), &cancel)
            .await;

        assert_eq!(result, Err(OrchestratorError::Cancelled));
    }

    #[tokio::test]
    async fn already_cancelled_token_short_circuits() {
        let orchestrator = SafetyOrchestrator::new(config());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = orchestrator
            .validate_with_cancel(&[], &PatientContext::default(), &cancel)
            .await;
        assert_eq!(result, Err(OrchestratorError::Cancelled));
    }

    #[tokio::test]
    async fn uncancelled_run_returns_report() {
        let orchestrator = SafetyOrchestrator::new(config());
        let meds = vec![make_medication("Metformin", 500.0, &["09:00"])];
        let result = orchestrator
            .validate_with_cancel(&meds, &PatientContext::default(), &CancellationToken::new())
            .await;
        assert!(result.is_ok_and(|r| r.is_valid));
    }
}
