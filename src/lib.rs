pub mod config;
pub mod dosage; // Dose amount, frequency and patient-factor checks
pub mod interaction; // Source adapters, aggregation, provider fetch seam
pub mod messages;
pub mod models;
pub mod safety; // Orchestrator and validation report
pub mod schedule; // Time expansion and conflict detection
pub mod telemetry;

pub use config::SafetyConfig;
pub use models::{DoseForm, Medication, PatientContext};
pub use safety::{OrchestratorError, SafetyOrchestrator, ValidationReport, ValidationState};
pub use schedule::ScheduleSpec;
