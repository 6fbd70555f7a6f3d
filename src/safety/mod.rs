pub mod orchestrator;
pub mod report;

pub use orchestrator::{OrchestratorError, SafetyOrchestrator};
pub use report::{IssueKind, ReportIssue, ValidationReport, ValidationState};
