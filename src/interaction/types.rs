use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Effect text shown when no source reported anything for a pair.
pub const NO_INTERACTION_INFO: &str = "no interaction information available";

// ---------------------------------------------------------------------------
// Severity & Evidence
// ---------------------------------------------------------------------------

/// Qualitative danger level. Variant order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Unknown,
    Minor,
    Moderate,
    Major,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Major => "major",
        }
    }
}

/// Confidence behind an interaction claim. Variant order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    #[default]
    Unknown,
    Limited,
    Moderate,
    Strong,
}

impl Evidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Limited => "limited",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    DrugDrug,
    HerbDrug,
}

/// The two medications a lookup is about. For herb-drug lookups `subject`
/// is the herb.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionQuery {
    pub subject: String,
    pub object: String,
    pub kind: LookupKind,
}

impl InteractionQuery {
    pub fn drug_drug(a: &str, b: &str) -> Self {
        Self {
            subject: a.to_string(),
            object: b.to_string(),
            kind: LookupKind::DrugDrug,
        }
    }

    pub fn herb_drug(herb: &str, drug: &str) -> Self {
        Self {
            subject: herb.to_string(),
            object: drug.to_string(),
            kind: LookupKind::HerbDrug,
        }
    }
}

/// An already-fetched provider response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPayload {
    pub source: String,
    pub query: InteractionQuery,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One provider's normalized view of an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub source: String,
    pub severity: Severity,
    pub evidence: Evidence,
    pub effect: String,
    pub medication_a: String,
    pub medication_b: String,
}

/// All sources' records for one medication pair folded into one verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedInteraction {
    pub medication_a: String,
    pub medication_b: String,
    pub severity: Severity,
    pub evidence: Evidence,
    pub effect: String,
    /// Sorted, de-duplicated provider names.
    pub sources: Vec<String>,
}

impl CombinedInteraction {
    /// The neutral verdict for a pair no source had data on.
    pub fn neutral(medication_a: &str, medication_b: &str) -> Self {
        Self {
            medication_a: medication_a.to_string(),
            medication_b: medication_b.to_string(),
            severity: Severity::Unknown,
            evidence: Evidence::Unknown,
            effect: NO_INTERACTION_INFO.to_string(),
            sources: Vec::new(),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.sources.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an adapter could not extract a record. Recovered inside the adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderParseError {
    #[error("Payload is empty")]
    Empty,

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("No interaction section found: {0}")]
    MissingSection(String),
}

/// Why a provider fetch produced no payload. Logged, never surfaced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider {0} timed out")]
    Timeout(String),

    #[error("Provider {source_name} transport error: {message}")]
    Transport { source_name: String, message: String },

    #[error("Provider {0} has no data for this query")]
    NotFound(String),
}
