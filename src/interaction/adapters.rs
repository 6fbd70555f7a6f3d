//! Provider adapters: turn one provider's raw response into at most one
//! normalized `InteractionRecord`.
//!
//! Adapters never fail outward. `try_parse` reports why nothing was found,
//! and the provided `parse` logs that reason and returns `None`, so one
//! malformed response cannot block the other sources.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::keywords::{classify_evidence, classify_severity, truncate_effect, MAX_EFFECT_CHARS};
use super::types::{Evidence, InteractionRecord, ProviderParseError, RawPayload};

pub const OPENFDA_SOURCE: &str = "OpenFDA";
pub const RXNAV_SOURCE: &str = "RxNav";
pub const HERBAL_MONOGRAPH_SOURCE: &str = "HerbalMonograph";

/// Parse a provider's payload into zero or one interaction record.
pub trait InteractionSourceAdapter: Send + Sync {
    /// Provider name; matches `RawPayload::source`.
    fn source_name(&self) -> &'static str;

    fn try_parse(&self, payload: &RawPayload) -> Result<InteractionRecord, ProviderParseError>;

    fn parse(&self, payload: &RawPayload) -> Option<InteractionRecord> {
        match self.try_parse(payload) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(
                    source = self.source_name(),
                    subject = %payload.query.subject,
                    object = %payload.query.object,
                    error = %e,
                    "No interaction record from provider"
                );
                None
            }
        }
    }
}

static REGISTRY: &[&dyn InteractionSourceAdapter] =
    &[&OpenFdaLabelAdapter, &RxNavAdapter, &HerbalMonographAdapter];

/// Every registered adapter, in registration order.
pub fn registered_adapters() -> &'static [&'static dyn InteractionSourceAdapter] {
    REGISTRY
}

/// Look up the adapter for a provider name (case-insensitive).
pub fn adapter_for(source: &str) -> Option<&'static dyn InteractionSourceAdapter> {
    REGISTRY
        .iter()
        .copied()
        .find(|a| a.source_name().eq_ignore_ascii_case(source))
}

/// Parse each payload with its provider's adapter, dropping anything that
/// yields no record or has no registered adapter.
pub fn parse_payloads(payloads: &[RawPayload]) -> Vec<InteractionRecord> {
    payloads
        .iter()
        .filter_map(|p| match adapter_for(&p.source) {
            Some(adapter) => adapter.parse(p),
            None => {
                tracing::debug!(source = %p.source, "No adapter registered for provider");
                None
            }
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════
// OpenFDA drug label (regulator data: evidence is always Strong)
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
struct OpenFdaResponse {
    #[serde(default)]
    results: Vec<OpenFdaLabel>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenFdaLabel {
    #[serde(default)]
    drug_interactions: Vec<String>,
    #[serde(default)]
    contraindications: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

/// Drug label JSON fetched for `query.subject`; relevant text is every label
/// sentence that names `query.object`.
pub struct OpenFdaLabelAdapter;

impl InteractionSourceAdapter for OpenFdaLabelAdapter {
    fn source_name(&self) -> &'static str {
        OPENFDA_SOURCE
    }

    fn try_parse(&self, payload: &RawPayload) -> Result<InteractionRecord, ProviderParseError> {
        let response: OpenFdaResponse = parse_json(&payload.body)?;

        let sections: Vec<&String> = response
            .results
            .iter()
            .flat_map(|label| {
                label
                    .contraindications
                    .iter()
                    .chain(&label.drug_interactions)
                    .chain(&label.warnings)
            })
            .collect();
        if sections.is_empty() {
            return Err(ProviderParseError::MissingSection("label has no interaction sections".into()));
        }

        let text = sections
            .iter()
            .flat_map(|s| sentences_mentioning(s, &payload.query.object))
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return Err(ProviderParseError::MissingSection(format!(
                "label does not mention {}",
                payload.query.object
            )));
        }

        Ok(build_record(self.source_name(), payload, &text, Evidence::Strong))
    }
}

// ═══════════════════════════════════════════════════════════
// RxNav interaction API (structured JSON)
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RxNavResponse {
    #[serde(default)]
    full_interaction_type_group: Vec<RxNavGroup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RxNavGroup {
    #[serde(default)]
    full_interaction_type: Vec<RxNavInteractionType>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RxNavInteractionType {
    #[serde(default)]
    interaction_pair: Vec<RxNavPair>,
}

#[derive(Debug, Default, Deserialize)]
struct RxNavPair {
    #[serde(default)]
    description: String,
}

pub struct RxNavAdapter;

impl InteractionSourceAdapter for RxNavAdapter {
    fn source_name(&self) -> &'static str {
        RXNAV_SOURCE
    }

    fn try_parse(&self, payload: &RawPayload) -> Result<InteractionRecord, ProviderParseError> {
        let response: RxNavResponse = parse_json(&payload.body)?;

        let descriptions: Vec<&str> = response
            .full_interaction_type_group
            .iter()
            .flat_map(|g| &g.full_interaction_type)
            .flat_map(|t| &t.interaction_pair)
            .map(|p| p.description.trim())
            .filter(|d| !d.is_empty())
            .collect();
        if descriptions.is_empty() {
            return Err(ProviderParseError::MissingSection("no interactionPair descriptions".into()));
        }

        let text = descriptions.join(" ");
        let evidence = classify_evidence(&text);
        Ok(build_record(self.source_name(), payload, &text, evidence))
    }
}

// ═══════════════════════════════════════════════════════════
// Herbal monograph (textual document, plain text or HTML)
// ═══════════════════════════════════════════════════════════

static BLOCK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*(?:br|/p|/h[1-6]|/li|/div)\s*/?\s*>").unwrap());
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static INTERACTIONS_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?:^|\n)\s*(?:drug\s+)?interactions?[ \t]*(?::[ \t]*\n?|\n)(.+?)(?:\n\s*\n|\z)")
        .unwrap()
});

/// Monograph document for the herb in `query.subject`; relevant text is the
/// sentences of its Interactions section that name `query.object`.
pub struct HerbalMonographAdapter;

impl InteractionSourceAdapter for HerbalMonographAdapter {
    fn source_name(&self) -> &'static str {
        HERBAL_MONOGRAPH_SOURCE
    }

    fn try_parse(&self, payload: &RawPayload) -> Result<InteractionRecord, ProviderParseError> {
        if payload.body.trim().is_empty() {
            return Err(ProviderParseError::Empty);
        }

        let with_breaks = BLOCK_TAG.replace_all(&payload.body, "\n");
        let plain = ANY_TAG.replace_all(&with_breaks, "");

        let section = INTERACTIONS_SECTION
            .captures(&plain)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| ProviderParseError::MissingSection("no Interactions heading".into()))?;

        let text = sentences_mentioning(section, &payload.query.object).join(" ");
        if text.is_empty() {
            return Err(ProviderParseError::MissingSection(format!(
                "interactions section does not mention {}",
                payload.query.object
            )));
        }

        let evidence = classify_evidence(&text);
        Ok(build_record(self.source_name(), payload, &text, evidence))
    }
}

// ═══════════════════════════════════════════════════════════
// Shared helpers
// ═══════════════════════════════════════════════════════════

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ProviderParseError> {
    if body.trim().is_empty() {
        return Err(ProviderParseError::Empty);
    }
    serde_json::from_str(body).map_err(|e| ProviderParseError::InvalidJson(e.to_string()))
}

fn build_record(source: &str, payload: &RawPayload, text: &str, evidence: Evidence) -> InteractionRecord {
    InteractionRecord {
        source: source.to_string(),
        severity: classify_severity(text),
        evidence,
        effect: truncate_effect(text, MAX_EFFECT_CHARS),
        medication_a: payload.query.subject.clone(),
        medication_b: payload.query.object.clone(),
    }
}

/// Sentences of `text` that mention `name` (whole name or its first word).
fn sentences_mentioning(text: &str, name: &str) -> Vec<String> {
    let lower_name = name.trim().to_lowercase();
    let first_word = lower_name.split_whitespace().next().unwrap_or_default().to_string();
    if first_word.is_empty() {
        return Vec::new();
    }

    text.split_inclusive(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let lower = s.to_lowercase();
            lower.contains(&lower_name) || lower.contains(&first_word)
        })
        .map(str::to_string)
        .collect()
}
