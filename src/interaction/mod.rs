pub mod adapters;
pub mod aggregator;
pub mod keywords;
pub mod provider;
pub mod types;

pub use adapters::{adapter_for, parse_payloads, registered_adapters, InteractionSourceAdapter};
pub use aggregator::aggregate;
pub use provider::{fetch_all, InteractionCache, InteractionProvider, TtlInteractionCache};
pub use types::{
    CombinedInteraction, Evidence, InteractionQuery, InteractionRecord, LookupKind,
    ProviderError, ProviderParseError, RawPayload, Severity,
};
