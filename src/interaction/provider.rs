//! Fetch seam for interaction providers.
//!
//! The engine does not own HTTP transport. Callers implement
//! `InteractionProvider` over their client of choice; this module only runs
//! the lookups concurrently, bounds each with a timeout, and treats every
//! failure as "no data from this source".

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::join_all;

use super::types::{InteractionQuery, LookupKind, ProviderError, RawPayload};

/// One upstream interaction data source.
#[async_trait]
pub trait InteractionProvider: Send + Sync {
    /// Must match the name of the adapter that parses this provider's payloads.
    fn source_name(&self) -> &str;

    /// Whether this provider answers lookups of `kind`.
    fn supports(&self, kind: LookupKind) -> bool {
        let _ = kind;
        true
    }

    /// Fetch the raw response body for `query`.
    async fn fetch(&self, query: &InteractionQuery) -> Result<String, ProviderError>;
}

// ═══════════════════════════════════════════════════════════
// Cache
// ═══════════════════════════════════════════════════════════

/// Response cache owned by the calling layer and injected into the
/// orchestrator.
pub trait InteractionCache: Send + Sync {
    fn get(&self, source: &str, query: &InteractionQuery) -> Option<String>;
    fn put(&self, source: &str, query: &InteractionQuery, body: String);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: String,
    subject: String,
    object: String,
    kind: LookupKind,
}

impl CacheKey {
    fn new(source: &str, query: &InteractionQuery) -> Self {
        Self {
            source: source.to_lowercase(),
            subject: query.subject.trim().to_lowercase(),
            object: query.object.trim().to_lowercase(),
            kind: query.kind,
        }
    }
}

/// In-memory cache whose entries expire `ttl` after insertion.
pub struct TtlInteractionCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, (Instant, String)>>,
}

impl TtlInteractionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl InteractionCache for TtlInteractionCache {
    fn get(&self, source: &str, query: &InteractionQuery) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        let (inserted, body) = entries.get(&CacheKey::new(source, query))?;
        if inserted.elapsed() < self.ttl {
            Some(body.clone())
        } else {
            None
        }
    }

    /// Expired entries are evicted on every insert.
    fn put(&self, source: &str, query: &InteractionQuery, body: String) {
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries.retain(|_, (inserted, _)| inserted.elapsed() < ttl);
            entries.insert(CacheKey::new(source, query), (Instant::now(), body));
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Concurrent lookup
// ═══════════════════════════════════════════════════════════

/// Query every provider that supports `query.kind` concurrently and return
/// the payloads that arrived in time, in provider order.
pub async fn fetch_all(
    providers: &[Arc<dyn InteractionProvider>],
    query: &InteractionQuery,
    timeout: Duration,
    cache: Option<&dyn InteractionCache>,
) -> Vec<RawPayload> {
    let lookups = providers
        .iter()
        .filter(|p| p.supports(query.kind))
        .map(|p| fetch_one(p.as_ref(), query, timeout, cache));

    join_all(lookups).await.into_iter().flatten().collect()
}

async fn fetch_one(
    provider: &dyn InteractionProvider,
    query: &InteractionQuery,
    timeout: Duration,
    cache: Option<&dyn InteractionCache>,
) -> Option<RawPayload> {
    let source = provider.source_name();

    if let Some(body) = cache.and_then(|c| c.get(source, query)) {
        tracing::debug!(source, subject = %query.subject, object = %query.object, "Interaction cache hit");
        return Some(payload(source, query, body));
    }

    match tokio::time::timeout(timeout, provider.fetch(query)).await {
        Ok(Ok(body)) => {
            if let Some(cache) = cache {
                cache.put(source, query, body.clone());
            }
            Some(payload(source, query, body))
        }
        Ok(Err(e)) => {
            tracing::warn!(source, error = %e, "Interaction provider lookup failed");
            None
        }
        Err(_) => {
            tracing::warn!(
                source,
                timeout_ms = timeout.as_millis() as u64,
                "{}",
                ProviderError::Timeout(source.to_string())
            );
            None
        }
    }
}

fn payload(source: &str, query: &InteractionQuery, body: String) -> RawPayload {
    RawPayload {
        source: source.to_string(),
        query: query.clone(),
        body,
    }
}
