//! Fact provider: resolves an entity to an ordered, never-empty fact list.
//!
//! Sources are tried in order (cache, curated table, external lookup) and
//! the first one returning a usable fact wins. When every source comes up
//! empty a single templated fallback fact is returned. Only curated and
//! external results are written back to the cache.

pub mod cache;
pub mod contextual;
pub mod curated;
pub mod lookup;

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use cache::FactCache;
pub use contextual::{contextual_facts, placeholder_fact};
pub use curated::curated_facts;
pub use lookup::{KnowledgeLookup, WikipediaLookup};

use crate::config::KnowledgeConfig;

/// Substring marking a fact as a "nothing known" placeholder.
pub const FALLBACK_MARKER: &str = "not available";

/// The templated fact returned when no source knows the entity.
pub fn fallback_fact(entity: &str) -> String {
    format!("Information about {entity} is not available in the knowledge base.")
}

/// Facts carrying the fallback marker are excluded from scoring and selection.
pub fn is_valid_fact(fact: &str) -> bool {
    !fact.to_lowercase().contains(FALLBACK_MARKER)
}

pub fn has_valid_fact(facts: &[String]) -> bool {
    facts.iter().any(|f| is_valid_fact(f))
}

/// Where a fact list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactSource {
    Cache,
    Curated,
    External,
    Contextual,
    Fallback,
}

impl std::fmt::Display for FactSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FactSource::Cache => "cache",
            FactSource::Curated => "curated",
            FactSource::External => "external",
            FactSource::Contextual => "contextual",
            FactSource::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// An ordered fact list with its source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactSet {
    pub facts: Vec<String>,
    pub source: FactSource,
}

impl FactSet {
    pub fn has_valid_fact(&self) -> bool {
        has_valid_fact(&self.facts)
    }
}

/// Per-source resolution counters.
#[derive(Debug, Default)]
pub struct SourceStats {
    cache: AtomicU64,
    curated: AtomicU64,
    external: AtomicU64,
    contextual: AtomicU64,
    fallback: AtomicU64,
}

/// Point-in-time copy of [`SourceStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub cache: u64,
    pub curated: u64,
    pub external: u64,
    pub contextual: u64,
    pub fallback: u64,
}

impl SourceCounts {
    pub fn total(&self) -> u64 {
        self.cache + self.curated + self.external + self.contextual + self.fallback
    }
}

impl SourceStats {
    pub fn record(&self, source: FactSource) {
        let counter = match source {
            FactSource::Cache => &self.cache,
            FactSource::Curated => &self.curated,
            FactSource::External => &self.external,
            FactSource::Contextual => &self.contextual,
            FactSource::Fallback => &self.fallback,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SourceCounts {
        SourceCounts {
            cache: self.cache.load(Ordering::Relaxed),
            curated: self.curated.load(Ordering::Relaxed),
            external: self.external.load(Ordering::Relaxed),
            contextual: self.contextual.load(Ordering::Relaxed),
            fallback: self.fallback.load(Ordering::Relaxed),
        }
    }
}

/// Tiered fact resolution over an injected cache and optional lookup.
pub struct FactProvider {
    cache: Arc<FactCache>,
    lookup: Option<Arc<dyn KnowledgeLookup>>,
    substring_match: bool,
    stats: SourceStats,
}

impl FactProvider {
    /// Provider over `cache` with the curated table only.
    pub fn new(cache: Arc<FactCache>) -> Self {
        Self {
            cache,
            lookup: None,
            substring_match: true,
            stats: SourceStats::default(),
        }
    }

    /// Provider built from configuration: persisted cache plus the
    /// Wikipedia lookup when external lookup is enabled.
    pub fn from_config(config: &KnowledgeConfig) -> Self {
        let cache = Arc::new(FactCache::load(&config.cache_path));
        let mut provider = Self::new(cache).with_substring_match(config.substring_match);
        if config.external_lookup {
            provider = provider.with_lookup(Arc::new(WikipediaLookup::from_config(config)));
        }
        provider
    }

    pub fn with_lookup(mut self, lookup: Arc<dyn KnowledgeLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn with_substring_match(mut self, enabled: bool) -> Self {
        self.substring_match = enabled;
        self
    }

    pub fn cache(&self) -> &FactCache {
        &self.cache
    }

    pub fn stats(&self) -> SourceCounts {
        self.stats.snapshot()
    }

    /// Non-empty fact list for `entity`. Never fails.
    pub async fn fetch_facts(&self, entity: &str) -> Vec<String> {
        self.resolve(entity).await.facts
    }

    /// Resolve `entity` through the source chain, reporting the source used.
    pub async fn resolve(&self, entity: &str) -> FactSet {
        let set = self.resolve_uncounted(entity).await;
        self.stats.record(set.source);
        tracing::debug!(entity = %entity, source = %set.source, facts = set.facts.len(), "Resolved facts");
        set
    }

    /// Resolve facts for a prompt's entity, substituting topic templates
    /// (and finally a placeholder) when the sources know nothing.
    pub async fn resolve_for_prompt(&self, prompt: &str, entity: &str, contextual: bool) -> FactSet {
        let set = self.resolve(entity).await;
        if set.has_valid_fact() || !contextual {
            return set;
        }
        let templated = contextual_facts(prompt, entity);
        let set = if templated.is_empty() {
            FactSet {
                facts: vec![placeholder_fact(entity)],
                source: FactSource::Fallback,
            }
        } else {
            self.stats.record(FactSource::Contextual);
            FactSet {
                facts: templated,
                source: FactSource::Contextual,
            }
        };
        tracing::debug!(entity = %entity, source = %set.source, "Substituted templated facts");
        set
    }

    async fn resolve_uncounted(&self, entity: &str) -> FactSet {
        if let Some(facts) = self.cache.get(entity)
            && has_valid_fact(&facts)
        {
            return FactSet {
                facts,
                source: FactSource::Cache,
            };
        }

        if let Some(facts) = curated_facts(entity, self.substring_match) {
            self.cache.insert(entity, facts.clone());
            return FactSet {
                facts,
                source: FactSource::Curated,
            };
        }

        if let Some(facts) = self.lookup_external(entity).await {
            self.cache.insert(entity, facts.clone());
            return FactSet {
                facts,
                source: FactSource::External,
            };
        }

        FactSet {
            facts: vec![fallback_fact(entity)],
            source: FactSource::Fallback,
        }
    }

    async fn lookup_external(&self, entity: &str) -> Option<Vec<String>> {
        let lookup = self.lookup.as_ref()?;
        if entity.trim().is_empty() {
            return None;
        }
        match lookup.lookup(entity).await {
            Ok(facts) => {
                let facts: Vec<String> = facts
                    .into_iter()
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect();
                if has_valid_fact(&facts) {
                    tracing::info!(entity = %entity, source = lookup.name(), facts = facts.len(), "Learned facts from external source");
                    Some(facts)
                } else {
                    None
                }
            }
            Err(e) => {
                tracing::warn!(entity = %entity, source = lookup.name(), error = %e, "Knowledge lookup failed");
                None
            }
        }
    }
}
