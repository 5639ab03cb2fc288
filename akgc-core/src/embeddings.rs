//! Pluggable embedding providers for context similarity.
//!
//! Provides a trait-based abstraction over embedding models, with a local
//! hashed term-frequency embedder (always available) and an Ollama-backed
//! embedder.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::default_ollama_url;
use crate::error::EmbeddingError;
use crate::text::word_tokens;

/// Trait for embedding providers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `text`, considering at most `max_tokens` whitespace tokens.
    async fn embed(&self, text: &str, max_tokens: usize) -> Result<Vec<f32>, EmbeddingError>;

    /// Return the dimensionality of embeddings.
    fn dimensions(&self) -> usize;

    /// Return the provider name.
    fn provider_name(&self) -> &str;
}

/// Configuration for embedding providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name: "local" (default) or "ollama".
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider-specific model name.
    #[serde(default)]
    pub model: Option<String>,
    /// Embedding dimensions (auto-detected from provider if 0).
    #[serde(default)]
    pub dimensions: usize,
    /// Endpoint for the Ollama provider.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
}

fn default_provider() -> String {
    "local".into()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".into(),
            model: None,
            dimensions: 0,
            base_url: default_ollama_url(),
        }
    }
}

/// Keep the first `max_tokens` whitespace tokens of `text`.
pub fn truncate_tokens(text: &str, max_tokens: usize) -> String {
    text.split_whitespace()
        .take(max_tokens)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Local feature-hashing embedder (no external dependencies).
///
/// Terms are the same punctuation-trimmed lowercase words the grounding
/// scorer sees. Each term is spread over two slots chosen by independent
/// FNV-1a hashes and weighted by `1 + ln(count)`.
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dimensions: usize,
}

impl LocalEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn slots(&self, term: &str) -> [usize; 2] {
        let width = self.dimensions as u64;
        [
            (fnv1a(term.as_bytes(), FNV_OFFSET) % width) as usize,
            (fnv1a(term.as_bytes(), FNV_OFFSET ^ SECOND_SEED) % width) as usize,
        ]
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const SECOND_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

fn fnv1a(bytes: &[u8], seed: u64) -> u64 {
    bytes
        .iter()
        .fold(seed, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str, max_tokens: usize) -> Result<Vec<f32>, EmbeddingError> {
        let terms = word_tokens(&truncate_tokens(text, max_tokens));
        if terms.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for term in &terms {
            *counts.entry(term.as_str()).or_default() += 1;
        }

        let mut vector = vec![0.0f32; self.dimensions];
        for (term, count) in counts {
            let weight = 1.0 + (count as f32).ln();
            for slot in self.slots(term) {
                vector[slot] += 0.5 * weight;
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        vector.iter_mut().for_each(|x| *x /= norm);
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "local"
    }
}

/// Ollama embedder (uses local Ollama API).
pub struct OllamaEmbedder {
    client: reqwest::Client,
    model: String,
    dims: usize,
    base_url: String,
}

impl OllamaEmbedder {
    pub fn new(model: Option<String>, base_url: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| "nomic-embed-text".into());
        let dims = match model.as_str() {
            "nomic-embed-text" => 768,
            "mxbai-embed-large" => 1024,
            "all-minilm" => 384,
            _ => 768,
        };
        Self {
            client: reqwest::Client::new(),
            model,
            dims,
            base_url: base_url
                .unwrap_or_else(default_ollama_url)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str, max_tokens: usize) -> Result<Vec<f32>, EmbeddingError> {
        let input = truncate_tokens(text, max_tokens);
        if input.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let url = format!("{}/api/embed", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": input,
        });
        tracing::debug!(url = %url, model = %self.model, "Requesting embedding");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Request {
                message: format!("Ollama embedding request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Request {
                message: format!("Ollama returned HTTP {status}"),
            });
        }

        let json: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| EmbeddingError::InvalidResponse {
                    message: e.to_string(),
                })?;
        let embedding = json["embeddings"][0]
            .as_array()
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                message: "missing 'embeddings' array".into(),
            })?;
        Ok(embedding
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

/// Factory function to create an embedder based on configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> Arc<dyn Embedder> {
    match config.provider.as_str() {
        "ollama" => Arc::new(OllamaEmbedder::new(
            config.model.clone(),
            Some(config.base_url.clone()),
        )),
        "local" => Arc::new(LocalEmbedder::new(local_dimensions(config))),
        other => {
            tracing::warn!(
                provider = other,
                "Unknown embedding provider, falling back to local"
            );
            Arc::new(LocalEmbedder::new(local_dimensions(config)))
        }
    }
}

fn local_dimensions(config: &EmbeddingConfig) -> usize {
    if config.dimensions > 0 {
        config.dimensions
    } else {
        128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_embedder_dimensions() {
        let embedder = LocalEmbedder::new(128);
        assert_eq!(embedder.dimensions(), 128);
        let v = embedder.embed("hello world", 512).await.unwrap();
        assert_eq!(v.len(), 128);
    }

    #[tokio::test]
    async fn test_local_embedder_normalized() {
        let embedder = LocalEmbedder::new(128);
        let v = embedder
            .embed("test input text for normalization", 512)
            .await
            .unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!(
            (norm - 1.0).abs() < 0.01,
            "Expected normalized vector, got norm={}",
            norm
        );
    }

    #[tokio::test]
    async fn test_local_embedder_empty_text() {
        let embedder = LocalEmbedder::new(128);
        let err = embedder.embed("  ...  ", 512).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyInput));
    }

    #[tokio::test]
    async fn test_local_embedder_deterministic() {
        let embedder = LocalEmbedder::new(128);
        let v1 = embedder.embed("same text", 512).await.unwrap();
        let v2 = embedder.embed("same text", 512).await.unwrap();
        assert_eq!(v1, v2);
    }

    #[tokio::test]
    async fn test_local_embedder_different_texts_differ() {
        let embedder = LocalEmbedder::new(128);
        let v1 = embedder.embed("hello world", 512).await.unwrap();
        let v2 = embedder.embed("goodbye universe", 512).await.unwrap();
        assert_ne!(v1, v2);
    }

    #[tokio::test]
    async fn test_local_embedder_truncates_input() {
        let embedder = LocalEmbedder::new(64);
        let short = embedder.embed("alpha beta", 2).await.unwrap();
        let long = embedder.embed("alpha beta gamma delta", 2).await.unwrap();
        assert_eq!(short, long);
    }

    #[tokio::test]
    async fn test_local_embedder_ignores_case_and_edge_punctuation() {
        let embedder = LocalEmbedder::new(128);
        let plain = embedder.embed("paris is the capital", 512).await.unwrap();
        let styled = embedder.embed("Paris, is THE capital!", 512).await.unwrap();
        assert_eq!(plain, styled);
    }

    #[tokio::test]
    async fn test_local_embedder_repeated_terms_grow_sublinearly() {
        let embedder = LocalEmbedder::new(4096);
        let v = embedder.embed("paris paris paris paris rome", 512).await.unwrap();
        let slots = embedder.slots("rome");
        let rome = v[slots[0]] + v[slots[1]];
        let paris_slots = embedder.slots("paris");
        let paris = v[paris_slots[0]] + v[paris_slots[1]];
        // 1 + ln(4) relative to 1, not 4 to 1
        assert!((paris / rome - (1.0 + 4f32.ln())).abs() < 1e-3);
    }

    #[test]
    fn test_truncate_tokens() {
        assert_eq!(truncate_tokens("a  b\tc d", 3), "a b c");
        assert_eq!(truncate_tokens("a b", 10), "a b");
        assert_eq!(truncate_tokens("a b", 0), "");
    }

    #[test]
    fn test_embedding_config_defaults() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "local");
        assert!(config.model.is_none());
        assert_eq!(config.dimensions, 0);
        assert_eq!(config.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_embedding_config_deserialize_empty() {
        let config: EmbeddingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.provider, "local");
    }

    #[test]
    fn test_create_embedder_default() {
        let embedder = create_embedder(&EmbeddingConfig::default());
        assert_eq!(embedder.provider_name(), "local");
        assert_eq!(embedder.dimensions(), 128);
    }

    #[test]
    fn test_create_embedder_explicit_dimensions() {
        let config = EmbeddingConfig {
            dimensions: 256,
            ..Default::default()
        };
        assert_eq!(create_embedder(&config).dimensions(), 256);
    }

    #[test]
    fn test_create_embedder_ollama() {
        let config = EmbeddingConfig {
            provider: "ollama".into(),
            model: Some("all-minilm".into()),
            ..Default::default()
        };
        let embedder = create_embedder(&config);
        assert_eq!(embedder.provider_name(), "ollama");
        assert_eq!(embedder.dimensions(), 384);
    }

    #[test]
    fn test_create_embedder_unknown_falls_back() {
        let config = EmbeddingConfig {
            provider: "quantum".into(),
            ..Default::default()
        };
        assert_eq!(create_embedder(&config).provider_name(), "local");
    }

    #[tokio::test]
    async fn test_ollama_unreachable_is_request_error() {
        let embedder = OllamaEmbedder::new(None, Some("http://127.0.0.1:1".into()));
        let err = embedder.embed("hello", 16).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Request { .. }));
    }
}
