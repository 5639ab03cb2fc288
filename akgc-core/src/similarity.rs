//! Context similarity between a prompt and a response.
//!
//! The primary signal is the cosine similarity of the two embeddings. Any
//! embedding failure (provider error, empty input, zero-norm vector,
//! dimension mismatch) degrades to lexical token overlap instead of failing.

use serde::Serialize;
use std::sync::Arc;

use crate::embeddings::Embedder;
use crate::error::EmbeddingError;
use crate::text::lexical_tokens;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMethod {
    Embedding,
    Lexical,
}

/// A similarity value and the method that produced it.
///
/// Embedding similarities lie in [-1, 1]; callers clamp when they need a
/// probability-like weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Similarity {
    pub value: f64,
    pub method: SimilarityMethod,
}

/// Cosine similarity of two vectors (1 - cosine distance).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, EmbeddingError> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(EmbeddingError::InvalidResponse {
            message: "zero-norm embedding".into(),
        });
    }
    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Share of prompt tokens that reappear in the response; 0 for an empty prompt.
pub fn lexical_similarity(prompt: &str, response: &str) -> f64 {
    let prompt_tokens = lexical_tokens(prompt);
    if prompt_tokens.is_empty() {
        return 0.0;
    }
    let response_tokens = lexical_tokens(response);
    let shared = prompt_tokens.intersection(&response_tokens).count();
    shared as f64 / prompt_tokens.len() as f64
}

/// Scores prompt/response similarity through an optional embedder.
#[derive(Clone)]
pub struct SimilarityScorer {
    embedder: Option<Arc<dyn Embedder>>,
    max_tokens: usize,
}

impl SimilarityScorer {
    pub fn new(embedder: Arc<dyn Embedder>, max_tokens: usize) -> Self {
        Self {
            embedder: Some(embedder),
            max_tokens,
        }
    }

    /// A scorer that always uses lexical overlap.
    pub fn lexical() -> Self {
        Self {
            embedder: None,
            max_tokens: 0,
        }
    }

    pub fn method(&self) -> SimilarityMethod {
        if self.embedder.is_some() {
            SimilarityMethod::Embedding
        } else {
            SimilarityMethod::Lexical
        }
    }

    pub async fn context_similarity(&self, prompt: &str, response: &str) -> Similarity {
        let Some(embedder) = &self.embedder else {
            return Similarity {
                value: lexical_similarity(prompt, response),
                method: SimilarityMethod::Lexical,
            };
        };

        match self.embedding_similarity(embedder.as_ref(), prompt, response).await {
            Ok(value) => Similarity {
                value,
                method: SimilarityMethod::Embedding,
            },
            Err(e) => {
                tracing::warn!(
                    provider = embedder.provider_name(),
                    error = %e,
                    "Embedding similarity failed, using lexical overlap"
                );
                Similarity {
                    value: lexical_similarity(prompt, response),
                    method: SimilarityMethod::Lexical,
                }
            }
        }
    }

    async fn embedding_similarity(
        &self,
        embedder: &dyn Embedder,
        prompt: &str,
        response: &str,
    ) -> Result<f64, EmbeddingError> {
        let prompt_vec = embedder.embed(prompt, self.max_tokens).await?;
        let response_vec = embedder.embed(response, self.max_tokens).await?;
        cosine_similarity(&prompt_vec, &response_vec)
    }
}
