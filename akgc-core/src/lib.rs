//! # AKGC Core
//!
//! Core library for Adaptive Knowledge-Guided Correction.
//! Scores a generated response for hallucination risk (the HVI, a blend of
//! context similarity and knowledge grounding) and replaces unsupported
//! responses with a fact drawn from the knowledge source chain.

pub mod batch;
pub mod config;
pub mod embeddings;
pub mod entity;
pub mod error;
pub mod generation;
pub mod grounding;
pub mod hvi;
pub mod knowledge;
pub mod metrics;
pub mod persistence;
pub mod policy;
pub mod similarity;
pub mod text;

// Re-export commonly used types at the crate root.
pub use batch::{BatchItem, BatchReport, BatchSummary, Sample, evaluate_batch, load_samples};
pub use config::{AkgcConfig, Profile, load_config};
pub use embeddings::{Embedder, EmbeddingConfig, LocalEmbedder, OllamaEmbedder, create_embedder};
pub use entity::{Extraction, extract, extract_entity, normalize_entity_name};
pub use error::{AkgcError, ConfigError, EmbeddingError, GenerationError, LookupError, Result};
pub use generation::{EchoGenerator, Generator, OllamaGenerator, create_generator};
pub use grounding::{grounding_score, is_supported};
pub use hvi::{HviWeights, hvi};
pub use knowledge::{FactCache, FactProvider, FactSet, FactSource, KnowledgeLookup, WikipediaLookup};
pub use metrics::{exact_match_accuracy, rouge_l};
pub use policy::{
    CorrectionPolicy, CorrectionReport, CorrectionResult, Outcome, ScoreReport, SelectionRule,
    Thresholds, select_best_fact,
};
pub use similarity::{Similarity, SimilarityMethod, SimilarityScorer};
