//! Correction policy: generate, score, then accept or replace the response.
//!
//! One correction call walks `Start -> Generated -> Scored ->
//! {Accepted | Corrected} -> Done`. Only a generation failure aborts a
//! call; missing facts, lookup failures and embedding failures all degrade
//! to lower-confidence scores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AkgcConfig;
use crate::embeddings::create_embedder;
use crate::entity::{self, Extraction};
use crate::error::GenerationError;
use crate::generation::{Generator, create_generator};
use crate::grounding::{GroundingBreakdown, grounding_breakdown, is_supported};
use crate::hvi::HviWeights;
use crate::knowledge::{FactProvider, FactSource, is_valid_fact};
use crate::similarity::{Similarity, SimilarityScorer};
use crate::text::{is_stop_word, word_tokens};

/// Prefix of responses synthesized from facts.
pub const SYNTHESIS_PREFIX: &str = "Based on available facts: ";

/// Keyword groups checked, in order, before any other selection rule.
const PRIORITY_GROUPS: &[&[&str]] = &[
    &["capital", "city"],
    &["element", "atomic", "chemical"],
    &["war", "battle", "conflict"],
    &["born", "birth"],
];

/// Decision thresholds for one correction call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Similarity below this is reported as context drift.
    pub sim_threshold: f64,
    /// HVI below this forces a correction.
    pub hvi_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sim_threshold: 0.8,
            hvi_threshold: 0.7,
        }
    }
}

/// Final outcome of a correction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub response: String,
    pub is_factual: bool,
    pub hvi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Accepted,
    Corrected,
}

/// Which rule picked the replacement fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    PriorityKeyword,
    EntityName,
    LexicalOverlap,
    FirstValid,
    FirstFact,
}

/// Scored components of a (prompt, response) pair.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub entity: Extraction,
    pub facts: Vec<String>,
    pub fact_source: FactSource,
    pub similarity: Similarity,
    pub grounding: GroundingBreakdown,
    pub hvi: f64,
    /// At least one valid fact backs the response.
    pub supported: bool,
    /// Similarity fell below the similarity threshold.
    pub context_drift: bool,
}

/// Everything a correction call decided, for inspection and evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct CorrectionReport {
    pub result: CorrectionResult,
    /// The generated response before any correction.
    pub candidate: String,
    pub score: ScoreReport,
    pub outcome: Outcome,
    pub selection: Option<SelectionRule>,
    /// The response was synthesized from facts by the final echo guard.
    pub synthesized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PolicyState {
    Start,
    Generated,
    Scored,
    Accepted,
    Corrected,
    Done,
}

fn advance(state: &mut PolicyState, next: PolicyState) {
    debug!(from = ?*state, to = ?next, "Correction state transition");
    *state = next;
}

/// The correction pipeline over injected collaborators.
pub struct CorrectionPolicy {
    generator: Arc<dyn Generator>,
    facts: Arc<FactProvider>,
    similarity: SimilarityScorer,
    weights: HviWeights,
    thresholds: Thresholds,
    max_tokens: usize,
    min_overlap: f64,
    contextual_fallback: bool,
}

impl CorrectionPolicy {
    /// Policy with default weights, thresholds and bounds.
    pub fn new(
        generator: Arc<dyn Generator>,
        facts: Arc<FactProvider>,
        similarity: SimilarityScorer,
    ) -> Self {
        let defaults = AkgcConfig::default();
        Self {
            generator,
            facts,
            similarity,
            weights: defaults.hvi,
            thresholds: Thresholds {
                sim_threshold: defaults.sim_threshold,
                hvi_threshold: defaults.hvi_threshold,
            },
            max_tokens: defaults.generation.max_tokens,
            min_overlap: defaults.support.min_overlap,
            contextual_fallback: defaults.knowledge.contextual_fallback,
        }
    }

    /// Build every collaborator from configuration.
    pub fn from_config(config: &AkgcConfig) -> Self {
        let similarity = if config.similarity.use_embeddings {
            SimilarityScorer::new(
                create_embedder(&config.embedding),
                config.similarity.max_tokens,
            )
        } else {
            SimilarityScorer::lexical()
        };
        Self::new(
            create_generator(&config.generation),
            Arc::new(FactProvider::from_config(&config.knowledge)),
            similarity,
        )
        .with_config(config)
    }

    /// Apply the scalar settings of `config` (collaborators are kept).
    pub fn with_config(mut self, config: &AkgcConfig) -> Self {
        self.weights = config.hvi;
        self.thresholds = Thresholds {
            sim_threshold: config.sim_threshold,
            hvi_threshold: config.hvi_threshold,
        };
        self.max_tokens = config.generation.max_tokens;
        self.min_overlap = config.support.min_overlap;
        self.contextual_fallback = config.knowledge.contextual_fallback;
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_weights(mut self, weights: HviWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn fact_provider(&self) -> &FactProvider {
        &self.facts
    }

    /// Correct `prompt` under the configured thresholds.
    pub async fn correct(&self, prompt: &str) -> Result<CorrectionResult, GenerationError> {
        self.correct_with(prompt, self.thresholds).await
    }

    /// Correct `prompt` under explicit thresholds.
    pub async fn correct_with(
        &self,
        prompt: &str,
        thresholds: Thresholds,
    ) -> Result<CorrectionResult, GenerationError> {
        Ok(self.correct_detailed(prompt, thresholds).await?.result)
    }

    /// Run a full correction call and report every intermediate decision.
    pub async fn correct_detailed(
        &self,
        prompt: &str,
        thresholds: Thresholds,
    ) -> Result<CorrectionReport, GenerationError> {
        let mut state = PolicyState::Start;

        let candidate = self
            .generator
            .generate(prompt, self.max_tokens)
            .await
            .inspect_err(|e| {
                warn!(model = self.generator.model_name(), error = %e, "Generation failed");
            })?;
        advance(&mut state, PolicyState::Generated);

        let score = self.score_with(prompt, &candidate, thresholds).await;
        advance(&mut state, PolicyState::Scored);

        let accepted = score.hvi >= thresholds.hvi_threshold && score.supported;
        let (mut response, outcome, selection) = if accepted {
            advance(&mut state, PolicyState::Accepted);
            (candidate.clone(), Outcome::Accepted, None)
        } else {
            advance(&mut state, PolicyState::Corrected);
            match select_best_fact(prompt, &score.entity.entity, &score.facts) {
                Some((fact, rule)) => (fact, Outcome::Corrected, Some(rule)),
                None => (candidate.clone(), Outcome::Corrected, None),
            }
        };

        let synthesized = needs_synthesis(prompt, &response, outcome);
        if synthesized {
            response = synthesize_from_facts(&score.facts);
        }
        advance(&mut state, PolicyState::Done);

        info!(
            entity = %score.entity.entity,
            outcome = ?outcome,
            hvi = score.hvi,
            supported = score.supported,
            context_drift = score.context_drift,
            "Correction complete"
        );

        Ok(CorrectionReport {
            result: CorrectionResult {
                response,
                is_factual: outcome == Outcome::Accepted,
                hvi: score.hvi,
            },
            candidate,
            score,
            outcome,
            selection,
            synthesized,
        })
    }

    /// Score an externally produced response without generating or correcting.
    pub async fn score(&self, prompt: &str, response: &str) -> ScoreReport {
        self.score_with(prompt, response, self.thresholds).await
    }

    async fn score_with(&self, prompt: &str, response: &str, thresholds: Thresholds) -> ScoreReport {
        let extraction = entity::extract(prompt);
        let fact_set = self
            .facts
            .resolve_for_prompt(prompt, &extraction.entity, self.contextual_fallback)
            .await;
        let similarity = self.similarity.context_similarity(prompt, response).await;
        let grounding = grounding_breakdown(response, &fact_set.facts);
        let hvi = self.weights.combine(similarity.value, grounding.score);
        let supported = is_supported(response, &fact_set.facts, self.min_overlap);

        debug!(
            entity = %extraction.entity,
            similarity = similarity.value,
            method = ?similarity.method,
            grounding = grounding.score,
            hvi,
            supported,
            "Scored response"
        );

        ScoreReport {
            entity: extraction,
            facts: fact_set.facts,
            fact_source: fact_set.source,
            context_drift: similarity.value < thresholds.sim_threshold,
            similarity,
            grounding,
            hvi,
            supported,
        }
    }
}

/// Pick the replacement fact for a corrected response.
///
/// Rules, in order: a priority keyword shared by prompt and fact, the
/// entity name, the largest overlap of significant prompt words, the first
/// valid fact, the first fact. `None` only for an empty fact list.
pub fn select_best_fact(
    prompt: &str,
    entity: &str,
    facts: &[String],
) -> Option<(String, SelectionRule)> {
    let first = facts.first()?;
    let valid: Vec<&String> = facts.iter().filter(|f| is_valid_fact(f)).collect();
    let prompt_words: BTreeSet<String> = word_tokens(prompt).into_iter().collect();

    for group in PRIORITY_GROUPS {
        if !group.iter().any(|kw| prompt_words.contains(*kw)) {
            continue;
        }
        let hit = valid.iter().find(|fact| {
            word_tokens(fact)
                .iter()
                .any(|w| group.contains(&w.as_str()))
        });
        if let Some(fact) = hit {
            return Some(((*fact).clone(), SelectionRule::PriorityKeyword));
        }
    }

    let entity_lower = entity.trim().to_lowercase();
    if !entity_lower.is_empty()
        && let Some(fact) = valid
            .iter()
            .find(|f| f.to_lowercase().contains(&entity_lower))
    {
        return Some(((*fact).clone(), SelectionRule::EntityName));
    }

    let prompt_significant = significant_words(prompt);
    let mut best: Option<(&String, usize)> = None;
    for fact in &valid {
        let overlap = significant_words(fact)
            .intersection(&prompt_significant)
            .count();
        if overlap > best.map_or(0, |(_, score)| score) {
            best = Some((*fact, overlap));
        }
    }
    if let Some((fact, _)) = best {
        return Some((fact.clone(), SelectionRule::LexicalOverlap));
    }

    match valid.first() {
        Some(fact) => Some(((*fact).clone(), SelectionRule::FirstValid)),
        None => Some((first.clone(), SelectionRule::FirstFact)),
    }
}

/// Words longer than three characters that are not stop words.
fn significant_words(text: &str) -> BTreeSet<String> {
    word_tokens(text)
        .into_iter()
        .filter(|w| w.chars().count() > 3 && !is_stop_word(w))
        .collect()
}

/// "Based on available facts: f1. f2." from up to two valid facts (or the
/// first two facts when none is valid).
pub fn synthesize_from_facts(facts: &[String]) -> String {
    let valid: Vec<&String> = facts.iter().filter(|f| is_valid_fact(f)).collect();
    let chosen: Vec<&String> = if valid.is_empty() {
        facts.iter().take(2).collect()
    } else {
        valid.into_iter().take(2).collect()
    };
    let body = chosen
        .iter()
        .map(|f| f.trim().trim_end_matches('.'))
        .collect::<Vec<_>>()
        .join(". ");
    format!("{SYNTHESIS_PREFIX}{body}.")
}

/// The echo guard: an empty response, or a corrected response that merely
/// repeats the prompt, is replaced by a synthesized one.
fn needs_synthesis(prompt: &str, response: &str, outcome: Outcome) -> bool {
    let response = response.trim();
    response.is_empty() || (outcome == Outcome::Corrected && response == prompt.trim())
}
