//! Knowledge grounding: how much of the retrieved knowledge a response echoes.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::knowledge::is_valid_fact;
use crate::text::{content_tokens, numeric_tokens};

/// Score when no valid fact is available to judge against.
pub const NEUTRAL_GROUNDING: f64 = 0.5;

/// Components of a grounding score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroundingBreakdown {
    /// Share of valid facts contained verbatim (case-insensitive) in the response.
    pub exact: f64,
    /// Best token overlap ratio of any valid fact.
    pub partial: f64,
    pub score: f64,
    pub valid_facts: usize,
}

/// Grounding score in [0, 1]; see [`grounding_breakdown`].
pub fn grounding_score(response: &str, facts: &[String]) -> f64 {
    grounding_breakdown(response, facts).score
}

/// Score a response against facts.
///
/// Strong partial overlap (> 0.5) is weighted equally with exact
/// containment; weaker overlap only contributes 30%.
pub fn grounding_breakdown(response: &str, facts: &[String]) -> GroundingBreakdown {
    let valid: Vec<&String> = facts.iter().filter(|f| is_valid_fact(f)).collect();
    if valid.is_empty() {
        return GroundingBreakdown {
            exact: 0.0,
            partial: 0.0,
            score: NEUTRAL_GROUNDING,
            valid_facts: 0,
        };
    }

    let response_lower = response.to_lowercase();
    let response_tokens = content_tokens(response);

    let contained = valid
        .iter()
        .filter(|f| response_lower.contains(&f.to_lowercase()))
        .count();
    let exact = (contained as f64 / valid.len() as f64).clamp(0.0, 1.0);

    let partial = valid
        .iter()
        .map(|f| overlap_ratio(f, &response_tokens))
        .fold(0.0, f64::max);

    let score = if partial > 0.5 {
        0.5 * exact + 0.5 * partial
    } else {
        0.7 * exact + 0.3 * partial
    };

    GroundingBreakdown {
        exact,
        partial,
        score: score.clamp(0.0, 1.0),
        valid_facts: valid.len(),
    }
}

/// |fact tokens ∩ response tokens| / |fact tokens|, or 0 for a token-less fact.
pub fn overlap_ratio(fact: &str, response_tokens: &BTreeSet<String>) -> f64 {
    let fact_tokens = content_tokens(fact);
    if fact_tokens.is_empty() {
        return 0.0;
    }
    let shared = fact_tokens.intersection(response_tokens).count();
    shared as f64 / fact_tokens.len() as f64
}

/// Whether at least one valid fact backs the response.
///
/// A fact backs the response when it appears verbatim in it, or when the
/// response repeats at least `min_overlap` of the fact's tokens without
/// contradicting it. A contradiction is a number the fact does not state,
/// or a term that takes the place of one of the fact's own terms.
pub fn is_supported(response: &str, facts: &[String], min_overlap: f64) -> bool {
    let response_lower = response.to_lowercase();
    let response_tokens = content_tokens(response);
    let response_numbers = numeric_tokens(response);

    facts.iter().filter(|f| is_valid_fact(f)).any(|fact| {
        if response_lower.contains(&fact.to_lowercase()) {
            return true;
        }
        overlap_ratio(fact, &response_tokens) >= min_overlap
            && !numbers_conflict(&response_numbers, &numeric_tokens(fact))
            && !substitutes_term(&response_tokens, &content_tokens(fact))
    })
}

fn numbers_conflict(response: &BTreeSet<String>, fact: &BTreeSet<String>) -> bool {
    !response.is_empty() && !fact.is_empty() && !response.is_subset(fact)
}

/// The response drops a term of the fact and brings in one the fact lacks.
///
/// Extra terms on top of the whole fact are elaboration, not substitution.
fn substitutes_term(response: &BTreeSet<String>, fact: &BTreeSet<String>) -> bool {
    !fact.is_subset(response) && !response.is_subset(fact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::fallback_fact;

    fn facts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_no_valid_facts_is_neutral() {
        assert_eq!(grounding_score("anything", &[]), NEUTRAL_GROUNDING);
        assert_eq!(
            grounding_score("anything", &[fallback_fact("X")]),
            NEUTRAL_GROUNDING
        );
    }

    #[test]
    fn test_exact_match_with_strong_overlap() {
        let kb = facts(&[
            "Water is made of hydrogen and oxygen.",
            "Water is a chemical compound with the formula H2O.",
            "Water is essential for all known forms of life.",
            "Water covers about 71% of Earth's surface.",
        ]);
        let b = grounding_breakdown("Water is made of hydrogen and oxygen.", &kb);
        assert!(approx(b.exact, 0.25));
        assert!(approx(b.partial, 1.0));
        assert!(approx(b.score, 0.625));
        assert_eq!(b.valid_facts, 4);
    }

    #[test]
    fn test_strong_partial_without_exact() {
        let kb = facts(&["World War II ended in 1945."]);
        let b = grounding_breakdown("World War II ended in 1944.", &kb);
        assert_eq!(b.exact, 0.0);
        assert!(approx(b.partial, 0.75));
        assert!(approx(b.score, 0.375));
    }

    #[test]
    fn test_weak_partial_weighting() {
        // fact tokens: capital, france, paris; response shares only "france"
        let kb = facts(&["The capital of France is Paris."]);
        let b = grounding_breakdown("France is lovely.", &kb);
        assert!(approx(b.partial, 1.0 / 3.0));
        assert!(approx(b.score, 0.3 / 3.0));
    }

    #[test]
    fn test_invalid_facts_ignored() {
        let kb = facts(&["The capital of France is Paris.", &fallback_fact("France")]);
        let b = grounding_breakdown("The capital of France is Paris.", &kb);
        assert_eq!(b.valid_facts, 1);
        assert!(approx(b.score, 1.0));
    }

    #[test]
    fn test_empty_response() {
        let kb = facts(&["The capital of France is Paris."]);
        assert_eq!(grounding_score("", &kb), 0.0);
    }

    #[test]
    fn test_supported_by_exact_containment() {
        let kb = facts(&["World War II ended in 1945."]);
        assert!(is_supported("Yes. World War II ended in 1945. Indeed.", &kb, 0.6));
    }

    #[test]
    fn test_numeric_conflict_blocks_support() {
        let kb = facts(&["World War II ended in 1945."]);
        assert!(!is_supported("World War II ended in 1944.", &kb, 0.6));
        assert!(is_supported("world war ii ended in 1945", &kb, 0.6));
    }

    #[test]
    fn test_overlap_support_without_numbers() {
        let kb = facts(&["The capital of France is Paris."]);
        assert!(is_supported("Paris is the capital city of France", &kb, 0.6));
        assert!(!is_supported("The capital of France is Florida.", &kb, 0.7));
    }

    #[test]
    fn test_substituted_name_blocks_support() {
        // capital and france overlap at 2/3, but florida replaces paris
        let kb = facts(&["The capital of France is Paris."]);
        assert!(approx(
            overlap_ratio(&kb[0], &content_tokens("The capital of France is Florida.")),
            2.0 / 3.0
        ));
        assert!(!is_supported("The capital of France is Florida.", &kb, 0.6));
        assert!(!is_supported("The capital of France is Florida.", &kb, 0.5));
        // a partial restatement that adds nothing new still counts
        assert!(is_supported("France, capital: Paris", &kb, 0.6));
    }

    #[test]
    fn test_fallback_never_supports() {
        let fact = fallback_fact("Zorblax");
        assert!(!is_supported(&fact, &[fact.clone()], 0.0));
    }
}
