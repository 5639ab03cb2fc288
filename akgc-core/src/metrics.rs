//! Evaluation metrics against reference answers.

use crate::text::word_tokens;

/// 1.0 when prediction and reference match after trimming and lowercasing.
pub fn exact_match_accuracy(prediction: &str, reference: &str) -> f64 {
    if prediction.trim().to_lowercase() == reference.trim().to_lowercase() {
        1.0
    } else {
        0.0
    }
}

/// ROUGE-L F-measure over lowercase word tokens; 0 when either side is empty.
pub fn rouge_l(prediction: &str, reference: &str) -> f64 {
    let candidate = word_tokens(prediction);
    let target = word_tokens(reference);
    if candidate.is_empty() || target.is_empty() {
        return 0.0;
    }
    let lcs = lcs_len(&candidate, &target) as f64;
    if lcs == 0.0 {
        return 0.0;
    }
    let precision = lcs / candidate.len() as f64;
    let recall = lcs / target.len() as f64;
    2.0 * precision * recall / (precision + recall)
}

/// Longest common subsequence length, two-row dynamic programming.
fn lcs_len(a: &[String], b: &[String]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert_eq!(exact_match_accuracy(" Paris ", "paris"), 1.0);
        assert_eq!(exact_match_accuracy("Paris", "Lyon"), 0.0);
    }

    #[test]
    fn test_rouge_identical_and_disjoint() {
        assert!((rouge_l("The capital is Paris.", "the capital is paris") - 1.0).abs() < 1e-9);
        assert_eq!(rouge_l("alpha beta", "gamma delta"), 0.0);
        assert_eq!(rouge_l("", "anything"), 0.0);
        assert_eq!(rouge_l("anything", "   "), 0.0);
    }

    #[test]
    fn test_rouge_partial() {
        // lcs("a b c d", "a c e") = 2, p = 0.5, r = 2/3
        let score = rouge_l("a b c d", "a c e");
        let expected = 2.0 * 0.5 * (2.0 / 3.0) / (0.5 + 2.0 / 3.0);
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_lcs_len() {
        let a: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        let b: Vec<String> = ["y", "x", "z"].iter().map(|s| s.to_string()).collect();
        assert_eq!(lcs_len(&a, &b), 2);
        assert_eq!(lcs_len(&a, &[]), 0);
    }
}
