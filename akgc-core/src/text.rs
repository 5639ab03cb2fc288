//! Tokenization helpers shared by the scorers, the extractor and the policy.

use std::collections::{BTreeSet, HashSet};

/// Words that carry no factual content for overlap scoring.
pub const STOP_WORDS: &[&str] = &[
    "the", "is", "are", "was", "were", "been", "have", "has", "had", "this", "that", "with",
    "from", "for", "and", "or", "but", "a", "an", "of", "in", "on", "at", "to", "by",
];

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Lowercased whitespace tokens with surrounding punctuation removed.
///
/// Inner punctuation survives, so "h2o" and "u.s" stay single tokens.
pub fn word_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| trim_punctuation(w).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Content tokens used for grounding: longer than two characters and not a stop word.
pub fn content_tokens(text: &str) -> BTreeSet<String> {
    word_tokens(text)
        .into_iter()
        .filter(|w| w.chars().count() > 2 && !is_stop_word(w))
        .collect()
}

/// Raw lowercase whitespace tokens, punctuation kept.
pub fn lexical_tokens(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Tokens that parse as numbers once thousands separators are removed.
pub fn numeric_tokens(text: &str) -> BTreeSet<String> {
    word_tokens(text)
        .into_iter()
        .map(|w| w.replace(',', ""))
        .filter(|w| {
            w.chars().any(|c| c.is_ascii_digit())
                && w.chars().all(|c| c.is_ascii_digit() || c == '.')
        })
        .collect()
}

pub fn trim_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Title-case every run of letters: first letter upper, the rest lower.
///
/// Whitespace and ASCII non-letters start a new run, so "they're" becomes
/// "They'Re" and "1st" becomes "1St". Other non-letters (combining marks,
/// symbols) leave the run open, which keeps the result stable when a case
/// mapping emits a combining mark ("İ" lowercases to "i\u{307}").
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                let mut upper = c.to_uppercase();
                if let Some(first) = upper.next() {
                    out.push(first);
                }
                // multi-char expansions ("ß" -> "SS") continue the run in lowercase
                for rest in upper {
                    out.extend(rest.to_lowercase());
                }
            }
            in_word = true;
        } else {
            out.push(c);
            if c.is_ascii() || c.is_whitespace() {
                in_word = false;
            }
        }
    }
    out
}

/// True when the word has letters and is already in title case.
pub fn is_title_cased(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && title_case(word) == word
}

/// Truncate to at most `max_chars` characters, appending "..." when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
