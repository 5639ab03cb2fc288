//! Entity extraction: prompt -> canonical subject string.
//!
//! Extraction runs an ordered cascade of keyword rules (named events, then
//! geography, science and history), falls back to the first title-cased
//! token, and finally to the first meaningful word. The raw result is
//! normalized against a fixed alias vocabulary.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::text::{is_title_cased, title_case, trim_punctuation};

/// Rule group a pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Event,
    Geography,
    Science,
    History,
}

/// How an entity was derived from its prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionSource {
    Pattern {
        domain: Domain,
        keyword: &'static str,
    },
    TitleCase,
    FirstWord,
    Empty,
}

/// A canonical entity together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub entity: String,
    pub raw: String,
    pub source: ExtractionSource,
}

struct ExtractionRule {
    domain: Domain,
    keyword: &'static str,
    pattern: Regex,
}

const GEOGRAPHY_KEYWORDS: &[&str] = &["capital", "country", "city", "state"];

const SCIENCE_KEYWORDS: &[&str] = &[
    "chemical symbol",
    "element",
    "chemical",
    "molecule",
    "atom",
    "planet",
    "star",
    "species",
    "organism",
    "disease",
    "virus",
    "bacteria",
];

const HISTORY_KEYWORDS: &[&str] = &[
    "war",
    "battle",
    "emperor",
    "king",
    "queen",
    "president",
    "dynasty",
    "empire",
    "revolution",
    "treaty",
    "century",
];

/// A captured phrase ends at the first of these.
const BOUNDARY_WORDS: &[&str] = &[
    "is", "was", "becomes", "became", "has", "had", "are", "were", "ended", "began", "started",
];

/// Skipped by the title-case fallback.
const FILLER_WORDS: &[&str] = &["the", "a", "an", "of", "in", "on", "at"];

const ARTICLES: &[&str] = &["the", "a", "an"];

static NAMED_EVENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\bworld\s+war\s+(ii|i|2|1)\b").ok());

static RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(build_rules);

fn build_rules() -> Vec<ExtractionRule> {
    let groups = [
        (Domain::Geography, GEOGRAPHY_KEYWORDS),
        (Domain::Science, SCIENCE_KEYWORDS),
        (Domain::History, HISTORY_KEYWORDS),
    ];
    groups
        .into_iter()
        .flat_map(|(domain, keywords)| keywords.iter().map(move |kw| (domain, *kw)))
        .filter_map(|(domain, keyword)| {
            let kw = keyword.replace(' ', r"\s+");
            let source = format!(r"(?i)\b{kw}\b(?:\s+(?:of|for|in))?\s+([A-Za-z][A-Za-z ]*)");
            Regex::new(&source).ok().map(|pattern| ExtractionRule {
                domain,
                keyword,
                pattern,
            })
        })
        .collect()
}

/// Canonical alias vocabulary, keyed by lowercase surface form.
const ALIASES: &[(&str, &str)] = &[
    // countries
    ("france", "France"),
    ("india", "India"),
    ("usa", "USA"),
    ("us", "USA"),
    ("u.s.", "USA"),
    ("united states", "USA"),
    ("united states of america", "USA"),
    ("america", "USA"),
    ("uk", "United Kingdom"),
    ("united kingdom", "United Kingdom"),
    ("britain", "United Kingdom"),
    ("great britain", "United Kingdom"),
    ("germany", "Germany"),
    ("japan", "Japan"),
    ("china", "China"),
    ("russia", "Russia"),
    ("brazil", "Brazil"),
    ("canada", "Canada"),
    ("australia", "Australia"),
    // cities
    ("paris", "Paris"),
    ("tokyo", "Tokyo"),
    ("london", "London"),
    ("beijing", "Beijing"),
    ("peking", "Beijing"),
    // substances and elements
    ("water", "Water"),
    ("h2o", "Water"),
    ("oxygen", "Oxygen"),
    ("carbon", "Carbon"),
    ("hydrogen", "Hydrogen"),
    ("nitrogen", "Nitrogen"),
    ("gold", "Gold"),
    ("silver", "Silver"),
    ("iron", "Iron"),
    // celestial bodies
    ("earth", "Earth"),
    ("mars", "Mars"),
    ("jupiter", "Jupiter"),
    ("saturn", "Saturn"),
    ("sun", "Sun"),
    ("the sun", "Sun"),
    ("moon", "Moon"),
    ("the moon", "Moon"),
    // historical events and figures
    ("world war ii", "World War II"),
    ("world war 2", "World War II"),
    ("wwii", "World War II"),
    ("ww2", "World War II"),
    ("second world war", "World War II"),
    ("world war i", "World War I"),
    ("world war 1", "World War I"),
    ("wwi", "World War I"),
    ("ww1", "World War I"),
    ("first world war", "World War I"),
    ("great war", "World War I"),
    ("napoleon", "Napoleon Bonaparte"),
    ("bonaparte", "Napoleon Bonaparte"),
    ("einstein", "Albert Einstein"),
    ("hitler", "Adolf Hitler"),
    ("caesar", "Julius Caesar"),
    ("julius caesar", "Julius Caesar"),
    // technology and medicine
    ("bitcoin", "Bitcoin"),
    ("python", "Python"),
    ("quantum computing", "Quantum Computing"),
    ("common cold", "Common Cold"),
    ("cold", "Common Cold"),
];

/// Map a raw entity onto its canonical form.
///
/// Known aliases resolve through the vocabulary; anything else is returned
/// trimmed and title-cased. Pure, total and idempotent.
///
/// Aliases are matched on the lowercased title case, so characters that
/// case-fold to ASCII ("ſ" to "S") hit the same entry on the first call as
/// on every later one.
pub fn normalize_entity_name(raw: &str) -> String {
    let titled = title_case(raw.trim());
    let key = titled.to_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(titled)
}

/// Derive the canonical entity of a prompt.
pub fn extract_entity(prompt: &str) -> String {
    extract(prompt).entity
}

/// Derive the canonical entity of a prompt and report which rule fired.
pub fn extract(prompt: &str) -> Extraction {
    let (raw, source) = match_rules(prompt)
        .or_else(|| title_case_fallback(prompt))
        .or_else(|| first_word_fallback(prompt))
        .unwrap_or_else(|| ("Unknown".to_string(), ExtractionSource::Empty));
    let entity = normalize_entity_name(&raw);
    tracing::debug!(entity = %entity, raw = %raw, source = ?source, "Extracted entity");
    Extraction {
        entity,
        raw,
        source,
    }
}

fn match_rules(prompt: &str) -> Option<(String, ExtractionSource)> {
    if let Some(re) = NAMED_EVENT.as_ref()
        && let Some(caps) = re.captures(prompt)
    {
        let numeral = caps.get(1).map_or("", |m| m.as_str());
        return Some((
            format!("World War {numeral}"),
            ExtractionSource::Pattern {
                domain: Domain::Event,
                keyword: "world war",
            },
        ));
    }

    RULES.iter().find_map(|rule| {
        let caps = rule.pattern.captures(prompt)?;
        let phrase = clean_phrase(caps.get(1)?.as_str())?;
        Some((
            phrase,
            ExtractionSource::Pattern {
                domain: rule.domain,
                keyword: rule.keyword,
            },
        ))
    })
}

/// Cut at the first boundary word and drop a leading "the".
fn clean_phrase(phrase: &str) -> Option<String> {
    let mut words: Vec<&str> = phrase
        .split_whitespace()
        .take_while(|w| !BOUNDARY_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    while words.first().is_some_and(|w| w.eq_ignore_ascii_case("the")) {
        words.remove(0);
    }
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn title_case_fallback(prompt: &str) -> Option<(String, ExtractionSource)> {
    let words: Vec<&str> = prompt.split_whitespace().map(trim_punctuation).collect();
    for (i, word) in words.iter().enumerate() {
        if is_filler(word) || word.chars().count() <= 2 || !is_title_cased(word) {
            continue;
        }
        let entity = match words.get(i + 1) {
            Some(next)
                if is_title_cased(next)
                    && !is_filler(next)
                    && !BOUNDARY_WORDS.contains(&next.to_lowercase().as_str()) =>
            {
                format!("{word} {next}")
            }
            _ => (*word).to_string(),
        };
        return Some((entity, ExtractionSource::TitleCase));
    }
    None
}

fn first_word_fallback(prompt: &str) -> Option<(String, ExtractionSource)> {
    let words: Vec<&str> = prompt
        .split_whitespace()
        .map(trim_punctuation)
        .filter(|w| !w.is_empty())
        .collect();
    let first = *words.first()?;
    let chosen = if ARTICLES.contains(&first.to_lowercase().as_str()) {
        words.get(1).copied().unwrap_or(first)
    } else {
        first
    };
    Some((chosen.to_string(), ExtractionSource::FirstWord))
}

fn is_filler(word: &str) -> bool {
    FILLER_WORDS.contains(&word.to_lowercase().as_str())
}
