//! Search query construction shared by the API-backed providers.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::textutil::PROPER_NOUN_RE;

static QUERY_STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "has", "have", "had", "be", "been",
        "being", "do", "does", "did", "will", "would", "could", "should", "may", "might",
        "shall", "can", "to", "of", "in", "for", "on", "at", "by", "with", "from", "as",
        "into", "about", "between", "through", "during", "before", "after", "and", "but", "or",
        "so", "if", "then", "than", "that", "this", "these", "those", "it", "its", "not", "no",
        "just", "very", "really", "also", "too", "more", "most", "some", "any", "all", "each",
        "every", "both", "few", "many", "much", "own", "other", "such", "only",
    ]
    .into_iter()
    .collect()
});

/// Multi-word phrases too common to sharpen a search
static COMMON_PHRASES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "United States",
        "New York",
        "Last Year",
        "Next Year",
        "First Quarter",
        "Second Quarter",
        "Third Quarter",
        "Fourth Quarter",
    ]
    .into_iter()
    .collect()
});

/// Extract the most informative terms from a claim for API search queries.
/// Multi-word proper nouns are preserved as quoted phrases; numbers are
/// always kept; filler words are stripped.
pub fn build_search_query(claim_text: &str, max_terms: usize) -> String {
    let proper_nouns: Vec<&str> = PROPER_NOUN_RE
        .find_iter(claim_text)
        .map(|m| m.as_str())
        .filter(|pn| !COMMON_PHRASES.contains(pn))
        .collect();

    let mut quoted_phrases = Vec::new();
    let mut terms_used = 0usize;
    for pn in proper_nouns.iter().take(3) {
        quoted_phrases.push(format!("\"{}\"", pn));
        terms_used += 2; // a phrase counts as roughly two terms
    }

    let proper_noun_words: HashSet<&str> = proper_nouns
        .iter()
        .flat_map(|pn| pn.split_whitespace())
        .collect();

    let mut key_terms = Vec::new();
    for w in claim_text.split_whitespace() {
        let cleaned = w.trim_matches(|c: char| ".,!?;:\"'()[]".contains(c));
        if cleaned.is_empty() || proper_noun_words.contains(cleaned) {
            continue;
        }
        let lower = cleaned.to_lowercase();
        if cleaned.chars().any(|c| c.is_ascii_digit()) {
            key_terms.push(cleaned.to_string());
        } else if cleaned.chars().next().is_some_and(|c| c.is_uppercase())
            && !QUERY_STOP_WORDS.contains(lower.as_str())
        {
            key_terms.push(cleaned.to_string());
        } else if !QUERY_STOP_WORDS.contains(lower.as_str()) && lower.len() > 2 {
            key_terms.push(lower);
        }
    }

    let remaining = max_terms.saturating_sub(terms_used);
    key_terms.truncate(remaining);

    let mut parts = quoted_phrases;
    parts.extend(key_terms);
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_filler_words() {
        let q = build_search_query("The company has been growing its revenue rapidly", 8);
        assert!(!q.contains("the "));
        assert!(q.contains("revenue"));
    }

    #[test]
    fn keeps_numbers() {
        let q = build_search_query("Revenue grew 12 percent to 113.8 billion", 8);
        assert!(q.contains("12"));
        assert!(q.contains("113.8"));
    }

    #[test]
    fn quotes_proper_noun_phrases() {
        let q = build_search_query("Goldman Sachs reported higher trading revenue", 8);
        assert!(q.contains("\"Goldman Sachs\""));
    }

    #[test]
    fn skips_common_phrases() {
        let q = build_search_query("The United States imported more steel", 8);
        assert!(!q.contains("\"United States\""));
    }

    #[test]
    fn respects_term_budget() {
        let q = build_search_query(
            "Alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu",
            4,
        );
        assert!(q.split_whitespace().count() <= 6);
    }
}
