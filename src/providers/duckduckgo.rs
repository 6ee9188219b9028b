//! DuckDuckGo Instant Answers: the universal web-answer fallback.
//!
//! The Instant Answer API works best with short entity names or topic
//! phrases, not boolean search strings, so several query candidates are
//! tried best-first and the first strong answer wins.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::{EvidenceResult, SearchContext};
use crate::textutil::PROPER_NOUN_RE;

const API_URL: &str = "https://api.duckduckgo.com/";

static ACRONYM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{2,6}\b").expect("valid regex"));

static ACRONYM_SKIP: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "I", "A", "THE", "AND", "BUT", "FOR", "NOT", "WAS", "HAS", "CEO", "CFO", "CTO", "COO",
        "IPO", "Q1", "Q2", "Q3", "Q4", "FY",
    ]
    .into_iter()
    .collect()
});

static COMMON_STARTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "The", "This", "That", "These", "Those", "There", "They", "Their", "What", "Which",
        "Where", "When", "How", "Who", "Why", "Our", "His", "Her", "Its", "Some", "Many",
        "Most", "All", "Each", "Every", "And", "But", "Also", "Just", "Very", "More", "Then",
        "Now", "Well", "Here",
    ]
    .into_iter()
    .collect()
});

static FALLBACK_STOPS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "has", "have", "had", "be", "been", "do",
        "does", "did", "will", "would", "could", "should", "may", "might", "can", "to", "of",
        "in", "for", "on", "at", "by", "with", "from", "as", "and", "but", "or", "so", "if",
        "than", "that", "this", "it", "its", "not", "no", "just", "very", "really", "also",
        "about", "we", "our", "they", "their", "he", "she", "his", "her", "you", "your",
        "there", "here", "being", "which", "what",
    ]
    .into_iter()
    .collect()
});

/// Candidate queries, best-first: entity phrases, acronyms, the sentence
/// subject, capitalised words, then a stripped keyword phrase
fn extract_queries(claim_text: &str) -> Vec<String> {
    let mut queries: Vec<String> = Vec::new();

    for m in PROPER_NOUN_RE.find_iter(claim_text) {
        let ent = m.as_str().to_string();
        if !queries.contains(&ent) {
            queries.push(ent);
        }
    }

    for m in ACRONYM_RE.find_iter(claim_text) {
        let acr = m.as_str();
        if !ACRONYM_SKIP.contains(acr) && !queries.iter().any(|q| q == acr) {
            queries.push(acr.to_string());
        }
    }

    let words: Vec<&str> = claim_text.split_whitespace().collect();
    if let Some(first) = words.first() {
        let clean = first.trim_matches(|c: char| ".,!?;:\"'()[]".contains(c));
        if clean.len() > 2
            && clean.chars().next().is_some_and(|c| c.is_uppercase())
            && clean.chars().all(|c| c.is_alphabetic())
            && !COMMON_STARTS.contains(clean)
            && !queries.iter().any(|q| q == clean)
        {
            queries.push(clean.to_string());
        }
    }

    for w in words.iter().skip(1) {
        let clean = w.trim_matches(|c: char| ".,!?;:\"'()[]".contains(c));
        if clean.len() > 2
            && clean.chars().next().is_some_and(|c| c.is_uppercase())
            && clean.chars().all(|c| c.is_alphabetic())
            && !queries.iter().any(|q| q == clean)
        {
            queries.push(clean.to_string());
        }
    }

    if queries.is_empty() {
        let key: Vec<String> = words
            .iter()
            .map(|w| {
                w.trim_matches(|c: char| ".,!?;:\"'()[]".contains(c))
                    .to_lowercase()
            })
            .filter(|w| w.len() > 2 && !FALLBACK_STOPS.contains(w.as_str()))
            .take(4)
            .collect();
        if !key.is_empty() {
            queries.push(key.join(" "));
        }
    }

    queries.truncate(4);
    queries
}

fn parse_response(data: &serde_json::Value, max_results: usize) -> Vec<EvidenceResult> {
    let mut results = Vec::new();

    let abstract_text = data["Abstract"].as_str().unwrap_or("").trim();
    let abstract_url = data["AbstractURL"].as_str().unwrap_or("").trim();
    let heading = data["Heading"].as_str().unwrap_or("");

    if !abstract_text.is_empty() && !abstract_url.is_empty() {
        let source = data["AbstractSource"].as_str().unwrap_or("");
        results.push(EvidenceResult {
            url: abstract_url.to_string(),
            title: format!("{}: {}", source, heading)
                .trim_matches(|c| c == ':' || c == ' ')
                .to_string(),
            source_name: "duckduckgo",
            evidence_type: "secondary",
            snippet: abstract_text.chars().take(2000).collect(),
            evidence_date: String::new(),
        });
    }

    let answer = data["Answer"].as_str().unwrap_or("").trim();
    if !answer.is_empty() && abstract_text.is_empty() {
        results.push(EvidenceResult {
            url: if abstract_url.is_empty() {
                "https://duckduckgo.com".to_string()
            } else {
                abstract_url.to_string()
            },
            title: format!("DuckDuckGo Answer: {}", heading)
                .trim_matches(|c| c == ':' || c == ' ')
                .to_string(),
            source_name: "duckduckgo",
            evidence_type: "secondary",
            snippet: answer.chars().take(2000).collect(),
            evidence_date: String::new(),
        });
    }

    let definition = data["Definition"].as_str().unwrap_or("").trim();
    let definition_url = data["DefinitionURL"].as_str().unwrap_or("").trim();
    if !definition.is_empty() && !definition_url.is_empty() && abstract_text.is_empty() {
        results.push(EvidenceResult {
            url: definition_url.to_string(),
            title: format!("Definition: {}", heading),
            source_name: "duckduckgo",
            evidence_type: "secondary",
            snippet: definition.chars().take(2000).collect(),
            evidence_date: String::new(),
        });
    }

    if let Some(related) = data["RelatedTopics"].as_array() {
        for topic in related {
            if results.len() >= max_results {
                break;
            }
            if topic.get("Topics").is_some() {
                continue; // nested category group
            }
            let text = topic["Text"].as_str().unwrap_or("").trim();
            let url = topic["FirstURL"].as_str().unwrap_or("").trim();
            if !text.is_empty() && !url.is_empty() {
                results.push(EvidenceResult {
                    url: url.to_string(),
                    title: text.chars().take(120).collect(),
                    source_name: "duckduckgo",
                    evidence_type: "secondary",
                    snippet: text.chars().take(2000).collect(),
                    evidence_date: String::new(),
                });
            }
        }
    }

    results.truncate(max_results);
    results
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    let queries = extract_queries(claim_text);
    if queries.is_empty() {
        return vec![];
    }

    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut all_results: Vec<EvidenceResult> = Vec::new();

    for query in queries {
        if query.trim().len() < 2 {
            continue;
        }
        let Some(data) = ctx
            .http
            .get_json(
                API_URL,
                "duckduckgo",
                &[
                    ("q", query.as_str()),
                    ("format", "json"),
                    ("no_html", "1"),
                    ("skip_disambig", "1"),
                ],
                &[],
            )
            .await
        else {
            continue;
        };

        let has_abstract = !data["Abstract"].as_str().unwrap_or("").trim().is_empty();
        let has_answer = !data["Answer"].as_str().unwrap_or("").trim().is_empty();

        for r in parse_response(&data, max_results) {
            if seen_urls.insert(r.url.clone()) {
                all_results.push(r);
            }
        }

        // A strong instant answer is good enough; stop burning requests
        if has_abstract || has_answer || all_results.len() >= max_results {
            break;
        }
    }

    all_results.truncate(max_results);
    all_results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_candidates_ordered() {
        let queries = extract_queries("Goldman Sachs and NASA both reported 2023 figures");
        assert_eq!(queries[0], "Goldman Sachs");
        assert!(queries.contains(&"NASA".to_string()));
    }

    #[test]
    fn fallback_query_when_no_entities() {
        let queries = extract_queries("the inflation rate doubled since last spring");
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains("inflation"));
    }

    #[test]
    fn parse_prefers_abstract() {
        let data = serde_json::json!({
            "Abstract": "Goldman Sachs is an American investment bank.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Goldman_Sachs",
            "AbstractSource": "Wikipedia",
            "Heading": "Goldman Sachs",
            "Answer": "",
            "RelatedTopics": [],
        });
        let results = parse_response(&data, 5);
        assert_eq!(results.len(), 1);
        assert!(results[0].title.contains("Wikipedia"));
        assert_eq!(results[0].evidence_type, "secondary");
    }
}
