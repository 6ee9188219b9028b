//! Crossref: academic work search over title/abstract.
//!
//! No API key required. Pre-filtered: only claims carrying academic language
//! or at least two proper-noun entities are worth the request.

use once_cell::sync::Lazy;
use regex::Regex;

use super::query::build_search_query;
use super::{EvidenceResult, SearchContext};
use crate::textutil::PROPER_NOUN_RE;

const BASE_URL: &str = "https://api.crossref.org/works";

/// Academic / research indicators shared with the preprint source
pub static ACADEMIC_TERMS: &[&str] = &[
    "study",
    "studies",
    "research",
    "researchers",
    "published",
    "journal",
    "peer-reviewed",
    "paper",
    "findings",
    "experiment",
    "hypothesis",
    "methodology",
    "statistical",
    "sample size",
    "correlation",
    "causation",
    "meta-analysis",
    "systematic review",
    "university",
    "professor",
    "phd",
];

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// True when a claim plausibly cites research
pub fn has_academic_relevance(claim_text: &str) -> bool {
    let lower = claim_text.to_lowercase();
    if ACADEMIC_TERMS.iter().any(|t| lower.contains(t)) {
        return true;
    }
    PROPER_NOUN_RE.find_iter(claim_text).count() >= 2
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    if !has_academic_relevance(claim_text) {
        return vec![];
    }
    let query = build_search_query(claim_text, 8);
    if query.is_empty() {
        return vec![];
    }

    let rows = max_results.to_string();
    let Some(data) = ctx
        .http
        .get_json(
            BASE_URL,
            "crossref",
            &[
                ("query", query.as_str()),
                ("rows", rows.as_str()),
                (
                    "select",
                    "DOI,title,abstract,type,published-print,published-online",
                ),
            ],
            &[],
        )
        .await
    else {
        return vec![];
    };

    let items = data["message"]["items"].as_array().cloned().unwrap_or_default();
    let mut results = Vec::new();

    for item in items {
        let doi = item["DOI"].as_str().unwrap_or("");
        let title = item["title"]
            .as_array()
            .and_then(|t| t.first())
            .and_then(|t| t.as_str())
            .unwrap_or("");
        let abstract_text = item["abstract"].as_str().unwrap_or("");
        let snippet: String = TAG_RE
            .replace_all(abstract_text, "")
            .chars()
            .take(300)
            .collect();

        let evidence_type = if item["type"].as_str() == Some("dataset") {
            "dataset"
        } else {
            "paper"
        };

        if doi.is_empty() || title.is_empty() {
            continue;
        }
        results.push(EvidenceResult {
            url: format!("https://doi.org/{}", doi),
            title: title.chars().take(200).collect(),
            source_name: "crossref",
            evidence_type,
            snippet,
            evidence_date: String::new(),
        });
    }

    results
}
