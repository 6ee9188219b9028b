//! Patents: USPTO PatentsView search for technology/innovation claims.
//!
//! Uses the API key when configured; otherwise degrades to a reference
//! search link.

use once_cell::sync::Lazy;
use regex::Regex;

use super::query::build_search_query;
use super::{EvidenceResult, SearchContext};

const BASE_URL: &str = "https://search.patentsview.org/api/v1";

static PATENT_TERMS: &[&str] = &[
    "patent",
    "patents",
    "patented",
    "innovation",
    "invention",
    "intellectual property",
    "patent filing",
    "patent application",
    "utility patent",
    "design patent",
    "trademark",
    "r&d",
    "research and development",
];

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\b").expect("valid regex"));

pub fn has_patent_relevance(claim_text: &str) -> bool {
    let lower = claim_text.to_lowercase();
    PATENT_TERMS.iter().any(|t| lower.contains(t))
}

fn extract_company(claim_text: &str) -> String {
    let skip = ["The", "How", "Why", "What", "This", "That", "New", "Patent", "Innovation"];
    for cap in ENTITY_RE.captures_iter(claim_text) {
        let entity = cap[1].to_string();
        let first = entity.split_whitespace().next().unwrap_or("");
        if !skip.contains(&first) {
            return entity;
        }
    }
    String::new()
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    if !has_patent_relevance(claim_text) {
        return vec![];
    }
    let query = build_search_query(claim_text, 4);
    if query.is_empty() {
        return vec![];
    }

    let mut results = Vec::new();

    if let Some(api_key) = ctx.runtime.patentsview_api_key.clone() {
        let company = extract_company(claim_text);
        let search_q = if company.is_empty() {
            query
                .replace('"', "")
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_string()
        } else {
            company
        };

        let q_param = format!(r#"{{"_text_any":{{"patent_abstract":"{}"}}}}"#, search_q);
        let per_page = max_results.min(5).to_string();
        if let Some(data) = ctx
            .http
            .get_json(
                &format!("{}/patent/", BASE_URL),
                "patentsview",
                &[
                    ("q", q_param.as_str()),
                    ("f", r#"["patent_id","patent_title","patent_date","patent_abstract"]"#),
                    ("per_page", per_page.as_str()),
                ],
                &[("X-Api-Key", api_key.as_str())],
            )
            .await
        {
            for p in data["patents"].as_array().cloned().unwrap_or_default().iter().take(max_results)
            {
                let patent_id = p["patent_id"].as_str().unwrap_or("");
                let title = p["patent_title"].as_str().unwrap_or("");
                let date = p["patent_date"].as_str().unwrap_or("");
                let abstract_text = p["patent_abstract"].as_str().unwrap_or("");

                results.push(EvidenceResult {
                    url: format!("https://patents.google.com/patent/US{}", patent_id),
                    title: format!("Patent US{}: {}", patent_id, title)
                        .chars()
                        .take(200)
                        .collect(),
                    source_name: "patentsview",
                    evidence_type: "gov",
                    snippet: format!(
                        "Filed: {}. {}",
                        date,
                        abstract_text.chars().take(500).collect::<String>()
                    )
                    .chars()
                    .take(2000)
                    .collect(),
                    evidence_date: date.chars().take(4).collect(),
                });
            }
        }
    }

    // No key or no hits: a reference link keeps the provider useful
    if results.is_empty() {
        let company = extract_company(claim_text);
        let search_term = if company.is_empty() {
            query.chars().take(50).collect::<String>()
        } else {
            company
        };
        results.push(EvidenceResult {
            url: format!(
                "https://patentsview.org/search/{}",
                search_term.replace(' ', "+")
            ),
            title: format!("PatentsView: {} Patents", search_term),
            source_name: "patentsview",
            evidence_type: "gov",
            snippet: format!(
                "USPTO patent search for: {}. PatentsView provides patent data from the \
                 US Patent and Trademark Office. Source: USPTO/PatentsView.",
                search_term
            ),
            evidence_date: String::new(),
        });
    }

    results.truncate(max_results);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patent_prefilter() {
        assert!(has_patent_relevance("Nvidia filed 1200 patents last year"));
        assert!(!has_patent_relevance("Revenue grew 8 percent"));
    }

    #[test]
    fn company_extraction_skips_stop_starts() {
        assert_eq!(extract_company("The Patent Office granted Nvidia Corp a patent"), "Nvidia Corp");
    }
}
