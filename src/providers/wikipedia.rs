//! Wikipedia: entity-level fact lookups via the MediaWiki Action API.
//!
//! Search-then-extract; the intro extract is re-ranked paragraph by
//! paragraph against the claim, keeping the top three.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::query::build_search_query;
use super::{EvidenceResult, SearchContext};

const API_URL: &str = "https://en.wikipedia.org/w/api.php";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    let query = build_search_query(claim_text, 8);
    if query.is_empty() {
        return vec![];
    }

    let srlimit = max_results.min(5).to_string();
    let Some(data) = ctx
        .http
        .get_json(
            API_URL,
            "wikipedia",
            &[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query.as_str()),
                ("srlimit", srlimit.as_str()),
                ("format", "json"),
                ("utf8", "1"),
            ],
            &[],
        )
        .await
    else {
        return vec![];
    };

    let search_results = data["query"]["search"].as_array().cloned().unwrap_or_default();
    if search_results.is_empty() {
        return vec![];
    }

    let page_ids: Vec<String> = search_results
        .iter()
        .filter_map(|r| r["pageid"].as_i64().map(|id| id.to_string()))
        .collect();
    let pageids = page_ids.join("|");
    let exlimit = page_ids.len().to_string();

    let extract_data = ctx
        .http
        .get_json(
            API_URL,
            "wikipedia",
            &[
                ("action", "query"),
                ("pageids", pageids.as_str()),
                ("prop", "extracts|info"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exlimit", exlimit.as_str()),
                ("inprop", "url"),
                ("format", "json"),
                ("utf8", "1"),
            ],
            &[],
        )
        .await;

    let Some(extract_data) = extract_data else {
        return results_from_search(&search_results, max_results);
    };

    let pages = &extract_data["query"]["pages"];
    let mut results = Vec::new();

    for sr in &search_results {
        let Some(pid) = sr["pageid"].as_i64() else { continue };
        let page = &pages[pid.to_string().as_str()];
        let title = page["title"]
            .as_str()
            .or_else(|| sr["title"].as_str())
            .unwrap_or("");
        let url = page["fullurl"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| {
                format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_"))
            });
        let extract = page["extract"].as_str().unwrap_or("");

        let snippet = rank_paragraphs(extract, claim_text);
        results.push(EvidenceResult {
            url,
            title: format!("{} - Wikipedia", title),
            source_name: "wikipedia",
            evidence_type: "secondary",
            snippet: snippet.chars().take(2000).collect(),
            evidence_date: String::new(),
        });
        if results.len() >= max_results {
            break;
        }
    }

    results
}

/// Keep the three paragraphs most relevant to the claim by token overlap
fn rank_paragraphs(extract: &str, claim_text: &str) -> String {
    if extract.is_empty() {
        return String::new();
    }
    let paragraphs: Vec<&str> = extract
        .split('\n')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        return extract.chars().take(500).collect();
    }

    let claim_words: HashSet<String> = claim_text
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect();

    let mut scored: Vec<(usize, &str)> = paragraphs
        .iter()
        .map(|p| {
            let p_words: HashSet<String> =
                p.to_lowercase().split_whitespace().map(String::from).collect();
            (claim_words.intersection(&p_words).count(), *p)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(3)
        .map(|(_, p)| p)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fallback: build results from search snippets when extracts fail
fn results_from_search(
    search_results: &[serde_json::Value],
    max_results: usize,
) -> Vec<EvidenceResult> {
    search_results
        .iter()
        .take(max_results)
        .filter_map(|sr| {
            let title = sr["title"].as_str()?;
            let snippet = TAG_RE.replace_all(sr["snippet"].as_str().unwrap_or(""), "");
            Some(EvidenceResult {
                url: format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_")),
                title: format!("{} - Wikipedia", title),
                source_name: "wikipedia",
                evidence_type: "secondary",
                snippet: snippet.chars().take(500).collect(),
                evidence_date: String::new(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_ranking_prefers_overlap() {
        let extract = "Unrelated opening paragraph about history.\n\
                       Apple reported revenue of 113.8 billion dollars for the quarter.\n\
                       Another paragraph about something else entirely.";
        let ranked = rank_paragraphs(extract, "Apple revenue of 113.8 billion dollars");
        assert!(ranked.starts_with("Apple reported revenue"));
    }
}
