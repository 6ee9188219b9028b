//! PubMed / NCBI E-utilities: biomedical literature search.
//!
//! Two-step: esearch for PMIDs, then esummary for titles and journals.

use super::query::build_search_query;
use super::{EvidenceResult, SearchContext};

const SEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const SUMMARY_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi";

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    let query = build_search_query(claim_text, 8);
    if query.is_empty() {
        return vec![];
    }

    let retmax = max_results.to_string();
    let Some(data) = ctx
        .http
        .get_json(
            SEARCH_URL,
            "pubmed",
            &[
                ("db", "pubmed"),
                ("term", query.as_str()),
                ("retmax", retmax.as_str()),
                ("retmode", "json"),
                ("sort", "relevance"),
            ],
            &[],
        )
        .await
    else {
        return vec![];
    };

    let id_list: Vec<String> = data["esearchresult"]["idlist"]
        .as_array()
        .map(|ids| {
            ids.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    if id_list.is_empty() {
        return vec![];
    }

    let ids = id_list.join(",");
    let Some(summary) = ctx
        .http
        .get_json(
            SUMMARY_URL,
            "pubmed",
            &[("db", "pubmed"), ("id", ids.as_str()), ("retmode", "json")],
            &[],
        )
        .await
    else {
        return vec![];
    };

    let result_map = &summary["result"];
    let mut results = Vec::new();
    for pmid in &id_list {
        let info = &result_map[pmid.as_str()];
        let title = info["title"].as_str().unwrap_or("");
        let journal = info["source"].as_str().unwrap_or("");
        if title.is_empty() {
            continue;
        }
        results.push(EvidenceResult {
            url: format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid),
            title: title.chars().take(200).collect(),
            source_name: "pubmed",
            evidence_type: "paper",
            snippet: if journal.is_empty() {
                String::new()
            } else {
                format!("Published in: {}", journal)
            },
            evidence_date: String::new(),
        });
    }

    results
}
