//! Federal spending: award search against the USASpending API.
//!
//! POSTs a keyword-plus-date-range query; each returned award becomes one
//! result.

use super::query::build_search_query;
use super::{EvidenceResult, SearchContext};

const BASE_URL: &str = "https://api.usaspending.gov/api/v2";

static SPENDING_TERMS: &[&str] = &[
    "spending",
    "budget",
    "contract",
    "contracts",
    "grant",
    "grants",
    "federal spending",
    "government spending",
    "appropriation",
    "billion",
    "million",
    "trillion",
    "allocated",
    "funded",
    "agency",
    "department",
    "pentagon",
    "defense spending",
    "infrastructure",
    "stimulus",
    "bailout",
];

pub fn has_spending_relevance(claim_text: &str) -> bool {
    let lower = claim_text.to_lowercase();
    SPENDING_TERMS.iter().any(|t| lower.contains(t))
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    if !has_spending_relevance(claim_text) {
        return vec![];
    }
    let query = build_search_query(claim_text, 4);
    if query.is_empty() {
        return vec![];
    }

    let keywords: Vec<String> = query
        .replace('"', "")
        .split_whitespace()
        .take(3)
        .map(String::from)
        .collect();

    let body = serde_json::json!({
        "filters": {
            "keywords": keywords,
            "time_period": [{"start_date": "2018-01-01", "end_date": "2026-12-31"}],
        },
        "fields": ["Award ID", "Recipient Name", "Award Amount", "Awarding Agency", "Description"],
        "limit": max_results.min(5),
        "page": 1,
        "sort": "Award Amount",
        "order": "desc",
    });

    let Some(data) = ctx
        .http
        .post_json(
            &format!("{}/search/spending_by_award/", BASE_URL),
            "usaspending",
            &body,
        )
        .await
    else {
        return vec![];
    };

    let awards = data["results"].as_array().cloned().unwrap_or_default();
    let mut results = Vec::new();

    for award in awards.iter().take(max_results) {
        let recipient = award["Recipient Name"].as_str().unwrap_or("");
        let agency = award["Awarding Agency"].as_str().unwrap_or("");
        let desc = award["Description"].as_str().unwrap_or("");
        let award_id = award["Award ID"].as_str().unwrap_or("");

        let mut snippet = format!("Recipient: {}. ", recipient);
        if let Some(amount) = award["Award Amount"].as_f64() {
            snippet.push_str(&format!("Amount: ${:.0}. ", amount));
        }
        if !agency.is_empty() {
            snippet.push_str(&format!("Agency: {}. ", agency));
        }
        if !desc.is_empty() {
            snippet.push_str(&format!(
                "Description: {}.",
                desc.chars().take(300).collect::<String>()
            ));
        }

        results.push(EvidenceResult {
            url: if award_id.is_empty() {
                "https://www.usaspending.gov".to_string()
            } else {
                format!("https://www.usaspending.gov/award/{}", award_id)
            },
            title: format!(
                "Federal Award: {}",
                recipient.chars().take(60).collect::<String>()
            )
            .chars()
            .take(200)
            .collect(),
            source_name: "usaspending",
            evidence_type: "gov",
            snippet: snippet.chars().take(2000).collect(),
            evidence_date: String::new(),
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spending_prefilter() {
        assert!(has_spending_relevance("The Pentagon spent 850 billion on defense"));
        assert!(!has_spending_relevance("The recipe calls for two eggs"));
    }
}
