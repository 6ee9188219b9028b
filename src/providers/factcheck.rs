//! Google Fact Check Explorer: third-party verdicts on claims.
//!
//! The Explorer frontend returns a prefixed, deeply nested array format;
//! each parsed entry carries the original claim, the reviewer's rating,
//! the publisher, and the review URL.

use super::query::build_search_query;
use super::{EvidenceResult, SearchContext};

const EXPLORER_URL: &str = "https://toolbox.google.com/factcheck/api/search";

#[derive(Debug, Clone)]
struct Review {
    publisher_name: String,
    url: String,
    rating: String,
    title_snippet: String,
}

#[derive(Debug, Clone)]
struct FactCheckItem {
    claim_text: String,
    claimant: String,
    reviews: Vec<Review>,
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    let query = build_search_query(claim_text, 10);
    if query.is_empty() {
        return vec![];
    }

    let num = (max_results * 2).min(10).to_string();
    let Some(raw) = ctx
        .http
        .get_text(
            EXPLORER_URL,
            "google_factcheck",
            &[("query", query.as_str()), ("num", num.as_str())],
            &[],
        )
        .await
    else {
        return vec![];
    };

    let items = parse_explorer_response(&raw);
    let mut results = Vec::new();
    for item in items {
        if let Some(r) = format_result(&item) {
            results.push(r);
            if results.len() >= max_results {
                break;
            }
        }
    }
    results
}

/// Strip the )]}' anti-JSON prefix and unwrap the nested array layout:
/// `[["claims_response", [entry...], ...]]` where each entry is
/// `[claim_array, thumbnail, relevance]` and each claim_array is
/// `[text, [claimant, id], timestamp, [[review]...], ...]`.
fn parse_explorer_response(raw: &str) -> Vec<FactCheckItem> {
    let body = if raw.starts_with(")]}'") {
        match raw.find('\n') {
            Some(pos) => &raw[pos + 1..],
            None => return vec![],
        }
    } else {
        raw
    };

    let Ok(outer) = serde_json::from_str::<serde_json::Value>(body) else {
        return vec![];
    };
    let Some(wrapper) = outer.as_array().and_then(|o| o.first()) else {
        return vec![];
    };
    let Some(entries) = wrapper.as_array().and_then(|w| w.get(1)).and_then(|e| e.as_array())
    else {
        return vec![];
    };

    let mut parsed = Vec::new();
    for entry in entries {
        let Some(claim_array) = entry.as_array().and_then(|e| e.first()).and_then(|c| c.as_array())
        else {
            continue;
        };
        if claim_array.len() < 4 {
            continue;
        }

        let claim_text = claim_array[0].as_str().unwrap_or("").to_string();
        let claimant = claim_array[1]
            .as_array()
            .and_then(|c| c.first())
            .and_then(|c| c.as_str())
            .unwrap_or("")
            .to_string();

        let mut reviews = Vec::new();
        if let Some(review_block) = claim_array[3].as_array() {
            for rev in review_block {
                let Some(rev) = rev.as_array() else { continue };
                if rev.len() < 4 {
                    continue;
                }
                let publisher_name = rev[0]
                    .as_array()
                    .and_then(|p| p.first())
                    .and_then(|p| p.as_str())
                    .unwrap_or("")
                    .to_string();
                let url = rev[1].as_str().unwrap_or("").to_string();
                let rating = rev[3].as_str().unwrap_or("").to_string();
                let title_snippet = rev
                    .get(8)
                    .and_then(|t| t.as_str())
                    .unwrap_or("")
                    .to_string();
                reviews.push(Review {
                    publisher_name,
                    url,
                    rating,
                    title_snippet,
                });
            }
        }

        if !claim_text.is_empty() && !reviews.is_empty() {
            parsed.push(FactCheckItem {
                claim_text,
                claimant,
                reviews,
            });
        }
    }

    parsed
}

/// Build the evidence result with a rich snippet carrying the verdict
fn format_result(item: &FactCheckItem) -> Option<EvidenceResult> {
    let best = item.reviews.first()?;
    if best.url.is_empty() {
        return None;
    }

    let publisher = if best.publisher_name.is_empty() {
        "Unknown"
    } else {
        &best.publisher_name
    };
    let mut title = format!("Fact Check by {}", publisher);
    if !best.rating.is_empty() {
        title.push_str(&format!(": {}", best.rating));
    }

    let mut snippet_parts = vec![format!("Claim: {}", item.claim_text)];
    if !item.claimant.is_empty() {
        snippet_parts.push(format!("Claimant: {}", item.claimant));
    }
    if !best.rating.is_empty() {
        snippet_parts.push(format!("Rating: {}", best.rating));
    }
    snippet_parts.push(format!("Checked by: {}", publisher));
    if !best.title_snippet.is_empty() {
        snippet_parts.push(best.title_snippet.clone());
    }

    let other_ratings: Vec<String> = item
        .reviews
        .iter()
        .skip(1)
        .take(2)
        .filter(|r| !r.publisher_name.is_empty() && !r.rating.is_empty())
        .map(|r| format!("{}: {}", r.publisher_name, r.rating))
        .collect();
    if !other_ratings.is_empty() {
        snippet_parts.push(format!("Also checked: {}", other_ratings.join("; ")));
    }

    Some(EvidenceResult {
        url: best.url.clone(),
        title,
        source_name: "google_factcheck",
        evidence_type: "factcheck",
        snippet: snippet_parts.join(" | ").chars().take(2000).collect(),
        evidence_date: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> String {
        let inner = serde_json::json!([[
            "claims_response",
            [
                [
                    [
                        "Unemployment fell to 3.9 percent",
                        ["Senator Example", "id-1"],
                        1700000000,
                        [[
                            ["PolitiFact", "politifact.com"],
                            "https://www.politifact.com/factchecks/example/",
                            null,
                            "Mostly True",
                            null,
                            [null, "rev-1"],
                            "en",
                            null,
                            "Checking the unemployment numbers"
                        ]]
                    ],
                    "thumb.jpg",
                    0.93
                ]
            ]
        ]]);
        format!(")]}}'\n{}", inner)
    }

    #[test]
    fn parses_prefixed_nested_arrays() {
        let items = parse_explorer_response(&sample_response());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].claim_text, "Unemployment fell to 3.9 percent");
        assert_eq!(items[0].claimant, "Senator Example");
        assert_eq!(items[0].reviews[0].rating, "Mostly True");
    }

    #[test]
    fn formats_result_with_rating_in_title() {
        let items = parse_explorer_response(&sample_response());
        let result = format_result(&items[0]).expect("result");
        assert!(result.title.contains("PolitiFact"));
        assert!(result.title.contains("Mostly True"));
        assert_eq!(result.evidence_type, "factcheck");
        assert!(result.snippet.contains("Rating: Mostly True"));
    }

    #[test]
    fn malformed_payload_yields_empty() {
        assert!(parse_explorer_response("not json").is_empty());
        assert!(parse_explorer_response(")]}'\n{\"a\":1}").is_empty());
    }
}
