//! OpenFDA: drug/device data for health claims.
//!
//! Four endpoint families picked by keyword: adverse events, labeling,
//! enforcement, and approvals.

use super::query::build_search_query;
use super::{EvidenceResult, SearchContext};

const BASE_URL: &str = "https://api.fda.gov";

static ENDPOINTS: &[(&str, &str)] = &[
    ("adverse", "/drug/event.json"),
    ("side effect", "/drug/event.json"),
    ("recall", "/food/enforcement.json"),
    ("recalled", "/food/enforcement.json"),
    ("approved", "/drug/drugsfda.json"),
    ("approval", "/drug/drugsfda.json"),
    ("fda approved", "/drug/drugsfda.json"),
    ("label", "/drug/label.json"),
    ("warning", "/drug/label.json"),
];

fn pick_endpoint(claim_text: &str) -> &'static str {
    let lower = claim_text.to_lowercase();
    for (kw, endpoint) in ENDPOINTS {
        if lower.contains(kw) {
            return endpoint;
        }
    }
    // Largest dataset
    "/drug/event.json"
}

fn first_str(v: &serde_json::Value) -> &str {
    v.as_array()
        .and_then(|a| a.first())
        .and_then(|s| s.as_str())
        .unwrap_or("")
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    let endpoint = pick_endpoint(claim_text);
    let query = build_search_query(claim_text, 4);
    if query.is_empty() {
        return vec![];
    }

    let search_param = query
        .replace('"', "")
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join("+AND+");
    let limit = max_results.min(5).to_string();

    let url = format!("{}{}", BASE_URL, endpoint);
    let Some(data) = ctx
        .http
        .get_json(
            &url,
            "openfda",
            &[("search", search_param.as_str()), ("limit", limit.as_str())],
            &[],
        )
        .await
    else {
        return vec![];
    };

    let items = data["results"].as_array().cloned().unwrap_or_default();
    let mut results = Vec::new();

    for item in items.iter().take(max_results) {
        let (title, snippet) = if endpoint.contains("/drug/event") {
            let reactions: Vec<&str> = item["patient"]["reaction"]
                .as_array()
                .map(|r| {
                    r.iter()
                        .take(3)
                        .filter_map(|x| x["reactionmeddrapt"].as_str())
                        .collect()
                })
                .unwrap_or_default();
            let drugs: Vec<&str> = item["patient"]["drug"]
                .as_array()
                .map(|d| {
                    d.iter()
                        .take(3)
                        .filter_map(|x| x["medicinalproduct"].as_str())
                        .collect()
                })
                .unwrap_or_default();
            (
                "FDA Adverse Event Report".to_string(),
                format!(
                    "Drugs: {}. Reactions: {}. Serious: {}. Country: {}.",
                    drugs.join(", "),
                    reactions.join(", "),
                    item["serious"].as_str().unwrap_or("unknown"),
                    item["occurcountry"].as_str().unwrap_or("unknown"),
                ),
            )
        } else if endpoint.contains("/drug/label") {
            let brand = first_str(&item["openfda"]["brand_name"]);
            let generic = first_str(&item["openfda"]["generic_name"]);
            let warnings = first_str(&item["warnings"]);
            (
                format!(
                    "FDA Drug Label: {}",
                    if brand.is_empty() { generic } else { brand }
                ),
                format!(
                    "Brand: {}. Generic: {}. {}",
                    brand,
                    generic,
                    warnings.chars().take(500).collect::<String>()
                ),
            )
        } else if endpoint.contains("/food/enforcement") {
            (
                format!(
                    "FDA Enforcement: {}",
                    item["product_description"]
                        .as_str()
                        .unwrap_or("")
                        .chars()
                        .take(80)
                        .collect::<String>()
                ),
                format!(
                    "Classification: {}. Reason: {}. Status: {}.",
                    item["classification"].as_str().unwrap_or(""),
                    item["reason_for_recall"]
                        .as_str()
                        .unwrap_or("")
                        .chars()
                        .take(300)
                        .collect::<String>(),
                    item["status"].as_str().unwrap_or(""),
                ),
            )
        } else {
            let Some(product) = item["products"].as_array().and_then(|p| p.first()) else {
                continue;
            };
            (
                format!(
                    "FDA Approval: {}",
                    product["brand_name"].as_str().unwrap_or("")
                ),
                format!(
                    "Brand: {}. Active: {}. Route: {}. Dosage: {}.",
                    product["brand_name"].as_str().unwrap_or(""),
                    product["active_ingredients"].to_string(),
                    product["route"].as_str().unwrap_or(""),
                    product["dosage_form"].as_str().unwrap_or(""),
                ),
            )
        };

        if snippet.trim().is_empty() {
            continue;
        }

        let endpoint_parts: Vec<&str> = endpoint.trim_matches('/').split('/').collect();
        let api_family = endpoint_parts.first().copied().unwrap_or("drug");
        let api_name = endpoint_parts
            .get(1)
            .map(|n| n.trim_end_matches(".json"))
            .unwrap_or("event");

        results.push(EvidenceResult {
            url: format!("https://open.fda.gov/apis/{}/{}/", api_family, api_name),
            title: title.chars().take(200).collect(),
            source_name: "openfda",
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
    fn endpoint_selection_by_keyword() {
        assert_eq!(pick_endpoint("the drug was recalled"), "/food/enforcement.json");
        assert_eq!(pick_endpoint("fda approved the treatment"), "/drug/drugsfda.json");
        assert_eq!(pick_endpoint("label warning"), "/drug/label.json");
        assert_eq!(pick_endpoint("general health claim"), "/drug/event.json");
    }
}
