//! SEC.gov publications search: the regulator's own reports rather than
//! corporate filings: annual reports, budget justifications, enforcement
//! statistics, staff reports.
//!
//! Pre-filtered by institutional terminology so ordinary corporate claims
//! don't burn requests here.

use once_cell::sync::Lazy;
use regex::Regex;

use super::http::SEC_USER_AGENT;
use super::query::build_search_query;
use super::{EvidenceResult, SearchContext};

const SEARCH_URL: &str = "https://efts.sec.gov/LATEST/search-index";

static SEC_INSTITUTIONAL_TERMS: &[&str] = &[
    "sec",
    "securities and exchange commission",
    "commission",
    "enforcement",
    "examination",
    "examinations",
    "inspection",
    "registrant",
    "registrants",
    "registered",
    "registration",
    "division",
    "office",
    "staff",
    "fte",
    "budget",
    "appropriation",
    "congressional",
    "rulemaking",
    "transfer agent",
    "transfer agents",
    "investment adviser",
    "investment advisers",
    "adviser",
    "advisers",
    "broker-dealer",
    "broker-dealers",
    "broker dealer",
    "municipal advisor",
    "municipal advisors",
    "swap dealer",
    "security-based swap",
    "nationally recognized",
    "clearing agency",
    "self-regulatory",
    "sro",
    "whistleblower",
    "disgorgement",
    "penalty",
    "penalties",
    "filing fee",
    "filing fees",
    "investor protection",
    "market integrity",
    "tipster",
    "complaint",
    "complaints",
];

/// Named report series worth a targeted follow-up query
static SEC_REPORT_KEYWORDS: &[(&str, &str)] = &[
    ("annual report", "SEC Annual Report"),
    ("budget justification", "Congressional Budget Justification"),
    ("strategic plan", "SEC Strategic Plan"),
    ("enforcement", "Division of Enforcement Annual Report"),
    ("examination", "Division of Examinations Annual Report"),
    ("inspection", "Office of Inspections Annual Report"),
    ("investor advocate", "Office of Investor Advocate Report"),
    ("ombudsman", "SEC Ombudsman Report"),
];

static YEAR_20XX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(20\d{2})\b").expect("valid regex"));

pub fn has_institutional_relevance(claim_text: &str) -> bool {
    let lower = claim_text.to_lowercase();
    SEC_INSTITUTIONAL_TERMS.iter().any(|t| lower.contains(t))
}

fn parse_hits(data: &serde_json::Value, limit: usize) -> Vec<EvidenceResult> {
    let hits = data["hits"]["hits"].as_array().cloned().unwrap_or_default();
    let mut results = Vec::new();

    for hit in hits.iter().take(limit) {
        let src = &hit["_source"];
        let file_date = src["file_date"].as_str().unwrap_or("");
        let form = src["form"].as_str().unwrap_or("");
        let entity_name = src["display_names"]
            .as_array()
            .and_then(|n| n.first())
            .and_then(|n| n.as_str())
            .map(|n| n.split("(CIK").next().unwrap_or(n).trim().to_string())
            .unwrap_or_else(|| "SEC".to_string());

        let adsh = src["adsh"].as_str().unwrap_or("");
        let cik = src["ciks"]
            .as_array()
            .and_then(|c| c.first())
            .and_then(|c| c.as_str())
            .unwrap_or("");
        if adsh.is_empty() || cik.is_empty() {
            continue;
        }
        let url = format!(
            "https://www.sec.gov/Archives/edgar/data/{}/{}/",
            cik,
            adsh.replace('-', "")
        );

        let title = if form.is_empty() {
            entity_name.clone()
        } else {
            format!("{} - {}", entity_name, form)
        };

        let mut snippet = String::new();
        if !file_date.is_empty() {
            snippet.push_str(&format!("Filed: {}", file_date));
        }
        if let Some(period) = src["period_ending"].as_str() {
            if !period.is_empty() {
                snippet.push_str(&format!(" | Period: {}", period));
            }
        }
        if !form.is_empty() {
            snippet.push_str(&format!(" | Form: {}", form));
        }

        results.push(EvidenceResult {
            url,
            title: title.chars().take(200).collect(),
            source_name: "sec_gov",
            evidence_type: "gov",
            snippet: snippet.chars().take(200).collect(),
            evidence_date: file_date.chars().take(4).collect(),
        });
    }

    results
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    if !has_institutional_relevance(claim_text) {
        return vec![];
    }
    let mut query = build_search_query(claim_text, 6);
    if query.is_empty() {
        return vec![];
    }
    let qlower = query.to_lowercase();
    if !qlower.contains("sec") && !qlower.contains("securities") {
        query = format!("SEC {}", query);
    }

    let headers = [("User-Agent", SEC_USER_AGENT), ("Accept", "application/json")];
    let mut results = Vec::new();

    if let Some(data) = ctx
        .http
        .get_json(
            SEARCH_URL,
            "sec_gov",
            &[
                ("q", query.as_str()),
                ("dateRange", "custom"),
                ("startdt", "2018-01-01"),
                ("enddt", "2026-12-31"),
            ],
            &headers,
        )
        .await
    {
        results.extend(parse_hits(&data, max_results));
    }

    // Targeted queries for named report series mentioned in the claim
    let lower = claim_text.to_lowercase();
    for (keyword, report_name) in SEC_REPORT_KEYWORDS {
        if results.len() >= max_results {
            break;
        }
        if !lower.contains(keyword) {
            continue;
        }
        let mut report_query = format!("SEC {}", report_name);
        if let Some(year) = YEAR_20XX_RE.find(claim_text) {
            report_query.push(' ');
            report_query.push_str(year.as_str());
        }
        if let Some(data) = ctx
            .http
            .get_json(
                SEARCH_URL,
                "sec_gov",
                &[
                    ("q", report_query.as_str()),
                    ("dateRange", "custom"),
                    ("startdt", "2018-01-01"),
                    ("enddt", "2026-12-31"),
                ],
                &headers,
            )
            .await
        {
            for mut r in parse_hits(&data, 2) {
                r.title = format!("SEC: {}", report_name).chars().take(200).collect();
                r.snippet = if r.snippet.is_empty() {
                    report_name.to_string()
                } else {
                    format!("{}. {}", report_name, r.snippet)
                };
                results.push(r);
            }
        }
    }

    results.truncate(max_results);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn institutional_prefilter() {
        assert!(has_institutional_relevance(
            "The SEC brought 784 enforcement actions last year"
        ));
        assert!(has_institutional_relevance(
            "There are over 15000 registered investment advisers"
        ));
        assert!(!has_institutional_relevance(
            "Apple revenue grew 8 percent year over year"
        ));
    }
}
