//! SEC EDGAR full-text search with filing enrichment.
//!
//! Pipeline:
//!   1. Search EDGAR EFTS for filings matching the claim (plus an injected
//!      company entity from source metadata, and a date range derived from
//!      the claim year or the source upload year).
//!   2. For the top hits, resolve the filing's primary .htm document via
//!      index.json, preferring exhibit pages and filtering XBRL viewer files.
//!   3. Convert the document to text, cache it on disk keyed by URL hash
//!      (atomic write), and pick the 4000-char window that best matches the
//!      claim's numbers and financial key terms as the snippet.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::http::SEC_USER_AGENT;
use super::query::build_search_query;
use super::{EvidenceResult, SearchContext};
use crate::textutil::{sha256_hex, DECIMAL_RE};

const SEARCH_URL: &str = "https://efts.sec.gov/LATEST/search-index";

const MAX_FILING_TEXT: usize = 60_000;
const SNIPPET_WINDOW: usize = 4000;

/// Known issuer aliases for entity injection from source metadata
static ENTITY_ALIASES: &[(&str, &[&str])] = &[
    ("alphabet", &["Alphabet", "Google", "GOOG"]),
    ("meta", &["Meta", "Facebook", "META"]),
    ("amazon", &["Amazon", "AMZN"]),
    ("microsoft", &["Microsoft", "MSFT"]),
    ("apple", &["Apple", "AAPL"]),
    ("nvidia", &["Nvidia", "NVDA"]),
    ("tesla", &["Tesla", "TSLA"]),
];

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\b").expect("valid regex"));

/// XBRL viewer pages look like R1.htm, R42.htm
static XBRL_VIEWER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^r\d+\.htm$").expect("valid regex"));

static ARCHIVE_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)href="(/Archives/[^"]+\.html?)""#).expect("valid regex"));

static FINANCIAL_KEY_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "revenue",
        "revenues",
        "income",
        "earnings",
        "margin",
        "margins",
        "billion",
        "million",
        "percent",
        "growth",
        "operating",
        "net",
        "cash",
        "flow",
        "capex",
        "depreciation",
        "cloud",
        "advertising",
        "search",
        "youtube",
        "subscriptions",
        "expenses",
        "costs",
        "quarter",
        "quarterly",
        "annual",
        "dividend",
        "repurchase",
        "backlog",
        "share",
        "shares",
        "eps",
    ]
    .into_iter()
    .collect()
});

/// Extract a company/entity name from source metadata for query injection.
/// Returns empty when nothing recognisable is present.
pub fn infer_source_entity(title: &str, channel: &str) -> String {
    let combined = format!("{} {}", title, channel);
    let combined = combined.trim();
    if combined.is_empty() {
        return String::new();
    }

    let lower = combined.to_lowercase();
    for (key, aliases) in ENTITY_ALIASES {
        if lower.contains(key) {
            return aliases[0].to_string();
        }
        for alias in *aliases {
            if lower.contains(&alias.to_lowercase()) {
                return aliases[0].to_string();
            }
        }
    }

    // Fallback: first capitalised entity from the title
    let skip = ["The", "How", "Why", "What", "This", "That", "New", "Free", "Open"];
    for cap in ENTITY_RE.captures_iter(title) {
        let entity = cap[1].to_string();
        let first = entity.split_whitespace().next().unwrap_or("");
        if !skip.contains(&first) {
            return entity;
        }
    }

    String::new()
}

/// Strip scripts, styles and head, collapse whitespace, cap length
fn html_to_text(html: &str) -> String {
    let document = scraper::Html::parse_document(html);
    let skip: HashSet<&str> = ["script", "style", "head", "meta", "link", "noscript"]
        .into_iter()
        .collect();

    let mut parts: Vec<String> = Vec::new();
    for node in document.root_element().descendants() {
        if let Some(text) = node.value().as_text() {
            let inside_skipped = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map(|el| skip.contains(el.name()))
                    .unwrap_or(false)
            });
            if !inside_skipped {
                let t = text.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
        }
    }

    let joined = parts.join(" ");
    let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_FILING_TEXT).collect()
}

fn cache_key(url: &str) -> String {
    sha256_hex(url)[..16].to_string()
}

fn cache_read(dir: &Path, url: &str) -> Option<String> {
    std::fs::read_to_string(dir.join(format!("{}.txt", cache_key(url)))).ok()
}

/// Write-once cache entry; temp file then rename so readers never see a
/// partial write
fn cache_write(dir: &Path, url: &str, text: &str) {
    let final_path = dir.join(format!("{}.txt", cache_key(url)));
    let tmp_path = dir.join(format!("{}.tmp", cache_key(url)));
    if std::fs::write(&tmp_path, text).is_ok() {
        let _ = std::fs::rename(&tmp_path, &final_path);
    }
}

/// Select candidate .htm documents from index.json: exhibits first, then by
/// size descending; index pages and XBRL viewer files excluded.
fn candidate_documents(index: &serde_json::Value) -> Vec<String> {
    let items = index["directory"]["item"].as_array().cloned().unwrap_or_default();
    let mut htm_items: Vec<(String, i64)> = Vec::new();

    for item in items {
        let name = item["name"].as_str().unwrap_or("");
        if !name.ends_with(".htm") {
            continue;
        }
        let name_lower = name.to_lowercase();
        if name_lower.contains("index") || XBRL_VIEWER_RE.is_match(&name_lower) {
            continue;
        }
        let size = item["size"]
            .as_i64()
            .or_else(|| item["size"].as_str().and_then(|s| s.parse().ok()))
            .unwrap_or(0);
        htm_items.push((name.to_string(), size));
    }

    htm_items.sort_by_key(|(name, size)| {
        let nl = name.to_lowercase();
        let is_exhibit = nl.contains("exhibit") || nl.contains("ex99") || nl.contains("ex-99");
        (if is_exhibit { 0 } else { 1 }, -size)
    });

    htm_items.into_iter().map(|(name, _)| name).collect()
}

/// Fetch a filing's primary document and extract its text, via cache
async fn fetch_filing_text(filing_url: &str, ctx: &SearchContext<'_>) -> String {
    let cache_dir = match ctx.paths.edgar_cache_dir() {
        Ok(d) => d,
        Err(_) => PathBuf::new(),
    };
    if cache_dir.as_os_str().is_empty() {
        return String::new();
    }
    if let Some(cached) = cache_read(&cache_dir, filing_url) {
        return cached;
    }

    let base_url = filing_url.trim_end_matches('/');
    let headers = [("User-Agent", SEC_USER_AGENT), ("Accept", "application/json")];
    let html_headers = [("User-Agent", SEC_USER_AGENT), ("Accept", "text/html")];
    let mut text = String::new();

    // Strategy 1: index.json lists the filing's documents
    if let Some(index) = ctx
        .http
        .get_json(
            &format!("{}/index.json", base_url),
            "sec_edgar_fetch",
            &[],
            &headers,
        )
        .await
    {
        for name in candidate_documents(&index).into_iter().take(4) {
            let doc_url = format!("{}/{}", base_url, name);
            let Some(html) = ctx
                .http
                .get_html(&doc_url, "sec_edgar_fetch", &html_headers)
                .await
            else {
                continue;
            };
            if html.len() <= 500 {
                continue;
            }
            let candidate = html_to_text(&html);
            let lower = candidate.to_lowercase();
            let has_financial_words = ["revenue", "income", "earnings", "operating", "quarter", "fiscal"]
                .iter()
                .any(|w| lower.contains(w));
            if candidate.len() > 1000 && has_financial_words {
                text = candidate;
                break;
            }
            if candidate.len() > 5000 {
                text = candidate;
                break;
            }
        }
    }

    // Strategy 2: scrape the index page for /Archives/ document links
    if text.is_empty() {
        if let Some(html) = ctx
            .http
            .get_html(filing_url, "sec_edgar_fetch", &html_headers)
            .await
        {
            for cap in ARCHIVE_LINK_RE.captures_iter(&html).take(3) {
                let doc_url = format!("https://www.sec.gov{}", &cap[1]);
                if let Some(doc_html) = ctx
                    .http
                    .get_html(&doc_url, "sec_edgar_fetch", &html_headers)
                    .await
                {
                    if doc_html.len() > 500 {
                        let candidate = html_to_text(&doc_html);
                        if candidate.len() > 200 {
                            text = candidate;
                            break;
                        }
                    }
                }
            }
        }
    }

    if !text.is_empty() {
        cache_write(&cache_dir, filing_url, &text);
    }

    text
}

/// Find the window of filing text most relevant to the claim. Exact number
/// occurrences dominate; financial key terms break ties.
pub fn extract_relevant_snippet(filing_text: &str, claim_text: &str, window: usize) -> String {
    if filing_text.is_empty() {
        return String::new();
    }

    let claim_nums: HashSet<String> = DECIMAL_RE
        .find_iter(claim_text)
        .map(|m| m.as_str().to_string())
        .collect();
    let claim_lower = claim_text.to_lowercase();
    let claim_words: HashSet<&str> = claim_lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| ".,!?;:\"'()[]$%".contains(c)))
        .collect();
    let key_terms: Vec<&'static str> = FINANCIAL_KEY_TERMS
        .iter()
        .filter(|t| claim_words.contains(**t))
        .copied()
        .collect();

    let text_lower = filing_text.to_lowercase();
    let bytes_len = filing_text.len();
    let step = 200;
    let mut best_pos = 0;
    let mut best_score = 0i32;

    let mut pos = 0;
    while pos < bytes_len.saturating_sub(window).max(1) {
        let end = (pos + window).min(bytes_len);
        let chunk = slice_at_char_boundaries(&text_lower, pos, end);
        let mut score = 0;
        for num in &claim_nums {
            if chunk.contains(num.as_str()) {
                score += 15;
            }
        }
        for term in &key_terms {
            if chunk.contains(term) {
                score += 3;
            }
        }
        if score > best_score {
            best_score = score;
            best_pos = pos;
        }
        pos += step;
        if bytes_len <= window {
            break;
        }
    }

    let end = (best_pos + window).min(bytes_len);
    slice_at_char_boundaries(filing_text, best_pos, end)
        .trim()
        .to_string()
}

/// Byte-range slice snapped inward to char boundaries
fn slice_at_char_boundaries(text: &str, mut start: usize, mut end: usize) -> &str {
    while start < text.len() && !text.is_char_boundary(start) {
        start += 1;
    }
    while end > start && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[start..end.max(start)]
}

/// EDGAR date range from claim/source temporal context: anchor year ±1,
/// falling back to a wide recent window.
pub fn compute_date_range(claim_date: &str, upload_date: &str) -> (String, String) {
    let mut anchor_year: Option<i32> = None;
    if claim_date.len() == 4 && claim_date.chars().all(|c| c.is_ascii_digit()) {
        anchor_year = claim_date.parse().ok();
    } else if upload_date.len() >= 4 {
        anchor_year = upload_date[..4].parse().ok();
    }

    if let Some(year) = anchor_year {
        if (1990..=2030).contains(&year) {
            return (
                format!("{}-01-01", year - 1),
                format!("{}-12-31", year + 1),
            );
        }
    }

    ("2018-01-01".to_string(), "2026-12-31".to_string())
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    let mut query = build_search_query(claim_text, 6);
    if query.is_empty() {
        return vec![];
    }

    // Entity injection: prepend the company name when not already present
    if !ctx.source_entity.is_empty()
        && !query.to_lowercase().contains(&ctx.source_entity.to_lowercase())
    {
        query = format!("{} {}", ctx.source_entity, query);
    }

    let (startdt, enddt) = compute_date_range(&ctx.claim_date, &ctx.upload_date);

    let Some(data) = ctx
        .http
        .get_json(
            SEARCH_URL,
            "sec_edgar",
            &[
                ("q", query.as_str()),
                ("dateRange", "custom"),
                ("startdt", startdt.as_str()),
                ("enddt", enddt.as_str()),
            ],
            &[("User-Agent", SEC_USER_AGENT), ("Accept", "application/json")],
        )
        .await
    else {
        return vec![];
    };

    let hits = data["hits"]["hits"].as_array().cloned().unwrap_or_default();
    let mut results = Vec::new();

    for hit in hits.iter().take(max_results) {
        let src = &hit["_source"];
        let file_date = src["file_date"].as_str().unwrap_or("");
        let mut form = src["form"].as_str().unwrap_or("").to_string();
        if form.is_empty() {
            if let Some(root) = src["root_forms"].as_array().and_then(|f| f.first()) {
                form = root.as_str().unwrap_or("").to_string();
            }
        }
        let period = src["period_ending"].as_str().unwrap_or("");

        let entity_name = src["display_names"]
            .as_array()
            .and_then(|names| names.first())
            .and_then(|n| n.as_str())
            .map(|n| n.split("(CIK").next().unwrap_or(n).trim().to_string())
            .unwrap_or_default();

        let adsh = src["adsh"].as_str().unwrap_or("");
        let cik = src["ciks"]
            .as_array()
            .and_then(|c| c.first())
            .and_then(|c| c.as_str())
            .unwrap_or("");

        let url = if !adsh.is_empty() && !cik.is_empty() {
            format!(
                "https://www.sec.gov/Archives/edgar/data/{}/{}/",
                cik,
                adsh.replace('-', "")
            )
        } else if !adsh.is_empty() {
            format!(
                "https://www.sec.gov/cgi-bin/browse-edgar?action=getcompany&accession={}",
                adsh
            )
        } else {
            String::new()
        };

        let title = if entity_name.is_empty() {
            form.clone()
        } else {
            format!("{} - {}", entity_name, form)
        };

        let mut meta_snippet = String::new();
        if !file_date.is_empty() {
            meta_snippet.push_str(&format!("Filed: {}", file_date));
        }
        if !period.is_empty() {
            meta_snippet.push_str(&format!(" | Period: {}", period));
        }

        if !url.is_empty() && !title.is_empty() {
            results.push(EvidenceResult {
                url,
                title: title.chars().take(200).collect(),
                source_name: "sec_edgar",
                evidence_type: "filing",
                snippet: meta_snippet.chars().take(200).collect(),
                evidence_date: file_date.chars().take(4).collect(),
            });
        }
    }

    // Enrich the top two filings with a scored text window (rate limits and
    // time budget cap the rest)
    let mut seen: HashSet<String> = HashSet::new();
    for i in 0..results.len().min(2) {
        let filing_url = results[i].url.clone();
        if !seen.insert(filing_url.clone()) {
            continue;
        }
        let filing_text = fetch_filing_text(&filing_url, ctx).await;
        if filing_text.len() > 200 {
            let snippet = extract_relevant_snippet(&filing_text, claim_text, SNIPPET_WINDOW);
            if snippet.len() > 50 {
                results[i].snippet = snippet.chars().take(4000).collect();
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_injection_from_known_alias() {
        assert_eq!(infer_source_entity("Alphabet Q4 Earnings Call", ""), "Alphabet");
        assert_eq!(infer_source_entity("GOOG earnings recap", ""), "Alphabet");
        assert_eq!(infer_source_entity("Tesla delivery numbers", ""), "Tesla");
    }

    #[test]
    fn entity_fallback_skips_stop_starts() {
        assert_eq!(
            infer_source_entity("The Quarterly Review of Nvidia", ""),
            "Nvidia"
        );
        assert_eq!(infer_source_entity("", ""), "");
    }

    #[test]
    fn date_range_prefers_claim_year() {
        assert_eq!(
            compute_date_range("2022", "20250204"),
            ("2021-01-01".to_string(), "2023-12-31".to_string())
        );
        assert_eq!(
            compute_date_range("", "20250204"),
            ("2024-01-01".to_string(), "2026-12-31".to_string())
        );
        assert_eq!(
            compute_date_range("", ""),
            ("2018-01-01".to_string(), "2026-12-31".to_string())
        );
    }

    #[test]
    fn candidate_docs_filter_xbrl_and_prefer_exhibits() {
        let index = serde_json::json!({
            "directory": {"item": [
                {"name": "R4.htm", "size": 90000},
                {"name": "main-10k.htm", "size": 50000},
                {"name": "ex99-press.htm", "size": 8000},
                {"name": "filing-index.htm", "size": 2000},
            ]}
        });
        let docs = candidate_documents(&index);
        assert_eq!(docs[0], "ex99-press.htm");
        assert!(docs.contains(&"main-10k.htm".to_string()));
        assert!(!docs.iter().any(|d| d == "R4.htm"));
        assert!(!docs.iter().any(|d| d.contains("index")));
    }

    #[test]
    fn snippet_window_finds_number_dense_region() {
        let filler = "lorem ipsum dolor sit amet ".repeat(400);
        let relevant =
            "Total revenue was 113.8 billion with operating margin of 31.6 percent this quarter. ";
        let filing = format!("{}{}{}", filler, relevant, filler);
        let snippet = extract_relevant_snippet(
            &filing,
            "Revenue grew to 113.8 billion with margin of 31.6 percent",
            4000,
        );
        assert!(snippet.contains("113.8"));
        assert!(snippet.contains("31.6"));
    }

    #[test]
    fn html_to_text_strips_scripts() {
        let html = "<html><head><title>x</title><script>var a=1;</script></head>\
                    <body><p>Revenue was 113.8 billion.</p><style>.a{}</style></body></html>";
        let text = html_to_text(html);
        assert!(text.contains("Revenue was 113.8 billion."));
        assert!(!text.contains("var a=1"));
    }
}
