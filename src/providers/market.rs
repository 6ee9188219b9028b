//! Market data: verify financial claims against Yahoo Finance quote data.
//!
//! Resolves a ticker from a company-name table or an explicit symbol in the
//! claim, fetches structured metrics, and encodes each metric both as a
//! human-readable string and a raw-number list so the scorer's exact-number
//! rule can fire.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::{EvidenceResult, SearchContext};

const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// Company name → ticker. Names are lowercase; longest-match wins.
pub static TICKER_MAP: &[(&str, &str)] = &[
    // Big tech
    ("alphabet", "GOOG"),
    ("google", "GOOG"),
    ("goog", "GOOG"),
    ("googl", "GOOG"),
    ("meta", "META"),
    ("facebook", "META"),
    ("amazon", "AMZN"),
    ("amzn", "AMZN"),
    ("microsoft", "MSFT"),
    ("msft", "MSFT"),
    ("apple", "AAPL"),
    ("aapl", "AAPL"),
    ("nvidia", "NVDA"),
    ("nvda", "NVDA"),
    ("tesla", "TSLA"),
    ("tsla", "TSLA"),
    ("netflix", "NFLX"),
    ("nflx", "NFLX"),
    // Finance
    ("jpmorgan", "JPM"),
    ("jp morgan", "JPM"),
    ("jpm", "JPM"),
    ("goldman sachs", "GS"),
    ("goldman", "GS"),
    ("blackrock", "BLK"),
    ("black rock", "BLK"),
    ("berkshire", "BRK-B"),
    ("berkshire hathaway", "BRK-B"),
    ("morgan stanley", "MS"),
    ("bank of america", "BAC"),
    ("wells fargo", "WFC"),
    ("citigroup", "C"),
    ("citi", "C"),
    // Other major
    ("disney", "DIS"),
    ("walt disney", "DIS"),
    ("salesforce", "CRM"),
    ("intel", "INTC"),
    ("intc", "INTC"),
    ("amd", "AMD"),
    ("oracle", "ORCL"),
    ("ibm", "IBM"),
    ("spotify", "SPOT"),
    ("uber", "UBER"),
    ("airbnb", "ABNB"),
    ("coinbase", "COIN"),
    ("palantir", "PLTR"),
    ("snowflake", "SNOW"),
];

/// Common English words that look like tickers but aren't
static TICKER_BLACKLIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "THE", "AND", "FOR", "BUT", "NOT", "ARE", "WAS", "HAS", "ITS", "HIS", "HER", "THIS",
        "THAT", "WITH", "FROM", "CEO", "CFO", "COO", "CTO", "GDP", "SEC", "IPO", "ETF", "LLC",
        "INC", "USD", "USA", "API", "RAM", "DAY", "NEW", "ALL", "ONE", "TWO", "NOW", "SAY",
        "WAY", "MAY", "CAN", "HOW", "WHY", "WHO", "OUR", "OUT", "TOP", "BIG", "OLD", "SET",
        "RUN", "OWN", "PUT", "LET", "GOT", "GET", "SAW", "USE", "TRY", "ASK", "END",
    ]
    .into_iter()
    .collect()
});

static SYMBOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z]{2,5})\b").expect("valid regex"));

/// True when the claim mentions any company from the ticker table
pub fn has_company_mention(text_lower: &str) -> bool {
    TICKER_MAP.iter().any(|(name, _)| text_lower.contains(name))
}

/// Resolve a ticker: known company names first (longest first), then
/// explicit all-caps symbols validated against the table and blacklist.
pub fn extract_ticker(claim_text: &str) -> Option<&'static str> {
    let lower = claim_text.to_lowercase();

    let mut names: Vec<&(&str, &str)> = TICKER_MAP.iter().collect();
    names.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));
    for (name, ticker) in names {
        if lower.contains(name) {
            return Some(ticker);
        }
    }

    for cap in SYMBOL_RE.captures_iter(claim_text) {
        let candidate = cap.get(1).map(|m| m.as_str()).unwrap_or("");
        if TICKER_BLACKLIST.contains(candidate) {
            continue;
        }
        if let Some((_, ticker)) = TICKER_MAP.iter().find(|(_, t)| *t == candidate) {
            return Some(ticker);
        }
    }

    None
}

fn format_large(n: f64) -> String {
    let abs = n.abs();
    if abs >= 1e12 {
        format!("{:.2}T", n / 1e12)
    } else if abs >= 1e9 {
        format!("{:.2}B", n / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", n / 1e6)
    } else {
        format!("{:.2}", n)
    }
}

/// Human-readable metric lines plus a raw-number list for exact matching
fn format_market_snippet(q: &serde_json::Value) -> String {
    let mut parts: Vec<String> = Vec::new();

    let symbol = q["symbol"].as_str().unwrap_or("");
    let name = q["shortName"]
        .as_str()
        .or_else(|| q["longName"].as_str())
        .unwrap_or(symbol);
    if !name.is_empty() {
        parts.push(format!("{} ({})", name, symbol));
    }

    let metrics: &[(&str, &str, bool)] = &[
        // (label, field, is_percentage)
        ("Market Cap", "marketCap", false),
        ("EPS (TTM)", "epsTrailingTwelveMonths", false),
        ("P/E Ratio", "trailingPE", false),
        ("Forward P/E", "forwardPE", false),
        ("Current Price", "regularMarketPrice", false),
        ("52wk High", "fiftyTwoWeekHigh", false),
        ("52wk Low", "fiftyTwoWeekLow", false),
        ("Dividend Yield", "trailingAnnualDividendYield", true),
        ("Price/Book", "priceToBook", false),
        ("Avg Volume", "averageDailyVolume3Month", false),
    ];

    let mut raw_nums: Vec<String> = Vec::new();
    for (label, field, is_pct) in metrics {
        let Some(val) = q[*field].as_f64() else { continue };
        if *is_pct {
            parts.push(format!("{}: {:.1}%", label, val * 100.0));
        } else if val.abs() >= 1e6 {
            parts.push(format!("{}: ${}", label, format_large(val)));
        } else {
            parts.push(format!("{}: {:.2}", label, val));
        }

        if val != 0.0 {
            if val.abs() >= 1e9 {
                raw_nums.push(format!("{:.1}", val / 1e9));
            }
            if val.abs() >= 1e6 {
                raw_nums.push(format!("{:.1}", val / 1e6));
            }
            if val.abs() < 10_000.0 {
                raw_nums.push(format!("{:.2}", val));
            }
        }
    }

    if !raw_nums.is_empty() {
        raw_nums.truncate(10);
        parts.push(format!("Raw values: {}", raw_nums.join(" ")));
    }

    if let Some(exchange) = q["fullExchangeName"].as_str() {
        parts.push(format!("Exchange: {}", exchange));
    }

    parts.join(" | ")
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    let Some(ticker) = extract_ticker(claim_text) else {
        return vec![];
    };

    let Some(data) = ctx
        .http
        .get_json(QUOTE_URL, "yahoo_finance", &[("symbols", ticker)], &[])
        .await
    else {
        return vec![];
    };

    let Some(quote) = data["quoteResponse"]["result"]
        .as_array()
        .and_then(|r| r.first())
    else {
        return vec![];
    };
    if quote["symbol"].as_str().is_none() {
        return vec![];
    }

    let company_name = quote["shortName"]
        .as_str()
        .or_else(|| quote["longName"].as_str())
        .unwrap_or(ticker);
    let snippet = format_market_snippet(quote);

    let results = vec![EvidenceResult {
        url: format!("https://finance.yahoo.com/quote/{}", ticker),
        title: format!("{} ({}) - Market Data", company_name, ticker),
        source_name: "yahoo_finance",
        evidence_type: "dataset",
        snippet: snippet.chars().take(4000).collect(),
        evidence_date: String::new(),
    }];

    results.into_iter().take(max_results).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_company_names_longest_first() {
        assert_eq!(extract_ticker("Goldman Sachs beat estimates"), Some("GS"));
        assert_eq!(extract_ticker("jp morgan results"), Some("JPM"));
        assert_eq!(
            extract_ticker("Berkshire Hathaway annual meeting"),
            Some("BRK-B")
        );
    }

    #[test]
    fn resolves_explicit_symbols() {
        assert_eq!(extract_ticker("NVDA rose 4 percent today"), Some("NVDA"));
    }

    #[test]
    fn blacklist_filters_common_words() {
        assert_eq!(extract_ticker("THE CEO SAID GDP WAS UP"), None);
    }

    #[test]
    fn unknown_symbols_rejected() {
        assert_eq!(extract_ticker("ZZZZ is not a real company"), None);
    }

    #[test]
    fn snippet_carries_raw_numbers() {
        let q = serde_json::json!({
            "symbol": "AAPL",
            "shortName": "Apple Inc.",
            "marketCap": 3_450_000_000_000_f64,
            "regularMarketPrice": 228.41,
        });
        let s = format_market_snippet(&q);
        assert!(s.contains("Apple Inc. (AAPL)"));
        assert!(s.contains("Raw values:"));
        assert!(s.contains("228.41"));
    }
}
