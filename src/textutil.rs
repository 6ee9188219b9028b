//! Shared text machinery: normalisation, tokenising, number and entity
//! extraction, claim hashing. All regexes are compiled once at first use.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

pub static NUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Decimal numbers like "113.8", "403", "2.82"
pub static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));

/// Multi-word proper noun phrases like "Goldman Sachs", "Federal Reserve"
pub static PROPER_NOUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b").expect("valid regex"));

/// Any capitalised word of 3+ letters
pub static CAPITALIZED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]{2,}\b").expect("valid regex"));

/// Date-like tokens: 12/31/2024, 2024, "January 15"
pub static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}|(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2})\b",
    )
    .expect("valid regex")
});

/// Plausible calendar year
pub static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid regex"));

/// Magnitude-suffixed amounts like "5.5 billion"
static MAGNITUDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(million|billion|trillion)").expect("valid regex")
});

/// Lower-case, strip ASCII punctuation, collapse whitespace. Idempotent.
pub fn normalise(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalised token set
pub fn tokenize(text: &str) -> HashSet<String> {
    normalise(text)
        .split_whitespace()
        .map(|s| s.to_string())
        .collect()
}

/// Adjacent-word pairs over normalised tokens
pub fn bigrams(text: &str) -> HashSet<String> {
    let norm = normalise(text);
    let words: Vec<&str> = norm.split_whitespace().collect();
    words
        .windows(2)
        .map(|w| format!("{} {}", w[0], w[1]))
        .collect()
}

/// SHA-256 hex digest of a string
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Same-source claim hash: SHA256(source_id || normalised text)
pub fn claim_hash(source_id: &str, text: &str) -> String {
    sha256_hex(&format!("{}||{}", source_id, normalise(text)))
}

/// Cross-source claim hash: SHA256(normalised text)
pub fn claim_hash_global(text: &str) -> String {
    sha256_hex(&normalise(text))
}

/// Extract significant decimal numbers from claim text.
/// Filters out trivially short numbers that match too loosely.
pub fn claim_numbers(text: &str) -> HashSet<String> {
    DECIMAL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|n| n.len() >= 2 || n.parse::<f64>().map(|v| v >= 10.0).unwrap_or(false))
        .collect()
}

/// Claim numbers plus unit-expanded variants, for fingerprinting.
/// "5.5 billion" adds "5500" (millions); "14 trillion" adds "14000" and
/// "14000000"; "X million" adds "X".
pub fn claim_numbers_expanded(text: &str) -> HashSet<String> {
    let mut nums = claim_numbers(text);
    for cap in MAGNITUDE_RE.captures_iter(text) {
        let value: f64 = match cap[1].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        match cap[2].to_lowercase().as_str() {
            "million" => {
                nums.insert(format_scaled(value));
            }
            "billion" => {
                nums.insert(format_scaled(value * 1_000.0));
            }
            "trillion" => {
                nums.insert(format_scaled(value * 1_000.0));
                nums.insert(format_scaled(value * 1_000_000.0));
            }
            _ => {}
        }
    }
    nums
}

fn format_scaled(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{}", v)
    }
}

/// First plausible year mentioned in the text, if any
pub fn extract_claim_year(text: &str) -> String {
    YEAR_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Split text at sentence boundaries (punctuation followed by whitespace),
/// dropping fragments of 10 chars or less. Works on transcription text.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.trim().chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            if let Some(next) = chars.peek() {
                if next.is_whitespace() {
                    let trimmed = current.trim();
                    if trimmed.len() > 10 {
                        sentences.push(trimmed.to_string());
                    }
                    current.clear();
                    // consume the run of whitespace
                    while chars.peek().is_some_and(|n| n.is_whitespace()) {
                        chars.next();
                    }
                }
            }
        }
    }
    let trimmed = current.trim();
    if trimmed.len() > 10 {
        sentences.push(trimmed.to_string());
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalise_is_idempotent() {
        let s = "Revenue grew 12 percent, year-over-year!";
        let once = normalise(s);
        assert_eq!(normalise(&once), once);
        assert_eq!(once, "revenue grew 12 percent yearoveryear");
    }

    #[test]
    fn hashes_are_64_hex() {
        let h = claim_hash("src1", "The Fed held rates at 4.5 percent.");
        let g = claim_hash_global("The Fed held rates at 4.5 percent.");
        assert_eq!(h.len(), 64);
        assert_eq!(g.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(h, g);
    }

    #[test]
    fn global_hash_ignores_punctuation_and_case() {
        assert_eq!(
            claim_hash_global("Revenue grew 12 percent year over year."),
            claim_hash_global("revenue grew 12 percent year over year")
        );
    }

    #[test]
    fn claim_numbers_filters_loose_singles() {
        let nums = claim_numbers("Growth of 3 percent beat 113.8 million by 12");
        assert!(nums.contains("113.8"));
        assert!(nums.contains("12"));
        assert!(!nums.contains("3"));
    }

    #[test]
    fn unit_expansion() {
        let nums = claim_numbers_expanded("The deal is worth $5.5 billion this year");
        assert!(nums.contains("5500"));
        let nums = claim_numbers_expanded("debt passed $14 trillion");
        assert!(nums.contains("14000"));
        assert!(nums.contains("14000000"));
        let nums = claim_numbers_expanded("a $350 million grant");
        assert!(nums.contains("350"));
    }

    #[test]
    fn sentence_split_keeps_punctuation() {
        let parts = split_sentences("The ECB held rates. Markets rallied hard! Why though?");
        assert_eq!(parts.len(), 3);
        assert!(parts[0].ends_with('.'));
        assert!(parts[1].ends_with('!'));
    }

    #[test]
    fn sentence_split_drops_short_fragments() {
        let parts = split_sentences("Ok. The unemployment rate fell to 3.9 percent in March.");
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn year_extraction_first_match() {
        assert_eq!(extract_claim_year("In 2022 revenue beat the 2019 peak"), "2022");
        assert_eq!(extract_claim_year("no year here"), "");
    }
}
