//! Evidence scoring engine: how well does an evidence result match a claim.
//!
//! All scoring is deterministic and explainable: token overlap, named-entity
//! and number matches, category relevance, evidence-type boosts, bigram
//! keyphrases, and a penalty for generic titles. Every rule that fires is
//! recorded as a named signal.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::categories::relevance_terms;
use crate::textutil::{bigrams, claim_numbers, tokenize, DECIMAL_RE, NUM_RE, PROPER_NOUN_RE};

static GENERIC_TITLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "introduction",
        "abstract",
        "summary",
        "chapter",
        "section",
        "appendix",
        "editorial",
        "letter",
        "comment",
        "reply",
        "correction",
        "erratum",
        "podcast",
        "episode",
        "transcript",
        "interview",
    ]
    .into_iter()
    .collect()
});

/// Evidence types whose provenance is official
pub fn is_primary_type(evidence_type: &str) -> bool {
    matches!(
        evidence_type,
        "paper" | "filing" | "gov" | "dataset" | "factcheck"
    )
}

/// Score how well an evidence result matches a claim.
/// Returns (score 0-100, pipe-delimited signals).
pub fn score_evidence(
    claim_text: &str,
    claim_category: &str,
    evidence_title: &str,
    evidence_snippet: &str,
    evidence_type: &str,
) -> (i32, String) {
    let mut signals: Vec<String> = Vec::new();
    let mut score: i32 = 0;

    let claim_tokens = tokenize(claim_text);
    let mut evidence_tokens = tokenize(evidence_title);
    evidence_tokens.extend(tokenize(evidence_snippet));

    // 1. Token overlap (0-30)
    if !claim_tokens.is_empty() && !evidence_tokens.is_empty() {
        let overlap = claim_tokens.intersection(&evidence_tokens).count();
        let ratio = overlap as f64 / claim_tokens.len() as f64;
        let token_score = ((ratio * 60.0) as i32).min(30);
        if token_score > 0 {
            score += token_score;
            signals.push(format!("token_overlap:{}", overlap));
        }
    }

    let combined = format!("{} {}", evidence_title, evidence_snippet);
    let combined_lower = combined.to_lowercase();

    // 2. Named entity match (0-15)
    let claim_entities: Vec<&str> = PROPER_NOUN_RE
        .find_iter(claim_text)
        .map(|m| m.as_str())
        .collect();
    if !claim_entities.is_empty() {
        let matched: Vec<&str> = claim_entities
            .iter()
            .filter(|e| combined_lower.contains(&e.to_lowercase()))
            .copied()
            .collect();
        if !matched.is_empty() {
            score += (matched.len() as i32 * 5).min(15);
            signals.push(format!("entity_match:{}", matched[..matched.len().min(3)].join(",")));
        }
    }

    // 3. Small-integer match (0-10)
    let claim_nums: HashSet<&str> = NUM_RE.find_iter(claim_text).map(|m| m.as_str()).collect();
    let evidence_nums: HashSet<&str> = NUM_RE.find_iter(&combined).map(|m| m.as_str()).collect();
    let matched_nums: Vec<&&str> = claim_nums.intersection(&evidence_nums).collect();
    if !matched_nums.is_empty() {
        score += (matched_nums.len() as i32 * 5).min(10);
        let mut shown: Vec<String> = matched_nums.iter().map(|n| n.to_string()).collect();
        shown.sort();
        shown.truncate(3);
        signals.push(format!("number_match:{}", shown.join(",")));
    }

    // 3b. Exact financial-number match: big boost for enriched snippets
    if evidence_snippet.len() > 200 {
        let claim_financial = claim_numbers(claim_text);
        let snippet_financial: HashSet<String> = DECIMAL_RE
            .find_iter(evidence_snippet)
            .map(|m| m.as_str().to_string())
            .collect();
        let mut exact: Vec<&String> = claim_financial.intersection(&snippet_financial).collect();
        if !exact.is_empty() {
            score += (exact.len() as i32 * 8).min(20);
            exact.sort();
            let shown: Vec<&str> = exact.iter().take(4).map(|s| s.as_str()).collect();
            signals.push(format!("number_exact_match:{}", shown.join(",")));
        }
    }

    // 4. Category relevance (0-10)
    let cat_terms = relevance_terms(claim_category);
    if !cat_terms.is_empty() && !evidence_tokens.is_empty() {
        let cat_overlap = cat_terms
            .iter()
            .filter(|t| evidence_tokens.contains(**t))
            .count();
        if cat_overlap > 0 {
            score += (cat_overlap as i32 * 3).min(10);
            signals.push(format!("category_match:{}", claim_category));
        }
    }

    // 5. Evidence type boost (0-15)
    if is_primary_type(evidence_type) {
        score += 15;
        signals.push(format!("primary_source:{}", evidence_type));
    } else if evidence_type == "secondary" {
        score += 5;
        signals.push("secondary_source".to_string());
    }

    // 6. Keyphrase match: shared bigrams (0-10)
    let claim_bigrams = bigrams(claim_text);
    let evidence_bigrams = bigrams(&combined);
    let keyphrase_matches = claim_bigrams.intersection(&evidence_bigrams).count();
    if keyphrase_matches > 0 {
        score += (keyphrase_matches as i32 * 5).min(10);
        signals.push(format!("keyphrase_hit:{}", keyphrase_matches));
    }

    // 7. Generic title penalty (-10)
    let title_words: Vec<String> = evidence_title
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect();
    if title_words.len() < 5
        && title_words
            .iter()
            .any(|w| GENERIC_TITLES.contains(w.as_str()))
    {
        score = (score - 10).max(0);
        signals.push("generic_title_penalty".to_string());
    }

    (score.clamp(0, 100), signals.join("|"))
}

// ---------------------------------------------------------------------------
// Finance claim typing
// ---------------------------------------------------------------------------

static NUMERIC_KPI_TERMS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "revenue",
        "revenues",
        "income",
        "earnings",
        "margin",
        "margins",
        "billion",
        "million",
        "percent",
        "eps",
        "capex",
        "depreciation",
        "cash flow",
        "free cash flow",
        "operating income",
        "net income",
        "growth",
        "dividend",
        "repurchase",
        "backlog",
    ]
});

static GUIDANCE_TERMS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "expect",
        "expects",
        "expected",
        "outlook",
        "guidance",
        "forecast",
        "forecasts",
        "will",
        "anticipate",
        "anticipates",
        "anticipated",
        "forward-looking",
        "estimate",
        "estimates",
        "project",
        "projected",
        "plan",
        "plans",
        "intend",
        "intends",
    ]
});

/// Classify a finance claim as numeric_kpi, guidance, or other.
/// Only numeric_kpi claims are eligible for auto supported/partial;
/// guidance stays unknown, numbers or not.
pub fn classify_finance_claim(claim_text: &str) -> &'static str {
    let lower = claim_text.to_lowercase();
    let has_number = NUM_RE.is_match(&lower);

    if has_number && NUMERIC_KPI_TERMS.iter().any(|t| lower.contains(t)) {
        if GUIDANCE_TERMS.iter().any(|g| lower.contains(g)) {
            return "guidance";
        }
        return "numeric_kpi";
    }

    if GUIDANCE_TERMS.iter().any(|g| lower.contains(g)) {
        return "guidance";
    }

    "other"
}

// ---------------------------------------------------------------------------
// Auto-status guardrails
// ---------------------------------------------------------------------------

/// Determine the auto verification status from the best evidence result.
/// Returns (status_auto, auto_confidence).
///
/// Guardrails, in order:
///   - guidance finance claims never get auto-labeled
///   - score below 70 stays unknown
///   - supported needs score >= 85, a primary source, token overlap, and a
///     keyphrase or exact-number signal
///   - 70..85 is partial; >= 85 missing the extra signals is partial
///   - contradicted is never produced automatically
pub fn compute_auto_status(
    best_score: i32,
    best_evidence_type: &str,
    best_signals: &str,
    finance_claim_type: &str,
) -> (&'static str, f64) {
    let confidence = best_score as f64 / 100.0;

    if finance_claim_type == "guidance" {
        return ("unknown", confidence);
    }
    if best_score < 70 {
        return ("unknown", confidence);
    }

    let signal_set: Vec<&str> = best_signals.split('|').collect();
    let has_token_overlap = signal_set.iter().any(|s| s.starts_with("token_overlap"));
    let has_keyphrase = signal_set.iter().any(|s| s.starts_with("keyphrase_hit"));
    let has_exact_number = signal_set
        .iter()
        .any(|s| s.starts_with("number_exact_match"));
    let primary = is_primary_type(best_evidence_type);

    if best_score >= 85 && primary && has_token_overlap && (has_keyphrase || has_exact_number) {
        return ("supported", confidence);
    }
    if (70..85).contains(&best_score) {
        return ("partial", confidence);
    }
    if best_score >= 85 && !(primary && (has_keyphrase || has_exact_number)) {
        return ("partial", confidence);
    }

    ("unknown", confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_overlap_scores_high() {
        let (score, signals) = score_evidence(
            "Apple reported revenue of 113.8 billion dollars in the quarter",
            "finance",
            "Apple Inc quarterly report",
            "Apple reported revenue of 113.8 billion dollars in the quarter, with operating margin expanding.",
            "filing",
        );
        assert!(score >= 60, "score {} too low ({})", score, signals);
        assert!(signals.contains("token_overlap"));
        assert!(signals.contains("primary_source:filing"));
    }

    #[test]
    fn unrelated_evidence_scores_low() {
        let (score, _) = score_evidence(
            "Apple reported revenue of 113.8 billion dollars",
            "finance",
            "Migration patterns of arctic terns",
            "A longitudinal banding survey",
            "other",
        );
        assert!(score < 20);
    }

    #[test]
    fn exact_number_needs_long_snippet() {
        let short = "Revenue was 113.8 billion.";
        let (_, signals) = score_evidence(
            "Revenue grew to 113.8 billion dollars",
            "finance",
            "Report",
            short,
            "filing",
        );
        assert!(!signals.contains("number_exact_match"));

        let long = format!("{} {}", short, "padding text ".repeat(20));
        let (_, signals) = score_evidence(
            "Revenue grew to 113.8 billion dollars",
            "finance",
            "Report",
            &long,
            "filing",
        );
        assert!(signals.contains("number_exact_match"));
    }

    #[test]
    fn generic_short_title_penalised() {
        let (with_penalty, signals) = score_evidence(
            "The study found a correlation",
            "science",
            "Abstract",
            "",
            "paper",
        );
        assert!(signals.contains("generic_title_penalty"));
        let (without_penalty, _) = score_evidence(
            "The study found a correlation",
            "science",
            "A large cohort analysis of dietary fat and cardiovascular outcomes",
            "",
            "paper",
        );
        assert!(without_penalty >= with_penalty);
    }

    #[test]
    fn factcheck_counts_as_primary() {
        let (_, signals) = score_evidence(
            "Unemployment fell to 3.9 percent",
            "labor",
            "Fact Check by PolitiFact: True",
            "Claim: unemployment fell to 3.9 percent | Rating: True",
            "factcheck",
        );
        assert!(signals.contains("primary_source:factcheck"));
    }

    #[test]
    fn finance_typing() {
        assert_eq!(
            classify_finance_claim("Revenue grew 12 percent to 113.8 billion"),
            "numeric_kpi"
        );
        assert_eq!(
            classify_finance_claim("We expect revenue growth of 12 percent next year"),
            "guidance"
        );
        assert_eq!(
            classify_finance_claim("The outlook remains uncertain"),
            "guidance"
        );
        assert_eq!(classify_finance_claim("The weather was pleasant"), "other");
    }

    #[test]
    fn guardrail_supported_full_conditions() {
        let (status, conf) = compute_auto_status(
            88,
            "filing",
            "token_overlap:6|number_exact_match:113.8,31.6|primary_source:filing",
            "numeric_kpi",
        );
        assert_eq!(status, "supported");
        assert!((conf - 0.88).abs() < 1e-9);
    }

    #[test]
    fn guardrail_guidance_always_unknown() {
        let (status, conf) = compute_auto_status(
            95,
            "filing",
            "token_overlap:8|keyphrase_hit:3|primary_source:filing",
            "guidance",
        );
        assert_eq!(status, "unknown");
        assert!((conf - 0.95).abs() < 1e-9);
    }

    #[test]
    fn guardrail_low_score_unknown() {
        let (status, _) = compute_auto_status(42, "paper", "token_overlap:3", "");
        assert_eq!(status, "unknown");
    }

    #[test]
    fn guardrail_mid_range_partial() {
        let (status, _) = compute_auto_status(72, "secondary", "token_overlap:4", "");
        assert_eq!(status, "partial");
    }

    #[test]
    fn guardrail_high_score_without_extras_is_partial() {
        let (status, _) = compute_auto_status(90, "secondary", "token_overlap:9", "");
        assert_eq!(status, "partial");
    }

    #[test]
    fn guardrail_supported_requires_primary() {
        let (status, _) = compute_auto_status(
            90,
            "secondary",
            "token_overlap:9|keyphrase_hit:2",
            "",
        );
        assert_ne!(status, "supported");
    }

    #[test]
    fn guardrail_never_contradicted() {
        for score in [0, 50, 70, 85, 100] {
            for etype in ["paper", "filing", "secondary", "other"] {
                let (status, _) =
                    compute_auto_status(score, etype, "token_overlap:5|keyphrase_hit:1", "");
                assert_ne!(status, "contradicted");
            }
        }
    }
}
