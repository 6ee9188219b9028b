//! Deterministic claim extraction from transcript segments.
//!
//! No LLM involved; rule-based heuristics only:
//!   1. Build a stitched text window across adjacent segments for context.
//!   2. Split into sentences at punctuation boundaries.
//!   3. Keep sentences anchored to the center segment by word overlap.
//!   4. Filter: length, dangling conjunctions, claim signals, subject anchor,
//!      transcript boilerplate.
//!   5. Classify confidence language and topic category.
//!   6. Deduplicate by exact hash, then by normalised text similarity.

use std::collections::HashSet;

use crate::categories::{classify_category, GENERAL};
use crate::config::{
    Config, ASSERTION_VERBS, BOILERPLATE_PATTERNS, DANGLING_STARTS, DEFINITIVE_WORDS, HEDGE_WORDS,
    SUBJECT_PRONOUNS,
};
use crate::error::{Result, VeridexError};
use crate::models::{new_id, now_rfc3339, Claim, Segment};
use crate::paths::DataPaths;
use crate::store::Store;
use crate::textutil::{
    claim_hash, claim_hash_global, extract_claim_year, normalise, split_sentences, CAPITALIZED_RE,
    DATE_RE, NUM_RE, PROPER_NOUN_RE,
};

const STITCH_BACKWARD: usize = 1;
const STITCH_FORWARD: usize = 2;

/// Build a text window around segment `center` by merging adjacent segments.
/// Returns (stitched text, ts_start, ts_end).
fn stitch_window(segments: &[Segment], center: usize) -> (String, f64, f64) {
    let lo = center.saturating_sub(STITCH_BACKWARD);
    let hi = (center + STITCH_FORWARD).min(segments.len() - 1);

    let text = segments[lo..=hi]
        .iter()
        .map(|s| s.text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    (text, segments[lo].start, segments[hi].end)
}

/// Split the stitched window into sentences and keep those sharing enough
/// words with the center segment. Timestamps are approximated by evenly
/// slicing the window duration across the split sentences.
fn sentences_from_window(
    window_text: &str,
    center_text: &str,
    ts_start: f64,
    ts_end: f64,
    max_claim_chars: usize,
) -> Vec<(String, f64, f64)> {
    let sentences = split_sentences(window_text);
    if sentences.is_empty() {
        let center = center_text.trim();
        if center.len() > 10 {
            return vec![(center.to_string(), ts_start, ts_end)];
        }
        return vec![];
    }

    let center_words: HashSet<String> = center_text
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect();
    let window_duration = ts_end - ts_start;
    let mut results = Vec::new();

    for (i, sent) in sentences.iter().enumerate() {
        let sent_words: HashSet<String> = sent
            .to_lowercase()
            .split_whitespace()
            .map(|w| w.to_string())
            .collect();
        let overlap = center_words.intersection(&sent_words).count();
        if overlap < 3 && center_words.len() > 5 {
            continue;
        }
        if overlap < 2 {
            continue;
        }

        let (s_start, s_end) = if sentences.len() == 1 {
            (ts_start, ts_end)
        } else {
            let slice_dur = window_duration / sentences.len() as f64;
            let s = ts_start + slice_dur * i as f64;
            (s, s + slice_dur)
        };

        let mut text = sent.clone();
        if text.len() > max_claim_chars {
            text = truncate_at_whitespace(&text, max_claim_chars);
        }

        results.push((text, round3(s_start), round3(s_end)));
    }

    results
}

/// Cut at the last whitespace before `max` bytes and append an ellipsis
fn truncate_at_whitespace(text: &str, max: usize) -> String {
    let mut cut = max;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let head = &text[..cut];
    let head = match head.rfind(char::is_whitespace) {
        Some(pos) => &head[..pos],
        None => head,
    };
    format!("{}...", head)
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

// ---------------------------------------------------------------------------
// Heuristic filters
// ---------------------------------------------------------------------------

fn has_number(s: &str) -> bool {
    NUM_RE.is_match(s)
}

fn has_date(s: &str) -> bool {
    DATE_RE.is_match(s)
}

fn has_named_entity(s: &str) -> bool {
    PROPER_NOUN_RE.is_match(s)
}

fn has_assertion_verb(s: &str) -> bool {
    s.to_lowercase()
        .split_whitespace()
        .any(|w| ASSERTION_VERBS.contains(w))
}

/// A subject-like token: pronoun, capitalised word, or number
fn has_subject(s: &str) -> bool {
    if s.to_lowercase()
        .split_whitespace()
        .any(|w| SUBJECT_PRONOUNS.contains(w))
    {
        return true;
    }
    if CAPITALIZED_RE.is_match(s) {
        return true;
    }
    has_number(s)
}

fn starts_with_conjunction(s: &str) -> bool {
    s.trim()
        .split_whitespace()
        .next()
        .map(|w| {
            let w = w.to_lowercase();
            DANGLING_STARTS.contains(w.trim_end_matches(','))
        })
        .unwrap_or(false)
}

/// A checkable, self-contained claim has at least one claim signal and a
/// subject anchor
fn is_candidate(s: &str) -> bool {
    let has_signal = has_number(s) || has_date(s) || has_named_entity(s) || has_assertion_verb(s);
    has_signal && has_subject(s)
}

/// Two or more filler phrases mark transcript boilerplate
fn is_boilerplate(s: &str) -> bool {
    let lower = s.to_lowercase();
    BOILERPLATE_PATTERNS
        .iter()
        .filter(|p| lower.contains(*p))
        .count()
        >= 2
}

fn collect_signals(s: &str) -> Vec<&'static str> {
    let mut signals = Vec::new();
    if has_number(s) {
        signals.push("number");
    }
    if has_date(s) {
        signals.push("date");
    }
    if has_named_entity(s) {
        signals.push("named_entity");
    }
    if has_assertion_verb(s) {
        signals.push("assertion_verb");
    }
    if has_subject(s) {
        signals.push("has_subject");
    }
    signals
}

/// hedged / definitive / unknown, with the both-or-neither tie → unknown
fn classify_confidence(s: &str) -> &'static str {
    let words: HashSet<String> = s
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect();
    let has_hedge = words.iter().any(|w| HEDGE_WORDS.contains(w.as_str()));
    let has_definitive = words.iter().any(|w| DEFINITIVE_WORDS.contains(w.as_str()));
    match (has_hedge, has_definitive) {
        (true, false) => "hedged",
        (false, true) => "definitive",
        _ => "unknown",
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Extract candidate claims from a source's segment sequence
pub fn extract_claims_from_segments(
    segments: &[Segment],
    source_id: &str,
    config: &Config,
) -> Vec<Claim> {
    let mut raw: Vec<Claim> = Vec::new();
    let mut seen_hashes: HashSet<String> = HashSet::new();

    for (idx, seg) in segments.iter().enumerate() {
        let (window_text, win_start, win_end) = stitch_window(segments, idx);
        let candidates = sentences_from_window(
            &window_text,
            &seg.text,
            win_start,
            win_end,
            config.extraction.max_claim_chars,
        );

        for (sent, ts_start, ts_end) in candidates {
            if sent.split_whitespace().count() < config.extraction.min_claim_words
                || sent.len() < config.extraction.min_claim_chars
            {
                continue;
            }
            if starts_with_conjunction(&sent) {
                continue;
            }
            if !is_candidate(&sent) {
                continue;
            }
            if is_boilerplate(&sent) {
                continue;
            }

            let chash = claim_hash(source_id, &sent);
            if !seen_hashes.insert(chash.clone()) {
                continue;
            }

            let mut signals: Vec<String> =
                collect_signals(&sent).into_iter().map(String::from).collect();
            let conf = classify_confidence(&sent);
            if conf != "unknown" {
                signals.push(format!("confidence:{}", conf));
            }
            let category = classify_category(&sent);
            if category != GENERAL {
                signals.push(format!("category:{}", category));
            }

            raw.push(Claim {
                id: new_id(),
                source_id: source_id.to_string(),
                claim_hash_global: claim_hash_global(&sent),
                claim_hash: chash,
                claim_date: extract_claim_year(&sent),
                ts_start,
                ts_end,
                speaker: None,
                confidence_language: conf.to_string(),
                status: "unknown".to_string(),
                category: category.to_string(),
                signals: signals.join("|"),
                status_auto: "unknown".to_string(),
                auto_confidence: 0.0,
                status_human: None,
                created_at: now_rfc3339(),
                updated_at: now_rfc3339(),
                text: sent,
            });
        }
    }

    deduplicate(raw, config.extraction.dedup_threshold)
}

/// Remove near-duplicate claims by normalised text similarity
fn deduplicate(claims: Vec<Claim>, threshold: f64) -> Vec<Claim> {
    let mut kept: Vec<Claim> = Vec::new();
    let mut seen_normalised: Vec<String> = Vec::new();

    for c in claims {
        let norm = normalise(&c.text);
        let is_dup = seen_normalised
            .iter()
            .any(|prev| strsim::normalized_levenshtein(&norm, prev) >= threshold);
        if !is_dup {
            seen_normalised.push(norm);
            kept.push(c);
        }
    }
    kept
}

/// Full pipeline: load the transcript blob, extract, replace the source's
/// claims in the store, and write claims.json to the export directory.
pub fn extract_for_source(
    store: &mut Store,
    paths: &DataPaths,
    config: &Config,
    source_id: &str,
) -> Result<Vec<Claim>> {
    let tmeta = store
        .get_transcript(source_id)?
        .ok_or_else(|| VeridexError::Validation {
            message: format!(
                "No transcript found for source '{}'. Run `veridex transcribe` first.",
                source_id
            ),
        })?;

    let segments = crate::segments::read_transcript(std::path::Path::new(&tmeta.transcript_path))?;
    let claims = extract_claims_from_segments(&segments, source_id, config);

    // Clear previous claims so re-running with tuned rules stays idempotent
    store.delete_claims_for_source(source_id)?;
    if !claims.is_empty() {
        store.insert_claims(&claims)?;
    }

    crate::export::write_claims_json(paths, source_id, &claims)?;
    tracing::info!(source_id, count = claims.len(), "claims extracted");

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> Segment {
        Segment {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn stitches_sentence_split_across_segments() {
        let segments = vec![
            seg(0.0, 5.0, "The European Central Bank"),
            seg(
                5.0,
                12.0,
                "announced it will maintain current interest rates at 4.5 percent through the first quarter.",
            ),
        ];
        let claims = extract_claims_from_segments(&segments, "src1", &Config::default());
        assert!(!claims.is_empty());
        let c = claims
            .iter()
            .find(|c| c.text.contains("European Central Bank") && c.text.contains("4.5 percent"))
            .expect("stitched claim present");
        assert!((c.ts_start - 0.0).abs() < 1e-9);
        assert!((c.ts_end - 12.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_dangling_conjunction_start() {
        let segments = vec![seg(
            0.0,
            6.0,
            "and the data shows growth of 3 percent across all regions this year",
        )];
        let claims = extract_claims_from_segments(&segments, "src1", &Config::default());
        assert!(claims
            .iter()
            .all(|c| !c.text.to_lowercase().starts_with("and")));
    }

    #[test]
    fn requires_signal_and_subject() {
        // No digits, dates, entities, or assertion verbs
        let segments = vec![seg(0.0, 6.0, "talking generally about nothing in particular today okay")];
        let claims = extract_claims_from_segments(&segments, "src1", &Config::default());
        assert!(claims.is_empty());
    }

    #[test]
    fn boilerplate_rejected() {
        let segments = vec![seg(
            0.0,
            8.0,
            "Make sure you subscribe and check out the link in the description for 20 percent off.",
        )];
        let claims = extract_claims_from_segments(&segments, "src1", &Config::default());
        assert!(claims.is_empty());
    }

    #[test]
    fn near_duplicates_collapse() {
        let text = "The company reported revenue of 113.8 billion dollars for the quarter.";
        let segments = vec![seg(0.0, 5.0, text), seg(100.0, 105.0, text)];
        let claims = extract_claims_from_segments(&segments, "src1", &Config::default());
        assert_eq!(claims.len(), 1);
    }

    #[test]
    fn long_claims_truncated_with_ellipsis() {
        let long = format!(
            "The Federal Reserve reported that {} inflation remained elevated at 4.2 percent.",
            "consumer spending across durable goods categories and housing services ".repeat(4)
        );
        let segments = vec![seg(0.0, 30.0, &long)];
        let claims = extract_claims_from_segments(&segments, "src1", &Config::default());
        for c in &claims {
            assert!(c.text.len() <= 243); // 240 cut + "..."
        }
    }

    #[test]
    fn hashes_are_recomputable() {
        let segments = vec![seg(
            0.0,
            6.0,
            "Apple reported revenue of 89.5 billion dollars in the fourth quarter.",
        )];
        let claims = extract_claims_from_segments(&segments, "srcX", &Config::default());
        let c = &claims[0];
        assert_eq!(c.claim_hash, claim_hash("srcX", &c.text));
        assert_eq!(c.claim_hash_global, claim_hash_global(&c.text));
        assert_eq!(c.claim_hash.len(), 64);
    }

    #[test]
    fn confidence_classes() {
        assert_eq!(classify_confidence("this might possibly happen"), "hedged");
        assert_eq!(
            classify_confidence("the study definitely demonstrates the effect"),
            "definitive"
        );
        // both hedge and definitive words → unknown
        assert_eq!(classify_confidence("it is likely true"), "unknown");
    }
}
