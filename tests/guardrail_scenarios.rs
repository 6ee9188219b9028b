//! Guardrail contract tests: the auto-status rules the rest of the system
//! leans on.

use veridex::scoring::{classify_finance_claim, compute_auto_status, score_evidence};

#[test]
fn supported_filing_with_exact_numbers() {
    let (status, confidence) = compute_auto_status(
        88,
        "filing",
        "token_overlap:6|number_exact_match:113.8,31.6|primary_source:filing",
        "numeric_kpi",
    );
    assert_eq!(status, "supported");
    assert!((confidence - 0.88).abs() < 1e-9);
}

#[test]
fn guidance_claims_never_auto_labeled() {
    let (status, confidence) = compute_auto_status(
        95,
        "filing",
        "token_overlap:8|keyphrase_hit:3|primary_source:filing",
        "guidance",
    );
    assert_eq!(status, "unknown");
    assert!((confidence - 0.95).abs() < 1e-9);
}

#[test]
fn supported_requires_every_precondition() {
    // score just below the bar
    let (s, _) = compute_auto_status(84, "filing", "token_overlap:6|keyphrase_hit:2", "");
    assert_eq!(s, "partial");

    // non-primary evidence
    let (s, _) = compute_auto_status(90, "secondary", "token_overlap:6|keyphrase_hit:2", "");
    assert_ne!(s, "supported");

    // missing token overlap
    let (s, _) = compute_auto_status(90, "filing", "keyphrase_hit:2|primary_source:filing", "");
    assert_ne!(s, "supported");

    // missing both keyphrase and exact-number
    let (s, _) = compute_auto_status(90, "filing", "token_overlap:6|primary_source:filing", "");
    assert_ne!(s, "supported");
}

#[test]
fn mid_band_is_partial_and_low_band_unknown() {
    for score in 70..85 {
        let (s, c) = compute_auto_status(score, "other", "token_overlap:2", "");
        assert_eq!(s, "partial", "score {}", score);
        assert!((c - score as f64 / 100.0).abs() < 1e-9);
    }
    for score in [0, 10, 42, 69] {
        let (s, _) = compute_auto_status(score, "filing", "token_overlap:6|keyphrase_hit:2", "");
        assert_eq!(s, "unknown", "score {}", score);
    }
}

#[test]
fn contradicted_is_unreachable_automatically() {
    let types = ["paper", "filing", "gov", "dataset", "factcheck", "secondary", "other"];
    let signal_sets = [
        "",
        "token_overlap:9",
        "token_overlap:9|keyphrase_hit:3|number_exact_match:1.5|primary_source:filing",
    ];
    for score in (0..=100).step_by(5) {
        for etype in types {
            for signals in signal_sets {
                let (s, _) = compute_auto_status(score, etype, signals, "");
                assert!(
                    matches!(s, "supported" | "partial" | "unknown"),
                    "unexpected status {}",
                    s
                );
            }
        }
    }
}

#[test]
fn scorer_feeds_guardrail_supported_end_to_end() {
    let claim = "Alphabet reported revenue of 113.8 billion dollars with operating margin of 31.6 percent";
    let snippet = format!(
        "Revenues were 113.8 billion and operating margin reached 31.6 percent for the quarter. {}",
        "Supplemental detail on segment revenues and operating margin follows. ".repeat(4)
    );
    let (score, signals) = score_evidence(claim, "finance", "Alphabet Inc - 10-Q", &snippet, "filing");
    assert!(score >= 85, "expected a strong score, got {} ({})", score, signals);

    let finance_type = classify_finance_claim(claim);
    assert_eq!(finance_type, "numeric_kpi");

    let (status, _) = compute_auto_status(score, "filing", &signals, finance_type);
    assert_eq!(status, "supported");
}

#[test]
fn forward_looking_numbers_stay_guidance() {
    assert_eq!(
        classify_finance_claim("We expect revenue of 120 billion next quarter"),
        "guidance"
    );
    assert_eq!(
        classify_finance_claim("Full-year guidance calls for 8 percent growth"),
        "guidance"
    );
}
