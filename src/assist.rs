//! Assisted verification: auto-discover evidence for a source's claims.
//!
//! For each claim, in descending verifiability order: route to providers,
//! fan the searches out, score every result, keep the top suggestions, and
//! derive a guarded auto-status from the best one. Provider failures are
//! contained; an optional time budget stops new claims but lets the current
//! one finish.

use futures_util::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::categories::{classify_category_with_context, GENERAL};
use crate::config::Config;
use crate::error::{Result, VeridexError};
use crate::models::{new_id, now_rfc3339, Claim, EvidenceSuggestion};
use crate::providers::http::ProviderHttp;
use crate::providers::sec_edgar::infer_source_entity;
use crate::providers::{EvidenceResult, SearchContext};
use crate::router;
use crate::scoring::{classify_finance_claim, compute_auto_status, score_evidence};
use crate::store::Store;
use crate::textutil::{CAPITALIZED_RE, NUM_RE, PROPER_NOUN_RE, YEAR_RE};

/// Results requested from each provider per claim
const PER_PROVIDER_RESULTS: usize = 3;

static ACRONYM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{2,6}\b").expect("valid regex"));
static CURRENCY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[$€£¥]").expect("valid regex"));

static MEASURABLE_TERMS: &[&str] = &[
    "percent",
    "percentage",
    "rate",
    "billion",
    "million",
    "trillion",
    "increase",
    "increased",
    "decrease",
    "decreased",
    "grew",
    "growth",
    "fell",
    "rose",
    "doubled",
    "tripled",
    "average",
    "median",
    "total",
];

static OPINION_PHRASES: &[&str] = &[
    "i think",
    "i believe",
    "in my opinion",
    "i feel",
    "my view",
    "personally",
    "i guess",
];

/// How amenable a claim is to automated corroboration. Orders work only;
/// never decides outcomes.
pub fn verifiability_score(claim_text: &str) -> i32 {
    let lower = claim_text.to_lowercase();
    let mut score: i32 = 0;

    let digit_groups = NUM_RE.find_iter(claim_text).count() as i32;
    score += digit_groups * 10;

    let entities = PROPER_NOUN_RE.find_iter(claim_text).count() as i32;
    score += (entities * 10).min(20);

    let capitalized = CAPITALIZED_RE.find_iter(claim_text).count() as i32;
    score += (capitalized * 3).min(10);

    let acronyms = ACRONYM_RE
        .find_iter(claim_text)
        .filter(|m| m.as_str() != "I" && m.as_str() != "A")
        .count() as i32;
    score += (acronyms * 5).min(10);

    let measurable = MEASURABLE_TERMS.iter().filter(|t| lower.contains(*t)).count() as i32;
    score += (measurable * 5).min(15);

    if YEAR_RE.is_match(claim_text) {
        score += 10;
    }
    if CURRENCY_RE.is_match(claim_text) {
        score += 10;
    }
    if OPINION_PHRASES.iter().any(|p| lower.contains(p)) {
        score -= 15;
    }
    if digit_groups == 0 && entities == 0 {
        score -= 20;
    }

    score.clamp(0, 100)
}

/// Per-claim slice of an assist run
#[derive(Debug, Clone)]
pub struct ClaimReport {
    pub claim_id: String,
    pub text_excerpt: String,
    pub category: String,
    pub verifiability: i32,
    pub suggestions_found: usize,
    pub suggestions_stored: usize,
    pub status_auto: String,
    pub auto_confidence: f64,
    pub best_score: i32,
    pub finance_claim_type: String,
}

/// Aggregate outcome of an assist run
#[derive(Debug, Clone)]
pub struct AssistReport {
    pub source_id: String,
    pub source_entity: String,
    pub claims_total: usize,
    pub claims_processed: usize,
    pub claims_skipped_low_verifiability: usize,
    pub total_suggestions_found: usize,
    pub total_suggestions_stored: usize,
    pub auto_supported: usize,
    pub auto_partial: usize,
    pub auto_unknown: usize,
    /// Result counts per provider name
    pub provider_tallies: HashMap<&'static str, usize>,
    pub elapsed_seconds: f64,
    pub dry_run: bool,
    pub claim_reports: Vec<ClaimReport>,
}

struct ClaimOutcome {
    report: ClaimReport,
    suggestions: Vec<EvidenceSuggestion>,
    tallies: HashMap<&'static str, usize>,
}

async fn assist_claim(
    claim: &Claim,
    verifiability: i32,
    max_per_claim: usize,
    min_suggestion_score: i32,
    ctx: &SearchContext<'_>,
) -> ClaimOutcome {
    let finance_claim_type = if claim.category == "finance" {
        classify_finance_claim(&claim.text).to_string()
    } else {
        String::new()
    };

    // Route, then fan out; each provider's failure is its own problem
    let providers = router::route(&claim.text, &claim.category);
    let searches = providers
        .iter()
        .map(|p| p.search(&claim.text, PER_PROVIDER_RESULTS, ctx));
    let batches: Vec<Vec<EvidenceResult>> = join_all(searches).await;

    let mut tallies: HashMap<&'static str, usize> = HashMap::new();
    let mut all_results: Vec<EvidenceResult> = Vec::new();
    for (provider, batch) in providers.iter().zip(batches) {
        if !batch.is_empty() {
            *tallies.entry(provider.name()).or_insert(0) += batch.len();
        }
        all_results.extend(batch);
    }

    if all_results.is_empty() {
        return ClaimOutcome {
            report: ClaimReport {
                claim_id: claim.id.clone(),
                text_excerpt: claim.text.chars().take(80).collect(),
                category: claim.category.clone(),
                verifiability,
                suggestions_found: 0,
                suggestions_stored: 0,
                status_auto: "unknown".to_string(),
                auto_confidence: 0.0,
                best_score: 0,
                finance_claim_type,
            },
            suggestions: vec![],
            tallies,
        };
    }

    // Score every result, best first
    let mut scored: Vec<(i32, String, EvidenceResult)> = all_results
        .into_iter()
        .map(|r| {
            let (score, signals) = score_evidence(
                &claim.text,
                &claim.category,
                &r.title,
                &r.snippet,
                r.evidence_type,
            );
            (score, signals, r)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let suggestions_found = scored.len();
    let top = &scored[..scored.len().min(max_per_claim)];

    let suggestions: Vec<EvidenceSuggestion> = top
        .iter()
        .filter(|(score, _, _)| *score >= min_suggestion_score)
        .map(|(score, signals, r)| EvidenceSuggestion {
            id: new_id(),
            claim_id: claim.id.clone(),
            url: r.url.clone(),
            title: r.title.clone(),
            source_name: r.source_name.to_string(),
            evidence_type: r.evidence_type.to_string(),
            score: *score,
            signals: signals.clone(),
            snippet: r.snippet.chars().take(4000).collect(),
            created_at: now_rfc3339(),
        })
        .collect();

    let (best_score, best_signals, best_type) = top
        .first()
        .map(|(s, sig, r)| (*s, sig.as_str(), r.evidence_type))
        .unwrap_or((0, "", "other"));
    let (status_auto, auto_confidence) =
        compute_auto_status(best_score, best_type, best_signals, &finance_claim_type);

    ClaimOutcome {
        report: ClaimReport {
            claim_id: claim.id.clone(),
            text_excerpt: claim.text.chars().take(80).collect(),
            category: claim.category.clone(),
            verifiability,
            suggestions_found,
            suggestions_stored: suggestions.len(),
            status_auto: status_auto.to_string(),
            auto_confidence,
            best_score,
            finance_claim_type,
        },
        suggestions,
        tallies,
    }
}

/// Run assisted verification for every claim in a source
pub async fn assist_source(
    store: &mut Store,
    paths: &crate::paths::DataPaths,
    config: &Config,
    source_id: &str,
    max_per_claim: usize,
    budget_minutes: u64,
    dry_run: bool,
) -> Result<AssistReport> {
    let mut claims = store.get_claims_for_source(source_id)?;
    if claims.is_empty() {
        return Err(VeridexError::Validation {
            message: format!(
                "No claims found for source '{}'. Run `veridex claims` first.",
                source_id
            ),
        });
    }

    let source = store.get_source(source_id)?;
    let (source_entity, source_title, source_channel, upload_date) = source
        .map(|s| {
            (
                infer_source_entity(&s.title, &s.channel),
                s.title,
                s.channel,
                s.upload_date,
            )
        })
        .unwrap_or_default();

    // Recategorise claims stuck on `general` using source metadata
    for claim in claims.iter_mut() {
        if claim.category == GENERAL {
            let recat =
                classify_category_with_context(&claim.text, &source_title, &source_channel);
            if recat != GENERAL {
                tracing::debug!(claim_id = %claim.id, category = recat, "recategorised");
                if !dry_run {
                    store.update_claim_category(&claim.id, recat)?;
                }
                claim.category = recat.to_string();
            }
        }
    }

    // Suggestions are derived state; each run rebuilds them
    if !dry_run {
        store.delete_suggestions_for_source(source_id)?;
    }

    // Most verifiable claims first, so a budget spends itself well
    let mut ranked: Vec<(i32, Claim)> = claims
        .into_iter()
        .map(|c| (verifiability_score(&c.text), c))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let http = ProviderHttp::new(&config.runtime);
    let ctx = SearchContext {
        http: &http,
        paths,
        runtime: &config.runtime,
        source_entity: source_entity.clone(),
        claim_date: String::new(),
        upload_date,
    };

    let started = Instant::now();
    let deadline = (budget_minutes > 0).then(|| started + Duration::from_secs(budget_minutes * 60));

    let claims_total = ranked.len();
    let mut report = AssistReport {
        source_id: source_id.to_string(),
        source_entity,
        claims_total,
        claims_processed: 0,
        claims_skipped_low_verifiability: 0,
        total_suggestions_found: 0,
        total_suggestions_stored: 0,
        auto_supported: 0,
        auto_partial: 0,
        auto_unknown: 0,
        provider_tallies: HashMap::new(),
        elapsed_seconds: 0.0,
        dry_run,
        claim_reports: Vec::new(),
    };

    for (verifiability, claim) in ranked {
        if let Some(deadline) = deadline {
            if Instant::now() > deadline {
                tracing::info!(source_id, "assist budget elapsed, stopping");
                break;
            }
        }
        if verifiability < config.assist.min_verifiability {
            report.claims_skipped_low_verifiability += 1;
            continue;
        }

        let ctx = SearchContext {
            http: ctx.http,
            paths: ctx.paths,
            runtime: ctx.runtime,
            claim_date: claim.claim_date.clone(),
            source_entity: ctx.source_entity.clone(),
            upload_date: ctx.upload_date.clone(),
        };
        let outcome = assist_claim(
            &claim,
            verifiability,
            max_per_claim,
            config.assist.min_suggestion_score,
            &ctx,
        )
        .await;

        if !dry_run {
            if !outcome.suggestions.is_empty() {
                store.insert_suggestions(&outcome.suggestions)?;
            }
            if outcome.report.status_auto != "unknown" {
                store.update_claim_auto_status(
                    &claim.id,
                    &outcome.report.status_auto,
                    outcome.report.auto_confidence,
                )?;
            }
        }

        report.claims_processed += 1;
        report.total_suggestions_found += outcome.report.suggestions_found;
        report.total_suggestions_stored += outcome.report.suggestions_stored;
        match outcome.report.status_auto.as_str() {
            "supported" => report.auto_supported += 1,
            "partial" => report.auto_partial += 1,
            _ => report.auto_unknown += 1,
        }
        for (name, count) in outcome.tallies {
            *report.provider_tallies.entry(name).or_insert(0) += count;
        }
        report.claim_reports.push(outcome.report);
    }

    report.elapsed_seconds = started.elapsed().as_secs_f64();
    tracing::info!(
        source_id,
        processed = report.claims_processed,
        supported = report.auto_supported,
        partial = report.auto_partial,
        "assist run complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifiability_rewards_numbers_and_entities() {
        let rich = verifiability_score(
            "Goldman Sachs reported $12.5 billion in revenue for 2023, up 8 percent",
        );
        let vague = verifiability_score("people generally seemed happier about things lately");
        assert!(rich > 50, "rich claim scored {}", rich);
        assert_eq!(vague, 0);
    }

    #[test]
    fn verifiability_penalises_opinion() {
        let with_opinion =
            verifiability_score("I think Tesla Motors will deliver 2 million cars");
        let without = verifiability_score("Tesla Motors will deliver 2 million cars");
        assert!(with_opinion < without);
    }

    #[test]
    fn verifiability_clamped_to_range() {
        let huge = verifiability_score(
            "In 2023 Apple Inc and Goldman Sachs and Morgan Stanley reported 1 2 3 4 5 6 7 8 \
             9 10 11 12 billion percent growth rate $",
        );
        assert!(huge <= 100);
        assert!(verifiability_score("") == 0);
    }
}
