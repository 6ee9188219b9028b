//! Topic category classification: token scoring over fixed term tables.
//!
//! No learned model: +2 for each multi-word term found as a substring,
//! +1 for each single-word term present as a whole word. A claim stays
//! `general` unless some category scores at least 2 points; ties break by
//! the fixed category enumeration order.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::textutil::normalise;

/// Category enumeration order (tiebreak order). `general` is the default.
pub const CATEGORY_ORDER: [&str; 9] = [
    "finance",
    "tech",
    "politics",
    "health",
    "science",
    "military",
    "education",
    "energy_climate",
    "labor",
];

pub const GENERAL: &str = "general";

/// Minimum score before a non-general category is assigned
const MIN_CATEGORY_SCORE: i32 = 2;

type TermTable = Vec<(&'static str, Vec<&'static str>)>;

static CATEGORY_TERMS: Lazy<TermTable> = Lazy::new(|| {
    vec![
        (
            "finance",
            vec![
                "rate", "rates", "inflation", "gdp", "deficit", "debt", "bond", "bonds", "stock",
                "stocks", "market", "markets", "fed", "federal reserve", "treasury", "bank",
                "banking", "banks", "economy", "economic", "recession", "fiscal", "monetary",
                "yield", "dollar", "interest", "investment", "investments", "investor",
                "investors", "earnings", "revenue", "revenues", "profit", "profits", "billion",
                "trillion", "million", "currency", "tariff", "tariffs", "trade", "budget",
                "margin", "margins", "capex", "depreciation", "amortization", "operating income",
                "net income", "cash flow", "free cash flow", "year-over-year", "quarter",
                "quarterly", "annual", "guidance", "shareholders", "dividend", "dividends",
                "repurchase", "buyback", "backlog", "expenses", "cost", "costs", "10-k", "10-q",
                "8-k", "sec", "filing", "filings", "assets", "fund", "funds", "hedge fund",
                "mutual fund", "etf", "portfolio", "aum", "manages", "managing",
                "asset management", "firm", "financial", "wall street", "returns", "return",
                "valuation", "equity", "equities", "shares", "ipo", "price", "pricing", "cap",
                "wealth", "ceo", "cfo", "quarterly earnings", "annual report", "balance sheet",
                "income statement", "cash position", "growth", "percent", "percentage",
            ],
        ),
        (
            "tech",
            vec![
                "ai", "artificial intelligence", "machine learning", "gpu", "chip", "chips",
                "semiconductor", "software", "algorithm", "data", "model", "neural", "robot",
                "robotics", "autonomous", "cloud", "computing", "nvidia", "openai", "google",
                "microsoft", "apple", "meta", "startup", "github", "open source", "training",
                "inference", "llm", "transformer", "api", "technology", "platform", "digital",
                "internet", "server", "servers", "database", "processor", "cpu", "hardware",
                "network", "encryption", "blockchain", "crypto", "bitcoin", "app", "application",
                "code", "programming", "developer", "developers", "machine", "automation",
                "quantum",
            ],
        ),
        (
            "politics",
            vec![
                "president", "congress", "senate", "house", "vote", "voted", "election",
                "democrat", "republican", "legislation", "law", "policy", "government",
                "administration", "cabinet", "supreme court", "constitutional", "bill",
                "bipartisan", "partisan", "campaign", "governor", "mayor", "political",
                "politics", "republicans", "democrats", "regulatory", "regulation",
                "regulations", "regulator", "federal", "state", "country", "countries",
                "nation", "nations",
            ],
        ),
        (
            "health",
            vec![
                "health", "healthcare", "hospital", "disease", "vaccine", "pandemic", "drug",
                "drugs", "fda", "clinical", "patient", "patients", "medical", "cancer",
                "treatment", "diagnosis", "mortality", "pharmaceutical", "cholesterol",
                "blood pressure", "trial", "trials", "study", "diet", "obesity", "heart",
                "stroke", "diabetes", "medicine", "doctor", "doctors", "physician", "nurse",
                "surgery", "symptom", "symptoms", "chronic", "acute", "infection", "antibiotic",
                "antibiotics", "therapy", "mental health", "depression", "anxiety", "nutrition",
                "calories", "protein", "carbohydrate", "carbohydrates", "fat", "saturated fat",
                "ldl", "hdl", "triglyceride", "triglycerides", "inflammation", "artery",
                "arteries", "coronary", "placebo", "randomized", "double-blind",
                "mediterranean diet", "framingham",
            ],
        ),
        (
            "science",
            vec![
                "research", "study", "experiment", "discovery", "nasa", "space", "climate",
                "temperature", "emissions", "carbon", "energy", "solar", "nuclear", "physics",
                "biology", "genome", "species", "cells", "immune", "bacteria", "virus",
                "protein", "dna", "rna", "scientist", "scientists", "researcher", "researchers",
                "published", "journal", "peer-reviewed", "findings", "hypothesis", "theory",
                "evidence", "data", "university", "professor", "laboratory", "lab", "evolution",
                "ecosystem", "biodiversity", "extinction", "astronomy", "telescope", "planet",
                "galaxy", "galaxies", "universe", "chemistry", "molecule", "atom", "element",
                "mathematics", "mathematical", "equation", "theorem", "correlation", "causation",
                "statistical", "statistically", "gravity", "quantum",
            ],
        ),
        (
            "military",
            vec![
                "military", "defense", "army", "navy", "war", "weapon", "weapons", "missile",
                "nuclear", "nato", "pentagon", "troops", "combat", "drone", "drones",
                "intelligence", "security", "sanctions",
            ],
        ),
        (
            "education",
            vec![
                "tuition", "student", "students", "student loans", "enrollment", "school",
                "schools", "high school", "graduation", "degree", "bachelor", "diploma",
                "teacher", "teachers", "classroom", "test scores", "literacy", "curriculum",
                "college", "university", "kindergarten", "k-12", "stem",
            ],
        ),
        (
            "energy_climate",
            vec![
                "carbon", "emissions", "fossil", "fossil fuels", "renewable",
                "renewable energy", "solar", "wind", "climate", "climate change", "warming",
                "global warming", "temperature", "sea level", "greenhouse", "methane",
                "pollution", "electric vehicle", "battery", "sustainable", "oil", "gas", "coal",
                "grid", "energy", "megawatt", "gigawatt",
            ],
        ),
        (
            "labor",
            vec![
                "unemployment", "wage", "wages", "minimum wage", "salary", "salaries", "union",
                "unions", "strike", "collective bargaining", "layoff", "layoffs", "hiring",
                "jobs", "workers", "workforce", "labor", "labor force", "gig economy",
                "remote work", "overtime", "employment", "employee", "employees",
                "participation rate",
            ],
        ),
    ]
});

/// Score every category for a text. Multi-word terms match as substrings of
/// the punctuation-stripped text; single words match against the word set.
pub fn score_all_categories(text: &str) -> Vec<(&'static str, i32)> {
    let clean = normalise(text);
    let words: HashSet<&str> = clean.split_whitespace().collect();

    CATEGORY_TERMS
        .iter()
        .map(|(cat, terms)| {
            let mut score = 0;
            for term in terms {
                if term.contains(' ') {
                    // Normalise the term the same way so "year-over-year" still hits
                    if clean.contains(&normalise(term)) {
                        score += 2;
                    }
                } else if words.contains(normalise(term).as_str()) {
                    score += 1;
                }
            }
            (*cat, score)
        })
        .collect()
}

/// Classify a claim into a topic category by keyword scoring
pub fn classify_category(text: &str) -> &'static str {
    best_category(&score_all_categories(text), MIN_CATEGORY_SCORE).unwrap_or(GENERAL)
}

/// Classify with source metadata as a tiebreaker: claims that would be
/// `general` on their own text take the metadata's category when the
/// title/channel text scores any points at all.
pub fn classify_category_with_context(text: &str, title: &str, channel: &str) -> &'static str {
    let own = classify_category(text);
    if own != GENERAL {
        return own;
    }
    let meta = format!("{} {}", title, channel);
    if meta.trim().is_empty() {
        return GENERAL;
    }
    best_category(&score_all_categories(&meta), 1).unwrap_or(GENERAL)
}

fn best_category(scores: &[(&'static str, i32)], min_score: i32) -> Option<&'static str> {
    let mut best: Option<(&'static str, i32)> = None;
    for (cat, score) in scores {
        match best {
            Some((_, s)) if *score <= s => {}
            _ if *score >= min_score => best = Some((cat, *score)),
            _ => {}
        }
    }
    best.map(|(c, _)| c)
}

/// Small per-category relevance table used by the evidence scorer and the
/// knowledge-graph fingerprint (tighter than the classifier tables).
pub fn relevance_terms(category: &str) -> &'static [&'static str] {
    match category {
        "finance" => &[
            "rate", "inflation", "gdp", "economy", "market", "fiscal", "monetary", "bank",
            "revenue", "revenues", "income", "earnings", "margin", "operating", "cash", "flow",
            "cap", "price", "eps", "dividend", "ratio", "stock", "shares", "valuation", "profit",
            "quarterly",
        ],
        "tech" => &["ai", "model", "gpu", "software", "algorithm", "computing", "neural"],
        "health" => &[
            "health", "drug", "vaccine", "clinical", "patient", "disease", "treatment",
        ],
        "science" => &["research", "study", "climate", "energy", "species", "experiment"],
        "politics" => &[
            "vote", "election", "congress", "senate", "legislation", "policy",
        ],
        "military" => &["military", "defense", "weapon", "security", "intelligence"],
        "education" => &["tuition", "students", "school", "teacher", "graduation"],
        "energy_climate" => &["carbon", "emissions", "renewable", "climate", "solar", "wind"],
        "labor" => &["unemployment", "wages", "union", "workers", "jobs"],
        _ => &[],
    }
}

/// Union of every relevance table, used for fingerprints of `general` claims
pub fn all_relevance_terms() -> &'static HashSet<&'static str> {
    static ALL: Lazy<HashSet<&'static str>> = Lazy::new(|| {
        CATEGORY_ORDER
            .iter()
            .flat_map(|c| relevance_terms(c).iter().copied())
            .collect()
    });
    &ALL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finance_earnings_language() {
        assert_eq!(
            classify_category("Revenue grew 12 percent and operating margin expanded"),
            "finance"
        );
    }

    #[test]
    fn health_trial_language() {
        assert_eq!(
            classify_category("The clinical trial showed patients on placebo had higher LDL"),
            "health"
        );
    }

    #[test]
    fn education_tuition_beats_finance() {
        assert_eq!(
            classify_category(
                "College tuition has increased 1200 percent and student loans now exceed 1.7 trillion"
            ),
            "education"
        );
    }

    #[test]
    fn energy_climate_carbon() {
        assert_eq!(
            classify_category("Carbon emissions from fossil fuels reached record levels in 2023"),
            "energy_climate"
        );
    }

    #[test]
    fn labor_union_strike() {
        assert_eq!(
            classify_category("The union organized a strike for better wages and collective bargaining"),
            "labor"
        );
    }

    #[test]
    fn labor_gig_economy() {
        assert_eq!(
            classify_category("Remote work and the gig economy have transformed the workforce"),
            "labor"
        );
    }

    #[test]
    fn general_needs_two_points() {
        assert_eq!(classify_category("He went to the market to buy groceries"), "general");
    }

    #[test]
    fn metadata_tiebreak_for_general_claims() {
        let text = "we are well positioned for the year ahead";
        assert_eq!(classify_category(text), "general");
        assert_eq!(
            classify_category_with_context(text, "Palantir Q4 FY25 Earnings Call PLTR", ""),
            "finance"
        );
    }

    #[test]
    fn metadata_does_not_override_specific_category() {
        let text = "The clinical trial enrolled 400 patients with chronic disease";
        assert_eq!(
            classify_category_with_context(text, "Apple Q1 Earnings Call", ""),
            "health"
        );
    }
}
