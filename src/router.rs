//! Provider routing: category priority lists plus content-signal re-ranking.
//!
//! `select` reads a fixed per-category priority list (every leaf ends with
//! the universal web-answer fallback); `rerank` computes an integer boost
//! per provider from claim-content signals and stable-sorts by
//! (-boost, original index). Providers missing from the category list are
//! appended in registry order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::providers::market::has_company_mention;
use crate::providers::{Provider, REGISTRY};
use crate::textutil::PROPER_NOUN_RE;

static PRIORITY: &[(&str, &[Provider])] = &[
    (
        "finance",
        &[
            Provider::LocalDataset,
            Provider::YahooFinance,
            Provider::SecEdgar,
            Provider::SecGov,
            Provider::Fred,
            Provider::GoogleFactcheck,
            Provider::Crossref,
            Provider::Wikipedia,
            Provider::Wikidata,
            Provider::DuckDuckGo,
        ],
    ),
    (
        "health",
        &[
            Provider::Pubmed,
            Provider::OpenFda,
            Provider::GoogleFactcheck,
            Provider::Crossref,
            Provider::Wikipedia,
            Provider::DuckDuckGo,
        ],
    ),
    (
        "science",
        &[
            Provider::Arxiv,
            Provider::Crossref,
            Provider::Pubmed,
            Provider::Wikipedia,
            Provider::Wikidata,
            Provider::DuckDuckGo,
        ],
    ),
    (
        "tech",
        &[
            Provider::Arxiv,
            Provider::Crossref,
            Provider::PatentsView,
            Provider::GoogleFactcheck,
            Provider::Wikipedia,
            Provider::DuckDuckGo,
        ],
    ),
    (
        "politics",
        &[
            Provider::GoogleFactcheck,
            Provider::UsaSpending,
            Provider::Cbo,
            Provider::Crossref,
            Provider::Wikipedia,
            Provider::DuckDuckGo,
        ],
    ),
    (
        "military",
        &[
            Provider::GoogleFactcheck,
            Provider::UsaSpending,
            Provider::Crossref,
            Provider::Wikipedia,
            Provider::DuckDuckGo,
        ],
    ),
    (
        "education",
        &[
            Provider::Census,
            Provider::GoogleFactcheck,
            Provider::Crossref,
            Provider::Wikipedia,
            Provider::DuckDuckGo,
        ],
    ),
    (
        "energy_climate",
        &[
            Provider::WorldBank,
            Provider::Fred,
            Provider::Crossref,
            Provider::Arxiv,
            Provider::Wikipedia,
            Provider::DuckDuckGo,
        ],
    ),
    (
        "labor",
        &[
            Provider::Bls,
            Provider::Fred,
            Provider::GoogleFactcheck,
            Provider::Crossref,
            Provider::Wikipedia,
            Provider::DuckDuckGo,
        ],
    ),
    (
        "general",
        &[
            Provider::GoogleFactcheck,
            Provider::Wikipedia,
            Provider::Wikidata,
            Provider::Crossref,
            Provider::Arxiv,
            Provider::DuckDuckGo,
        ],
    ),
];

/// Preferred providers for a category, then the rest in registry order
pub fn select(category: &str) -> Vec<Provider> {
    let preferred = PRIORITY
        .iter()
        .find(|(cat, _)| *cat == category)
        .map(|(_, list)| *list)
        .unwrap_or_else(|| {
            PRIORITY
                .iter()
                .find(|(cat, _)| *cat == "general")
                .map(|(_, list)| *list)
                .unwrap_or(&[])
        });

    let mut ordered: Vec<Provider> = preferred.to_vec();
    for p in REGISTRY {
        if !ordered.contains(&p) {
            ordered.push(p);
        }
    }
    ordered
}

// ---------------------------------------------------------------------------
// Content signal sets
// ---------------------------------------------------------------------------

static ACADEMIC_TERMS: &[&str] = &[
    "study", "studies", "research", "researchers", "published", "journal", "peer-reviewed",
    "paper", "findings", "experiment", "hypothesis", "methodology", "statistical",
    "sample size", "correlation", "causation", "meta-analysis", "systematic review",
    "university", "professor", "phd",
];

static HEALTH_TERMS: &[&str] = &[
    "patients", "clinical", "trial", "trials", "treatment", "therapy", "diagnosis",
    "symptoms", "disease", "drug", "fda", "vaccine", "mortality", "survival", "dosage",
    "placebo", "double-blind", "randomized",
];

static FINANCIAL_METRIC_TERMS: &[&str] = &[
    "revenue", "revenues", "earnings", "income", "profit", "margin", "eps", "p/e",
    "pe ratio", "market cap", "stock price", "share price", "dividend", "valuation",
    "billion", "million", "quarter", "quarterly", "annual", "growth rate", "operating",
    "capex", "cash flow", "balance sheet", "debt", "equity", "ipo",
];

static MACRO_TERMS: &[&str] = &[
    "gdp", "inflation", "unemployment", "interest rate", "federal reserve",
    "monetary policy", "fiscal policy", "recession", "cpi", "consumer price",
    "trade deficit", "national debt", "federal debt", "money supply", "treasury",
    "mortgage rate", "housing starts",
];

static FACTCHECK_TERMS: &[&str] = &[
    "president", "congress", "senator", "representative", "government", "administration",
    "white house", "campaign", "claimed", "claim", "said", "says", "stated", "according",
    "false", "true", "misleading", "debunked", "unemployment", "crime", "border",
    "immigration", "vaccine", "covid", "pandemic",
];

static DRUG_TERMS: &[&str] = &[
    "drug", "drugs", "medication", "prescription", "fda", "adverse", "recall",
    "side effect", "dosage", "label", "pharmaceutical",
];

static LABOR_TERMS: &[&str] = &[
    "unemployment", "payroll", "payrolls", "wages", "hourly earnings", "labor force",
    "job openings", "quit rate", "jobs report", "participation rate",
];

static BUDGET_TERMS: &[&str] = &[
    "budget", "deficit", "cbo", "congressional budget", "social security", "medicare",
    "medicaid", "appropriations", "debt ceiling", "debt limit", "cost estimate",
];

static SPENDING_TERMS: &[&str] = &[
    "spending", "contract", "contracts", "grant", "grants", "awarded", "federal spending",
    "pentagon", "agency", "department",
];

static DEMOGRAPHIC_TERMS: &[&str] = &[
    "population", "median income", "household income", "poverty", "census",
    "homeownership", "uninsured", "demographic",
];

static INTERNATIONAL_TERMS: &[&str] = &[
    "world bank", "gdp per capita", "life expectancy", "developing", "global economy",
    "per capita", "country", "countries", "worldwide",
];

static PATENT_TERMS: &[&str] = &[
    "patent", "patents", "patented", "invention", "intellectual property", "trademark",
];

static INSTITUTIONAL_TERMS: &[&str] = &[
    "enforcement", "registrant", "broker-dealer", "investment adviser", "whistleblower",
    "disgorgement", "rulemaking", "self-regulatory",
];

static HISTORIC_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b1[5-9]\d{2}\b").expect("valid regex"));

fn count_hits(lower: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|t| lower.contains(*t)).count()
}

/// Re-rank providers by claim-content boost. Stable: ties preserve the
/// category-priority order.
pub fn rerank(claim_text: &str, providers: Vec<Provider>) -> Vec<Provider> {
    let lower = claim_text.to_lowercase();
    let mut boosts: std::collections::HashMap<Provider, i32> =
        providers.iter().map(|p| (*p, 0)).collect();

    let mut boost = |p: Provider, amount: i32, boosts: &mut std::collections::HashMap<Provider, i32>| {
        if let Some(b) = boosts.get_mut(&p) {
            *b += amount;
        }
    };

    // Company mention → market data, filings, encyclopedia
    if has_company_mention(&lower) {
        boost(Provider::YahooFinance, 10, &mut boosts);
        boost(Provider::SecEdgar, 5, &mut boosts);
        boost(Provider::Wikipedia, 4, &mut boosts);
    }

    // Financial metrics
    if count_hits(&lower, FINANCIAL_METRIC_TERMS) >= 2 {
        boost(Provider::YahooFinance, 8, &mut boosts);
        boost(Provider::SecEdgar, 4, &mut boosts);
    }

    // Academic language
    if count_hits(&lower, ACADEMIC_TERMS) >= 2 {
        boost(Provider::Arxiv, 8, &mut boosts);
        boost(Provider::Crossref, 4, &mut boosts);
    }

    // Health language
    if count_hits(&lower, HEALTH_TERMS) >= 2 {
        boost(Provider::Pubmed, 8, &mut boosts);
    }

    // Macro-economic language
    let macro_hits = count_hits(&lower, MACRO_TERMS);
    if macro_hits >= 1 {
        boost(Provider::Fred, 10, &mut boosts);
        if lower.contains("percent") {
            boost(Provider::Fred, 5, &mut boosts);
        }
    }

    // Named entities → encyclopedia and structured-entity source
    if PROPER_NOUN_RE.is_match(claim_text) {
        boost(Provider::Wikipedia, 6, &mut boosts);
        boost(Provider::Wikidata, 8, &mut boosts);
        if HISTORIC_YEAR_RE.is_match(claim_text) {
            boost(Provider::Wikidata, 5, &mut boosts);
        }
    }

    // Fact-checker coverage
    match count_hits(&lower, FACTCHECK_TERMS) {
        0 => {}
        1 => boost(Provider::GoogleFactcheck, 5, &mut boosts),
        _ => boost(Provider::GoogleFactcheck, 10, &mut boosts),
    }

    // Specialist government/statistical sets: two hits earn the full boost
    let specialist: &[(&[&str], Provider)] = &[
        (DRUG_TERMS, Provider::OpenFda),
        (LABOR_TERMS, Provider::Bls),
        (BUDGET_TERMS, Provider::Cbo),
        (SPENDING_TERMS, Provider::UsaSpending),
        (DEMOGRAPHIC_TERMS, Provider::Census),
        (INTERNATIONAL_TERMS, Provider::WorldBank),
        (PATENT_TERMS, Provider::PatentsView),
        (INSTITUTIONAL_TERMS, Provider::SecGov),
    ];
    for (terms, provider) in specialist {
        match count_hits(&lower, terms) {
            0 => {}
            1 => boost(*provider, 5, &mut boosts),
            _ => boost(*provider, 10, &mut boosts),
        }
    }

    // Universal fallback: nothing specific fired strongly → web answers
    let max_other = boosts
        .iter()
        .filter(|(p, _)| **p != Provider::DuckDuckGo)
        .map(|(_, b)| *b)
        .max()
        .unwrap_or(0);
    if max_other <= 5 {
        boost(Provider::DuckDuckGo, 6, &mut boosts);
    }

    let mut indexed: Vec<(Provider, i32, usize)> = providers
        .into_iter()
        .enumerate()
        .map(|(i, p)| (p, *boosts.get(&p).unwrap_or(&0), i))
        .collect();
    indexed.sort_by_key(|(_, boost, idx)| (-boost, *idx));
    indexed.into_iter().map(|(p, _, _)| p).collect()
}

/// Convenience: full routing for a claim
pub fn route(claim_text: &str, category: &str) -> Vec<Provider> {
    rerank(claim_text, select(category))
}
