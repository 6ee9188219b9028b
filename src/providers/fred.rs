//! FRED (Federal Reserve Economic Data): the economic-indicator catalogue.
//!
//! A fixed phrase → series-id map covers the common macro vocabulary; each
//! matched series becomes one result with a rich description snippet so the
//! scorer has terms and context to work with.

use super::{EvidenceResult, SearchContext};

const SERIES_WEB_URL: &str = "https://fred.stlouisfed.org/series";

/// Well-known series IDs for common macro phrases. Longest phrase wins.
static SERIES_MAP: &[(&str, &str)] = &[
    // GDP
    ("gdp", "GDP"),
    ("real gdp", "GDPC1"),
    ("gdp growth", "A191RL1Q225SBEA"),
    // Inflation / prices
    ("inflation", "CPIAUCSL"),
    ("cpi", "CPIAUCSL"),
    ("consumer price index", "CPIAUCSL"),
    ("pce", "PCEPI"),
    ("core inflation", "CPILFESL"),
    // Employment
    ("unemployment", "UNRATE"),
    ("unemployment rate", "UNRATE"),
    ("nonfarm payroll", "PAYEMS"),
    ("payrolls", "PAYEMS"),
    ("labor force", "CLF16OV"),
    ("participation rate", "CIVPART"),
    // Interest rates
    ("interest rate", "FEDFUNDS"),
    ("federal funds rate", "FEDFUNDS"),
    ("fed funds rate", "FEDFUNDS"),
    ("fed rate", "FEDFUNDS"),
    ("10 year treasury", "DGS10"),
    ("treasury yield", "DGS10"),
    ("30 year mortgage", "MORTGAGE30US"),
    ("mortgage rate", "MORTGAGE30US"),
    ("prime rate", "DPRIME"),
    // Money supply
    ("money supply", "M2SL"),
    ("m2", "M2SL"),
    // Housing
    ("housing starts", "HOUST"),
    ("home prices", "CSUSHPINSA"),
    ("case-shiller", "CSUSHPINSA"),
    // Trade
    ("trade balance", "BOPGSTB"),
    ("trade deficit", "BOPGSTB"),
    // Debt
    ("national debt", "GFDEBTN"),
    ("federal debt", "GFDEBTN"),
    ("debt to gdp", "GFDEGDQ188S"),
    // Other
    ("industrial production", "INDPRO"),
    ("retail sales", "RSAFS"),
    ("consumer confidence", "UMCSENT"),
];

/// Macro keywords for the related-series sweep
static MACRO_KEYWORDS: &[&str] = &[
    "gdp",
    "inflation",
    "unemployment",
    "interest rate",
    "cpi",
    "recession",
    "federal reserve",
    "monetary policy",
    "trade deficit",
    "housing",
    "mortgage",
    "money supply",
    "retail",
    "industrial",
];

fn series_description(series_id: &str) -> String {
    let desc = match series_id {
        "GDP" => "Gross Domestic Product (GDP), Billions of Dollars, Quarterly, Seasonally Adjusted Annual Rate",
        "GDPC1" => "Real Gross Domestic Product, Billions of Chained 2017 Dollars, Quarterly, Seasonally Adjusted Annual Rate",
        "A191RL1Q225SBEA" => "Real GDP Growth Rate, Percent Change from Preceding Period, Quarterly, Seasonally Adjusted Annual Rate",
        "CPIAUCSL" => "Consumer Price Index for All Urban Consumers (CPI-U), Index 1982-1984=100, Monthly, Seasonally Adjusted",
        "CPILFESL" => "Consumer Price Index Less Food and Energy (Core CPI), Monthly, Seasonally Adjusted",
        "PCEPI" => "Personal Consumption Expenditures Price Index, Monthly, Seasonally Adjusted",
        "UNRATE" => "Unemployment Rate, Percent, Monthly, Seasonally Adjusted",
        "FEDFUNDS" => "Federal Funds Effective Rate, Percent, Monthly",
        "DGS10" => "Market Yield on U.S. Treasury Securities at 10-Year Constant Maturity, Percent, Daily",
        "M2SL" => "M2 Money Supply, Billions of Dollars, Monthly, Seasonally Adjusted",
        "PAYEMS" => "All Employees, Total Nonfarm, Thousands of Persons, Monthly, Seasonally Adjusted",
        "CLF16OV" => "Civilian Labor Force Level, Thousands of Persons, Monthly, Seasonally Adjusted",
        "CIVPART" => "Labor Force Participation Rate, Percent, Monthly, Seasonally Adjusted",
        "HOUST" => "New Privately-Owned Housing Units Started, Thousands of Units, Monthly, Seasonally Adjusted Annual Rate",
        "CSUSHPINSA" => "S&P CoreLogic Case-Shiller U.S. National Home Price Index, Monthly",
        "GFDEBTN" => "Federal Debt: Total Public Debt, Millions of Dollars, Quarterly",
        "GFDEGDQ188S" => "Federal Debt: Total Public Debt as Percent of GDP, Quarterly",
        "MORTGAGE30US" => "30-Year Fixed Rate Mortgage Average in the United States, Percent, Weekly",
        "DPRIME" => "Bank Prime Loan Rate, Percent, Daily",
        "BOPGSTB" => "Trade Balance: Goods and Services, Millions of Dollars, Monthly, Seasonally Adjusted",
        "INDPRO" => "Industrial Production: Total Index, Monthly, Seasonally Adjusted",
        "RSAFS" => "Advance Retail Sales: Retail Trade and Food Services, Millions of Dollars, Monthly",
        "UMCSENT" => "University of Michigan: Consumer Sentiment, Index, Monthly",
        other => return format!("FRED series {}", other),
    };
    desc.to_string()
}

/// Match the claim to a known series id, longest phrase first
pub fn match_series(claim_text: &str) -> Option<&'static str> {
    let lower = claim_text.to_lowercase();
    let mut entries: Vec<&(&str, &str)> = SERIES_MAP.iter().collect();
    entries.sort_by_key(|(phrase, _)| std::cmp::Reverse(phrase.len()));
    entries
        .iter()
        .find(|(phrase, _)| lower.contains(phrase))
        .map(|(_, id)| *id)
}

fn build_series_snippet(series_id: &str) -> String {
    format!(
        "{}. Source: Federal Reserve Bank of St. Louis (FRED). Series ID: {}. \
         This is official U.S. government economic data updated regularly. \
         View full historical data and charts at {}/{}",
        series_description(series_id),
        series_id,
        SERIES_WEB_URL,
        series_id
    )
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    _ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    let lower = claim_text.to_lowercase();
    let series_id = match_series(claim_text);
    let keywords: Vec<&str> = MACRO_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .copied()
        .collect();

    if series_id.is_none() && keywords.is_empty() {
        return vec![];
    }

    let mut results = Vec::new();

    if let Some(id) = series_id {
        results.push(EvidenceResult {
            url: format!("{}/{}", SERIES_WEB_URL, id),
            title: format!("FRED Economic Data: {}", id),
            source_name: "fred",
            evidence_type: "dataset",
            snippet: build_series_snippet(id),
            evidence_date: String::new(),
        });
    }

    // Related series for broader coverage
    for kw in keywords.iter().take(3) {
        if results.len() >= max_results {
            break;
        }
        let Some(related) = SERIES_MAP
            .iter()
            .find(|(phrase, _)| phrase == kw)
            .map(|(_, id)| *id)
        else {
            continue;
        };
        if Some(related) == series_id {
            continue;
        }
        results.push(EvidenceResult {
            url: format!("{}/{}", SERIES_WEB_URL, related),
            title: format!("FRED Economic Data: {}", related),
            source_name: "fred",
            evidence_type: "dataset",
            snippet: format!(
                "Federal Reserve Economic Data series {} for {}. \
                 Source: Federal Reserve Bank of St. Louis.",
                related, kw
            ),
            evidence_date: String::new(),
        });
    }

    results.truncate(max_results);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_phrase_wins() {
        assert_eq!(match_series("the federal funds rate rose"), Some("FEDFUNDS"));
        assert_eq!(match_series("real gdp expanded"), Some("GDPC1"));
        assert_eq!(match_series("gdp expanded"), Some("GDP"));
    }

    #[test]
    fn no_macro_language_no_results() {
        assert_eq!(match_series("the cat sat on the mat"), None);
    }
}
