//! Demographics: Census Bureau ACS lookups for population, income,
//! poverty, education, insurance, and housing claims.
//!
//! Fixed keyword → (dataset, variables) map, with an optional state-level
//! follow-up when the claim names a US state.

use super::{EvidenceResult, SearchContext};

const BASE_URL: &str = "https://api.census.gov/data";

static CENSUS_QUERIES: &[(&str, &str, &str, &str)] = &[
    // (keyword, dataset, variables, description)
    ("population", "2022/acs/acs1", "NAME,B01003_001E", "Total Population (ACS 1-Year Estimates)"),
    ("median income", "2022/acs/acs1", "NAME,B19013_001E", "Median Household Income (ACS 1-Year Estimates)"),
    ("household income", "2022/acs/acs1", "NAME,B19013_001E", "Median Household Income (ACS 1-Year Estimates)"),
    ("poverty rate", "2022/acs/acs1", "NAME,B17001_002E", "Population Below Poverty Level (ACS 1-Year Estimates)"),
    ("poverty", "2022/acs/acs1", "NAME,B17001_002E", "Population Below Poverty Level (ACS 1-Year Estimates)"),
    ("education", "2022/acs/acs1", "NAME,B15003_022E", "Bachelor's Degree or Higher (ACS 1-Year Estimates)"),
    ("bachelor", "2022/acs/acs1", "NAME,B15003_022E", "Bachelor's Degree Attainment (ACS 1-Year Estimates)"),
    ("college", "2022/acs/acs1", "NAME,B15003_022E", "Educational Attainment (ACS 1-Year Estimates)"),
    ("uninsured", "2022/acs/acs1", "NAME,B27010_001E", "Health Insurance Coverage Status (ACS 1-Year Estimates)"),
    ("health insurance", "2022/acs/acs1", "NAME,B27010_001E", "Health Insurance Coverage Status (ACS 1-Year Estimates)"),
    ("homeownership", "2022/acs/acs1", "NAME,B25003_002E", "Owner-Occupied Housing Units (ACS 1-Year Estimates)"),
    ("rent", "2022/acs/acs1", "NAME,B25064_001E", "Median Gross Rent (ACS 1-Year Estimates)"),
];

static STATE_FIPS: &[(&str, &str)] = &[
    ("alabama", "01"), ("alaska", "02"), ("arizona", "04"), ("arkansas", "05"),
    ("california", "06"), ("colorado", "08"), ("connecticut", "09"), ("delaware", "10"),
    ("florida", "12"), ("georgia", "13"), ("hawaii", "15"), ("idaho", "16"),
    ("illinois", "17"), ("indiana", "18"), ("iowa", "19"), ("kansas", "20"),
    ("kentucky", "21"), ("louisiana", "22"), ("maine", "23"), ("maryland", "24"),
    ("massachusetts", "25"), ("michigan", "26"), ("minnesota", "27"), ("mississippi", "28"),
    ("missouri", "29"), ("montana", "30"), ("nebraska", "31"), ("nevada", "32"),
    ("new hampshire", "33"), ("new jersey", "34"), ("new mexico", "35"), ("new york", "36"),
    ("north carolina", "37"), ("north dakota", "38"), ("ohio", "39"), ("oklahoma", "40"),
    ("oregon", "41"), ("pennsylvania", "42"), ("rhode island", "44"), ("south carolina", "45"),
    ("south dakota", "46"), ("tennessee", "47"), ("texas", "48"), ("utah", "49"),
    ("vermont", "50"), ("virginia", "51"), ("washington", "53"), ("west virginia", "54"),
    ("wisconsin", "55"), ("wyoming", "56"),
];

fn match_query(claim_text: &str) -> Option<(&'static str, &'static str, &'static str)> {
    let lower = claim_text.to_lowercase();
    let mut entries: Vec<&(&str, &str, &str, &str)> = CENSUS_QUERIES.iter().collect();
    entries.sort_by_key(|(kw, _, _, _)| std::cmp::Reverse(kw.len()));
    entries
        .iter()
        .find(|(kw, _, _, _)| lower.contains(kw))
        .map(|(_, ds, vars, desc)| (*ds, *vars, *desc))
}

fn extract_state(claim_text: &str) -> Option<&'static str> {
    let lower = claim_text.to_lowercase();
    let mut entries: Vec<&(&str, &str)> = STATE_FIPS.iter().collect();
    entries.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));
    entries
        .iter()
        .find(|(name, _)| lower.contains(name))
        .map(|(_, fips)| *fips)
}

/// Format the array-of-arrays payload `[headers, values...]` into
/// "header: value" pairs
fn format_pairs(data: &serde_json::Value, skip: &[&str]) -> Vec<String> {
    let Some(rows) = data.as_array() else { return vec![] };
    if rows.len() < 2 {
        return vec![];
    }
    let headers = rows[0].as_array().cloned().unwrap_or_default();
    let values = rows[1].as_array().cloned().unwrap_or_default();

    headers
        .iter()
        .zip(values.iter())
        .filter_map(|(h, v)| {
            let h = h.as_str()?;
            let v = v.as_str()?;
            if skip.contains(&h) || v.is_empty() || v == "null" {
                return None;
            }
            Some(format!("{}: {}", h, v))
        })
        .collect()
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    let Some((dataset, variables, description)) = match_query(claim_text) else {
        return vec![];
    };

    let url = format!("{}/{}", BASE_URL, dataset);
    let mut snippet = format!("{}. Source: U.S. Census Bureau.", description);

    if let Some(data) = ctx
        .http
        .get_json(&url, "census", &[("get", variables), ("for", "us:*")], &[])
        .await
    {
        let pairs = format_pairs(&data, &["us"]);
        if !pairs.is_empty() {
            snippet.push_str(&format!(" National totals: {}.", pairs.join("; ")));
        }
    }

    if let Some(fips) = extract_state(claim_text) {
        let state_for = format!("state:{}", fips);
        if let Some(sdata) = ctx
            .http
            .get_json(
                &url,
                "census",
                &[("get", variables), ("for", state_for.as_str())],
                &[],
            )
            .await
        {
            let pairs = format_pairs(&sdata, &["state"]);
            if !pairs.is_empty() {
                snippet.push_str(&format!(" State data: {}.", pairs.join("; ")));
            }
        }
    }

    let results = vec![EvidenceResult {
        url: format!(
            "https://data.census.gov/table?q={}",
            description.replace(' ', "+")
        ),
        title: format!("Census Bureau: {}", description),
        source_name: "census",
        evidence_type: "gov",
        snippet: snippet.chars().take(2000).collect(),
        evidence_date: String::new(),
    }];

    results.into_iter().take(max_results).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_match_prefers_longest() {
        assert_eq!(
            match_query("the poverty rate fell to 11 percent").map(|(_, v, _)| v),
            Some("NAME,B17001_002E")
        );
        assert!(match_query("unrelated claim").is_none());
    }

    #[test]
    fn state_extraction() {
        assert_eq!(extract_state("poverty in West Virginia rose"), Some("54"));
        assert_eq!(extract_state("poverty in Virginia rose"), Some("51"));
        assert_eq!(extract_state("no state here"), None);
    }
}
