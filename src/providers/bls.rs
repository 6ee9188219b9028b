//! Bureau of Labor Statistics: labor and price series.
//!
//! Fixed keyword → series-id map; the snippet embeds the most recent
//! observations so exact-number matching can fire.

use super::{EvidenceResult, SearchContext};

const BASE_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data";

static SERIES_MAP: &[(&str, &str, &str)] = &[
    // (keyword, series_id, description)
    ("unemployment rate", "LNS14000000", "Unemployment Rate, Seasonally Adjusted"),
    ("unemployment", "LNS14000000", "Unemployment Rate, Seasonally Adjusted"),
    ("nonfarm payroll", "CES0000000001", "Total Nonfarm Employment, Seasonally Adjusted"),
    ("payrolls", "CES0000000001", "Total Nonfarm Employment, Seasonally Adjusted"),
    ("jobs", "CES0000000001", "Total Nonfarm Employment, Seasonally Adjusted"),
    ("employment", "CES0000000001", "Total Nonfarm Employment, Seasonally Adjusted"),
    ("cpi", "CUUR0000SA0", "Consumer Price Index, All Urban Consumers, U.S. City Average"),
    ("consumer price", "CUUR0000SA0", "Consumer Price Index, All Urban Consumers"),
    ("inflation", "CUUR0000SA0", "Consumer Price Index, All Urban Consumers"),
    ("wages", "CES0500000003", "Average Hourly Earnings, Private Sector"),
    ("hourly earnings", "CES0500000003", "Average Hourly Earnings, Private Sector"),
    ("average wage", "CES0500000003", "Average Hourly Earnings, Private Sector"),
    ("labor force", "LNS11000000", "Civilian Labor Force Level"),
    ("participation rate", "LNS11300000", "Labor Force Participation Rate"),
    ("job openings", "JTS000000000000000JOL", "Job Openings, Total Nonfarm"),
    ("quit rate", "JTS000000000000000QUR", "Quits Rate, Total Nonfarm"),
    ("producer price", "WPUFD4", "Producer Price Index, Final Demand"),
    ("ppi", "WPUFD4", "Producer Price Index, Final Demand"),
];

fn match_series(claim_text: &str) -> Option<(&'static str, &'static str)> {
    let lower = claim_text.to_lowercase();
    let mut entries: Vec<&(&str, &str, &str)> = SERIES_MAP.iter().collect();
    entries.sort_by_key(|(kw, _, _)| std::cmp::Reverse(kw.len()));
    entries
        .iter()
        .find(|(kw, _, _)| lower.contains(kw))
        .map(|(_, id, desc)| (*id, *desc))
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    let Some((series_id, description)) = match_series(claim_text) else {
        return vec![];
    };

    let mut snippet = format!(
        "{}. Source: Bureau of Labor Statistics. Series: {}.",
        description, series_id
    );

    if let Some(data) = ctx
        .http
        .get_json(&format!("{}/{}", BASE_URL, series_id), "bls", &[], &[])
        .await
    {
        if data["status"].as_str() == Some("REQUEST_SUCCEEDED") {
            let obs = data["Results"]["series"]
                .as_array()
                .and_then(|s| s.first())
                .and_then(|s| s["data"].as_array())
                .cloned()
                .unwrap_or_default();
            let values: Vec<String> = obs
                .iter()
                .take(8)
                .filter_map(|o| {
                    let year = o["year"].as_str()?;
                    let period = o["periodName"].as_str().unwrap_or("");
                    let value = o["value"].as_str()?;
                    Some(format!("{} {}: {}", period, year, value))
                })
                .collect();
            if !values.is_empty() {
                snippet.push_str(&format!(" Recent values: {}.", values.join("; ")));
            }
        }
    }

    let results = vec![EvidenceResult {
        url: format!("https://data.bls.gov/timeseries/{}", series_id),
        title: format!("BLS: {}", description),
        source_name: "bls",
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
    fn series_match_longest_first() {
        assert_eq!(
            match_series("the unemployment rate fell").map(|(id, _)| id),
            Some("LNS14000000")
        );
        assert_eq!(
            match_series("labor force participation rate rose").map(|(id, _)| id),
            Some("LNS11300000")
        );
        assert_eq!(match_series("nothing relevant here"), None);
    }
}
