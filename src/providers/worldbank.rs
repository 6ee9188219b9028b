//! International indicators: World Bank data for cross-country claims.
//!
//! Fixed keyword → indicator map plus country-name extraction; defaults to
//! the world aggregate when no country is named.

use super::{EvidenceResult, SearchContext};

const BASE_URL: &str = "https://api.worldbank.org/v2";

static INDICATOR_MAP: &[(&str, &str, &str)] = &[
    // (keyword, indicator_code, description)
    ("gdp per capita", "NY.GDP.PCAP.CD", "GDP per capita (current US$)"),
    ("gdp growth", "NY.GDP.MKTP.KD.ZG", "GDP growth (annual %)"),
    ("gross domestic product", "NY.GDP.MKTP.CD", "GDP (current US$)"),
    ("gdp", "NY.GDP.MKTP.CD", "GDP (current US$)"),
    ("gni per capita", "NY.GNP.PCAP.CD", "GNI per capita (current US$)"),
    ("gni", "NY.GNP.MKTP.CD", "GNI (current US$)"),
    ("population", "SP.POP.TOTL", "Population, total"),
    ("life expectancy", "SP.DYN.LE00.IN", "Life expectancy at birth (years)"),
    ("infant mortality", "SP.DYN.IMRT.IN", "Mortality rate, infant (per 1,000 live births)"),
    ("co2 emissions", "EN.ATM.CO2E.KT", "CO2 emissions (kt)"),
    ("carbon emissions", "EN.ATM.CO2E.KT", "CO2 emissions (kt)"),
    ("renewable energy", "EG.FEC.RNEW.ZS", "Renewable energy consumption (% of total)"),
    ("electricity", "EG.ELC.ACCS.ZS", "Access to electricity (% of population)"),
    ("trade", "NE.TRD.GNFS.ZS", "Trade (% of GDP)"),
    ("exports", "NE.EXP.GNFS.ZS", "Exports of goods and services (% of GDP)"),
    ("imports", "NE.IMP.GNFS.ZS", "Imports of goods and services (% of GDP)"),
    ("foreign aid", "DT.ODA.ALLD.CD", "Net official development assistance received (current US$)"),
    ("external debt", "DT.DOD.DECT.CD", "External debt stocks, total (DOD, current US$)"),
    ("debt", "GC.DOD.TOTL.GD.ZS", "Central government debt, total (% of GDP)"),
    ("poverty", "SI.POV.DDAY", "Poverty headcount ratio at $2.15/day (% of population)"),
    ("inequality", "SI.POV.GINI", "Gini index"),
    ("gini", "SI.POV.GINI", "Gini index"),
    ("literacy", "SE.ADT.LITR.ZS", "Literacy rate, adult total (% of people ages 15+)"),
    ("unemployment", "SL.UEM.TOTL.ZS", "Unemployment, total (% of total labor force)"),
    ("inflation", "FP.CPI.TOTL.ZG", "Inflation, consumer prices (annual %)"),
];

static COUNTRY_CODES: &[(&str, &str)] = &[
    ("united states", "US"), ("america", "US"), ("usa", "US"), ("u.s.", "US"),
    ("china", "CN"), ("chinese", "CN"),
    ("india", "IN"), ("indian", "IN"),
    ("japan", "JP"), ("japanese", "JP"),
    ("germany", "DE"), ("german", "DE"),
    ("united kingdom", "GB"), ("uk", "GB"), ("britain", "GB"), ("british", "GB"),
    ("france", "FR"), ("french", "FR"),
    ("brazil", "BR"), ("brazilian", "BR"),
    ("canada", "CA"), ("canadian", "CA"),
    ("russia", "RU"), ("russian", "RU"),
    ("australia", "AU"), ("australian", "AU"),
    ("mexico", "MX"), ("mexican", "MX"),
    ("south korea", "KR"), ("korea", "KR"),
    ("italy", "IT"), ("italian", "IT"),
    ("spain", "ES"), ("spanish", "ES"),
    ("nigeria", "NG"),
    ("south africa", "ZA"),
    ("indonesia", "ID"),
    ("turkey", "TR"),
    ("saudi arabia", "SA"),
    ("argentina", "AR"),
    ("world", "WLD"),
    ("global", "WLD"),
];

fn match_indicator(claim_text: &str) -> Option<(&'static str, &'static str)> {
    let lower = claim_text.to_lowercase();
    let mut entries: Vec<&(&str, &str, &str)> = INDICATOR_MAP.iter().collect();
    entries.sort_by_key(|(kw, _, _)| std::cmp::Reverse(kw.len()));
    entries
        .iter()
        .find(|(kw, _, _)| lower.contains(kw))
        .map(|(_, code, desc)| (*code, *desc))
}

fn extract_country(claim_text: &str) -> &'static str {
    let lower = claim_text.to_lowercase();
    let mut entries: Vec<&(&str, &str)> = COUNTRY_CODES.iter().collect();
    entries.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));
    entries
        .iter()
        .find(|(name, _)| lower.contains(name))
        .map(|(_, code)| *code)
        .unwrap_or("WLD")
}

fn format_observation(year: &str, val: f64) -> String {
    let abs = val.abs();
    if abs >= 1e9 {
        format!("{}: ${:.1}B", year, val / 1e9)
    } else if abs >= 1e6 {
        format!("{}: ${:.1}M", year, val / 1e6)
    } else if abs < 100.0 {
        format!("{}: {:.1}%", year, val)
    } else {
        format!("{}: {:.0}", year, val)
    }
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    let Some((indicator_code, indicator_desc)) = match_indicator(claim_text) else {
        return vec![];
    };
    let country = extract_country(claim_text);

    let mut snippet = format!(
        "{}. Source: World Bank. Country: {}.",
        indicator_desc, country
    );

    if let Some(data) = ctx
        .http
        .get_json(
            &format!("{}/country/{}/indicator/{}", BASE_URL, country, indicator_code),
            "worldbank",
            &[("format", "json"), ("date", "2015:2024"), ("per_page", "10")],
            &[],
        )
        .await
    {
        // World Bank wraps records as [metadata, data_array]
        if let Some(records) = data.as_array().and_then(|a| a.get(1)).and_then(|r| r.as_array()) {
            let mut country_name = country.to_string();
            let values: Vec<String> = records
                .iter()
                .filter_map(|rec| {
                    let val = rec["value"].as_f64()?;
                    let year = rec["date"].as_str().unwrap_or("");
                    if let Some(name) = rec["country"]["value"].as_str() {
                        country_name = name.to_string();
                    }
                    Some(format_observation(year, val))
                })
                .take(8)
                .collect();
            if !values.is_empty() {
                snippet = format!(
                    "{} - {}. Source: World Bank. Data: {}.",
                    indicator_desc,
                    country_name,
                    values.join("; ")
                );
            }
        }
    }

    let results = vec![EvidenceResult {
        url: format!(
            "https://data.worldbank.org/indicator/{}?locations={}",
            indicator_code, country
        ),
        title: format!("World Bank: {} ({})", indicator_desc, country),
        source_name: "worldbank",
        evidence_type: "dataset",
        snippet: snippet.chars().take(2000).collect(),
        evidence_date: String::new(),
    }];

    results.into_iter().take(max_results).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_longest_match() {
        assert_eq!(
            match_indicator("gdp per capita in Japan doubled").map(|(c, _)| c),
            Some("NY.GDP.PCAP.CD")
        );
        assert_eq!(
            match_indicator("gdp in Japan doubled").map(|(c, _)| c),
            Some("NY.GDP.MKTP.CD")
        );
    }

    #[test]
    fn country_extraction_defaults_to_world() {
        assert_eq!(extract_country("gdp of china grew"), "CN");
        assert_eq!(extract_country("south korea exports rose"), "KR");
        assert_eq!(extract_country("gdp grew"), "WLD");
    }
}
