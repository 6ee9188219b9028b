//! Wikidata: structured entity facts (founding dates, headquarters,
//! revenue, population) via the Action API.
//!
//! Two-step: wbsearchentities by the claim's most likely entity name, then
//! wbgetentities for the top hit's claims, flattened into a fact snippet.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{EvidenceResult, SearchContext};
use crate::textutil::PROPER_NOUN_RE;

const API_URL: &str = "https://www.wikidata.org/w/api.php";

/// Properties worth surfacing during verification
static USEFUL_PROPERTIES: &[(&str, &str)] = &[
    ("P571", "inception/founding date"),
    ("P159", "headquarters location"),
    ("P1128", "number of employees"),
    ("P2139", "total revenue"),
    ("P169", "chief executive officer"),
    ("P112", "founded by"),
    ("P17", "country"),
    ("P1082", "population"),
    ("P569", "date of birth"),
    ("P570", "date of death"),
    ("P27", "country of citizenship"),
    ("P19", "place of birth"),
    ("P106", "occupation"),
    ("P108", "employer"),
    ("P576", "dissolved/abolished date"),
    ("P856", "official website"),
    ("P625", "coordinate location"),
    ("P2142", "box office"),
    ("P577", "publication date"),
    ("P50", "author"),
    ("P136", "genre"),
];

static ACRONYM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{2,6}\b").expect("valid regex"));

static ACRONYM_SKIP: &[&str] = &["I", "A", "THE", "AND", "BUT", "FOR", "NOT", "WAS", "HAS"];

pub fn has_entity_relevance(claim_text: &str) -> bool {
    !extract_entity_query(claim_text).is_empty()
}

/// The most likely entity name: multi-word proper noun, then acronym, then
/// a capitalised mid-sentence word
fn extract_entity_query(claim_text: &str) -> String {
    if let Some(m) = PROPER_NOUN_RE.find(claim_text) {
        return m.as_str().to_string();
    }
    for m in ACRONYM_RE.find_iter(claim_text) {
        if !ACRONYM_SKIP.contains(&m.as_str()) {
            return m.as_str().to_string();
        }
    }
    for (i, w) in claim_text.split_whitespace().enumerate() {
        if i > 0
            && w.chars().next().is_some_and(|c| c.is_uppercase())
            && w.chars().all(|c| c.is_alphabetic())
            && w.len() > 2
        {
            return w.to_string();
        }
    }
    String::new()
}

/// Render a snak value (time, quantity, text, entity id) as a short string
fn format_value(snak: &serde_json::Value) -> String {
    let dv = &snak["datavalue"];
    let val = &dv["value"];
    match dv["type"].as_str().unwrap_or("") {
        "string" => val.as_str().unwrap_or("").to_string(),
        "time" => val["time"]
            .as_str()
            .map(|t| t.trim_start_matches('+').split('T').next().unwrap_or("").to_string())
            .unwrap_or_default(),
        "quantity" => {
            let amount = val["amount"].as_str().unwrap_or("");
            let unit = val["unit"].as_str().unwrap_or("1");
            let unit_id = unit.rsplit('/').next().unwrap_or("1");
            if unit_id == "1" {
                amount.to_string()
            } else {
                format!("{} ({})", amount, unit_id)
            }
        }
        "monolingualtext" => val["text"].as_str().unwrap_or("").to_string(),
        "wikibase-entityid" => val["id"].as_str().unwrap_or("").to_string(),
        _ => val.to_string().chars().take(100).collect(),
    }
}

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    let entity_query = extract_entity_query(claim_text);
    if entity_query.is_empty() {
        return vec![];
    }

    let Some(search_data) = ctx
        .http
        .get_json(
            API_URL,
            "wikidata",
            &[
                ("action", "wbsearchentities"),
                ("search", entity_query.as_str()),
                ("language", "en"),
                ("limit", "3"),
                ("format", "json"),
            ],
            &[],
        )
        .await
    else {
        return vec![];
    };

    let search_results = search_data["search"].as_array().cloned().unwrap_or_default();
    let Some(top) = search_results.first() else {
        return vec![];
    };
    let entity_id = top["id"].as_str().unwrap_or("");
    let entity_label = top["label"].as_str().unwrap_or(&entity_query);
    let entity_desc = top["description"].as_str().unwrap_or("");
    if entity_id.is_empty() {
        return vec![];
    }

    let Some(entity_data) = ctx
        .http
        .get_json(
            API_URL,
            "wikidata",
            &[
                ("action", "wbgetentities"),
                ("ids", entity_id),
                ("languages", "en"),
                ("props", "claims|descriptions"),
                ("format", "json"),
            ],
            &[],
        )
        .await
    else {
        return vec![];
    };

    let claims_data = &entity_data["entities"][entity_id]["claims"];
    let mut facts: Vec<String> = Vec::new();
    if !entity_desc.is_empty() {
        facts.push(format!("{}: {}", entity_label, entity_desc));
    }

    for (prop_id, prop_label) in USEFUL_PROPERTIES {
        let Some(prop_claims) = claims_data[*prop_id].as_array() else {
            continue;
        };
        for pc in prop_claims.iter().take(2) {
            let value = format_value(&pc["mainsnak"]);
            if !value.is_empty() {
                facts.push(format!("{}: {}", prop_label, value));
            }
        }
    }

    if facts.is_empty() {
        return vec![];
    }
    facts.truncate(15);

    let mut results = vec![EvidenceResult {
        url: format!("https://www.wikidata.org/wiki/{}", entity_id),
        title: format!("Wikidata: {}", entity_label),
        source_name: "wikidata",
        evidence_type: "dataset",
        snippet: facts.join("; ").chars().take(2000).collect(),
        evidence_date: String::new(),
    }];

    for sr in search_results.iter().skip(1).take(max_results.saturating_sub(1)) {
        let label = sr["label"].as_str().unwrap_or("");
        let desc = sr["description"].as_str().unwrap_or("");
        let id = sr["id"].as_str().unwrap_or("");
        if label.is_empty() || id.is_empty() {
            continue;
        }
        results.push(EvidenceResult {
            url: format!("https://www.wikidata.org/wiki/{}", id),
            title: format!("Wikidata: {}", label),
            source_name: "wikidata",
            evidence_type: "dataset",
            snippet: format!("{}: {}", label, desc).chars().take(2000).collect(),
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
    fn entity_query_prefers_multiword_proper_nouns() {
        assert_eq!(
            extract_entity_query("Goldman Sachs was founded in 1869"),
            "Goldman Sachs"
        );
        assert_eq!(extract_entity_query("NASA launched the probe"), "NASA");
        assert_eq!(
            extract_entity_query("the launch by Nvidia was delayed"),
            "Nvidia"
        );
        assert_eq!(extract_entity_query("no entities at all here"), "");
    }

    #[test]
    fn formats_time_and_quantity_values() {
        let time_snak = serde_json::json!({
            "datavalue": {"type": "time", "value": {"time": "+1976-04-01T00:00:00Z"}}
        });
        assert_eq!(format_value(&time_snak), "1976-04-01");

        let qty_snak = serde_json::json!({
            "datavalue": {"type": "quantity", "value": {"amount": "+164000", "unit": "1"}}
        });
        assert_eq!(format_value(&qty_snak), "+164000");
    }
}
