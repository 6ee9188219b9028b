//! arXiv: preprint search over the Atom feed.
//!
//! Recommended cadence is one request per 3 seconds; the throttle enforces
//! it. Same academic pre-filter as the paper search.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::crossref::has_academic_relevance;
use super::query::build_search_query;
use super::{EvidenceResult, SearchContext};

const BASE_URL: &str = "https://export.arxiv.org/api/query";

pub async fn search(
    claim_text: &str,
    max_results: usize,
    ctx: &SearchContext<'_>,
) -> Vec<EvidenceResult> {
    if !has_academic_relevance(claim_text) {
        return vec![];
    }
    let query = build_search_query(claim_text, 8);
    if query.is_empty() {
        return vec![];
    }

    let search_query = format!("all:{}", query);
    let max = max_results.to_string();
    let Some(xml) = ctx
        .http
        .get_text(
            BASE_URL,
            "arxiv",
            &[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max.as_str()),
                ("sortBy", "relevance"),
                ("sortOrder", "descending"),
            ],
            &[],
        )
        .await
    else {
        return vec![];
    };

    parse_atom_entries(&xml)
}

/// Pull (title, summary, id) out of each Atom `<entry>`
fn parse_atom_entries(xml: &str) -> Vec<EvidenceResult> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut results = Vec::new();
    let mut in_entry = false;
    let mut field: Option<&'static str> = None;
    let mut title = String::new();
    let mut summary = String::new();
    let mut id = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"entry" => {
                    in_entry = true;
                    title.clear();
                    summary.clear();
                    id.clear();
                }
                b"title" if in_entry => field = Some("title"),
                b"summary" if in_entry => field = Some("summary"),
                b"id" if in_entry => field = Some("id"),
                _ => field = None,
            },
            Ok(Event::Text(t)) => {
                if let (true, Some(f)) = (in_entry, field) {
                    let text = t.unescape().unwrap_or_default();
                    match f {
                        "title" => title.push_str(&text),
                        "summary" => summary.push_str(&text),
                        "id" => id.push_str(&text),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"entry" => {
                    in_entry = false;
                    let title = title.replace('\n', " ").trim().to_string();
                    let url = id.trim().to_string();
                    if !title.is_empty() && !url.is_empty() {
                        let snippet: String =
                            summary.replace('\n', " ").trim().chars().take(300).collect();
                        results.push(EvidenceResult {
                            url,
                            title: title.chars().take(200).collect(),
                            source_name: "arxiv",
                            evidence_type: "paper",
                            snippet,
                            evidence_date: String::new(),
                        });
                    }
                }
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_atom_feed() {
        let xml = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query Results</title>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <title>Scaling Laws for
 Transformer Training</title>
    <summary>We study compute-optimal scaling of transformers.</summary>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00002v1</id>
    <title>Another Paper</title>
    <summary>Summary two.</summary>
  </entry>
</feed>"#;
        let results = parse_atom_entries(xml);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "http://arxiv.org/abs/2401.00001v1");
        assert!(results[0].title.contains("Scaling Laws"));
        assert_eq!(results[0].evidence_type, "paper");
    }

    #[test]
    fn feed_title_outside_entries_ignored() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Results</title></feed>"#;
        assert!(parse_atom_entries(xml).is_empty());
    }
}
