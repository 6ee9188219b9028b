//! Export: source-cited briefs as Markdown or JSON, plus the claims.json
//! written on extraction.
//!
//! Briefs never dump the full transcript: source metadata, the claim list
//! with status and evidence, and short timestamped quotes only.

use serde_json::json;

use crate::error::{Result, VeridexError};
use crate::models::{now_rfc3339, Claim};
use crate::paths::DataPaths;
use crate::store::Store;

pub const DEFAULT_MAX_QUOTES: usize = 10;

/// Format seconds as HH:MM:SS
pub fn fmt_ts(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (h, rem) = (total / 3600, total % 3600);
    let (m, s) = (rem / 60, rem % 60);
    format!("{:02}:{:02}:{:02}", h, m, s)
}

/// Write claims.json for a source after extraction
pub fn write_claims_json(paths: &DataPaths, source_id: &str, claims: &[Claim]) -> Result<()> {
    let payload: Vec<serde_json::Value> = claims
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "text": c.text,
                "ts_start": c.ts_start,
                "ts_end": c.ts_end,
                "confidence_language": c.confidence_language,
                "category": c.category,
                "claim_hash": &c.claim_hash[..c.claim_hash.len().min(16)],
                "claim_hash_global": &c.claim_hash_global[..c.claim_hash_global.len().min(16)],
                "signals": c.signals,
                "status": c.status,
            })
        })
        .collect();

    let out = paths.export_dir(source_id)?.join("claims.json");
    std::fs::write(&out, serde_json::to_string_pretty(&payload)?)?;
    Ok(())
}

fn build_brief_data(
    store: &Store,
    source_id: &str,
    max_quotes: usize,
) -> Result<serde_json::Value> {
    let source = store
        .get_source(source_id)?
        .ok_or_else(|| VeridexError::Validation {
            message: format!("Source '{}' not found.", source_id),
        })?;

    let claims = store.get_claims_for_source(source_id)?;
    let mut claims_data = Vec::new();

    for c in claims.iter().take(max_quotes) {
        let evidence = store.get_evidence_for_claim(&c.id)?;
        let suggestions = store.get_suggestions_for_claim(&c.id, 3)?;
        claims_data.push(json!({
            "id": c.id,
            "text": c.text,
            "timestamp": format!("{} - {}", fmt_ts(c.ts_start), fmt_ts(c.ts_end)),
            "confidence": c.confidence_language,
            "category": c.category,
            "final_status": c.final_status(),
            "status_auto": c.status_auto,
            "auto_confidence": (c.auto_confidence * 100.0).round() / 100.0,
            "status_human": c.status_human,
            "evidence": evidence.iter().map(|e| json!({
                "url": e.url,
                "type": e.evidence_type,
                "strength": e.strength,
                "notes": e.notes,
            })).collect::<Vec<_>>(),
            "evidence_suggestions": suggestions.iter().map(|s| json!({
                "url": s.url,
                "title": s.title,
                "source": s.source_name,
                "score": s.score,
            })).collect::<Vec<_>>(),
        }));
    }

    Ok(json!({
        "title": source.title,
        "url": source.url,
        "channel": source.channel,
        "upload_date": source.upload_date,
        "duration": fmt_ts(source.duration_seconds),
        "source_id": source.id,
        "total_claims": claims.len(),
        "exported_claims": claims_data.len(),
        "generated_at": now_rfc3339(),
        "claims": claims_data,
    }))
}

/// Write brief.json and return its path
pub fn export_json(
    store: &Store,
    paths: &DataPaths,
    source_id: &str,
    max_quotes: usize,
) -> Result<String> {
    let data = build_brief_data(store, source_id, max_quotes)?;
    let out = paths.export_dir(source_id)?.join("brief.json");
    std::fs::write(&out, serde_json::to_string_pretty(&data)?)?;
    Ok(out.display().to_string())
}

/// Write brief.md and return its path
pub fn export_markdown(
    store: &Store,
    paths: &DataPaths,
    source_id: &str,
    max_quotes: usize,
) -> Result<String> {
    let d = build_brief_data(store, source_id, max_quotes)?;

    let mut lines: Vec<String> = vec![
        format!("# Veridex Brief: {}", d["title"].as_str().unwrap_or("")),
        String::new(),
        format!("**Source:** {}  ", d["url"].as_str().unwrap_or("")),
        format!("**Channel:** {}  ", d["channel"].as_str().unwrap_or("")),
        format!("**Uploaded:** {}  ", d["upload_date"].as_str().unwrap_or("")),
        format!("**Duration:** {}  ", d["duration"].as_str().unwrap_or("")),
        format!("**Source ID:** `{}`  ", d["source_id"].as_str().unwrap_or("")),
        format!("**Total claims extracted:** {}  ", d["total_claims"]),
        format!("**Generated:** {}  ", d["generated_at"].as_str().unwrap_or("")),
        String::new(),
        "---".to_string(),
        String::new(),
        "## Claims".to_string(),
        String::new(),
    ];

    for (i, c) in d["claims"].as_array().cloned().unwrap_or_default().iter().enumerate() {
        let final_status = c["final_status"].as_str().unwrap_or("unknown");
        let status_icon = match final_status {
            "supported" => "✅",
            "contradicted" => "❌",
            "partial" => "⚠️",
            _ => "❓",
        };

        let provenance = if c["status_human"].as_str().is_some() {
            "HUMAN".to_string()
        } else if c["status_auto"].as_str().unwrap_or("unknown") != "unknown" {
            format!(
                "AUTO ({:.0}%)",
                c["auto_confidence"].as_f64().unwrap_or(0.0) * 100.0
            )
        } else {
            "UNVERIFIED".to_string()
        };

        lines.push(format!(
            "### {}. {} [{}] ({}) — {}",
            i + 1,
            status_icon,
            final_status.to_uppercase(),
            c["confidence"].as_str().unwrap_or("unknown"),
            provenance
        ));
        lines.push(String::new());
        lines.push(format!("> \"{}\"", c["text"].as_str().unwrap_or("")));
        lines.push(">".to_string());
        lines.push(format!(
            "> *Timestamp: {}  |  Category: {}*",
            c["timestamp"].as_str().unwrap_or(""),
            c["category"].as_str().unwrap_or("general")
        ));
        lines.push(String::new());

        let evidence = c["evidence"].as_array().cloned().unwrap_or_default();
        if !evidence.is_empty() {
            lines.push("**Evidence (human-verified):**".to_string());
            for ev in &evidence {
                lines.push(format!(
                    "- [{}] ({}) {}",
                    ev["type"].as_str().unwrap_or("other"),
                    ev["strength"].as_str().unwrap_or("medium"),
                    ev["url"].as_str().unwrap_or("")
                ));
                if let Some(notes) = ev["notes"].as_str() {
                    if !notes.is_empty() {
                        lines.push(format!("  - {}", notes));
                    }
                }
            }
            lines.push(String::new());
        }

        let suggestions = c["evidence_suggestions"].as_array().cloned().unwrap_or_default();
        if !suggestions.is_empty() {
            lines.push("**Evidence suggestions (auto-discovered):**".to_string());
            for s in &suggestions {
                lines.push(format!(
                    "- [{}] (score: {}) {}",
                    s["source"].as_str().unwrap_or(""),
                    s["score"],
                    s["url"].as_str().unwrap_or("")
                ));
                if let Some(title) = s["title"].as_str() {
                    if !title.is_empty() {
                        lines.push(format!("  - {}", title.chars().take(100).collect::<String>()));
                    }
                }
            }
            lines.push(String::new());
        }
    }

    lines.push("---".to_string());
    lines.push(String::new());
    lines.push("*Generated by Veridex — local claim extraction engine.*".to_string());
    lines.push(String::new());

    let out = paths.export_dir(source_id)?.join("brief.md");
    std::fs::write(&out, lines.join("\n"))?;
    Ok(out.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_formatting() {
        assert_eq!(fmt_ts(0.0), "00:00:00");
        assert_eq!(fmt_ts(61.4), "00:01:01");
        assert_eq!(fmt_ts(3725.0), "01:02:05");
    }
}
