//! Record types shared across the veridex engine

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Generate a short id: first 12 hex chars of a random UUID
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Current timestamp as RFC 3339 UTC
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// What kind of intake produced a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Audio,
    Text,
    Pdf,
    Url,
    Filing,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Audio => "audio",
            SourceType::Text => "text",
            SourceType::Pdf => "pdf",
            SourceType::Url => "url",
            SourceType::Filing => "filing",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "text" => SourceType::Text,
            "pdf" => SourceType::Pdf,
            "url" => SourceType::Url,
            "filing" => SourceType::Filing,
            _ => SourceType::Audio,
        }
    }
}

/// An ingested source (talk, article, filing, ...). Immutable after intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub url: String,
    pub title: String,
    pub channel: String,
    pub upload_date: String,
    pub source_type: SourceType,
    pub duration_seconds: f64,
    pub local_audio_path: String,
    pub created_at: String,
}

impl Source {
    pub fn new(url: &str, title: &str, channel: &str, source_type: SourceType) -> Self {
        Self {
            id: new_id(),
            url: url.to_string(),
            title: title.to_string(),
            channel: channel.to_string(),
            upload_date: String::new(),
            source_type,
            duration_seconds: 0.0,
            local_audio_path: String::new(),
            created_at: now_rfc3339(),
        }
    }
}

/// Metadata row stored in the DB; actual segments live in transcript.json on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMeta {
    pub source_id: String,
    pub engine: String,
    pub language: String,
    pub segment_count: usize,
    pub transcript_path: String,
    pub created_at: String,
}

/// Single transcript segment: kept in the JSON blob, never row-level
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// A self-contained factual sentence extracted from a source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    pub source_id: String,
    pub text: String,
    pub ts_start: f64,
    pub ts_end: f64,
    pub speaker: Option<String>,
    /// hedged | definitive | unknown
    pub confidence_language: String,
    /// supported | contradicted | partial | unknown (legacy human-set field)
    pub status: String,
    pub category: String,
    /// Year extracted from claim text, e.g. "2022"
    pub claim_date: String,
    /// SHA256(source_id + normalised text): same-source dedup
    pub claim_hash: String,
    /// SHA256(normalised text): cross-source identity
    pub claim_hash_global: String,
    /// Pipe-delimited rule signals, e.g. "number|named_entity|assertion_verb"
    pub signals: String,
    /// supported | partial | unknown
    pub status_auto: String,
    pub auto_confidence: f64,
    /// Human override, wins over everything
    pub status_human: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Claim {
    /// Human override wins; otherwise auto; otherwise legacy `status`.
    pub fn final_status(&self) -> &str {
        if let Some(h) = &self.status_human {
            return h;
        }
        if self.status_auto != "unknown" {
            return &self.status_auto;
        }
        &self.status
    }
}

/// Human-attached evidence. Authoritative; never touched by automation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    pub claim_id: String,
    pub url: String,
    pub title: String,
    /// primary|secondary|dataset|filing|gov|paper|factcheck|other
    pub evidence_type: String,
    /// strong|medium|weak
    pub strength: String,
    pub notes: String,
    pub created_at: String,
}

/// Auto-discovered evidence candidate. Rebuilt on each assist run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceSuggestion {
    pub id: String,
    pub claim_id: String,
    pub url: String,
    pub title: String,
    pub source_name: String,
    pub evidence_type: String,
    /// 0-100
    pub score: i32,
    pub signals: String,
    pub snippet: String,
    pub created_at: String,
}

/// Cross-source cluster: group of claims about the same fact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimCluster {
    pub id: String,
    pub representative_text: String,
    pub category: String,
    pub claim_count: usize,
    pub source_count: usize,
    pub best_status: String,
    pub best_confidence: f64,
    pub consensus_score: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Membership row linking a claim into a cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterMember {
    pub cluster_id: String,
    pub claim_id: String,
    pub fingerprint: String,
    pub similarity_to_rep: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_is_12_hex() {
        let id = new_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn final_status_prefers_human() {
        let mut c = test_claim();
        c.status_auto = "partial".into();
        c.status_human = Some("contradicted".into());
        assert_eq!(c.final_status(), "contradicted");
    }

    #[test]
    fn final_status_falls_back_to_auto_then_legacy() {
        let mut c = test_claim();
        c.status_auto = "supported".into();
        assert_eq!(c.final_status(), "supported");
        c.status_auto = "unknown".into();
        c.status = "partial".into();
        assert_eq!(c.final_status(), "partial");
    }

    fn test_claim() -> Claim {
        Claim {
            id: new_id(),
            source_id: new_id(),
            text: String::new(),
            ts_start: 0.0,
            ts_end: 0.0,
            speaker: None,
            confidence_language: "unknown".into(),
            status: "unknown".into(),
            category: "general".into(),
            claim_date: String::new(),
            claim_hash: String::new(),
            claim_hash_global: String::new(),
            signals: String::new(),
            status_auto: "unknown".into(),
            auto_confidence: 0.0,
            status_human: None,
            created_at: now_rfc3339(),
            updated_at: now_rfc3339(),
        }
    }
}
