//! Configuration loaded from veridex.toml and environment variables

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use once_cell::sync::Lazy;

/// Main configuration structure loaded from veridex.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub assist: AssistConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Claim extraction tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub min_claim_words: usize,
    pub min_claim_chars: usize,
    pub max_claim_chars: usize,
    pub dedup_threshold: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_claim_words: 7,
            min_claim_chars: 40,
            max_claim_chars: 240,
            dedup_threshold: 0.85,
        }
    }
}

/// Assist orchestrator defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssistConfig {
    pub max_per_claim: usize,
    /// 0 means no deadline
    pub budget_minutes: u64,
    pub min_suggestion_score: i32,
    pub min_verifiability: i32,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            max_per_claim: 5,
            budget_minutes: 0,
            min_suggestion_score: 5,
            min_verifiability: 5,
        }
    }
}

/// Knowledge graph defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphConfig {
    pub similarity_threshold: f64,
    pub max_block_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.40,
            max_block_size: 500,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub data_dir: PathBuf,
    pub fred_api_key: Option<String>,
    pub patentsview_api_key: Option<String>,
    pub provider_timeout_secs: u64,
    pub html_fetch_timeout_secs: u64,
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("veridex")
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            fred_api_key: None,
            patentsview_api_key: None,
            provider_timeout_secs: 15,
            html_fetch_timeout_secs: 25,
            log_level: "veridex=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self {
            data_dir: std::env::var("VERIDEX_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_data_dir()),
            fred_api_key: std::env::var("FRED_API_KEY").ok(),
            patentsview_api_key: std::env::var("PATENTSVIEW_API_KEY").ok(),
            provider_timeout_secs: std::env::var("VERIDEX_PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            html_fetch_timeout_secs: std::env::var("VERIDEX_HTML_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(25),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "veridex=info".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    /// Uses VERIDEX_CONFIG or defaults to "veridex.toml"; missing file falls
    /// back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path =
            std::env::var("VERIDEX_CONFIG").unwrap_or_else(|_| "veridex.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            toml::from_str(&content)?
        } else {
            tracing::debug!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.runtime = RuntimeConfig::load_from_env();

        // Clamp tuning values that would break invariants
        if config.extraction.dedup_threshold <= 0.0 || config.extraction.dedup_threshold > 1.0 {
            tracing::warn!(
                "dedup_threshold {} out of (0,1], resetting to 0.85",
                config.extraction.dedup_threshold
            );
            config.extraction.dedup_threshold = 0.85;
        }
        if config.graph.similarity_threshold <= 0.0 || config.graph.similarity_threshold > 1.0 {
            tracing::warn!(
                "similarity_threshold {} out of (0,1], resetting to 0.40",
                config.graph.similarity_threshold
            );
            config.graph.similarity_threshold = 0.40;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            assist: AssistConfig::default(),
            graph: GraphConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixed word sets used by the claim extractor
// ---------------------------------------------------------------------------

/// Verbs that indicate a factual statement rather than narrative
pub static ASSERTION_VERBS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "is",
        "are",
        "was",
        "were",
        "has",
        "have",
        "had",
        "shows",
        "show",
        "confirm",
        "confirms",
        "confirmed",
        "found",
        "reveals",
        "reveal",
        "means",
        "meant",
        "will",
        "causes",
        "cause",
        "caused",
        "leads",
        "led",
        "announced",
        "released",
        "proved",
        "proves",
        "demonstrates",
        "established",
    ]
    .into_iter()
    .collect()
});

pub static HEDGE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "might",
        "may",
        "could",
        "possibly",
        "likely",
        "appears",
        "suggests",
        "suggest",
        "perhaps",
        "probably",
        "seemingly",
        "reportedly",
        "allegedly",
    ]
    .into_iter()
    .collect()
});

pub static DEFINITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "confirms",
        "confirm",
        "confirmed",
        "proves",
        "prove",
        "proved",
        "is",
        "are",
        "will",
        "has",
        "have",
        "definitely",
        "certainly",
        "absolutely",
        "establishes",
        "demonstrates",
    ]
    .into_iter()
    .collect()
});

/// Conjunctions that signal a dangling clause, not a self-contained claim
pub static DANGLING_STARTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "and", "but", "while", "because", "so", "which", "that", "or", "nor", "yet", "also",
        "then", "plus",
    ]
    .into_iter()
    .collect()
});

/// Subject-like pronouns that can anchor a claim
pub static SUBJECT_PRONOUNS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "it", "they", "we", "he", "she", "i", "you", "this", "that", "these", "those", "there",
        "one",
    ]
    .into_iter()
    .collect()
});

/// Transcript filler / self-promotion phrases
pub static BOILERPLATE_PATTERNS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "subscribe",
        "like and subscribe",
        "hit the bell",
        "leave a comment",
        "check out",
        "link in the description",
        "sponsored by",
        "thanks for watching",
        "let me know",
        "in the comments",
        "smash that",
        "don't forget to",
        "follow me on",
        "join the",
        "patreon",
        "merch",
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.extraction.min_claim_words, 7);
        assert_eq!(cfg.assist.budget_minutes, 0);
        assert!((cfg.graph.similarity_threshold - 0.40).abs() < 1e-9);
    }

    #[test]
    fn word_sets_disjoint_enough() {
        // "is" is both an assertion verb and definitive; hedges must not overlap definitive
        for w in HEDGE_WORDS.iter() {
            assert!(!DEFINITIVE_WORDS.contains(w), "{} in both sets", w);
        }
    }
}
