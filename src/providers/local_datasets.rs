//! Local dataset evidence source: match claims against user-supplied
//! CSV/XLSX files in the datasets directory. No network, zero latency.
//!
//! Follows the statistical-source pattern: cheap keyword pre-filter over a
//! per-file text index, then precise row scoring.

use calamine::{open_workbook_auto, Data, Reader};
use lru::LruCache;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{EvidenceResult, SearchContext};
use crate::textutil::{claim_numbers_expanded, PROPER_NOUN_RE};

/// Safety cap on rows read from a single file
const MAX_ROWS: usize = 10_000;

/// Files larger than this need stronger pre-filter evidence
const LARGE_FILE_ROWS: usize = 500;

/// Minimum row score before a row becomes a result
const MIN_ROW_SCORE: i32 = 10;

static ROW_STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "has", "have", "had", "be", "been", "to",
        "of", "in", "for", "on", "at", "by", "with", "from", "as", "and", "but", "or", "not",
        "that", "this", "it",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug)]
struct Dataset {
    filename: String,
    path: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    /// All cell values concatenated, case-folded, for fast substring checks
    text_index: String,
}

/// Parsed-file cache keyed by (path, mtime, size); bounded
static CACHE: Lazy<Mutex<LruCache<String, Arc<Dataset>>>> = Lazy::new(|| {
    Mutex::new(LruCache::new(
        NonZeroUsize::new(64).expect("nonzero capacity"),
    ))
});

fn file_key(path: &Path) -> Option<String> {
    let meta = std::fs::metadata(path).ok()?;
    let mtime = meta
        .modified()
        .ok()?
        .duration_since(std::time::UNIX_EPOCH)
        .ok()?;
    Some(format!(
        "{}:{}:{}",
        path.display(),
        mtime.as_secs(),
        meta.len()
    ))
}

fn load_csv(path: &Path) -> Option<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .ok()?;
    let headers: Vec<String> = reader
        .headers()
        .ok()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() {
        return None;
    }

    let mut rows = Vec::new();
    for record in reader.records().take(MAX_ROWS) {
        match record {
            Ok(r) => rows.push(r.iter().map(|c| c.trim().to_string()).collect()),
            Err(_) => continue,
        }
    }

    Some(build_dataset(path, headers, rows))
}

fn load_xlsx(path: &Path) -> Option<Dataset> {
    let mut workbook = open_workbook_auto(path).ok()?;
    let sheet_name = workbook.sheet_names().first()?.to_string();
    let range = workbook.worksheet_range(&sheet_name).ok()?;

    let mut iter = range.rows();
    let headers: Vec<String> = iter.next()?.iter().map(cell_to_string).collect();
    if headers.is_empty() {
        return None;
    }

    let rows: Vec<Vec<String>> = iter
        .take(MAX_ROWS)
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Some(build_dataset(path, headers, rows))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if (f - f.round()).abs() < 1e-9 {
                format!("{}", f.round() as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn build_dataset(path: &Path, headers: Vec<String>, rows: Vec<Vec<String>>) -> Dataset {
    let mut text_index = headers.join(" ");
    for row in &rows {
        text_index.push(' ');
        text_index.push_str(&row.join(" "));
    }
    Dataset {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        path: path.display().to_string(),
        headers,
        rows,
        text_index: text_index.to_lowercase(),
    }
}

fn load_all(dir: &Path) -> Vec<Arc<Dataset>> {
    let mut datasets = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return datasets,
    };

    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()).map(str::to_lowercase),
                Some(ref ext) if ext == "csv" || ext == "xlsx"
            )
        })
        .collect();
    paths.sort();

    for path in paths {
        let Some(key) = file_key(&path) else { continue };
        let cached = CACHE.lock().ok().and_then(|mut c| c.get(&key).cloned());
        if let Some(ds) = cached {
            datasets.push(ds);
            continue;
        }

        let loaded = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => load_csv(&path),
            _ => load_xlsx(&path),
        };
        if let Some(ds) = loaded {
            let ds = Arc::new(ds);
            if let Ok(mut cache) = CACHE.lock() {
                cache.put(key, ds.clone());
            }
            datasets.push(ds);
        } else {
            tracing::warn!(path = %path.display(), "skipping unreadable dataset file");
        }
    }

    datasets
}

fn claim_terms(claim_text: &str) -> Vec<String> {
    claim_text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| ".,!?;:\"'()[]$%".contains(c))
                .to_lowercase()
        })
        .filter(|w| w.len() > 2 && !ROW_STOP_WORDS.contains(w.as_str()))
        .collect()
}

struct RowMatch {
    score: i32,
    snippet: String,
    num_matches: Vec<String>,
}

fn find_matching_rows(
    ds: &Dataset,
    claim_words: &[String],
    claim_phrases: &[String],
    claim_nums: &HashSet<String>,
) -> Vec<RowMatch> {
    let mut matches = Vec::new();

    for row in &ds.rows {
        let row_text = row.join(" ").to_lowercase();

        let mut num_matches: Vec<String> = claim_nums
            .iter()
            .filter(|n| row_text.contains(n.as_str()))
            .cloned()
            .collect();
        num_matches.sort();

        let mut score = num_matches.len() as i32 * 20;
        score += claim_phrases
            .iter()
            .filter(|p| row_text.contains(p.as_str()))
            .count() as i32
            * 15;
        score += claim_words
            .iter()
            .filter(|w| row_text.contains(w.as_str()))
            .count() as i32
            * 3;

        if score < MIN_ROW_SCORE {
            continue;
        }

        let snippet: String = ds
            .headers
            .iter()
            .zip(row.iter())
            .filter(|(_, v)| !v.is_empty())
            .map(|(h, v)| format!("{}: {}", h, v))
            .collect::<Vec<_>>()
            .join(" | ");

        matches.push(RowMatch {
            score,
            snippet: snippet.chars().take(2000).collect(),
            num_matches,
        });
    }

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches.truncate(5);
    matches
}

/// Search the datasets directory for rows matching a claim
pub fn search(claim_text: &str, max_results: usize, ctx: &SearchContext<'_>) -> Vec<EvidenceResult> {
    let Ok(dir) = ctx.paths.datasets_dir() else {
        return vec![];
    };
    let datasets = load_all(&dir);
    if datasets.is_empty() {
        return vec![];
    }

    let claim_nums = claim_numbers_expanded(claim_text);
    let claim_words = claim_terms(claim_text);
    let claim_phrases: Vec<String> = PROPER_NOUN_RE
        .find_iter(claim_text)
        .map(|m| m.as_str().to_lowercase())
        .collect();

    let mut results = Vec::new();

    for ds in &datasets {
        // Pre-filter: at least one significant number or two term overlaps.
        // Large files need a 3+ digit number or three term overlaps.
        let big_num_hit = claim_nums
            .iter()
            .any(|n| n.chars().filter(|c| c.is_ascii_digit()).count() >= 3 && ds.text_index.contains(n.as_str()));
        let any_num_hit = claim_nums.iter().any(|n| ds.text_index.contains(n.as_str()));
        let term_hits = claim_words
            .iter()
            .filter(|w| w.len() > 3 && ds.text_index.contains(w.as_str()))
            .count();

        let relevant = if ds.rows.len() > LARGE_FILE_ROWS {
            big_num_hit || term_hits >= 3
        } else {
            any_num_hit || term_hits >= 2
        };
        if !relevant {
            continue;
        }

        // Filename relevance sharpens ambiguous matches
        let filename_lower = ds.filename.to_lowercase();
        let filename_bonus = if claim_words.iter().any(|w| filename_lower.contains(w.as_str())) {
            10
        } else {
            0
        };

        for mut m in find_matching_rows(ds, &claim_words, &claim_phrases, &claim_nums) {
            m.score += filename_bonus;
            let mut snippet = m.snippet;
            if !m.num_matches.is_empty() {
                let shown: Vec<&str> = m.num_matches.iter().take(3).map(|s| s.as_str()).collect();
                snippet = format!("[Exact number match: {}] {}", shown.join(", "), snippet);
            }

            results.push((
                m.score,
                EvidenceResult {
                    url: format!("file://{}", ds.path),
                    title: format!("Local Dataset: {} ({} rows)", ds.filename, ds.rows.len())
                        .chars()
                        .take(200)
                        .collect(),
                    source_name: "local_dataset",
                    evidence_type: "dataset",
                    snippet: snippet.chars().take(4000).collect(),
                    evidence_date: String::new(),
                },
            ));
        }
    }

    results.sort_by(|a, b| b.0.cmp(&a.0));
    results
        .into_iter()
        .take(max_results)
        .map(|(_, r)| r)
        .collect()
}
