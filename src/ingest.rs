//! Intake: register sources and produce their segment blobs.
//!
//! Text files, inline text, and web articles become pseudo-segments here.
//! Audio download and speech-to-text live outside the core: `ingest`
//! registers the source record, and `transcribe` consumes an externally
//! produced segment blob.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, VeridexError};
use crate::models::{now_rfc3339, Segment, Source, SourceType, TranscriptMeta};
use crate::paths::DataPaths;
use crate::segments::{text_to_segments, write_transcript};
use crate::store::Store;

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static NUMERIC_ENTITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#\d+;").expect("valid regex"));
static NAMED_ENTITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&\w+;").expect("valid regex"));

/// Ingest a plain text file as a source
pub fn ingest_text_file(
    store: &mut Store,
    paths: &DataPaths,
    file_path: &str,
    title: &str,
    channel: &str,
) -> Result<Source> {
    let path = std::path::Path::new(file_path);
    let text = std::fs::read_to_string(path).map_err(|e| VeridexError::Intake {
        message: format!("File not found or unreadable: {}: {}", file_path, e),
    })?;
    if text.trim().is_empty() {
        return Err(VeridexError::Intake {
            message: format!("File is empty: {}", file_path),
        });
    }

    let title = if title.is_empty() {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string())
    } else {
        title.to_string()
    };
    let url = path
        .canonicalize()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| file_path.to_string());

    create_text_source(store, paths, &text, &title, channel, &url, SourceType::Text)
}

/// Ingest an inline text buffer as a source
pub fn ingest_raw_text(
    store: &mut Store,
    paths: &DataPaths,
    text: &str,
    title: &str,
    channel: &str,
) -> Result<Source> {
    if text.trim().is_empty() {
        return Err(VeridexError::Intake {
            message: "Text content is empty.".to_string(),
        });
    }
    let title = if title.is_empty() { "Inline Text" } else { title };
    create_text_source(store, paths, text, title, channel, "", SourceType::Text)
}

/// Ingest a web article URL as a source
pub async fn ingest_url(
    store: &mut Store,
    paths: &DataPaths,
    url: &str,
    title: &str,
    channel: &str,
) -> Result<Source> {
    let client = reqwest::Client::builder()
        .user_agent("veridex/0.3 (local research tool)")
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| VeridexError::Intake {
            message: e.to_string(),
        })?;

    let resp = client.get(url).send().await.map_err(|e| VeridexError::Intake {
        message: format!("Fetch failed for {}: {}", url, e),
    })?;
    if !resp.status().is_success() {
        return Err(VeridexError::Intake {
            message: format!("Fetch failed for {}: HTTP {}", url, resp.status()),
        });
    }
    let html = resp.text().await.map_err(|e| VeridexError::Intake {
        message: e.to_string(),
    })?;

    let (page_title, text) = extract_article_text(&html);
    if text.trim().is_empty() {
        return Err(VeridexError::Intake {
            message: format!("No article text could be extracted from: {}", url),
        });
    }

    let title = if title.is_empty() {
        if page_title.is_empty() {
            url.to_string()
        } else {
            page_title
        }
    } else {
        title.to_string()
    };

    create_text_source(store, paths, &text, &title, channel, url, SourceType::Url)
}

/// Register an audio source. Download and transcription are external; the
/// raw directory is created so those tools have a landing spot.
pub fn ingest_audio_source(
    store: &mut Store,
    paths: &DataPaths,
    url: &str,
    title: &str,
    channel: &str,
) -> Result<Source> {
    let source = Source::new(url, title, channel, SourceType::Audio);
    store.insert_source(&source)?;
    paths.raw_dir(&source.id)?;
    tracing::info!(source_id = %source.id, "audio source registered");
    Ok(source)
}

/// Consume an externally produced segment blob for a source: copy it to the
/// canonical transcript path and record the metadata row.
pub fn attach_transcript(
    store: &mut Store,
    paths: &DataPaths,
    source_id: &str,
    segments_path: Option<&str>,
    engine: &str,
) -> Result<TranscriptMeta> {
    if store.get_source(source_id)?.is_none() {
        return Err(VeridexError::Validation {
            message: format!("Source '{}' not found.", source_id),
        });
    }

    let canonical = paths.transcript_path(source_id)?;
    let read_from = match segments_path {
        Some(p) => std::path::PathBuf::from(p),
        None => canonical.clone(),
    };
    let segments = crate::segments::read_transcript(&read_from)?;
    if segments.is_empty() {
        return Err(VeridexError::Intake {
            message: format!("Segment blob is empty: {}", read_from.display()),
        });
    }
    validate_segment_order(&segments)?;

    if read_from != canonical {
        write_transcript(&canonical, &segments)?;
    }

    let tmeta = TranscriptMeta {
        source_id: source_id.to_string(),
        engine: engine.to_string(),
        language: "en".to_string(),
        segment_count: segments.len(),
        transcript_path: canonical.display().to_string(),
        created_at: now_rfc3339(),
    };
    store.upsert_transcript(&tmeta)?;
    Ok(tmeta)
}

fn validate_segment_order(segments: &[Segment]) -> Result<()> {
    let mut prev_start = f64::NEG_INFINITY;
    for (i, s) in segments.iter().enumerate() {
        if s.start > s.end {
            return Err(VeridexError::Validation {
                message: format!("Segment {} has start {} after end {}", i, s.start, s.end),
            });
        }
        if s.start < prev_start {
            return Err(VeridexError::Validation {
                message: format!("Segment {} breaks non-decreasing start order", i),
            });
        }
        prev_start = s.start;
    }
    Ok(())
}

/// Shared tail of every text intake: source row, pseudo-segments, transcript
/// blob, metadata row. Any failure before the source insert leaves the store
/// untouched.
fn create_text_source(
    store: &mut Store,
    paths: &DataPaths,
    text: &str,
    title: &str,
    channel: &str,
    url: &str,
    source_type: SourceType,
) -> Result<Source> {
    let segments = text_to_segments(text);
    if segments.is_empty() {
        return Err(VeridexError::Intake {
            message: "No segments could be created from the text.".to_string(),
        });
    }

    let source = Source::new(url, title, channel, source_type);
    store.insert_source(&source)?;

    let transcript_path = paths.transcript_path(&source.id)?;
    write_transcript(&transcript_path, &segments)?;

    let tmeta = TranscriptMeta {
        source_id: source.id.clone(),
        engine: "text-ingest".to_string(),
        language: "en".to_string(),
        segment_count: segments.len(),
        transcript_path: transcript_path.display().to_string(),
        created_at: now_rfc3339(),
    };
    store.upsert_transcript(&tmeta)?;

    tracing::info!(source_id = %source.id, segments = segments.len(), "text source ingested");
    Ok(source)
}

/// Extract (title, article text) from an HTML page. Prefers article/main
/// content, strips chrome elements, decodes basic entities.
pub fn extract_article_text(html: &str) -> (String, String) {
    let title = TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str()).trim().to_string())
        .unwrap_or_default();

    let document = scraper::Html::parse_document(html);

    // Prefer the article/main region; fall back to body
    let mut content_text = String::new();
    for selector_str in ["article", "main", "body"] {
        let Ok(selector) = scraper::Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            content_text = collect_visible_text(element);
            if !content_text.trim().is_empty() {
                break;
            }
        }
    }
    if content_text.trim().is_empty() {
        content_text = collect_visible_text(document.root_element());
    }

    let text = decode_entities(&content_text);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    (title.chars().take(200).collect(), text)
}

/// Text nodes outside script/style/nav/header/footer/aside
fn collect_visible_text(element: scraper::ElementRef<'_>) -> String {
    let skip: std::collections::HashSet<&str> = [
        "script", "style", "nav", "header", "footer", "aside", "noscript", "head",
    ]
    .into_iter()
    .collect();

    let mut parts = Vec::new();
    for node in element.descendants() {
        if let Some(text) = node.value().as_text() {
            let inside_skipped = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map(|el| skip.contains(el.name()))
                    .unwrap_or(false)
            });
            if !inside_skipped {
                let t = text.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
        }
    }
    parts.join(" ")
}

fn decode_entities(text: &str) -> String {
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    let text = NUMERIC_ENTITY_RE.replace_all(&text, "");
    NAMED_ENTITY_RE.replace_all(&text, "").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_extraction_prefers_article_tag() {
        let html = r#"<html><head><title>Rates Hold &amp; Markets Rally</title></head>
            <body>
              <nav>Home | About | Contact</nav>
              <article><p>The central bank held rates at 4.5 percent.</p>
              <p>Markets rallied on the news.</p></article>
              <footer>Copyright 2025</footer>
            </body></html>"#;
        let (title, text) = extract_article_text(html);
        assert_eq!(title, "Rates Hold & Markets Rally");
        assert!(text.contains("held rates at 4.5 percent"));
        assert!(!text.contains("Home | About"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn segment_order_validation() {
        let good = vec![
            Segment { start: 0.0, end: 5.0, text: "a".into() },
            Segment { start: 5.0, end: 9.0, text: "b".into() },
        ];
        assert!(validate_segment_order(&good).is_ok());

        let inverted = vec![Segment { start: 5.0, end: 2.0, text: "a".into() }];
        assert!(validate_segment_order(&inverted).is_err());

        let regressing = vec![
            Segment { start: 5.0, end: 9.0, text: "a".into() },
            Segment { start: 1.0, end: 2.0, text: "b".into() },
        ];
        assert!(validate_segment_order(&regressing).is_err());
    }
}
