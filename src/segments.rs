//! Segment adapter: converts intake text into the uniform segment sequence
//! the claim extractor consumes, and reads/writes the transcript blob.
//!
//! Non-audio intake produces pseudo-segments: paragraphs first, then
//! sentence-boundary chunks of ~200 chars within long paragraphs. Timestamps
//! are synthetic (20 chars/sec reading rate); only their ordering matters.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Result, VeridexError};
use crate::models::Segment;

/// Approximate target characters per pseudo-segment
const SEGMENT_TARGET_CHARS: usize = 200;

/// Nominal reading rate used for synthetic timestamps
const CHARS_PER_SECOND: f64 = 20.0;

static PARA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));
static SENT_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

/// On-disk transcript blob shape
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptBlob {
    pub segments: Vec<Segment>,
}

/// Split text into pseudo-segments with monotone synthetic timestamps
pub fn text_to_segments(text: &str) -> Vec<Segment> {
    let text: String = text.nfc().collect();
    let mut segments = Vec::new();
    let mut fake_ts = 0.0_f64;

    for para in PARA_RE.split(&text) {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }
        let chunks = if para.len() <= SEGMENT_TARGET_CHARS {
            vec![para.to_string()]
        } else {
            split_into_chunks(para, SEGMENT_TARGET_CHARS)
        };

        for chunk in chunks {
            let chunk = chunk.trim();
            if chunk.len() < 20 {
                continue;
            }
            let duration = (chunk.len() as f64 / CHARS_PER_SECOND).max(1.0);
            segments.push(Segment {
                start: round3(fake_ts),
                end: round3(fake_ts + duration),
                text: chunk.to_string(),
            });
            fake_ts += duration;
        }
    }

    segments
}

/// Split text at sentence endings into chunks of roughly target_chars
fn split_into_chunks(text: &str, target_chars: usize) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut last = 0;
    for m in SENT_END_RE.find_iter(text) {
        sentences.push(text[last..m.start() + 1].trim().to_string());
        last = m.end();
    }
    if last < text.len() {
        let tail = text[last..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for sent in sentences {
        if !current.is_empty() && current.len() + sent.len() > target_chars {
            chunks.push(current.trim().to_string());
            current = sent;
        } else if current.is_empty() {
            current = sent;
        } else {
            current.push(' ');
            current.push_str(&sent);
        }
    }
    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Write the transcript blob for a source
pub fn write_transcript(path: &Path, segments: &[Segment]) -> Result<()> {
    let blob = TranscriptBlob {
        segments: segments.to_vec(),
    };
    let json = serde_json::to_string_pretty(&blob)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load the transcript blob for a source
pub fn read_transcript(path: &Path) -> Result<Vec<Segment>> {
    let raw = std::fs::read_to_string(path).map_err(|e| VeridexError::Intake {
        message: format!("Transcript file missing or unreadable: {}: {}", path.display(), e),
    })?;
    let blob: TranscriptBlob = serde_json::from_str(&raw)?;
    Ok(blob.segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_paragraph_is_one_segment() {
        let segs = text_to_segments("The unemployment rate fell to 3.9 percent in March.");
        assert_eq!(segs.len(), 1);
        assert!(segs[0].start < segs[0].end);
    }

    #[test]
    fn long_paragraph_splits_at_sentence_ends() {
        let para = "The European Central Bank held rates steady at 4.5 percent this quarter. \
                    Inflation across the euro area slowed to 2.4 percent in the latest reading. \
                    Officials signalled that cuts remain possible later in the year if the trend holds. \
                    Markets priced in two quarter-point moves before December.";
        let segs = text_to_segments(para);
        assert!(segs.len() >= 2);
        // timestamps are monotone non-decreasing
        for pair in segs.windows(2) {
            assert!(pair[0].end <= pair[1].start + 1e-9);
        }
    }

    #[test]
    fn paragraph_boundaries_respected() {
        let text = "First paragraph with enough text to survive the filter.\n\n\
                    Second paragraph also long enough to keep around here.";
        let segs = text_to_segments(text);
        assert_eq!(segs.len(), 2);
    }

    #[test]
    fn tiny_chunks_dropped() {
        let segs = text_to_segments("Short.\n\nAlso tiny.");
        assert!(segs.is_empty());
    }
}
