//! Text intake through claim extraction, all on disk: pseudo-segments,
//! transcript blob, store rows, and the claims.json export.

use veridex::config::Config;
use veridex::extract::extract_for_source;
use veridex::ingest::{attach_transcript, ingest_raw_text, ingest_text_file};
use veridex::models::SourceType;
use veridex::paths::DataPaths;
use veridex::segments::{read_transcript, write_transcript};
use veridex::store::Store;

const ARTICLE: &str = "\
The European Central Bank held interest rates at 4.5 percent on Thursday. \
President Christine Lagarde said inflation across the euro area slowed to 2.4 percent.

Markets rallied after the announcement. Analysts at Goldman Sachs now expect \
two quarter-point cuts before December 2025.";

fn setup(root: &std::path::Path) -> (Store, DataPaths, Config) {
    let mut config = Config::default();
    config.runtime.data_dir = root.to_path_buf();
    let paths = DataPaths::from_config(&config);
    let store = Store::open(&paths.db_path()).unwrap();
    (store, paths, config)
}

#[test]
fn raw_text_to_claims_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut store, paths, config) = setup(tmp.path());

    let source = ingest_raw_text(&mut store, &paths, ARTICLE, "ECB Holds Rates", "Example Wire")
        .expect("ingest succeeds");
    assert_eq!(source.source_type, SourceType::Text);

    // the transcript blob landed on disk with ordered segments
    let tmeta = store.get_transcript(&source.id).unwrap().expect("meta row");
    let segments = read_transcript(std::path::Path::new(&tmeta.transcript_path)).unwrap();
    assert_eq!(segments.len(), tmeta.segment_count);
    assert!(segments.len() >= 2);
    for pair in segments.windows(2) {
        assert!(pair[0].start <= pair[1].start);
        assert!(pair[0].start <= pair[0].end);
    }

    let claims = extract_for_source(&mut store, &paths, &config, &source.id).unwrap();
    assert!(!claims.is_empty());
    assert!(claims
        .iter()
        .any(|c| c.text.contains("4.5 percent") || c.text.contains("2.4 percent")));

    // claims are persisted in ts order and exported as claims.json
    let stored = store.get_claims_for_source(&source.id).unwrap();
    assert_eq!(stored.len(), claims.len());
    for pair in stored.windows(2) {
        assert!(pair[0].ts_start <= pair[1].ts_start);
    }
    let claims_json = paths.export_dir(&source.id).unwrap().join("claims.json");
    assert!(claims_json.exists());
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(claims_json).unwrap()).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), claims.len());
}

#[test]
fn reextraction_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut store, paths, config) = setup(tmp.path());

    let source = ingest_raw_text(&mut store, &paths, ARTICLE, "ECB", "").unwrap();
    let first = extract_for_source(&mut store, &paths, &config, &source.id).unwrap();
    let second = extract_for_source(&mut store, &paths, &config, &source.id).unwrap();

    assert_eq!(first.len(), second.len());
    let stored = store.get_claims_for_source(&source.id).unwrap();
    assert_eq!(stored.len(), second.len());

    // hashes identical run to run; ids are fresh
    let mut h1: Vec<&str> = first.iter().map(|c| c.claim_hash.as_str()).collect();
    let mut h2: Vec<&str> = second.iter().map(|c| c.claim_hash.as_str()).collect();
    h1.sort();
    h2.sort();
    assert_eq!(h1, h2);
}

#[test]
fn text_file_ingest_defaults_title_to_stem() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut store, paths, _config) = setup(tmp.path());

    let article_path = tmp.path().join("ecb_decision.txt");
    std::fs::write(&article_path, ARTICLE).unwrap();

    let source = ingest_text_file(
        &mut store,
        &paths,
        article_path.to_str().unwrap(),
        "",
        "",
    )
    .unwrap();
    assert_eq!(source.title, "ecb_decision");
}

#[test]
fn empty_file_fails_without_store_changes() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut store, paths, _config) = setup(tmp.path());

    let empty_path = tmp.path().join("empty.txt");
    std::fs::write(&empty_path, "   \n").unwrap();

    assert!(ingest_text_file(&mut store, &paths, empty_path.to_str().unwrap(), "", "").is_err());
    assert!(store.list_sources().unwrap().is_empty());
}

#[test]
fn external_transcript_attaches_to_audio_source() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut store, paths, _config) = setup(tmp.path());

    let source = veridex::ingest::ingest_audio_source(
        &mut store,
        &paths,
        "https://example.com/talk.mp3",
        "A Talk",
        "",
    )
    .unwrap();

    // an external STT tool drops a segment blob somewhere
    let blob_path = tmp.path().join("stt_output.json");
    write_transcript(
        &blob_path,
        &[
            veridex::models::Segment {
                start: 0.0,
                end: 5.0,
                text: "The European Central Bank".to_string(),
            },
            veridex::models::Segment {
                start: 5.0,
                end: 12.0,
                text: "held rates at 4.5 percent this quarter.".to_string(),
            },
        ],
    )
    .unwrap();

    let meta = attach_transcript(
        &mut store,
        &paths,
        &source.id,
        Some(blob_path.to_str().unwrap()),
        "whisper-large",
    )
    .unwrap();
    assert_eq!(meta.segment_count, 2);
    assert_eq!(meta.engine, "whisper-large");

    // blob now lives at the canonical path
    let canonical = paths.transcript_path(&source.id).unwrap();
    assert!(canonical.exists());
    assert_eq!(read_transcript(&canonical).unwrap().len(), 2);
}

#[test]
fn disordered_segment_blob_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut store, paths, _config) = setup(tmp.path());

    let source = veridex::ingest::ingest_audio_source(
        &mut store,
        &paths,
        "https://example.com/x.mp3",
        "X",
        "",
    )
    .unwrap();

    let blob_path = tmp.path().join("bad.json");
    write_transcript(
        &blob_path,
        &[
            veridex::models::Segment { start: 9.0, end: 12.0, text: "later".to_string() },
            veridex::models::Segment { start: 1.0, end: 3.0, text: "earlier".to_string() },
        ],
    )
    .unwrap();

    assert!(attach_transcript(
        &mut store,
        &paths,
        &source.id,
        Some(blob_path.to_str().unwrap()),
        "stt",
    )
    .is_err());
    assert!(store.get_transcript(&source.id).unwrap().is_none());
}
