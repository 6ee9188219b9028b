//! Store behavior: migrations, cascades, cross-source queries, the review
//! queue, and the human-override rules.

use veridex::models::{now_rfc3339, Claim, Evidence, EvidenceSuggestion, Source, SourceType};
use veridex::store::Store;
use veridex::textutil::claim_hash_global;

fn source(id: &str, title: &str, created_at: &str) -> Source {
    Source {
        id: id.to_string(),
        url: format!("https://example.com/{}", id),
        title: title.to_string(),
        channel: format!("channel-{}", id),
        upload_date: String::new(),
        source_type: SourceType::Text,
        duration_seconds: 0.0,
        local_audio_path: String::new(),
        created_at: created_at.to_string(),
    }
}

fn claim(id: &str, source_id: &str, text: &str, ts_start: f64) -> Claim {
    Claim {
        id: id.to_string(),
        source_id: source_id.to_string(),
        text: text.to_string(),
        ts_start,
        ts_end: ts_start + 5.0,
        speaker: None,
        confidence_language: "unknown".to_string(),
        status: "unknown".to_string(),
        category: "general".to_string(),
        claim_date: String::new(),
        claim_hash: format!("{:0>64}", id),
        claim_hash_global: claim_hash_global(text),
        signals: String::new(),
        status_auto: "unknown".to_string(),
        auto_confidence: 0.0,
        status_human: None,
        created_at: now_rfc3339(),
        updated_at: now_rfc3339(),
    }
}

fn suggestion(id: &str, claim_id: &str, score: i32) -> EvidenceSuggestion {
    EvidenceSuggestion {
        id: id.to_string(),
        claim_id: claim_id.to_string(),
        url: format!("https://evidence.example/{}", id),
        title: "Evidence".to_string(),
        source_name: "crossref".to_string(),
        evidence_type: "paper".to_string(),
        score,
        signals: "token_overlap:3".to_string(),
        snippet: String::new(),
        created_at: now_rfc3339(),
    }
}

#[test]
fn cascade_delete_removes_dependents() {
    let mut store = Store::open_in_memory().unwrap();
    store.insert_source(&source("src000000001", "A", "2025-01-01T00:00:00+00:00")).unwrap();
    store
        .insert_claims(&[claim("clm000000001", "src000000001", "Numbers went up 5 percent", 0.0)])
        .unwrap();
    store.insert_suggestions(&[suggestion("sug000000001", "clm000000001", 40)]).unwrap();
    store
        .insert_evidence(&Evidence {
            id: "evd000000001".to_string(),
            claim_id: "clm000000001".to_string(),
            url: "https://example.com/e".to_string(),
            title: String::new(),
            evidence_type: "paper".to_string(),
            strength: "strong".to_string(),
            notes: String::new(),
            created_at: now_rfc3339(),
        })
        .unwrap();

    let deleted = store.delete_claims_for_source("src000000001").unwrap();
    assert_eq!(deleted, 1);
    assert!(store.get_claims_for_source("src000000001").unwrap().is_empty());
    assert!(store.get_suggestions_for_claim("clm000000001", 10).unwrap().is_empty());
    assert!(store.get_evidence_for_claim("clm000000001").unwrap().is_empty());
}

#[test]
fn suggestions_cleared_per_source_only() {
    let mut store = Store::open_in_memory().unwrap();
    store.insert_source(&source("srcaaa000001", "A", "2025-01-01T00:00:00+00:00")).unwrap();
    store.insert_source(&source("srcbbb000002", "B", "2025-01-02T00:00:00+00:00")).unwrap();
    store
        .insert_claims(&[
            claim("clmaaa000001", "srcaaa000001", "Claim in source A about 7 things", 0.0),
            claim("clmbbb000001", "srcbbb000002", "Claim in source B about 9 things", 0.0),
        ])
        .unwrap();
    store
        .insert_suggestions(&[
            suggestion("sugaaa000001", "clmaaa000001", 50),
            suggestion("sugbbb000001", "clmbbb000001", 60),
        ])
        .unwrap();

    store.delete_suggestions_for_source("srcaaa000001").unwrap();
    assert!(store.get_suggestions_for_claim("clmaaa000001", 10).unwrap().is_empty());
    assert_eq!(store.get_suggestions_for_claim("clmbbb000001", 10).unwrap().len(), 1);
}

#[test]
fn spread_orders_by_source_intake_time() {
    let mut store = Store::open_in_memory().unwrap();
    store.insert_source(&source("srclate00001", "Late", "2025-03-01T00:00:00+00:00")).unwrap();
    store.insert_source(&source("srcearly0001", "Early", "2025-01-01T00:00:00+00:00")).unwrap();

    let text = "Revenue grew 12 percent year over year.";
    store
        .insert_claims(&[
            claim("clmlate00001", "srclate00001", text, 30.0),
            claim("clmearly0001", "srcearly0001", text, 10.0),
        ])
        .unwrap();

    let rows = store.claim_spread(&claim_hash_global(text)).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].source_id, "srcearly0001");
    assert_eq!(rows[1].source_id, "srclate00001");
}

#[test]
fn top_claims_requires_two_distinct_sources() {
    let mut store = Store::open_in_memory().unwrap();
    store.insert_source(&source("srcaaa000001", "A", "2025-01-01T00:00:00+00:00")).unwrap();
    store.insert_source(&source("srcbbb000002", "B", "2025-01-02T00:00:00+00:00")).unwrap();

    let shared = "The company reported 100 billion dollars in revenue.";
    let solo = "A claim that appears in only one source with 42 details.";
    store
        .insert_claims(&[
            claim("clm000000001", "srcaaa000001", shared, 0.0),
            claim("clm000000002", "srcbbb000002", shared, 0.0),
            // repeated within one source only
            claim("clm000000003", "srcaaa000001", solo, 0.0),
            claim("clm000000004", "srcaaa000001", solo, 50.0),
        ])
        .unwrap();

    let top = store.top_claims(false, 20).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].source_count, 2);
    assert_eq!(top[0].frequency, 2);
    assert_eq!(top[0].claim_hash_global, claim_hash_global(shared));
}

#[test]
fn review_queue_puts_unverified_low_confidence_first() {
    let mut store = Store::open_in_memory().unwrap();
    store.insert_source(&source("src000000001", "A", "2025-01-01T00:00:00+00:00")).unwrap();

    let mut verified = claim("clmverified1", "src000000001", "A verified claim about 3 things", 0.0);
    verified.status_auto = "supported".to_string();
    verified.auto_confidence = 0.9;

    let mut low = claim("clmlowconf01", "src000000001", "A shaky claim about 5 things", 10.0);
    low.auto_confidence = 0.1;

    let mut human_done = claim("clmhumandone", "src000000001", "Already reviewed claim 8", 20.0);
    human_done.status_human = Some("contradicted".to_string());

    store.insert_claims(&[verified, low, human_done]).unwrap();

    let queue = store.review_queue(10).unwrap();
    assert_eq!(queue[0].id, "clmlowconf01");
}

#[test]
fn human_override_wins_in_stats() {
    let mut store = Store::open_in_memory().unwrap();
    store.insert_source(&source("src000000001", "A", "2025-01-01T00:00:00+00:00")).unwrap();

    let mut c = claim("clm000000001", "src000000001", "An auto-supported claim with 12 details", 0.0);
    c.status_auto = "supported".to_string();
    c.auto_confidence = 0.9;
    store.insert_claims(&[c]).unwrap();

    let stats = store.source_stats().unwrap();
    assert_eq!(stats[0].supported, 1);

    // human flips it; automation never undoes this
    store.update_claim_human_status("clm000000001", "contradicted").unwrap();
    let stats = store.source_stats().unwrap();
    assert_eq!(stats[0].supported, 0);

    let c = store.get_claim("clm000000001").unwrap().unwrap();
    assert_eq!(c.final_status(), "contradicted");
    assert_eq!(c.status_auto, "supported"); // auto record preserved
}

#[test]
fn substring_search_matches_claim_text() {
    let mut store = Store::open_in_memory().unwrap();
    store.insert_source(&source("src000000001", "A", "2025-01-01T00:00:00+00:00")).unwrap();
    store
        .insert_claims(&[
            claim("clm000000001", "src000000001", "Inflation fell to 2.4 percent in March", 0.0),
            claim("clm000000002", "src000000001", "Unemployment held at 3.9 percent", 10.0),
        ])
        .unwrap();

    let hits = store.search_claims("inflation", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].text.contains("Inflation"));
}

#[test]
fn migration_adds_late_columns_to_old_schema() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("veridex.sqlite3");

    // Simulate a database created before the late columns existed
    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE sources (
                id TEXT PRIMARY KEY, url TEXT NOT NULL, title TEXT NOT NULL DEFAULT '',
                channel TEXT NOT NULL DEFAULT '', upload_date TEXT NOT NULL DEFAULT '',
                source_type TEXT NOT NULL DEFAULT 'audio',
                duration_seconds REAL NOT NULL DEFAULT 0,
                local_audio_path TEXT NOT NULL DEFAULT '', created_at TEXT NOT NULL
            );
            CREATE TABLE claims (
                id TEXT PRIMARY KEY,
                source_id TEXT NOT NULL REFERENCES sources(id),
                text TEXT NOT NULL,
                ts_start REAL NOT NULL DEFAULT 0,
                ts_end REAL NOT NULL DEFAULT 0,
                speaker TEXT,
                confidence_language TEXT NOT NULL DEFAULT 'unknown',
                status TEXT NOT NULL DEFAULT 'unknown',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            INSERT INTO sources (id, url, created_at)
                VALUES ('srcold000001', 'https://example.com', '2024-01-01T00:00:00+00:00');
            INSERT INTO claims (id, source_id, text, created_at, updated_at)
                VALUES ('clmold000001', 'srcold000001', 'An old claim about 4 things',
                        '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00');",
        )
        .unwrap();
    }

    // Opening migrates in place; the old row reads back with defaults
    let store = Store::open(&db_path).unwrap();
    let c = store.get_claim("clmold000001").unwrap().unwrap();
    assert_eq!(c.category, "general");
    assert_eq!(c.status_auto, "unknown");
    assert_eq!(c.auto_confidence, 0.0);
    assert!(c.status_human.is_none());
    assert_eq!(c.claim_hash, "");
}
