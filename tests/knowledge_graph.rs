//! Knowledge-graph pipeline over a real (in-memory) store: fingerprint,
//! block, cluster, consensus, and the atomic rebuild.

use std::collections::HashSet;

use veridex::graph::{build_knowledge_graph, claim_fingerprint, fingerprint_similarity};
use veridex::models::{now_rfc3339, Claim, Source, SourceType};
use veridex::store::Store;
use veridex::textutil::claim_hash_global;

fn source(id: &str, title: &str, created_at: &str) -> Source {
    Source {
        id: id.to_string(),
        url: format!("https://example.com/{}", id),
        title: title.to_string(),
        channel: String::new(),
        upload_date: String::new(),
        source_type: SourceType::Text,
        duration_seconds: 0.0,
        local_audio_path: String::new(),
        created_at: created_at.to_string(),
    }
}

fn claim(id: &str, source_id: &str, text: &str, category: &str, status: &str, conf: f64) -> Claim {
    Claim {
        id: id.to_string(),
        source_id: source_id.to_string(),
        text: text.to_string(),
        ts_start: 0.0,
        ts_end: 10.0,
        speaker: None,
        confidence_language: "unknown".to_string(),
        status: "unknown".to_string(),
        category: category.to_string(),
        claim_date: String::new(),
        claim_hash: format!("{:0>64}", id),
        claim_hash_global: claim_hash_global(text),
        signals: "number".to_string(),
        status_auto: status.to_string(),
        auto_confidence: conf,
        status_human: None,
        created_at: now_rfc3339(),
        updated_at: now_rfc3339(),
    }
}

fn seeded_store() -> Store {
    let mut store = Store::open_in_memory().expect("store opens");
    store
        .insert_source(&source("srcaaa000001", "Alpha", "2025-01-01T00:00:00+00:00"))
        .unwrap();
    store
        .insert_source(&source("srcbbb000002", "Beta", "2025-02-01T00:00:00+00:00"))
        .unwrap();
    store
        .insert_source(&source("srcccc000003", "Gamma", "2025-03-01T00:00:00+00:00"))
        .unwrap();

    store
        .insert_claims(&[
            claim(
                "claimaaa0001",
                "srcaaa000001",
                "Revenue grew 12 percent year over year",
                "finance",
                "supported",
                0.80,
            ),
            claim(
                "claimbbb0001",
                "srcbbb000002",
                "Revenue grew 12 percent compared with last year",
                "finance",
                "supported",
                0.75,
            ),
            claim(
                "claimccc0001",
                "srcccc000003",
                "Revenue grew 12 percent versus the prior year",
                "finance",
                "partial",
                0.70,
            ),
            // unrelated singleton claim
            claim(
                "claimddd0001",
                "srcaaa000001",
                "The vaccine trial enrolled 4000 patients across Europe",
                "health",
                "unknown",
                0.0,
            ),
        ])
        .unwrap();
    store
}

#[test]
fn three_source_cluster_gets_consensus_boost() {
    let mut store = seeded_store();
    let report = build_knowledge_graph(&mut store, 0.40, 500).expect("graph builds");
    assert_eq!(report.clusters_found, 1);
    assert_eq!(report.claims_clustered, 3);

    let clusters = store.list_clusters("consensus", 10).unwrap();
    assert_eq!(clusters.len(), 1);
    let c = &clusters[0];

    assert_eq!(c.source_count, 3);
    assert_eq!(c.claim_count, 3);
    assert_eq!(c.best_status, "supported");
    assert!((c.best_confidence - 0.80).abs() < 1e-9);
    // 0.80 + 0.10 (two verified sources) + 0.05 (a third)
    assert!((c.consensus_score - 0.95).abs() < 1e-9);
    assert!(c.consensus_score >= c.best_confidence);
    assert!(c.consensus_score <= 1.0);
}

#[test]
fn cluster_members_come_from_distinct_sources() {
    let mut store = seeded_store();
    build_knowledge_graph(&mut store, 0.40, 500).unwrap();

    for cluster in store.list_clusters("consensus", 10).unwrap() {
        let members = store.get_cluster_members(&cluster.id).unwrap();
        assert_eq!(cluster.claim_count, members.len());
        let sources: HashSet<String> = members
            .iter()
            .map(|(_, claim)| claim.source_id.clone())
            .collect();
        assert_eq!(sources.len(), members.len(), "shared source in a cluster");
        assert!(cluster.source_count >= 2);
        for (m, _) in &members {
            assert!((0.0..=1.0).contains(&m.similarity_to_rep));
        }
    }
}

#[test]
fn rebuild_replaces_previous_graph() {
    let mut store = seeded_store();
    build_knowledge_graph(&mut store, 0.40, 500).unwrap();
    let first: Vec<String> = store
        .list_clusters("consensus", 10)
        .unwrap()
        .iter()
        .map(|c| c.id.clone())
        .collect();
    assert_eq!(first.len(), 1);

    build_knowledge_graph(&mut store, 0.40, 500).unwrap();
    let second = store.list_clusters("consensus", 10).unwrap();
    assert_eq!(second.len(), 1);
    // new cluster ids each build; never an accumulation
    assert!(!first.contains(&second[0].id));
}

#[test]
fn high_threshold_keeps_claims_apart() {
    let mut store = seeded_store();
    let report = build_knowledge_graph(&mut store, 0.99, 500).unwrap();
    assert_eq!(report.clusters_found, 0);
    assert!(store.list_clusters("consensus", 10).unwrap().is_empty());
}

#[test]
fn fingerprint_laws_hold() {
    let fp_a = claim_fingerprint("The deficit reached $1.7 trillion in 2023", "finance");
    let fp_b = claim_fingerprint("In 2023 the federal deficit hit 1.7 trillion dollars", "finance");
    assert!(fingerprint_similarity(&fp_a, &fp_b) > 0.0);
    assert_eq!(
        fingerprint_similarity(&fp_a, &fp_b),
        fingerprint_similarity(&fp_b, &fp_a)
    );
    assert_eq!(fingerprint_similarity(&fp_a, &fp_a), 1.0);
    assert_eq!(fingerprint_similarity("", &fp_a), 0.0);
}
