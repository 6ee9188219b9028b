//! Knowledge graph: claim fingerprinting, blocking, clustering, consensus.
//!
//! Links claims about the same fact across different sources with zero
//! learned models: fingerprint → block → union-find cluster → consensus →
//! store. Agreement across independent sources raises confidence; a claim
//! repeated within one source never does.

use std::collections::{HashMap, HashSet};

use crate::categories::{all_relevance_terms, relevance_terms};
use crate::error::Result;
use crate::models::{new_id, now_rfc3339, Claim, ClaimCluster, ClusterMember};
use crate::store::Store;
use crate::textutil::{claim_numbers_expanded, tokenize};

/// Common English function words with no value for fact matching.
/// Intentionally small.
static STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "can", "shall",
    "not", "no", "in", "on", "at", "to", "for", "of", "with", "by", "from", "as", "or", "and",
    "but", "if", "so", "than", "then", "that", "this", "it", "its", "their", "there", "about",
    "also", "just", "more",
];

/// Deterministic fingerprint for fuzzy claim matching: significant tokens,
/// unit-expanded numbers, and matched category terms, sorted and |-joined.
/// Same fact, different wording → similar fingerprints.
pub fn claim_fingerprint(text: &str, category: &str) -> String {
    let mut tokens = tokenize(text);
    for sw in STOPWORDS {
        tokens.remove(*sw);
    }

    let numbers = claim_numbers_expanded(text);

    let matched_cat: HashSet<String> = if category == "general" {
        all_relevance_terms()
            .iter()
            .filter(|t| tokens.contains(**t))
            .map(|t| t.to_string())
            .collect()
    } else {
        relevance_terms(category)
            .iter()
            .filter(|t| tokens.contains(**t))
            .map(|t| t.to_string())
            .collect()
    };

    let mut components: Vec<String> = tokens.into_iter().collect();
    components.extend(numbers);
    components.extend(matched_cat);
    components.sort();
    components.dedup();

    components.join("|")
}

/// Jaccard similarity between two fingerprints; 0 when either is empty
pub fn fingerprint_similarity(fp1: &str, fp2: &str) -> f64 {
    if fp1.is_empty() || fp2.is_empty() {
        return 0.0;
    }
    let set1: HashSet<&str> = fp1.split('|').collect();
    let set2: HashSet<&str> = fp2.split('|').collect();
    let union = set1.union(&set2).count();
    if union == 0 {
        return 0.0;
    }
    set1.intersection(&set2).count() as f64 / union as f64
}

/// Lightweight claim view for clustering
#[derive(Debug, Clone)]
pub struct ClaimRecord {
    pub claim_id: String,
    pub source_id: String,
    pub text: String,
    pub category: String,
    pub fingerprint: String,
    pub numbers: HashSet<String>,
    pub status_auto: String,
    pub auto_confidence: f64,
}

impl From<&Claim> for ClaimRecord {
    fn from(c: &Claim) -> Self {
        ClaimRecord {
            claim_id: c.id.clone(),
            source_id: c.source_id.clone(),
            text: c.text.clone(),
            category: c.category.clone(),
            fingerprint: claim_fingerprint(&c.text, &c.category),
            numbers: claim_numbers_expanded(&c.text),
            status_auto: c.status_auto.clone(),
            auto_confidence: c.auto_confidence,
        }
    }
}

/// Group claims into comparison blocks keyed by category + shared number.
/// Only claims within a block are compared pairwise.
pub fn build_blocks(claims: &[ClaimRecord]) -> HashMap<String, Vec<usize>> {
    let mut blocks: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, claim) in claims.iter().enumerate() {
        if claim.numbers.is_empty() {
            blocks
                .entry(format!("{}|no_numbers", claim.category))
                .or_default()
                .push(idx);
        } else {
            for num in &claim.numbers {
                blocks
                    .entry(format!("{}|{}", claim.category, num))
                    .or_default()
                    .push(idx);
            }
        }
    }
    blocks
}

/// Disjoint-set with path compression and union by rank
struct UnionFind {
    parent: HashMap<String, String>,
    rank: HashMap<String, u32>,
}

impl UnionFind {
    fn new() -> Self {
        Self {
            parent: HashMap::new(),
            rank: HashMap::new(),
        }
    }

    fn find(&mut self, x: &str) -> String {
        if !self.parent.contains_key(x) {
            self.parent.insert(x.to_string(), x.to_string());
            self.rank.insert(x.to_string(), 0);
            return x.to_string();
        }
        let parent = self.parent[x].clone();
        if parent == x {
            return parent;
        }
        let root = self.find(&parent);
        self.parent.insert(x.to_string(), root.clone());
        root
    }

    fn union(&mut self, x: &str, y: &str) {
        let mut rx = self.find(x);
        let mut ry = self.find(y);
        if rx == ry {
            return;
        }
        if self.rank[&rx] < self.rank[&ry] {
            std::mem::swap(&mut rx, &mut ry);
        }
        self.parent.insert(ry.clone(), rx.clone());
        if self.rank[&rx] == self.rank[&ry] {
            *self.rank.get_mut(&rx).expect("rank exists") += 1;
        }
    }

    fn components(&mut self) -> HashMap<String, Vec<String>> {
        let keys: Vec<String> = self.parent.keys().cloned().collect();
        let mut groups: HashMap<String, Vec<String>> = HashMap::new();
        for k in keys {
            let root = self.find(&k);
            groups.entry(root).or_default().push(k);
        }
        groups
    }
}

/// Build clusters via blocking + cross-source union-find.
/// Returns cluster_id → member records; every member comes from a distinct
/// source and every cluster has at least two.
pub fn build_clusters(
    claims: &[ClaimRecord],
    threshold: f64,
    max_block_size: usize,
) -> HashMap<String, Vec<ClaimRecord>> {
    let blocks = build_blocks(claims);
    let mut uf = UnionFind::new();

    for indices in blocks.values() {
        let n = indices.len();
        if n < 2 || n > max_block_size {
            continue; // singleton or noise-sized block
        }
        for i in 0..n {
            for j in (i + 1)..n {
                let a = &claims[indices[i]];
                let b = &claims[indices[j]];
                if a.source_id == b.source_id {
                    continue; // cross-source only
                }
                let sim = fingerprint_similarity(&a.fingerprint, &b.fingerprint);
                if sim >= threshold {
                    uf.union(&a.claim_id, &b.claim_id);
                }
            }
        }
    }

    let by_id: HashMap<&str, &ClaimRecord> =
        claims.iter().map(|c| (c.claim_id.as_str(), c)).collect();

    let mut result: HashMap<String, Vec<ClaimRecord>> = HashMap::new();
    for members in uf.components().into_values() {
        if members.len() < 2 {
            continue;
        }
        let mut records: Vec<ClaimRecord> = members
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).map(|c| (*c).clone()))
            .collect();

        // One member per source: keep the strongest claim from each
        records.sort_by(|a, b| {
            b.auto_confidence
                .partial_cmp(&a.auto_confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.text.len().cmp(&a.text.len()))
        });
        let mut seen_sources: HashSet<String> = HashSet::new();
        records.retain(|r| seen_sources.insert(r.source_id.clone()));

        if records.len() < 2 {
            continue;
        }
        result.insert(new_id(), records);
    }

    result
}

/// Consensus for a cluster: never below the best individual confidence,
/// rising with the number of distinct verified sources.
/// Returns (best_status, best_confidence, consensus_score).
pub fn compute_consensus(members: &[ClaimRecord]) -> (String, f64, f64) {
    if members.is_empty() {
        return ("unknown".to_string(), 0.0, 0.0);
    }

    let best_confidence = members
        .iter()
        .map(|m| m.auto_confidence)
        .fold(0.0_f64, f64::max);

    let verified_sources: HashSet<&str> = members
        .iter()
        .filter(|m| m.status_auto == "supported" || m.status_auto == "partial")
        .map(|m| m.source_id.as_str())
        .collect();

    let mut consensus = best_confidence;
    if verified_sources.len() >= 2 {
        consensus += 0.10;
    }
    if verified_sources.len() >= 3 {
        let extra = (verified_sources.len() - 2).min(4) as f64;
        consensus += 0.05 * extra;
    }
    consensus = (consensus * 10_000.0).round() / 10_000.0;
    consensus = consensus.min(1.0);

    let best_status = if members.iter().any(|m| m.status_auto == "supported") {
        "supported"
    } else if members.iter().any(|m| m.status_auto == "partial") {
        "partial"
    } else {
        "unknown"
    };

    (best_status.to_string(), best_confidence, consensus)
}

/// Summary of a graph rebuild
#[derive(Debug, Clone)]
pub struct GraphReport {
    pub total_claims: usize,
    pub clusters_found: usize,
    pub claims_clustered: usize,
    pub largest_cluster: usize,
    pub elapsed_seconds: f64,
}

/// Full pipeline over every stored claim: fingerprint, block, cluster,
/// score consensus, and atomically replace the cluster tables.
pub fn build_knowledge_graph(
    store: &mut Store,
    threshold: f64,
    max_block_size: usize,
) -> Result<GraphReport> {
    let started = std::time::Instant::now();

    let claims = store.all_claims()?;
    let records: Vec<ClaimRecord> = claims.iter().map(ClaimRecord::from).collect();

    let clusters = build_clusters(&records, threshold, max_block_size);

    let mut cluster_rows: Vec<ClaimCluster> = Vec::new();
    let mut member_rows: Vec<ClusterMember> = Vec::new();

    for (cluster_id, members) in &clusters {
        // Representative: highest confidence, longest text breaking ties
        let rep = members
            .iter()
            .max_by(|a, b| {
                a.auto_confidence
                    .partial_cmp(&b.auto_confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.text.len().cmp(&b.text.len()))
            })
            .expect("cluster has members");

        let (best_status, best_confidence, consensus) = compute_consensus(members);
        let source_count: usize = members
            .iter()
            .map(|m| m.source_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        cluster_rows.push(ClaimCluster {
            id: cluster_id.clone(),
            representative_text: rep.text.clone(),
            category: rep.category.clone(),
            claim_count: members.len(),
            source_count,
            best_status,
            best_confidence,
            consensus_score: consensus,
            created_at: now_rfc3339(),
            updated_at: now_rfc3339(),
        });

        for m in members {
            let sim = fingerprint_similarity(&rep.fingerprint, &m.fingerprint);
            member_rows.push(ClusterMember {
                cluster_id: cluster_id.clone(),
                claim_id: m.claim_id.clone(),
                fingerprint: m.fingerprint.clone(),
                similarity_to_rep: (sim * 10_000.0).round() / 10_000.0,
            });
        }
    }

    store.replace_clusters(&cluster_rows, &member_rows)?;

    let report = GraphReport {
        total_claims: records.len(),
        clusters_found: clusters.len(),
        claims_clustered: clusters.values().map(|m| m.len()).sum(),
        largest_cluster: clusters.values().map(|m| m.len()).max().unwrap_or(0),
        elapsed_seconds: started.elapsed().as_secs_f64(),
    };
    tracing::info!(
        clusters = report.clusters_found,
        claims = report.total_claims,
        "knowledge graph rebuilt"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        id: &str,
        source: &str,
        text: &str,
        category: &str,
        status: &str,
        conf: f64,
    ) -> ClaimRecord {
        ClaimRecord {
            claim_id: id.to_string(),
            source_id: source.to_string(),
            text: text.to_string(),
            category: category.to_string(),
            fingerprint: claim_fingerprint(text, category),
            numbers: claim_numbers_expanded(text),
            status_auto: status.to_string(),
            auto_confidence: conf,
        }
    }

    #[test]
    fn similarity_is_symmetric_and_reflexive() {
        let fp1 = claim_fingerprint("Revenue grew 12 percent year over year", "finance");
        let fp2 = claim_fingerprint("Yearly revenue grew by 12 percent", "finance");
        assert!((fingerprint_similarity(&fp1, &fp2) - fingerprint_similarity(&fp2, &fp1)).abs() < 1e-12);
        assert!((fingerprint_similarity(&fp1, &fp1) - 1.0).abs() < 1e-12);
        assert_eq!(fingerprint_similarity("", &fp1), 0.0);
    }

    #[test]
    fn unit_expansion_reaches_fingerprint() {
        let fp = claim_fingerprint("The program cost $5.5 billion over a decade", "finance");
        assert!(fp.split('|').any(|c| c == "5500"));
    }

    #[test]
    fn cross_source_claims_cluster() {
        let claims = vec![
            record("c1", "srcA", "Revenue grew 12 percent year over year", "finance", "supported", 0.85),
            record("c2", "srcB", "Revenue grew 12 percent compared with last year", "finance", "partial", 0.72),
        ];
        let clusters = build_clusters(&claims, 0.40, 500);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters.values().next().unwrap().len(), 2);
    }

    #[test]
    fn same_source_pairs_never_cluster() {
        let claims = vec![
            record("c1", "srcA", "Revenue grew 12 percent year over year", "finance", "unknown", 0.0),
            record("c2", "srcA", "Revenue grew 12 percent compared with last year", "finance", "unknown", 0.0),
        ];
        let clusters = build_clusters(&claims, 0.40, 500);
        assert!(clusters.is_empty());
    }

    #[test]
    fn cluster_members_have_distinct_sources() {
        let claims = vec![
            record("c1", "srcA", "Revenue grew 12 percent year over year", "finance", "supported", 0.9),
            record("c2", "srcB", "Revenue grew 12 percent compared with last year", "finance", "partial", 0.7),
            // a second srcA claim that matches transitively
            record("c3", "srcA", "Revenue grew 12 percent versus the prior year", "finance", "unknown", 0.1),
        ];
        let clusters = build_clusters(&claims, 0.30, 500);
        for members in clusters.values() {
            let sources: HashSet<&str> = members.iter().map(|m| m.source_id.as_str()).collect();
            assert_eq!(sources.len(), members.len());
            assert!(members.len() >= 2);
            // the strongest srcA claim survives
            assert!(members.iter().any(|m| m.claim_id == "c1"));
        }
    }

    #[test]
    fn dissimilar_claims_stay_apart() {
        let claims = vec![
            record("c1", "srcA", "Revenue grew 12 percent year over year", "finance", "unknown", 0.0),
            record("c2", "srcB", "The vaccine trial enrolled 12 thousand patients", "health", "unknown", 0.0),
        ];
        let clusters = build_clusters(&claims, 0.40, 500);
        assert!(clusters.is_empty());
    }

    #[test]
    fn two_verified_sources_add_a_tenth() {
        let members = vec![
            record("c1", "srcA", "x", "general", "supported", 0.85),
            record("c2", "srcB", "x", "general", "partial", 0.72),
        ];
        let (status, best, consensus) = compute_consensus(&members);
        assert_eq!(status, "supported");
        assert!((best - 0.85).abs() < 1e-9);
        assert!((consensus - 0.95).abs() < 1e-9);
    }

    #[test]
    fn third_verified_source_adds_a_twentieth_more() {
        let members = vec![
            record("c1", "srcA", "x", "general", "supported", 0.80),
            record("c2", "srcB", "x", "general", "partial", 0.70),
            record("c3", "srcC", "x", "general", "supported", 0.75),
        ];
        let (status, best, consensus) = compute_consensus(&members);
        assert_eq!(status, "supported");
        assert!((best - 0.80).abs() < 1e-9);
        assert!((consensus - 0.95).abs() < 1e-9);
    }

    #[test]
    fn consensus_never_below_best_and_capped() {
        let members = vec![
            record("c1", "srcA", "x", "general", "supported", 0.97),
            record("c2", "srcB", "x", "general", "supported", 0.96),
            record("c3", "srcC", "x", "general", "supported", 0.95),
        ];
        let (_, best, consensus) = compute_consensus(&members);
        assert!(consensus >= best);
        assert!(consensus <= 1.0);
    }

    #[test]
    fn unverified_cluster_stays_unknown() {
        let members = vec![
            record("c1", "srcA", "x", "general", "unknown", 0.0),
            record("c2", "srcB", "x", "general", "unknown", 0.0),
        ];
        let (status, _, consensus) = compute_consensus(&members);
        assert_eq!(status, "unknown");
        assert_eq!(consensus, 0.0);
    }
}
