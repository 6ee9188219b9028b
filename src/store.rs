//! SQLite store: durable state for sources, segments metadata, claims,
//! evidence, suggestions, and the derived cluster tables.
//!
//! Single-writer. WAL journal mode, foreign keys enforced, one transaction
//! per top-level operation. On open the claims table is introspected and any
//! since-introduced column is added with its default, so older databases
//! keep working.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::error::Result;
use crate::models::{
    now_rfc3339, Claim, ClaimCluster, ClusterMember, Evidence, EvidenceSuggestion, Source,
    SourceType, TranscriptMeta,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sources (
    id               TEXT PRIMARY KEY,
    url              TEXT NOT NULL,
    title            TEXT NOT NULL DEFAULT '',
    channel          TEXT NOT NULL DEFAULT '',
    upload_date      TEXT NOT NULL DEFAULT '',
    source_type      TEXT NOT NULL DEFAULT 'audio',
    duration_seconds REAL NOT NULL DEFAULT 0,
    local_audio_path TEXT NOT NULL DEFAULT '',
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transcripts (
    source_id       TEXT PRIMARY KEY REFERENCES sources(id),
    engine          TEXT NOT NULL DEFAULT '',
    language        TEXT NOT NULL DEFAULT '',
    segment_count   INTEGER NOT NULL DEFAULT 0,
    transcript_path TEXT NOT NULL DEFAULT '',
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS claims (
    id                  TEXT PRIMARY KEY,
    source_id           TEXT NOT NULL REFERENCES sources(id),
    text                TEXT NOT NULL,
    ts_start            REAL NOT NULL DEFAULT 0,
    ts_end              REAL NOT NULL DEFAULT 0,
    speaker             TEXT,
    confidence_language TEXT NOT NULL DEFAULT 'unknown',
    status              TEXT NOT NULL DEFAULT 'unknown',
    category            TEXT NOT NULL DEFAULT 'general',
    claim_date          TEXT NOT NULL DEFAULT '',
    claim_hash          TEXT NOT NULL DEFAULT '',
    claim_hash_global   TEXT NOT NULL DEFAULT '',
    signals             TEXT NOT NULL DEFAULT '',
    status_auto         TEXT NOT NULL DEFAULT 'unknown',
    auto_confidence     REAL NOT NULL DEFAULT 0.0,
    status_human        TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_claims_source ON claims(source_id);
CREATE INDEX IF NOT EXISTS idx_claims_text   ON claims(text);
CREATE INDEX IF NOT EXISTS idx_claims_hash   ON claims(claim_hash);
CREATE INDEX IF NOT EXISTS idx_claims_ghash  ON claims(claim_hash_global);

CREATE TABLE IF NOT EXISTS evidence (
    id            TEXT PRIMARY KEY,
    claim_id      TEXT NOT NULL REFERENCES claims(id),
    url           TEXT NOT NULL DEFAULT '',
    title         TEXT NOT NULL DEFAULT '',
    evidence_type TEXT NOT NULL DEFAULT 'other',
    strength      TEXT NOT NULL DEFAULT 'medium',
    notes         TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_evidence_claim ON evidence(claim_id);

CREATE TABLE IF NOT EXISTS evidence_suggestions (
    id            TEXT PRIMARY KEY,
    claim_id      TEXT NOT NULL REFERENCES claims(id),
    url           TEXT NOT NULL DEFAULT '',
    title         TEXT NOT NULL DEFAULT '',
    source_name   TEXT NOT NULL DEFAULT '',
    evidence_type TEXT NOT NULL DEFAULT 'other',
    score         INTEGER NOT NULL DEFAULT 0,
    signals       TEXT NOT NULL DEFAULT '',
    snippet       TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_evsug_claim ON evidence_suggestions(claim_id);
CREATE INDEX IF NOT EXISTS idx_evsug_score ON evidence_suggestions(score DESC);

CREATE TABLE IF NOT EXISTS clusters (
    id                  TEXT PRIMARY KEY,
    representative_text TEXT NOT NULL DEFAULT '',
    category            TEXT NOT NULL DEFAULT 'general',
    claim_count         INTEGER NOT NULL DEFAULT 0,
    source_count        INTEGER NOT NULL DEFAULT 0,
    best_status         TEXT NOT NULL DEFAULT 'unknown',
    best_confidence     REAL NOT NULL DEFAULT 0.0,
    consensus_score     REAL NOT NULL DEFAULT 0.0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cluster_members (
    cluster_id        TEXT NOT NULL REFERENCES clusters(id),
    claim_id          TEXT NOT NULL REFERENCES claims(id),
    fingerprint       TEXT NOT NULL DEFAULT '',
    similarity_to_rep REAL NOT NULL DEFAULT 0.0,
    PRIMARY KEY (cluster_id, claim_id)
);

CREATE INDEX IF NOT EXISTS idx_cmember_claim ON cluster_members(claim_id);
"#;

/// Columns added after the initial claims schema, with their defaults
const LATE_CLAIM_COLUMNS: &[(&str, &str)] = &[
    ("category", "TEXT NOT NULL DEFAULT 'general'"),
    ("claim_date", "TEXT NOT NULL DEFAULT ''"),
    ("claim_hash", "TEXT NOT NULL DEFAULT ''"),
    ("claim_hash_global", "TEXT NOT NULL DEFAULT ''"),
    ("signals", "TEXT NOT NULL DEFAULT ''"),
    ("status_auto", "TEXT NOT NULL DEFAULT 'unknown'"),
    ("auto_confidence", "REAL NOT NULL DEFAULT 0.0"),
    ("status_human", "TEXT"),
];

pub struct Store {
    conn: Connection,
}

/// Per-source verification metrics for the sources listing
#[derive(Debug, Clone)]
pub struct SourceStats {
    pub source_id: String,
    pub title: String,
    pub channel: String,
    pub created_at: String,
    pub total_claims: i64,
    pub supported: i64,
    pub partial: i64,
    pub unknown: i64,
    pub verified_rate: f64,
}

/// One occurrence of a claim across sources (spread / timeline)
#[derive(Debug, Clone)]
pub struct SpreadRow {
    pub claim_id: String,
    pub source_id: String,
    pub source_title: String,
    pub source_created: String,
    pub text: String,
    pub ts_start: f64,
    pub category: String,
    pub status_auto: String,
    pub auto_confidence: f64,
}

/// Aggregate row for the top-claims listing
#[derive(Debug, Clone)]
pub struct TopClaimRow {
    pub claim_hash_global: String,
    pub frequency: i64,
    pub source_count: i64,
    pub text: String,
    pub category: String,
    pub best_status: String,
    pub best_confidence: f64,
}

impl Store {
    /// Open (and migrate) the database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory store, used by tests
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrate(&conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // -- sources ------------------------------------------------------------

    pub fn insert_source(&self, s: &Source) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sources (id, url, title, channel, upload_date, source_type, \
             duration_seconds, local_audio_path, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                s.id,
                s.url,
                s.title,
                s.channel,
                s.upload_date,
                s.source_type.as_str(),
                s.duration_seconds,
                s.local_audio_path,
                s.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_source(&self, source_id: &str) -> Result<Option<Source>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM sources WHERE id = ?1",
                params![source_id],
                row_to_source,
            )
            .optional()?)
    }

    pub fn list_sources(&self) -> Result<Vec<Source>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM sources ORDER BY created_at DESC")?;
        let rows = stmt.query_map([], row_to_source)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // -- transcripts ---------------------------------------------------------

    pub fn upsert_transcript(&self, t: &TranscriptMeta) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO transcripts \
             (source_id, engine, language, segment_count, transcript_path, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                t.source_id,
                t.engine,
                t.language,
                t.segment_count,
                t.transcript_path,
                t.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_transcript(&self, source_id: &str) -> Result<Option<TranscriptMeta>> {
        Ok(self
            .conn
            .query_row(
                "SELECT source_id, engine, language, segment_count, transcript_path, created_at \
                 FROM transcripts WHERE source_id = ?1",
                params![source_id],
                |row| {
                    Ok(TranscriptMeta {
                        source_id: row.get(0)?,
                        engine: row.get(1)?,
                        language: row.get(2)?,
                        segment_count: row.get::<_, i64>(3)? as usize,
                        transcript_path: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()?)
    }

    // -- claims --------------------------------------------------------------

    /// Delete all claims for a source, cascading to their evidence and
    /// suggestions. Returns the number of claims removed.
    pub fn delete_claims_for_source(&mut self, source_id: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM cluster_members WHERE claim_id IN \
             (SELECT id FROM claims WHERE source_id = ?1)",
            params![source_id],
        )?;
        tx.execute(
            "DELETE FROM evidence_suggestions WHERE claim_id IN \
             (SELECT id FROM claims WHERE source_id = ?1)",
            params![source_id],
        )?;
        tx.execute(
            "DELETE FROM evidence WHERE claim_id IN \
             (SELECT id FROM claims WHERE source_id = ?1)",
            params![source_id],
        )?;
        let n = tx.execute("DELETE FROM claims WHERE source_id = ?1", params![source_id])?;
        tx.commit()?;
        Ok(n)
    }

    pub fn insert_claims(&mut self, claims: &[Claim]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO claims (id, source_id, text, ts_start, ts_end, speaker, \
                 confidence_language, status, category, claim_date, claim_hash, \
                 claim_hash_global, signals, status_auto, auto_confidence, status_human, \
                 created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            )?;
            for c in claims {
                stmt.execute(params![
                    c.id,
                    c.source_id,
                    c.text,
                    c.ts_start,
                    c.ts_end,
                    c.speaker,
                    c.confidence_language,
                    c.status,
                    c.category,
                    c.claim_date,
                    c.claim_hash,
                    c.claim_hash_global,
                    c.signals,
                    c.status_auto,
                    c.auto_confidence,
                    c.status_human,
                    c.created_at,
                    c.updated_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(claims.len())
    }

    pub fn get_claims_for_source(&self, source_id: &str) -> Result<Vec<Claim>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, source_id, text, ts_start, ts_end, speaker, confidence_language, status, category, claim_date, claim_hash, claim_hash_global, signals, status_auto, auto_confidence, status_human, created_at, updated_at FROM claims WHERE source_id = ?1 ORDER BY ts_start")?;
        let rows = stmt.query_map(params![source_id], row_to_claim)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_claim(&self, claim_id: &str) -> Result<Option<Claim>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, source_id, text, ts_start, ts_end, speaker, confidence_language, status, category, claim_date, claim_hash, claim_hash_global, signals, status_auto, auto_confidence, status_human, created_at, updated_at FROM claims WHERE id = ?1",
                params![claim_id],
                row_to_claim,
            )
            .optional()?)
    }

    pub fn all_claims(&self) -> Result<Vec<Claim>> {
        let mut stmt = self.conn.prepare("SELECT id, source_id, text, ts_start, ts_end, speaker, confidence_language, status, category, claim_date, claim_hash, claim_hash_global, signals, status_auto, auto_confidence, status_human, created_at, updated_at FROM claims")?;
        let rows = stmt.query_map([], row_to_claim)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_claim_status(&self, claim_id: &str, status: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE claims SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, now_rfc3339(), claim_id],
        )?;
        Ok(())
    }

    pub fn update_claim_category(&self, claim_id: &str, category: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE claims SET category = ?1, updated_at = ?2 WHERE id = ?3",
            params![category, now_rfc3339(), claim_id],
        )?;
        Ok(())
    }

    pub fn update_claim_auto_status(
        &self,
        claim_id: &str,
        status_auto: &str,
        auto_confidence: f64,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE claims SET status_auto = ?1, auto_confidence = ?2, updated_at = ?3 \
             WHERE id = ?4",
            params![status_auto, auto_confidence, now_rfc3339(), claim_id],
        )?;
        Ok(())
    }

    /// Human override: sets both status_human and the legacy status column
    pub fn update_claim_human_status(&self, claim_id: &str, status_human: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE claims SET status_human = ?1, status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status_human, now_rfc3339(), claim_id],
        )?;
        Ok(())
    }

    pub fn search_claims(&self, query: &str, limit: usize) -> Result<Vec<Claim>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, source_id, text, ts_start, ts_end, speaker, confidence_language, status, category, claim_date, claim_hash, claim_hash_global, signals, status_auto, auto_confidence, status_human, created_at, updated_at FROM claims WHERE text LIKE ?1 ORDER BY ts_start LIMIT ?2")?;
        let pattern = format!("%{}%", query);
        let rows = stmt.query_map(params![pattern, limit as i64], row_to_claim)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Claims sorted for review: unverified first, then ascending confidence
    pub fn review_queue(&self, limit: usize) -> Result<Vec<Claim>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_id, text, ts_start, ts_end, speaker, confidence_language, status, category, claim_date, claim_hash, claim_hash_global, signals, status_auto, auto_confidence, status_human, created_at, updated_at FROM claims ORDER BY \
             CASE WHEN status_auto = 'unknown' AND status_human IS NULL THEN 0 ELSE 1 END, \
             auto_confidence ASC, ts_start ASC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], row_to_claim)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // -- evidence ------------------------------------------------------------

    pub fn insert_evidence(&self, e: &Evidence) -> Result<()> {
        self.conn.execute(
            "INSERT INTO evidence (id, claim_id, url, title, evidence_type, strength, notes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                e.id,
                e.claim_id,
                e.url,
                e.title,
                e.evidence_type,
                e.strength,
                e.notes,
                e.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_evidence_for_claim(&self, claim_id: &str) -> Result<Vec<Evidence>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, claim_id, url, title, evidence_type, strength, notes, created_at \
                      FROM evidence WHERE claim_id = ?1 ORDER BY created_at")?;
        let rows = stmt.query_map(params![claim_id], |row| {
            Ok(Evidence {
                id: row.get(0)?,
                claim_id: row.get(1)?,
                url: row.get(2)?,
                title: row.get(3)?,
                evidence_type: row.get(4)?,
                strength: row.get(5)?,
                notes: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // -- evidence suggestions -------------------------------------------------

    pub fn insert_suggestions(&mut self, suggestions: &[EvidenceSuggestion]) -> Result<usize> {
        if suggestions.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO evidence_suggestions \
                 (id, claim_id, url, title, source_name, evidence_type, score, signals, snippet, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for s in suggestions {
                stmt.execute(params![
                    s.id,
                    s.claim_id,
                    s.url,
                    s.title,
                    s.source_name,
                    s.evidence_type,
                    s.score,
                    s.signals,
                    s.snippet,
                    s.created_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(suggestions.len())
    }

    pub fn get_suggestions_for_claim(
        &self,
        claim_id: &str,
        limit: usize,
    ) -> Result<Vec<EvidenceSuggestion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, claim_id, url, title, source_name, evidence_type, score, signals, \
             snippet, created_at \
             FROM evidence_suggestions WHERE claim_id = ?1 ORDER BY score DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![claim_id, limit as i64], |row| {
            Ok(EvidenceSuggestion {
                id: row.get(0)?,
                claim_id: row.get(1)?,
                url: row.get(2)?,
                title: row.get(3)?,
                source_name: row.get(4)?,
                evidence_type: row.get(5)?,
                score: row.get(6)?,
                signals: row.get(7)?,
                snippet: row.get(8)?,
                created_at: row.get(9)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_suggestions_for_source(&self, source_id: &str) -> Result<usize> {
        Ok(self.conn.execute(
            "DELETE FROM evidence_suggestions WHERE claim_id IN \
             (SELECT id FROM claims WHERE source_id = ?1)",
            params![source_id],
        )?)
    }

    // -- cross-source queries --------------------------------------------------

    /// All occurrences of a claim across sources, ordered by source intake time
    pub fn claim_spread(&self, claim_hash_global: &str) -> Result<Vec<SpreadRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.source_id, s.title, s.created_at, c.text, c.ts_start, \
             c.category, c.status_auto, c.auto_confidence \
             FROM claims c JOIN sources s ON c.source_id = s.id \
             WHERE c.claim_hash_global = ?1 \
             ORDER BY s.created_at ASC, c.ts_start ASC",
        )?;
        let rows = stmt.query_map(params![claim_hash_global], |row| {
            Ok(SpreadRow {
                claim_id: row.get(0)?,
                source_id: row.get(1)?,
                source_title: row.get(2)?,
                source_created: row.get(3)?,
                text: row.get(4)?,
                ts_start: row.get(5)?,
                category: row.get(6)?,
                status_auto: row.get(7)?,
                auto_confidence: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Most-repeated claims across sources, restricted to global hashes seen
    /// in at least two distinct sources
    pub fn top_claims(&self, by_confidence: bool, limit: usize) -> Result<Vec<TopClaimRow>> {
        let order = if by_confidence {
            "MAX(c.auto_confidence) DESC, source_count DESC"
        } else {
            "source_count DESC, frequency DESC"
        };
        let sql = format!(
            "SELECT c.claim_hash_global, COUNT(*) AS frequency, \
             COUNT(DISTINCT c.source_id) AS source_count, MIN(c.text) AS text, \
             MIN(c.category) AS category, \
             MAX(CASE WHEN c.status_auto = 'supported' THEN 2 \
                      WHEN c.status_auto = 'partial' THEN 1 ELSE 0 END) AS best_status_rank, \
             MAX(c.auto_confidence) AS best_confidence \
             FROM claims c WHERE c.claim_hash_global != '' \
             GROUP BY c.claim_hash_global \
             HAVING COUNT(DISTINCT c.source_id) > 1 \
             ORDER BY {} LIMIT ?1",
            order
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let rank: i64 = row.get(5)?;
            Ok(TopClaimRow {
                claim_hash_global: row.get(0)?,
                frequency: row.get(1)?,
                source_count: row.get(2)?,
                text: row.get(3)?,
                category: row.get(4)?,
                best_status: match rank {
                    2 => "supported".to_string(),
                    1 => "partial".to_string(),
                    _ => "unknown".to_string(),
                },
                best_confidence: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Per-source verification counts over the derived final status
    pub fn source_stats(&self) -> Result<Vec<SourceStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.title, s.channel, s.created_at, COUNT(c.id), \
             SUM(CASE WHEN COALESCE(c.status_human, \
                 CASE WHEN c.status_auto != 'unknown' THEN c.status_auto ELSE c.status END) \
                 = 'supported' THEN 1 ELSE 0 END), \
             SUM(CASE WHEN COALESCE(c.status_human, \
                 CASE WHEN c.status_auto != 'unknown' THEN c.status_auto ELSE c.status END) \
                 = 'partial' THEN 1 ELSE 0 END), \
             SUM(CASE WHEN COALESCE(c.status_human, \
                 CASE WHEN c.status_auto != 'unknown' THEN c.status_auto ELSE c.status END) \
                 = 'unknown' THEN 1 ELSE 0 END) \
             FROM sources s LEFT JOIN claims c ON c.source_id = s.id \
             GROUP BY s.id ORDER BY s.created_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let total: i64 = row.get(4)?;
            let supported: i64 = row.get::<_, Option<i64>>(5)?.unwrap_or(0);
            let partial: i64 = row.get::<_, Option<i64>>(6)?.unwrap_or(0);
            let unknown: i64 = row.get::<_, Option<i64>>(7)?.unwrap_or(0);
            Ok(SourceStats {
                source_id: row.get(0)?,
                title: row.get(1)?,
                channel: row.get(2)?,
                created_at: row.get(3)?,
                total_claims: total,
                supported,
                partial,
                unknown,
                verified_rate: if total > 0 {
                    (supported + partial) as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // -- clusters -------------------------------------------------------------

    /// Replace the whole cluster graph in one transaction. Readers never see
    /// a half-rebuilt graph.
    pub fn replace_clusters(
        &mut self,
        clusters: &[ClaimCluster],
        members: &[ClusterMember],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM cluster_members", [])?;
        tx.execute("DELETE FROM clusters", [])?;
        {
            let mut cstmt = tx.prepare(
                "INSERT INTO clusters (id, representative_text, category, claim_count, \
                 source_count, best_status, best_confidence, consensus_score, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for c in clusters {
                cstmt.execute(params![
                    c.id,
                    c.representative_text,
                    c.category,
                    c.claim_count as i64,
                    c.source_count as i64,
                    c.best_status,
                    c.best_confidence,
                    c.consensus_score,
                    c.created_at,
                    c.updated_at,
                ])?;
            }
            let mut mstmt = tx.prepare(
                "INSERT INTO cluster_members (cluster_id, claim_id, fingerprint, similarity_to_rep) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for m in members {
                mstmt.execute(params![
                    m.cluster_id,
                    m.claim_id,
                    m.fingerprint,
                    m.similarity_to_rep,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_clusters(&self, sort_by: &str, limit: usize) -> Result<Vec<ClaimCluster>> {
        let order = match sort_by {
            "sources" => "source_count DESC, consensus_score DESC",
            "claims" => "claim_count DESC, consensus_score DESC",
            _ => "consensus_score DESC, source_count DESC",
        };
        let sql = format!(
            "SELECT id, representative_text, category, claim_count, source_count, best_status, \
             best_confidence, consensus_score, created_at, updated_at \
             FROM clusters ORDER BY {} LIMIT ?1",
            order
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], row_to_cluster)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_cluster(&self, cluster_id: &str) -> Result<Option<ClaimCluster>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, representative_text, category, claim_count, source_count, \
                 best_status, best_confidence, consensus_score, created_at, updated_at \
                 FROM clusters WHERE id = ?1",
                params![cluster_id],
                row_to_cluster,
            )
            .optional()?)
    }

    /// Members of a cluster with the backing claims, best similarity first
    pub fn get_cluster_members(&self, cluster_id: &str) -> Result<Vec<(ClusterMember, Claim)>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.cluster_id, m.claim_id, m.fingerprint, m.similarity_to_rep, c.id, c.source_id, c.text, c.ts_start, c.ts_end, c.speaker, c.confidence_language, c.status, c.category, c.claim_date, c.claim_hash, c.claim_hash_global, c.signals, c.status_auto, c.auto_confidence, c.status_human, c.created_at, c.updated_at \
             FROM cluster_members m JOIN claims c ON c.id = m.claim_id \
             WHERE m.cluster_id = ?1 ORDER BY m.similarity_to_rep DESC",
        )?;
        let rows = stmt.query_map(params![cluster_id], |row| {
            let member = ClusterMember {
                cluster_id: row.get(0)?,
                claim_id: row.get(1)?,
                fingerprint: row.get(2)?,
                similarity_to_rep: row.get(3)?,
            };
            let claim = claim_from_row_offset(row, 4)?;
            Ok((member, claim))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

/// Add any claims column introduced after the initial schema. Safe to re-run.
fn migrate(conn: &Connection) -> Result<()> {
    let claims_exists: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='claims'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if claims_exists.is_none() {
        return Ok(()); // schema script will create the table with all columns
    }

    let mut stmt = conn.prepare("PRAGMA table_info(claims)")?;
    let existing: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (name, decl) in LATE_CLAIM_COLUMNS {
        if !existing.iter().any(|c| c == name) {
            tracing::info!("migrating claims table: adding column {}", name);
            conn.execute(
                &format!("ALTER TABLE claims ADD COLUMN {} {}", name, decl),
                [],
            )?;
        }
    }
    Ok(())
}

fn row_to_source(row: &Row<'_>) -> rusqlite::Result<Source> {
    Ok(Source {
        id: row.get("id")?,
        url: row.get("url")?,
        title: row.get("title")?,
        channel: row.get("channel")?,
        upload_date: row.get("upload_date")?,
        source_type: SourceType::parse(&row.get::<_, String>("source_type")?),
        duration_seconds: row.get("duration_seconds")?,
        local_audio_path: row.get("local_audio_path")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_claim(row: &Row<'_>) -> rusqlite::Result<Claim> {
    claim_from_row_offset(row, 0)
}

fn claim_from_row_offset(row: &Row<'_>, base: usize) -> rusqlite::Result<Claim> {
    Ok(Claim {
        id: row.get(base)?,
        source_id: row.get(base + 1)?,
        text: row.get(base + 2)?,
        ts_start: row.get(base + 3)?,
        ts_end: row.get(base + 4)?,
        speaker: row.get(base + 5)?,
        confidence_language: row.get(base + 6)?,
        status: row.get(base + 7)?,
        category: row.get(base + 8)?,
        claim_date: row.get(base + 9)?,
        claim_hash: row.get(base + 10)?,
        claim_hash_global: row.get(base + 11)?,
        signals: row.get(base + 12)?,
        status_auto: row.get(base + 13)?,
        auto_confidence: row.get(base + 14)?,
        status_human: row.get(base + 15)?,
        created_at: row.get(base + 16)?,
        updated_at: row.get(base + 17)?,
    })
}

fn row_to_cluster(row: &Row<'_>) -> rusqlite::Result<ClaimCluster> {
    Ok(ClaimCluster {
        id: row.get(0)?,
        representative_text: row.get(1)?,
        category: row.get(2)?,
        claim_count: row.get::<_, i64>(3)? as usize,
        source_count: row.get::<_, i64>(4)? as usize,
        best_status: row.get(5)?,
        best_confidence: row.get(6)?,
        consensus_score: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
