//! Veridex CLI: local claim-extraction and evidence-tracking engine.

use clap::{Parser, Subcommand};
use prettytable::{row, Table};
use std::io::Write;

use crate::config::Config;
use crate::error::VeridexError;
use crate::export::{fmt_ts, DEFAULT_MAX_QUOTES};
use crate::models::{new_id, now_rfc3339, Evidence};
use crate::paths::DataPaths;
use crate::store::Store;

const VALID_STATUSES: [&str; 4] = ["supported", "contradicted", "partial", "unknown"];
const VALID_EVIDENCE_TYPES: [&str; 8] = [
    "primary",
    "secondary",
    "dataset",
    "filing",
    "gov",
    "paper",
    "factcheck",
    "other",
];
const VALID_STRENGTHS: [&str; 3] = ["strong", "medium", "weak"];

#[derive(Parser)]
#[command(name = "veridex", version, about = "Local claim-extraction and evidence-tracking engine")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register an audio source (download/transcription handled externally)
    Ingest {
        url: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        channel: String,
    },
    /// Ingest a plain text file
    IngestText {
        path: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        channel: String,
    },
    /// Ingest a web article URL
    IngestUrl {
        url: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        channel: String,
    },
    /// Attach an externally produced segment blob to a source
    Transcribe {
        source_id: String,
        /// Path to a {"segments": [...]} JSON file; defaults to the
        /// source's canonical transcript path
        #[arg(long)]
        segments: Option<String>,
        #[arg(long, default_value = "external-stt")]
        engine: String,
    },
    /// Extract candidate claims from a source's segments (deterministic)
    Claims { source_id: String },
    /// Auto-discover evidence and set guarded auto-statuses for a source
    Assist {
        source_id: String,
        #[arg(long, default_value_t = 5)]
        max_per_claim: usize,
        /// 0 means no deadline
        #[arg(long, default_value_t = 0)]
        budget_minutes: u64,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Set a claim's verification status and attach evidence
    Verify {
        claim_id: String,
        #[arg(long)]
        status: String,
        #[arg(long = "add-evidence")]
        add_evidence: Vec<String>,
        #[arg(long, default_value = "other")]
        evidence_type: String,
        #[arg(long, default_value = "medium")]
        strength: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Step through a source's claims interactively
    Review { source_id: String },
    /// Substring search over claim text
    Search {
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List sources with verification counts
    Sources {
        #[arg(long = "by")]
        sort_by: Option<String>,
    },
    /// All occurrences of a claim across sources
    Spread { claim_id_or_hash: String },
    /// Chronological propagation of a claim across sources
    Timeline { claim_id_or_hash: String },
    /// Most-repeated claims across sources
    TopClaims {
        #[arg(long = "by", default_value = "frequency")]
        sort_by: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Rebuild the cross-source claim clusters
    BuildGraph {
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// List clusters
    Clusters {
        #[arg(long = "by", default_value = "consensus")]
        sort_by: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one cluster with its members
    Cluster { cluster_id: String },
    /// Claims most in need of human review
    Queue {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List auto-verified claims with their evidence
    InspectVerified {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },
    /// Write a source-cited brief
    Export {
        source_id: String,
        #[arg(long, default_value = "md")]
        format: String,
        #[arg(long, default_value_t = DEFAULT_MAX_QUOTES)]
        max_quotes: usize,
    },
    /// Check runtime dependencies and configuration
    Doctor,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let paths = DataPaths::from_config(&config);
    let mut store = Store::open(&paths.db_path())?;

    match cli.command {
        Command::Ingest { url, title, channel } => {
            let source = crate::ingest::ingest_audio_source(&mut store, &paths, &url, &title, &channel)?;
            println!("Registered source {}", source.id);
            println!("  Title   : {}", source.title);
            println!("  Channel : {}", source.channel);
            println!(
                "  Drop the transcript at {} and run `veridex transcribe {}`",
                paths.transcript_path(&source.id)?.display(),
                source.id
            );
        }

        Command::IngestText { path, title, channel } => {
            let source = crate::ingest::ingest_text_file(&mut store, &paths, &path, &title, &channel)?;
            println!("Ingested text source {}  ({})", source.id, source.title);
        }

        Command::IngestUrl { url, title, channel } => {
            let source = crate::ingest::ingest_url(&mut store, &paths, &url, &title, &channel).await?;
            println!("Ingested URL source {}  ({})", source.id, source.title);
        }

        Command::Transcribe { source_id, segments, engine } => {
            let meta = crate::ingest::attach_transcript(
                &mut store,
                &paths,
                &source_id,
                segments.as_deref(),
                &engine,
            )?;
            println!(
                "Transcript attached: {} segments ({})",
                meta.segment_count, meta.transcript_path
            );
        }

        Command::Claims { source_id } => {
            let claims = crate::extract::extract_for_source(&mut store, &paths, &config, &source_id)?;
            println!("{} claims extracted.", claims.len());

            let mut table = Table::new();
            table.add_row(row!["ID", "Timestamp", "Conf.", "Category", "Claim Text"]);
            for c in claims.iter().take(30) {
                table.add_row(row![
                    c.id,
                    format!("{}-{}", fmt_ts(c.ts_start), fmt_ts(c.ts_end)),
                    c.confidence_language,
                    c.category,
                    truncate(&c.text, 100)
                ]);
            }
            table.printstd();
            if claims.len() > 30 {
                println!("  ... and {} more (see claims.json)", claims.len() - 30);
            }
        }

        Command::Assist {
            source_id,
            max_per_claim,
            budget_minutes,
            dry_run,
        } => {
            let report = crate::assist::assist_source(
                &mut store,
                &paths,
                &config,
                &source_id,
                max_per_claim,
                budget_minutes,
                dry_run,
            )
            .await?;

            println!(
                "Assist run for {} ({}):",
                report.source_id,
                if report.dry_run { "dry run" } else { "stored" }
            );
            println!(
                "  claims: {}/{} processed, {} below verifiability cutoff",
                report.claims_processed, report.claims_total, report.claims_skipped_low_verifiability
            );
            println!(
                "  suggestions: {} found, {} stored",
                report.total_suggestions_found, report.total_suggestions_stored
            );
            println!(
                "  auto-status: {} supported, {} partial, {} unknown",
                report.auto_supported, report.auto_partial, report.auto_unknown
            );
            if !report.provider_tallies.is_empty() {
                let mut tallies: Vec<_> = report.provider_tallies.iter().collect();
                tallies.sort_by(|a, b| b.1.cmp(a.1));
                let summary: Vec<String> =
                    tallies.iter().map(|(name, n)| format!("{}:{}", name, n)).collect();
                println!("  providers: {}", summary.join(" "));
            }
            println!("  elapsed: {:.1}s", report.elapsed_seconds);

            let mut table = Table::new();
            table.add_row(row!["Claim", "Verif.", "Best", "Auto", "Text"]);
            for r in report.claim_reports.iter().take(30) {
                table.add_row(row![
                    r.claim_id,
                    r.verifiability,
                    r.best_score,
                    r.status_auto,
                    truncate(&r.text_excerpt, 70)
                ]);
            }
            table.printstd();
        }

        Command::Verify {
            claim_id,
            status,
            add_evidence,
            evidence_type,
            strength,
            notes,
        } => {
            if !VALID_STATUSES.contains(&status.as_str()) {
                return Err(VeridexError::Validation {
                    message: format!("Invalid status '{}'. Must be one of {:?}", status, VALID_STATUSES),
                }
                .into());
            }
            if store.get_claim(&claim_id)?.is_none() {
                return Err(VeridexError::Validation {
                    message: format!("Claim '{}' not found.", claim_id),
                }
                .into());
            }

            store.update_claim_human_status(&claim_id, &status)?;
            for url in &add_evidence {
                store.insert_evidence(&Evidence {
                    id: new_id(),
                    claim_id: claim_id.clone(),
                    url: url.clone(),
                    title: String::new(),
                    evidence_type: if VALID_EVIDENCE_TYPES.contains(&evidence_type.as_str()) {
                        evidence_type.clone()
                    } else {
                        "other".to_string()
                    },
                    strength: if VALID_STRENGTHS.contains(&strength.as_str()) {
                        strength.clone()
                    } else {
                        "medium".to_string()
                    },
                    notes: notes.clone(),
                    created_at: now_rfc3339(),
                })?;
            }
            println!("Claim {} -> status={}", claim_id, status);
            for url in &add_evidence {
                println!("  + evidence: {}", url);
            }
        }

        Command::Review { source_id } => {
            review_source(&mut store, &source_id)?;
        }

        Command::Search { query, limit } => {
            let claims = crate::search::search(&store, &query, limit)?;
            println!("{} match(es) for '{}':", claims.len(), query);
            let mut table = Table::new();
            table.add_row(row!["ID", "Source", "Status", "Text"]);
            for c in &claims {
                table.add_row(row![c.id, c.source_id, c.final_status(), truncate(&c.text, 90)]);
            }
            table.printstd();
        }

        Command::Sources { sort_by } => {
            let mut stats = store.source_stats()?;
            match sort_by.as_deref() {
                Some("verified_rate") => stats.sort_by(|a, b| {
                    b.verified_rate
                        .partial_cmp(&a.verified_rate)
                        .unwrap_or(std::cmp::Ordering::Equal)
                }),
                Some("claims") => stats.sort_by(|a, b| b.total_claims.cmp(&a.total_claims)),
                _ => {} // already newest-first
            }

            let mut table = Table::new();
            table.add_row(row!["ID", "Title", "Claims", "Supported", "Partial", "Unknown", "Verified %"]);
            for s in &stats {
                table.add_row(row![
                    s.source_id,
                    truncate(&s.title, 50),
                    s.total_claims,
                    s.supported,
                    s.partial,
                    s.unknown,
                    format!("{:.0}%", s.verified_rate)
                ]);
            }
            table.printstd();
        }

        Command::Spread { claim_id_or_hash } => {
            let hash = resolve_global_hash(&store, &claim_id_or_hash)?;
            let rows = store.claim_spread(&hash)?;
            println!("{} occurrence(s):", rows.len());
            let mut table = Table::new();
            table.add_row(row!["Source", "Title", "At", "Auto", "Conf."]);
            for r in &rows {
                table.add_row(row![
                    r.source_id,
                    truncate(&r.source_title, 40),
                    fmt_ts(r.ts_start),
                    r.status_auto,
                    format!("{:.2}", r.auto_confidence)
                ]);
            }
            table.printstd();
        }

        Command::Timeline { claim_id_or_hash } => {
            let hash = resolve_global_hash(&store, &claim_id_or_hash)?;
            let rows = store.claim_spread(&hash)?;
            println!("Propagation timeline ({} source(s)):", rows.len());
            for r in &rows {
                println!(
                    "  {}  [{}] {}  — {}",
                    r.source_created,
                    r.status_auto,
                    truncate(&r.source_title, 50),
                    truncate(&r.text, 70)
                );
            }
        }

        Command::TopClaims { sort_by, limit } => {
            let rows = store.top_claims(sort_by == "confidence", limit)?;
            let mut table = Table::new();
            table.add_row(row!["Sources", "Freq", "Status", "Conf.", "Text"]);
            for r in &rows {
                table.add_row(row![
                    r.source_count,
                    r.frequency,
                    r.best_status,
                    format!("{:.2}", r.best_confidence),
                    truncate(&r.text, 80)
                ]);
            }
            table.printstd();
        }

        Command::BuildGraph { threshold } => {
            let threshold = threshold.unwrap_or(config.graph.similarity_threshold);
            let report = crate::graph::build_knowledge_graph(
                &mut store,
                threshold,
                config.graph.max_block_size,
            )?;
            println!(
                "Graph rebuilt: {} clusters over {} claims ({} clustered, largest {}), {:.1}s",
                report.clusters_found,
                report.total_claims,
                report.claims_clustered,
                report.largest_cluster,
                report.elapsed_seconds
            );
        }

        Command::Clusters { sort_by, limit } => {
            let clusters = store.list_clusters(&sort_by, limit)?;
            let mut table = Table::new();
            table.add_row(row!["ID", "Sources", "Claims", "Status", "Consensus", "Representative"]);
            for c in &clusters {
                table.add_row(row![
                    c.id,
                    c.source_count,
                    c.claim_count,
                    c.best_status,
                    format!("{:.2}", c.consensus_score),
                    truncate(&c.representative_text, 70)
                ]);
            }
            table.printstd();
        }

        Command::Cluster { cluster_id } => {
            let cluster = store
                .get_cluster(&cluster_id)?
                .ok_or_else(|| VeridexError::Validation {
                    message: format!("Cluster '{}' not found.", cluster_id),
                })?;
            println!("Cluster {}", cluster.id);
            println!("  \"{}\"", cluster.representative_text);
            println!(
                "  category={} sources={} claims={} status={} consensus={:.2}",
                cluster.category,
                cluster.source_count,
                cluster.claim_count,
                cluster.best_status,
                cluster.consensus_score
            );
            for (m, claim) in store.get_cluster_members(&cluster_id)? {
                println!(
                    "  - [{:.2}] ({}) {}",
                    m.similarity_to_rep,
                    claim.source_id,
                    truncate(&claim.text, 80)
                );
            }
        }

        Command::Queue { limit } => {
            let claims = store.review_queue(limit)?;
            let mut table = Table::new();
            table.add_row(row!["ID", "Auto", "Conf.", "Category", "Text"]);
            for c in &claims {
                table.add_row(row![
                    c.id,
                    c.status_auto,
                    format!("{:.2}", c.auto_confidence),
                    c.category,
                    truncate(&c.text, 80)
                ]);
            }
            table.printstd();
        }

        Command::InspectVerified {
            status,
            source,
            category,
            verbose,
        } => {
            let claims = match &source {
                Some(source_id) => store.get_claims_for_source(source_id)?,
                None => store.all_claims()?,
            };
            let filtered: Vec<_> = claims
                .into_iter()
                .filter(|c| c.status_auto != "unknown")
                .filter(|c| status.as_deref().map_or(true, |s| c.status_auto == s))
                .filter(|c| category.as_deref().map_or(true, |cat| c.category == cat))
                .collect();

            println!("{} auto-verified claim(s):", filtered.len());
            for c in &filtered {
                println!(
                    "  [{}] ({:.2}) {} — {}",
                    c.status_auto,
                    c.auto_confidence,
                    c.id,
                    truncate(&c.text, 90)
                );
                if verbose {
                    for s in store.get_suggestions_for_claim(&c.id, 3)? {
                        println!("      [{}] score={} {}", s.source_name, s.score, s.url);
                    }
                }
            }
        }

        Command::Export {
            source_id,
            format,
            max_quotes,
        } => {
            let path = match format.as_str() {
                "json" => crate::export::export_json(&store, &paths, &source_id, max_quotes)?,
                "md" => crate::export::export_markdown(&store, &paths, &source_id, max_quotes)?,
                other => {
                    return Err(VeridexError::Validation {
                        message: format!("Unknown export format '{}'. Use md or json.", other),
                    }
                    .into())
                }
            };
            println!("Wrote {}", path);
        }

        Command::Doctor => {
            let checks = crate::doctor::run_checks(&config).await;
            let mut table = Table::new();
            table.add_row(row!["Check", "Status", "Detail"]);
            for (name, ok, detail) in &checks {
                table.add_row(row![name, if *ok { "OK" } else { "FAIL" }, detail]);
            }
            table.printstd();
        }
    }

    Ok(())
}

/// Accept either a claim id or a 64-hex global hash
fn resolve_global_hash(store: &Store, id_or_hash: &str) -> anyhow::Result<String> {
    if id_or_hash.len() == 64 && id_or_hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(id_or_hash.to_string());
    }
    let claim = store
        .get_claim(id_or_hash)?
        .ok_or_else(|| VeridexError::Validation {
            message: format!("Claim '{}' not found.", id_or_hash),
        })?;
    Ok(claim.claim_hash_global)
}

/// Interactive review: step through claims, prompt for a verdict each
fn review_source(store: &mut Store, source_id: &str) -> anyhow::Result<()> {
    let claims = store.get_claims_for_source(source_id)?;
    if claims.is_empty() {
        return Err(VeridexError::Validation {
            message: format!("No claims found for source '{}'.", source_id),
        }
        .into());
    }

    println!(
        "Reviewing {} claims. [s]upported [c]ontradicted [p]artial [u]nknown [enter] skip [q]uit",
        claims.len()
    );

    let stdin = std::io::stdin();
    for (i, claim) in claims.iter().enumerate() {
        println!();
        println!(
            "{}/{} [{}] ({}) {}",
            i + 1,
            claims.len(),
            claim.final_status(),
            fmt_ts(claim.ts_start),
            claim.text
        );
        for s in store.get_suggestions_for_claim(&claim.id, 3)? {
            println!("    [{}] score={} {}", s.source_name, s.score, s.url);
        }
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        stdin.read_line(&mut line)?;
        let status = match line.trim() {
            "s" => Some("supported"),
            "c" => Some("contradicted"),
            "p" => Some("partial"),
            "u" => Some("unknown"),
            "q" => break,
            _ => None,
        };
        if let Some(status) = status {
            store.update_claim_human_status(&claim.id, status)?;
            println!("  -> {}", status);
        }
    }

    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    }
}
