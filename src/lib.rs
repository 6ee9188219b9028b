pub mod assist;
pub mod categories;
pub mod cli;
pub mod config;
pub mod doctor;
pub mod error;
pub mod export;
pub mod extract;
pub mod graph;
pub mod ingest;
pub mod models;
pub mod paths;
pub mod providers;
pub mod router;
pub mod scoring;
pub mod search;
pub mod segments;
pub mod store;
pub mod textutil;

// Load env from the standard location; missing .env is silently ignored.
pub fn load_env() {
    let _ = dotenvy::dotenv();
}
