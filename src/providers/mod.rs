//! Evidence providers: a fixed, ordered registry of structured data source
//! adapters. Each provider is a rate-limited searcher that never raises into
//! its caller: any failure yields an empty result list.

pub mod arxiv;
pub mod bls;
pub mod cbo;
pub mod census;
pub mod crossref;
pub mod duckduckgo;
pub mod factcheck;
pub mod fred;
pub mod http;
pub mod local_datasets;
pub mod market;
pub mod openfda;
pub mod patentsview;
pub mod pubmed;
pub mod query;
pub mod sec_edgar;
pub mod sec_gov;
pub mod usaspending;
pub mod wikidata;
pub mod wikipedia;
pub mod worldbank;

use crate::config::RuntimeConfig;
use crate::paths::DataPaths;
use http::ProviderHttp;

/// A single evidence search hit in the shape the scorer consumes
#[derive(Debug, Clone)]
pub struct EvidenceResult {
    pub url: String,
    pub title: String,
    pub source_name: &'static str,
    /// paper|filing|gov|dataset|factcheck|secondary|primary|other
    pub evidence_type: &'static str,
    pub snippet: String,
    /// Year string when the provider knows one
    pub evidence_date: String,
}

/// Ambient inputs a provider may consult besides the claim text
pub struct SearchContext<'a> {
    pub http: &'a ProviderHttp,
    pub paths: &'a DataPaths,
    pub runtime: &'a RuntimeConfig,
    /// Company/entity inferred from source metadata (filing query injection)
    pub source_entity: String,
    /// Year extracted from the claim text, e.g. "2022"
    pub claim_date: String,
    /// Source upload date, e.g. "20250204" or ISO
    pub upload_date: String,
}

/// The fixed provider registry, as a tagged variant with a search capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    LocalDataset,
    Crossref,
    Arxiv,
    Pubmed,
    SecEdgar,
    SecGov,
    YahooFinance,
    Wikipedia,
    Fred,
    GoogleFactcheck,
    OpenFda,
    Bls,
    Cbo,
    UsaSpending,
    Census,
    WorldBank,
    PatentsView,
    Wikidata,
    DuckDuckGo,
}

/// Registry order is fixed; the router re-ranks but never invents entries
pub const REGISTRY: [Provider; 19] = [
    Provider::LocalDataset,
    Provider::Crossref,
    Provider::Arxiv,
    Provider::Pubmed,
    Provider::SecEdgar,
    Provider::SecGov,
    Provider::YahooFinance,
    Provider::Wikipedia,
    Provider::Fred,
    Provider::GoogleFactcheck,
    Provider::OpenFda,
    Provider::Bls,
    Provider::Cbo,
    Provider::UsaSpending,
    Provider::Census,
    Provider::WorldBank,
    Provider::PatentsView,
    Provider::Wikidata,
    Provider::DuckDuckGo,
];

impl Provider {
    /// Stable provider name, used in suggestion rows and throttle cells
    pub fn name(&self) -> &'static str {
        match self {
            Provider::LocalDataset => "local_dataset",
            Provider::Crossref => "crossref",
            Provider::Arxiv => "arxiv",
            Provider::Pubmed => "pubmed",
            Provider::SecEdgar => "sec_edgar",
            Provider::SecGov => "sec_gov",
            Provider::YahooFinance => "yahoo_finance",
            Provider::Wikipedia => "wikipedia",
            Provider::Fred => "fred",
            Provider::GoogleFactcheck => "google_factcheck",
            Provider::OpenFda => "openfda",
            Provider::Bls => "bls",
            Provider::Cbo => "cbo",
            Provider::UsaSpending => "usaspending",
            Provider::Census => "census",
            Provider::WorldBank => "worldbank",
            Provider::PatentsView => "patentsview",
            Provider::Wikidata => "wikidata",
            Provider::DuckDuckGo => "duckduckgo",
        }
    }

    /// Run the provider's search. Never fails; errors degrade to empty.
    pub async fn search(
        &self,
        claim_text: &str,
        max_results: usize,
        ctx: &SearchContext<'_>,
    ) -> Vec<EvidenceResult> {
        match self {
            Provider::LocalDataset => local_datasets::search(claim_text, max_results, ctx),
            Provider::Crossref => crossref::search(claim_text, max_results, ctx).await,
            Provider::Arxiv => arxiv::search(claim_text, max_results, ctx).await,
            Provider::Pubmed => pubmed::search(claim_text, max_results, ctx).await,
            Provider::SecEdgar => sec_edgar::search(claim_text, max_results, ctx).await,
            Provider::SecGov => sec_gov::search(claim_text, max_results, ctx).await,
            Provider::YahooFinance => market::search(claim_text, max_results, ctx).await,
            Provider::Wikipedia => wikipedia::search(claim_text, max_results, ctx).await,
            Provider::Fred => fred::search(claim_text, max_results, ctx).await,
            Provider::GoogleFactcheck => factcheck::search(claim_text, max_results, ctx).await,
            Provider::OpenFda => openfda::search(claim_text, max_results, ctx).await,
            Provider::Bls => bls::search(claim_text, max_results, ctx).await,
            Provider::Cbo => cbo::search(claim_text, max_results, ctx).await,
            Provider::UsaSpending => usaspending::search(claim_text, max_results, ctx).await,
            Provider::Census => census::search(claim_text, max_results, ctx).await,
            Provider::WorldBank => worldbank::search(claim_text, max_results, ctx).await,
            Provider::PatentsView => patentsview::search(claim_text, max_results, ctx).await,
            Provider::Wikidata => wikidata::search(claim_text, max_results, ctx).await,
            Provider::DuckDuckGo => duckduckgo::search(claim_text, max_results, ctx).await,
        }
    }
}
