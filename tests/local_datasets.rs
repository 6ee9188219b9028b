//! Local dataset provider: the one evidence source that works fully
//! offline, exercised against real files on disk.

use std::io::Write;

use veridex::config::Config;
use veridex::paths::DataPaths;
use veridex::providers::http::ProviderHttp;
use veridex::providers::{local_datasets, SearchContext};

fn context_for(root: &std::path::Path, config: &Config) -> (DataPaths, ProviderHttp) {
    let mut config = config.clone();
    config.runtime.data_dir = root.to_path_buf();
    let paths = DataPaths {
        root: root.to_path_buf(),
    };
    let http = ProviderHttp::new(&config.runtime);
    (paths, http)
}

fn write_csv(dir: &std::path::Path, name: &str, content: &str) {
    let mut f = std::fs::File::create(dir.join(name)).unwrap();
    f.write_all(content.as_bytes()).unwrap();
}

#[test]
fn matching_rows_become_dataset_results() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::default();
    let (paths, http) = context_for(tmp.path(), &config);
    let datasets_dir = paths.datasets_dir().unwrap();

    write_csv(
        &datasets_dir,
        "budget_summary.csv",
        "Program,Year,Amount\n\
         Enforcement,2023,2149\n\
         Examinations,2023,1207\n\
         Technology,2023,420\n",
    );

    let ctx = SearchContext {
        http: &http,
        paths: &paths,
        runtime: &config.runtime,
        source_entity: String::new(),
        claim_date: String::new(),
        upload_date: String::new(),
    };

    let results = local_datasets::search(
        "The enforcement budget reached 2149 million dollars in 2023",
        5,
        &ctx,
    );
    assert!(!results.is_empty());
    let r = &results[0];
    assert_eq!(r.evidence_type, "dataset");
    assert_eq!(r.source_name, "local_dataset");
    assert!(r.title.contains("budget_summary.csv"));
    assert!(r.snippet.contains("2149"));
    assert!(r.snippet.contains("Exact number match"));
    assert!(r.url.starts_with("file://"));
}

#[test]
fn irrelevant_claims_match_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::default();
    let (paths, http) = context_for(tmp.path(), &config);
    let datasets_dir = paths.datasets_dir().unwrap();

    write_csv(
        &datasets_dir,
        "birds.csv",
        "Species,Count\nSparrow,90210\nStarling,88771\n",
    );

    let ctx = SearchContext {
        http: &http,
        paths: &paths,
        runtime: &config.runtime,
        source_entity: String::new(),
        claim_date: String::new(),
        upload_date: String::new(),
    };

    let results = local_datasets::search("Quarterly margin expanded moderately", 5, &ctx);
    assert!(results.is_empty());
}

#[test]
fn empty_datasets_dir_is_fine() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::default();
    let (paths, http) = context_for(tmp.path(), &config);
    paths.datasets_dir().unwrap();

    let ctx = SearchContext {
        http: &http,
        paths: &paths,
        runtime: &config.runtime,
        source_entity: String::new(),
        claim_date: String::new(),
        upload_date: String::new(),
    };

    assert!(local_datasets::search("Anything with a 42 in it", 5, &ctx).is_empty());
}

#[test]
fn unreadable_file_does_not_fail_the_search() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::default();
    let (paths, http) = context_for(tmp.path(), &config);
    let datasets_dir = paths.datasets_dir().unwrap();

    // Not actually an XLSX file; the loader should skip it
    write_csv(&datasets_dir, "broken.xlsx", "this is not a spreadsheet");
    write_csv(
        &datasets_dir,
        "good.csv",
        "Metric,Value\nRevenue,113.8\nMargin,31.6\n",
    );

    let ctx = SearchContext {
        http: &http,
        paths: &paths,
        runtime: &config.runtime,
        source_entity: String::new(),
        claim_date: String::new(),
        upload_date: String::new(),
    };

    let results = local_datasets::search("Revenue came in at 113.8 billion", 5, &ctx);
    assert!(!results.is_empty());
    assert!(results[0].title.contains("good.csv"));
}
