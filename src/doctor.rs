//! Diagnostics: verify the runtime environment before a long run.

use crate::config::Config;
use crate::paths::DataPaths;
use crate::store::Store;

/// One diagnostic outcome: (check name, passed, detail)
pub type Check = (String, bool, String);

pub async fn run_checks(config: &Config) -> Vec<Check> {
    let mut results: Vec<Check> = Vec::new();
    let paths = DataPaths::from_config(config);

    // 1. Data root writable
    let data_ok = std::fs::create_dir_all(&paths.root).is_ok();
    results.push((
        "Data directory".to_string(),
        data_ok,
        if data_ok {
            paths.root.display().to_string()
        } else {
            format!("cannot create {}", paths.root.display())
        },
    ));

    // 2. Store opens and migrates
    match Store::open(&paths.db_path()) {
        Ok(_) => results.push((
            "Store".to_string(),
            true,
            paths.db_path().display().to_string(),
        )),
        Err(e) => results.push(("Store".to_string(), false, e.to_string())),
    }

    // 3. Datasets directory contents
    match paths.datasets_dir() {
        Ok(dir) => {
            let count = std::fs::read_dir(&dir)
                .map(|entries| {
                    entries
                        .filter_map(|e| e.ok())
                        .filter(|e| {
                            matches!(
                                e.path()
                                    .extension()
                                    .and_then(|x| x.to_str())
                                    .map(str::to_lowercase),
                                Some(ref ext) if ext == "csv" || ext == "xlsx"
                            )
                        })
                        .count()
                })
                .unwrap_or(0);
            results.push((
                "Local datasets".to_string(),
                true,
                format!("{} file(s) in {}", count, dir.display()),
            ));
        }
        Err(e) => results.push(("Local datasets".to_string(), false, e.to_string())),
    }

    // 4. Optional API keys
    results.push((
        "PatentsView API key".to_string(),
        config.runtime.patentsview_api_key.is_some(),
        if config.runtime.patentsview_api_key.is_some() {
            "configured".to_string()
        } else {
            "not set — provider degrades to reference links".to_string()
        },
    ));
    results.push((
        "FRED API key".to_string(),
        config.runtime.fred_api_key.is_some(),
        if config.runtime.fred_api_key.is_some() {
            "configured".to_string()
        } else {
            "not set — catalogue snippets only".to_string()
        },
    ));

    // 5. Outbound network (one cheap, throttle-free request)
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build();
    let net_ok = match client {
        Ok(client) => client
            .head("https://api.crossref.org/works?rows=0")
            .send()
            .await
            .map(|r| r.status().is_success() || r.status().is_client_error())
            .unwrap_or(false),
        Err(_) => false,
    };
    results.push((
        "Network".to_string(),
        net_ok,
        if net_ok {
            "outbound HTTPS reachable".to_string()
        } else {
            "providers will return empty results".to_string()
        },
    ));

    results
}
