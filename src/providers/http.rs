//! Shared HTTP plumbing for evidence providers: one reqwest client, a
//! per-provider throttle cell, and error-swallowing fetch helpers.
//!
//! Concurrent calls to the same provider are serialised by its throttle;
//! different providers proceed independently.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::config::RuntimeConfig;

const USER_AGENT: &str = concat!(
    "veridex/",
    env!("CARGO_PKG_VERSION"),
    " (local research tool; mailto:noreply@local)"
);

/// SEC requires "Company AdminContact@domain" in the User-Agent
pub const SEC_USER_AGENT: &str = "Veridex Research Tool research@veridex.local";

/// Providers that need a gentler cadence than the 1 s default
const SLOW_INTERVALS: &[(&str, u64)] = &[
    ("arxiv", 3000),
    ("sec_edgar", 3000),
    ("sec_edgar_fetch", 3000),
    ("yahoo_finance", 1500),
];

const DEFAULT_INTERVAL_MS: u64 = 1000;

pub struct ProviderHttp {
    client: Client,
    throttles: HashMap<&'static str, DefaultDirectRateLimiter>,
    default_timeout: Duration,
    html_timeout: Duration,
}

fn limiter_for_interval(ms: u64) -> DefaultDirectRateLimiter {
    let period = Duration::from_millis(ms.max(1));
    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::new(1).expect("nonzero")));
    RateLimiter::direct(quota)
}

impl ProviderHttp {
    pub fn new(runtime: &RuntimeConfig) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(runtime.html_fetch_timeout_secs.max(
                runtime.provider_timeout_secs,
            )))
            .build()
            .unwrap_or_default();

        let mut throttles = HashMap::new();
        for (name, ms) in SLOW_INTERVALS {
            throttles.insert(*name, limiter_for_interval(*ms));
        }

        Self {
            client,
            throttles,
            default_timeout: Duration::from_secs(runtime.provider_timeout_secs),
            html_timeout: Duration::from_secs(runtime.html_fetch_timeout_secs),
        }
    }

    /// Block until the provider's minimum inter-request interval has passed
    pub async fn throttle(&self, source_name: &'static str) {
        match self.throttles.get(source_name) {
            Some(limiter) => limiter.until_ready().await,
            None => {
                // Default cells are created lazily per process via a static map
                default_limiter(source_name).until_ready().await;
            }
        }
    }

    /// GET returning parsed JSON; None on any failure
    pub async fn get_json(
        &self,
        url: &str,
        source_name: &'static str,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Option<serde_json::Value> {
        let text = self
            .get_raw(url, source_name, params, headers, self.default_timeout)
            .await?;
        match serde_json::from_str(&text) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(provider = source_name, error = %e, "JSON parse failed");
                None
            }
        }
    }

    /// GET returning the response body; None on any failure
    pub async fn get_text(
        &self,
        url: &str,
        source_name: &'static str,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Option<String> {
        self.get_raw(url, source_name, params, headers, self.default_timeout)
            .await
    }

    /// GET with the longer HTML-fetch timeout
    pub async fn get_html(
        &self,
        url: &str,
        source_name: &'static str,
        headers: &[(&str, &str)],
    ) -> Option<String> {
        self.get_raw(url, source_name, &[], headers, self.html_timeout)
            .await
    }

    async fn get_raw(
        &self,
        url: &str,
        source_name: &'static str,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Option<String> {
        self.throttle(source_name).await;

        let mut req = self.client.get(url).timeout(timeout);
        if !params.is_empty() {
            req = req.query(params);
        }
        for (k, v) in headers {
            req = req.header(*k, *v);
        }

        match req.send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::debug!(provider = source_name, error = %e, "body read failed");
                    None
                }
            },
            Ok(resp) => {
                tracing::debug!(provider = source_name, status = %resp.status(), url, "non-2xx");
                None
            }
            Err(e) => {
                tracing::warn!(provider = source_name, error = %e, "request failed");
                None
            }
        }
    }

    /// POST a JSON body; None on any failure
    pub async fn post_json(
        &self,
        url: &str,
        source_name: &'static str,
        body: &serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.throttle(source_name).await;

        match self
            .client
            .post(url)
            .timeout(self.default_timeout)
            .json(body)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => match resp.json().await {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::debug!(provider = source_name, error = %e, "JSON parse failed");
                    None
                }
            },
            Ok(resp) => {
                tracing::debug!(provider = source_name, status = %resp.status(), "non-2xx");
                None
            }
            Err(e) => {
                tracing::warn!(provider = source_name, error = %e, "request failed");
                None
            }
        }
    }
}

/// Process-wide default throttle cells for providers without a custom interval
fn default_limiter(source_name: &'static str) -> &'static DefaultDirectRateLimiter {
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static CELLS: Lazy<Mutex<HashMap<&'static str, &'static DefaultDirectRateLimiter>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));

    let mut cells = CELLS.lock().expect("throttle map poisoned");
    *cells
        .entry(source_name)
        .or_insert_with(|| Box::leak(Box::new(limiter_for_interval(DEFAULT_INTERVAL_MS))))
}
