// src/fetch/mod.rs
//! Source Fetchers: one upstream, one call, one normalized record or one
//! classified failure.

pub mod providers;
pub mod types;

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::{ErrorKind, FetchError};
use crate::fetch::types::{Category, FetchOutcome, SourceRecord, Tier};

const USER_AGENT: &str = "command-center/0.1";

/// One provider for one category.
///
/// Implementations make exactly one outbound request per `fetch` and never
/// retry. A record is returned only when every field parsed.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    fn category(&self) -> Category;
    fn name(&self) -> &'static str;
    async fn fetch(&self, timeout: Duration) -> Result<SourceRecord, FetchError>;
}

/// Run one fetch attempt under `timeout` and turn it into a [`FetchOutcome`].
///
/// The timeout is enforced here as well as inside the fetcher, so a fetcher
/// that ignores its budget is still cut off.
pub async fn attempt(fetcher: &dyn SourceFetcher, tier: Tier, timeout: Duration) -> FetchOutcome {
    crate::metrics::ensure_metrics_described();

    let category = fetcher.category();
    let t0 = Instant::now();
    let res = match tokio::time::timeout(timeout, fetcher.fetch(timeout)).await {
        Ok(r) => r,
        Err(_) => Err(FetchError::new(
            ErrorKind::Timeout,
            format!("no answer within {}ms", timeout.as_millis()),
        )),
    };
    let res = res.and_then(|record| {
        if record.category() == category {
            Ok(record)
        } else {
            Err(FetchError::malformed(format!(
                "{} returned a {} record",
                fetcher.name(),
                record.category()
            )))
        }
    });
    let latency = t0.elapsed();
    let latency_ms = latency.as_secs_f64() * 1_000.0;

    histogram!("fetch_latency_ms", "category" => category.as_str(), "tier" => tier.as_str())
        .record(latency_ms);

    match res {
        Ok(record) => {
            tracing::debug!(
                category = category.as_str(),
                tier = tier.as_str(),
                provider = fetcher.name(),
                latency_ms,
                "fetch ok"
            );
            counter!(
                "fetch_attempts_total",
                "category" => category.as_str(),
                "tier" => tier.as_str(),
                "outcome" => "success"
            )
            .increment(1);
            FetchOutcome::Success {
                record,
                tier,
                latency,
            }
        }
        Err(e) => {
            tracing::warn!(
                category = category.as_str(),
                tier = tier.as_str(),
                provider = fetcher.name(),
                latency_ms,
                error = %e,
                "fetch failed"
            );
            counter!(
                "fetch_attempts_total",
                "category" => category.as_str(),
                "tier" => tier.as_str(),
                "outcome" => e.kind.as_str()
            )
            .increment(1);
            FetchOutcome::Failure {
                error: e.kind,
                tier,
                latency,
            }
        }
    }
}

/// Shared client for all upstream calls. Per-request timeouts are set by each
/// fetcher from its attempt budget.
pub fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(4))
        .build()
        .context("building upstream http client")
}

/// Send the request and reject non-2xx statuses with a classified error.
pub(crate) async fn send(
    req: RequestBuilder,
    timeout: Duration,
) -> Result<reqwest::Response, FetchError> {
    let resp = req.timeout(timeout).send().await?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let exhausted = resp
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    Err(FetchError::new(
        ErrorKind::from_status(status, exhausted),
        format!("http status {status}"),
    ))
}

pub(crate) async fn get_text(req: RequestBuilder, timeout: Duration) -> Result<String, FetchError> {
    let resp = send(req, timeout).await?;
    Ok(resp.text().await?)
}

pub(crate) async fn get_json<T: DeserializeOwned>(
    req: RequestBuilder,
    timeout: Duration,
) -> Result<T, FetchError> {
    let body = get_text(req, timeout).await?;
    serde_json::from_str(&body).map_err(|e| FetchError::malformed(format!("json body: {e}")))
}

/// Normalize upstream text: decode entities, strip tags, straighten quotes,
/// collapse whitespace, cap at `max_chars`.
pub fn normalize_text(s: &str, max_chars: usize) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    truncate_chars(&out, max_chars)
}

pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
