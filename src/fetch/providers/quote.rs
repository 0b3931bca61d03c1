// src/fetch/providers/quote.rs
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::capability::Credential;
use crate::error::FetchError;
use crate::fetch::types::{Category, QuoteRecord, SourceRecord};
use crate::fetch::{get_json, normalize_text, SourceFetcher};

const MAX_QUOTE_CHARS: usize = 400;

/// Quotable random quote. Free, no key.
pub struct Quotable {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct QuotableResponse {
    content: String,
    author: String,
}

impl Quotable {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl SourceFetcher for Quotable {
    fn category(&self) -> Category {
        Category::QuoteOfDay
    }

    fn name(&self) -> &'static str {
        "quotable"
    }

    async fn fetch(&self, timeout: Duration) -> Result<SourceRecord, FetchError> {
        let resp: QuotableResponse = get_json(self.client.get(&self.endpoint), timeout).await?;
        quote_record(&resp.content, &resp.author)
    }
}

/// API Ninjas quotes. Needs `X-Api-Key`.
pub struct ApiNinjas {
    client: reqwest::Client,
    endpoint: String,
    key: Credential,
}

#[derive(Debug, Deserialize)]
struct NinjaQuote {
    quote: String,
    author: String,
}

impl ApiNinjas {
    pub fn new(client: reqwest::Client, endpoint: String, key: Credential) -> Self {
        Self {
            client,
            endpoint,
            key,
        }
    }
}

#[async_trait]
impl SourceFetcher for ApiNinjas {
    fn category(&self) -> Category {
        Category::QuoteOfDay
    }

    fn name(&self) -> &'static str {
        "api-ninjas"
    }

    async fn fetch(&self, timeout: Duration) -> Result<SourceRecord, FetchError> {
        let req = self
            .client
            .get(&self.endpoint)
            .header("X-Api-Key", self.key.expose());
        let resp: Vec<NinjaQuote> = get_json(req, timeout).await?;
        let first = resp
            .first()
            .ok_or_else(|| FetchError::malformed("empty quote list"))?;
        quote_record(&first.quote, &first.author)
    }
}

fn quote_record(text: &str, author: &str) -> Result<SourceRecord, FetchError> {
    let text = normalize_text(text, MAX_QUOTE_CHARS);
    let author = normalize_text(author, 120);
    if text.is_empty() || author.is_empty() {
        return Err(FetchError::malformed("quote without text or author"));
    }
    Ok(SourceRecord::Quote(QuoteRecord { text, author }))
}
