// src/fetch/providers/market.rs
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::capability::Credential;
use crate::config::FetchParams;
use crate::error::{ErrorKind, FetchError};
use crate::fetch::types::{Category, MarketRecord, QuoteItem, SourceRecord};
use crate::fetch::{get_json, get_text, SourceFetcher};

/// Stooq CSV quotes for all symbols in one request. Free, no key.
///
/// Stooq has no previous-close field in this format, so `change_pct` is the
/// session move from open to last.
pub struct Stooq {
    client: reqwest::Client,
    endpoint: String,
    symbols: Vec<String>,
}

impl Stooq {
    pub fn new(client: reqwest::Client, endpoint: String, params: &FetchParams) -> Self {
        Self {
            client,
            endpoint,
            symbols: params.symbols.clone(),
        }
    }

    fn stooq_symbols(&self) -> String {
        self.symbols
            .iter()
            .map(|s| {
                let s = s.trim().to_ascii_lowercase();
                if s.contains('.') {
                    s
                } else {
                    format!("{s}.us")
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Expected header: `Symbol,Date,Time,Open,High,Low,Close`. A row of
    /// `N/D` means Stooq has no quote for that symbol, which fails the record.
    pub fn parse_csv(body: &str, symbols: &[String]) -> Result<SourceRecord, FetchError> {
        let mut lines = body.lines().map(str::trim).filter(|l| !l.is_empty());
        let header = lines
            .next()
            .ok_or_else(|| FetchError::malformed("empty csv"))?;
        let cols: Vec<&str> = header.split(',').map(str::trim).collect();
        let idx = |name: &str| {
            cols.iter()
                .position(|c| c.eq_ignore_ascii_case(name))
                .ok_or_else(|| FetchError::malformed(format!("csv has no {name} column")))
        };
        let (i_sym, i_open, i_close) = (idx("Symbol")?, idx("Open")?, idx("Close")?);

        let mut quotes = Vec::new();
        for line in lines {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != cols.len() {
                return Err(FetchError::malformed(format!("ragged csv row: {line}")));
            }
            if fields.iter().any(|f| f.eq_ignore_ascii_case("N/D")) {
                return Err(FetchError::malformed(format!(
                    "no quote for {}",
                    fields[i_sym]
                )));
            }
            let open = parse_price(fields[i_open])?;
            let close = parse_price(fields[i_close])?;
            if open == 0.0 {
                return Err(FetchError::malformed("zero open price"));
            }
            let symbol = fields[i_sym]
                .trim_end_matches(".US")
                .trim_end_matches(".us")
                .to_ascii_uppercase();
            quotes.push(QuoteItem {
                symbol,
                price: close,
                change_pct: (close - open) / open * 100.0,
            });
        }
        market_record(quotes, symbols)
    }
}

#[async_trait]
impl SourceFetcher for Stooq {
    fn category(&self) -> Category {
        Category::MarketQuotes
    }

    fn name(&self) -> &'static str {
        "stooq"
    }

    async fn fetch(&self, timeout: Duration) -> Result<SourceRecord, FetchError> {
        let symbols = self.stooq_symbols();
        let req = self.client.get(&self.endpoint).query(&[
            ("s", symbols.as_str()),
            ("f", "sd2t2ohlc"),
            ("h", ""),
            ("e", "csv"),
        ]);
        let body = get_text(req, timeout).await?;
        Self::parse_csv(&body, &self.symbols)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpQuote {
    symbol: String,
    price: f64,
    changes_percentage: f64,
}

/// Financial Modeling Prep batch quote. Needs `apikey`.
pub struct Fmp {
    client: reqwest::Client,
    endpoint: String,
    key: Credential,
    symbols: Vec<String>,
}

impl Fmp {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        key: Credential,
        params: &FetchParams,
    ) -> Self {
        Self {
            client,
            endpoint,
            key,
            symbols: params.symbols.clone(),
        }
    }

    /// FMP answers a bad key with 200 and `{"Error Message": ...}`.
    fn parse(body: serde_json::Value, symbols: &[String]) -> Result<SourceRecord, FetchError> {
        if let Some(msg) = body.get("Error Message").and_then(|m| m.as_str()) {
            return Err(FetchError::new(ErrorKind::AuthRejected, msg.to_string()));
        }
        let raw: Vec<FmpQuote> = serde_json::from_value(body)
            .map_err(|e| FetchError::malformed(format!("fmp quotes: {e}")))?;
        let quotes = raw
            .into_iter()
            .map(|q| {
                if q.price.is_finite() && q.changes_percentage.is_finite() {
                    Ok(QuoteItem {
                        symbol: q.symbol.to_ascii_uppercase(),
                        price: q.price,
                        change_pct: q.changes_percentage,
                    })
                } else {
                    Err(FetchError::malformed("non-finite quote"))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        market_record(quotes, symbols)
    }
}

#[async_trait]
impl SourceFetcher for Fmp {
    fn category(&self) -> Category {
        Category::MarketQuotes
    }

    fn name(&self) -> &'static str {
        "fmp"
    }

    async fn fetch(&self, timeout: Duration) -> Result<SourceRecord, FetchError> {
        let url = format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.symbols.join(",")
        );
        let req = self
            .client
            .get(url)
            .query(&[("apikey", self.key.expose())]);
        let body: serde_json::Value = get_json(req, timeout).await?;
        Self::parse(body, &self.symbols)
    }
}

fn parse_price(s: &str) -> Result<f64, FetchError> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FetchError::malformed(format!("bad price {s:?}")))
}

/// All-or-nothing: every configured symbol must have a quote.
fn market_record(quotes: Vec<QuoteItem>, symbols: &[String]) -> Result<SourceRecord, FetchError> {
    if quotes.is_empty() {
        return Err(FetchError::malformed("no quotes"));
    }
    let missing: Vec<&str> = symbols
        .iter()
        .map(|s| s.trim())
        .filter(|want| !quotes.iter().any(|q| q.symbol.eq_ignore_ascii_case(want)))
        .collect();
    if !missing.is_empty() {
        return Err(FetchError::malformed(format!(
            "no quote for {}",
            missing.join(", ")
        )));
    }
    Ok(SourceRecord::Market(MarketRecord { quotes }))
}
