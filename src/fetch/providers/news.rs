// src/fetch/providers/news.rs
use std::time::Duration;

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::capability::Credential;
use crate::config::FetchParams;
use crate::error::FetchError;
use crate::fetch::types::{Category, HeadlineItem, NewsRecord, SourceRecord};
use crate::fetch::{get_json, get_text, normalize_text, SourceFetcher};

const MAX_TITLE_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
}

/// Headlines from a public RSS 2.0 feed. Free, no key.
pub struct RssHeadlines {
    client: reqwest::Client,
    endpoint: String,
    max_items: usize,
}

impl RssHeadlines {
    pub fn new(client: reqwest::Client, endpoint: String, params: &FetchParams) -> Self {
        Self {
            client,
            endpoint,
            max_items: params.max_items,
        }
    }

    pub fn parse_feed(xml: &str, max_items: usize) -> Result<SourceRecord, FetchError> {
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss =
            from_str(&xml_clean).map_err(|e| FetchError::malformed(format!("rss xml: {e}")))?;
        let headlines = rss
            .channel
            .item
            .into_iter()
            .filter_map(|it| {
                let title = normalize_text(it.title.as_deref()?, MAX_TITLE_CHARS);
                (!title.is_empty()).then(|| HeadlineItem {
                    title,
                    url: it.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
                })
            })
            .take(max_items)
            .collect();
        news_record(headlines)
    }
}

#[async_trait]
impl SourceFetcher for RssHeadlines {
    fn category(&self) -> Category {
        Category::News
    }

    fn name(&self) -> &'static str {
        "rss"
    }

    async fn fetch(&self, timeout: Duration) -> Result<SourceRecord, FetchError> {
        let body = get_text(self.client.get(&self.endpoint), timeout).await?;
        Self::parse_feed(&body, self.max_items)
    }
}

#[derive(Debug, Deserialize)]
struct NaResponse {
    #[serde(default)]
    articles: Vec<NaArticle>,
}

#[derive(Debug, Deserialize)]
struct NaArticle {
    title: Option<String>,
    url: Option<String>,
}

/// NewsAPI top headlines. Needs `X-Api-Key`.
pub struct NewsApi {
    client: reqwest::Client,
    endpoint: String,
    key: Credential,
    topic: String,
    max_items: usize,
}

impl NewsApi {
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
            topic: params.news_topic.clone(),
            max_items: params.max_items,
        }
    }

    fn parse(resp: NaResponse, max_items: usize) -> Result<SourceRecord, FetchError> {
        let headlines = resp
            .articles
            .into_iter()
            .filter_map(|a| {
                let title = normalize_text(a.title.as_deref()?, MAX_TITLE_CHARS);
                // NewsAPI keeps deleted articles around under this placeholder.
                if title.is_empty() || title == "[Removed]" {
                    return None;
                }
                Some(HeadlineItem { title, url: a.url })
            })
            .take(max_items)
            .collect();
        news_record(headlines)
    }
}

#[async_trait]
impl SourceFetcher for NewsApi {
    fn category(&self) -> Category {
        Category::News
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }

    async fn fetch(&self, timeout: Duration) -> Result<SourceRecord, FetchError> {
        let page_size = self.max_items.to_string();
        let req = self
            .client
            .get(&self.endpoint)
            .header("X-Api-Key", self.key.expose())
            .query(&[
                ("category", self.topic.as_str()),
                ("country", "us"),
                ("pageSize", page_size.as_str()),
            ]);
        let resp: NaResponse = get_json(req, timeout).await?;
        Self::parse(resp, self.max_items)
    }
}

fn news_record(headlines: Vec<HeadlineItem>) -> Result<SourceRecord, FetchError> {
    if headlines.is_empty() {
        return Err(FetchError::malformed("no usable headlines"));
    }
    Ok(SourceRecord::News(NewsRecord { headlines }))
}

/// quick-xml only knows the XML entities; feeds routinely carry HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
