// src/fetch/providers/repos.rs
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::capability::Credential;
use crate::config::FetchParams;
use crate::error::FetchError;
use crate::fetch::types::{Category, RepoItem, RepoRecord, SourceRecord};
use crate::fetch::{get_json, normalize_text, SourceFetcher};

const MAX_DESCRIPTION_CHARS: usize = 80;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    full_name: String,
    description: Option<String>,
    stargazers_count: u64,
}

/// GitHub repository search: most-starred repos created in the trending window.
/// Anonymous on the primary tier, token-authenticated on the fallback tier.
pub struct GithubSearch {
    client: reqwest::Client,
    endpoint: String,
    token: Option<Credential>,
    window_days: i64,
    max_items: usize,
}

impl GithubSearch {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        token: Option<Credential>,
        params: &FetchParams,
    ) -> Self {
        Self {
            client,
            endpoint,
            token,
            window_days: params.trending_window_days.max(1),
            max_items: params.max_items,
        }
    }

    fn query(&self) -> String {
        let since = Utc::now().date_naive() - chrono::Duration::days(self.window_days);
        format!("created:>{}", since.format("%Y-%m-%d"))
    }

    fn parse(resp: SearchResponse, max_items: usize) -> Result<SourceRecord, FetchError> {
        let repos: Vec<RepoItem> = resp
            .items
            .into_iter()
            .filter(|r| !r.full_name.trim().is_empty())
            .take(max_items)
            .map(|r| RepoItem {
                name: r.full_name,
                description: r
                    .description
                    .map(|d| normalize_text(&d, MAX_DESCRIPTION_CHARS))
                    .unwrap_or_default(),
                star_count: r.stargazers_count,
            })
            .collect();
        if repos.is_empty() {
            return Err(FetchError::malformed("search returned no repositories"));
        }
        Ok(SourceRecord::Repos(RepoRecord { repos }))
    }
}

#[async_trait]
impl SourceFetcher for GithubSearch {
    fn category(&self) -> Category {
        Category::TrendingRepos
    }

    fn name(&self) -> &'static str {
        if self.token.is_some() {
            "github-search-token"
        } else {
            "github-search"
        }
    }

    async fn fetch(&self, timeout: Duration) -> Result<SourceRecord, FetchError> {
        let per_page = self.max_items.to_string();
        let q = self.query();
        let mut req = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("q", q.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ]);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token.expose());
        }
        let resp: SearchResponse = get_json(req, timeout).await?;
        Self::parse(resp, self.max_items)
    }
}
