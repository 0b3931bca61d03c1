// src/config/sources.rs
//! Static source configuration: which providers back each category, in which
//! order, with which credential and timeout. Loaded once at startup.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::fetch::types::Category;

pub const ENV_SOURCES_PATH: &str = "COMMAND_CENTER_SOURCES_PATH";
pub const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";

/// Upstream providers this crate knows how to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    OpenMeteo,
    OpenWeather,
    Rss,
    NewsApi,
    Stooq,
    Fmp,
    GithubSearch,
    Quotable,
    ApiNinjas,
}

impl ProviderKind {
    pub fn category(&self) -> Category {
        match self {
            Self::OpenMeteo | Self::OpenWeather => Category::Weather,
            Self::Rss | Self::NewsApi => Category::News,
            Self::Stooq | Self::Fmp => Category::MarketQuotes,
            Self::GithubSearch => Category::TrendingRepos,
            Self::Quotable | Self::ApiNinjas => Category::QuoteOfDay,
        }
    }

    /// Providers that cannot be called at all without a key.
    pub fn requires_credential(&self) -> bool {
        matches!(
            self,
            Self::OpenWeather | Self::NewsApi | Self::Fmp | Self::ApiNinjas
        )
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenMeteo => "https://api.open-meteo.com/v1/forecast",
            Self::OpenWeather => "https://api.openweathermap.org/data/2.5/weather",
            Self::Rss => "https://feeds.bbci.co.uk/news/technology/rss.xml",
            Self::NewsApi => "https://newsapi.org/v2/top-headlines",
            Self::Stooq => "https://stooq.com/q/l/",
            Self::Fmp => "https://financialmodelingprep.com/api/v3/quote",
            Self::GithubSearch => "https://api.github.com/search/repositories",
            Self::Quotable => "https://api.quotable.io/random",
            Self::ApiNinjas => "https://api.api-ninjas.com/v1/quotes",
        }
    }
}

/// Credential requirement of a descriptor: the env var holding the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequirement {
    pub env: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub provider: ProviderKind,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub auth: Option<AuthRequirement>,
    /// Own budget for this source; never exceeds the per-attempt timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl SourceDescriptor {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            endpoint: None,
            auth: None,
            timeout_ms: None,
        }
    }

    pub fn with_auth_env(mut self, env: &str) -> Self {
        self.auth = Some(AuthRequirement {
            env: env.to_string(),
        });
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }

    pub fn timeout_cap(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateSection {
    pub per_attempt_timeout_ms: u64,
}

impl Default for AggregateSection {
    fn default() -> Self {
        Self {
            per_attempt_timeout_ms: 4_000,
        }
    }
}

/// Request parameters shared by the providers. Static, not per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchParams {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub news_topic: String,
    pub symbols: Vec<String>,
    pub trending_window_days: i64,
    pub max_items: usize,
}

impl Default for FetchParams {
    fn default() -> Self {
        Self {
            city: "New York".to_string(),
            latitude: 40.7128,
            longitude: -74.006,
            news_topic: "technology".to_string(),
            symbols: vec!["AAPL".into(), "GOOGL".into(), "MSFT".into()],
            trending_window_days: 30,
            max_items: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub aggregate: AggregateSection,
    #[serde(default)]
    pub params: FetchParams,
    /// Categories absent from the file keep their built-in chain.
    #[serde(default)]
    pub chains: BTreeMap<Category, Vec<SourceDescriptor>>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            aggregate: AggregateSection::default(),
            params: FetchParams::default(),
            chains: default_chains(),
        }
    }
}

/// Free primary first, keyed fallback second.
pub fn default_chains() -> BTreeMap<Category, Vec<SourceDescriptor>> {
    use ProviderKind::*;
    BTreeMap::from([
        (
            Category::Weather,
            vec![
                SourceDescriptor::new(OpenMeteo),
                SourceDescriptor::new(OpenWeather).with_auth_env("OPENWEATHER_API_KEY"),
            ],
        ),
        (
            Category::News,
            vec![
                SourceDescriptor::new(Rss),
                SourceDescriptor::new(NewsApi).with_auth_env("NEWS_API_KEY"),
            ],
        ),
        (
            Category::MarketQuotes,
            vec![
                SourceDescriptor::new(Stooq),
                SourceDescriptor::new(Fmp).with_auth_env("FMP_API_KEY"),
            ],
        ),
        (
            Category::TrendingRepos,
            vec![
                SourceDescriptor::new(GithubSearch),
                SourceDescriptor::new(GithubSearch).with_auth_env("GITHUB_TOKEN"),
            ],
        ),
        (
            Category::QuoteOfDay,
            vec![
                SourceDescriptor::new(Quotable),
                SourceDescriptor::new(ApiNinjas).with_auth_env("API_NINJAS_KEY"),
            ],
        ),
    ])
}

impl SourcesConfig {
    pub fn per_attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.aggregate.per_attempt_timeout_ms)
    }

    pub fn chain(&self, category: Category) -> &[SourceDescriptor] {
        self.chains
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Reject configurations the chains cannot be built from.
    pub fn validate(&self) -> Result<()> {
        if self.aggregate.per_attempt_timeout_ms == 0 {
            bail!("aggregate.per_attempt_timeout_ms must be > 0");
        }
        if self.params.max_items == 0 {
            bail!("params.max_items must be > 0");
        }
        for category in Category::ALL {
            let chain = self.chain(category);
            if chain.is_empty() || chain.len() > 2 {
                bail!(
                    "chain for {category} must have 1 or 2 sources, got {}",
                    chain.len()
                );
            }
            for desc in chain {
                if desc.provider.category() != category {
                    bail!(
                        "provider {:?} serves {}, not {category}",
                        desc.provider,
                        desc.provider.category()
                    );
                }
                if desc.provider.requires_credential() && desc.auth.is_none() {
                    bail!(
                        "provider {:?} in {category} needs `auth = {{ env = \"...\" }}`",
                        desc.provider
                    );
                }
                if desc.timeout_ms == Some(0) {
                    bail!("timeout_ms for {:?} in {category} must be > 0", desc.provider);
                }
            }
        }
        Ok(())
    }
}

/// Parse a TOML sources file, overlaying it on the built-in chains.
pub fn parse_sources(s: &str) -> Result<SourcesConfig> {
    let mut cfg: SourcesConfig = toml::from_str(s).context("parsing sources toml")?;
    for (category, chain) in default_chains() {
        cfg.chains.entry(category).or_insert(chain);
    }
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_sources_from(path: &Path) -> Result<SourcesConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources config from {}", path.display()))?;
    parse_sources(&content)
}

/// Load using env var + fallbacks:
/// 1) $COMMAND_CENTER_SOURCES_PATH (must exist)
/// 2) config/sources.toml
/// 3) built-in defaults
pub fn load_sources_default() -> Result<SourcesConfig> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_SOURCES_PATH} points to non-existent path"));
        }
        return load_sources_from(&pb);
    }
    let default_p = PathBuf::from(DEFAULT_SOURCES_PATH);
    if default_p.exists() {
        return load_sources_from(&default_p);
    }
    Ok(SourcesConfig::default())
}
