// src/fetch/types.rs
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ErrorKind;

/// The fixed set of data domains. Declaration order is the order used for
/// context lines and briefing sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Weather,
    News,
    MarketQuotes,
    TrendingRepos,
    QuoteOfDay,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Weather,
        Category::News,
        Category::MarketQuotes,
        Category::TrendingRepos,
        Category::QuoteOfDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::News => "news",
            Self::MarketQuotes => "market-quotes",
            Self::TrendingRepos => "trending-repos",
            Self::QuoteOfDay => "quote-of-day",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| anyhow::anyhow!("unknown category: {needle}"))
    }
}

/// Position of a fetcher inside its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Primary,
    Fallback,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// Degrees Fahrenheit.
    pub temperature: f64,
    pub condition: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineItem {
    pub title: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub headlines: Vec<HeadlineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteItem {
    pub symbol: String,
    pub price: f64,
    pub change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub quotes: Vec<QuoteItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoItem {
    pub name: String,
    pub description: String,
    pub star_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRecord {
    pub repos: Vec<RepoItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub text: String,
    pub author: String,
}

/// Normalized payload of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SourceRecord {
    Weather(WeatherRecord),
    News(NewsRecord),
    Market(MarketRecord),
    Repos(RepoRecord),
    Quote(QuoteRecord),
}

impl SourceRecord {
    pub fn category(&self) -> Category {
        match self {
            Self::Weather(_) => Category::Weather,
            Self::News(_) => Category::News,
            Self::Market(_) => Category::MarketQuotes,
            Self::Repos(_) => Category::TrendingRepos,
            Self::Quote(_) => Category::QuoteOfDay,
        }
    }
}

fn serialize_latency<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Result of one chain resolution (or one fetch attempt).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Success {
        record: SourceRecord,
        tier: Tier,
        #[serde(rename = "latency_ms", serialize_with = "serialize_latency")]
        latency: Duration,
    },
    Failure {
        error: ErrorKind,
        tier: Tier,
        #[serde(rename = "latency_ms", serialize_with = "serialize_latency")]
        latency: Duration,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn record(&self) -> Option<&SourceRecord> {
        match self {
            Self::Success { record, .. } => Some(record),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(*error),
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            Self::Success { tier, .. } | Self::Failure { tier, .. } => *tier,
        }
    }

    pub fn latency(&self) -> Duration {
        match self {
            Self::Success { latency, .. } | Self::Failure { latency, .. } => *latency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Weather".parse::<Category>().unwrap(), Category::Weather);
        assert_eq!(
            " market-quotes ".parse::<Category>().unwrap(),
            Category::MarketQuotes
        );
        assert!("stocks".parse::<Category>().is_err());
    }

    #[test]
    fn all_is_sorted_in_declaration_order() {
        let mut sorted = Category::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Category::ALL.to_vec());
    }

    #[test]
    fn outcome_serializes_latency_in_ms() {
        let out = FetchOutcome::Failure {
            error: ErrorKind::Timeout,
            tier: Tier::Fallback,
            latency: Duration::from_millis(1250),
        };
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["status"], "failure");
        assert_eq!(v["error"], "timeout");
        assert_eq!(v["tier"], "fallback");
        assert_eq!(v["latency_ms"], 1250);
    }
}
