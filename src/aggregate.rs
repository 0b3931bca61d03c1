// src/aggregate.rs
//! Aggregator: every requested category resolved concurrently, every
//! category reported exactly once.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::histogram;
use serde::Serialize;
use tokio::task::JoinSet;

use crate::chain::FallbackChain;
use crate::config::SourcesConfig;
use crate::error::ErrorKind;
use crate::fetch::http_client;
use crate::fetch::types::{Category, FetchOutcome, SourceRecord, Tier};

/// One outcome per requested category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregateResult {
    outcomes: BTreeMap<Category, FetchOutcome>,
}

/// Flattened per-category view for widgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStatus {
    pub ok: bool,
    pub tier: Tier,
    pub error: Option<ErrorKind>,
    pub latency_ms: u64,
}

impl AggregateResult {
    pub fn get(&self, category: Category) -> Option<&FetchOutcome> {
        self.outcomes.get(&category)
    }

    /// Iterates in fixed category order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &FetchOutcome)> {
        self.outcomes.iter().map(|(c, o)| (*c, o))
    }

    pub fn categories(&self) -> BTreeSet<Category> {
        self.outcomes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Successful records in fixed category order.
    pub fn successes(&self) -> impl Iterator<Item = (Category, &SourceRecord)> {
        self.iter().filter_map(|(c, o)| o.record().map(|r| (c, r)))
    }

    pub fn statuses(&self) -> BTreeMap<Category, CategoryStatus> {
        self.iter()
            .map(|(c, o)| {
                let status = CategoryStatus {
                    ok: o.is_success(),
                    tier: o.tier(),
                    error: o.error(),
                    latency_ms: u64::try_from(o.latency().as_millis()).unwrap_or(u64::MAX),
                };
                (c, status)
            })
            .collect()
    }
}

impl FromIterator<(Category, FetchOutcome)> for AggregateResult {
    fn from_iter<I: IntoIterator<Item = (Category, FetchOutcome)>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

pub struct Aggregator {
    chains: BTreeMap<Category, Arc<FallbackChain>>,
}

impl Aggregator {
    /// A later chain for the same category replaces an earlier one.
    pub fn new(chains: impl IntoIterator<Item = FallbackChain>) -> Self {
        Self {
            chains: chains
                .into_iter()
                .map(|c| (c.category(), Arc::new(c)))
                .collect(),
        }
    }

    /// Build every configured chain once, sharing one HTTP client.
    pub fn from_config(cfg: &SourcesConfig) -> anyhow::Result<Self> {
        let client = http_client()?;
        let chains = Category::ALL.into_iter().map(|category| {
            FallbackChain::from_descriptors(category, cfg.chain(category), &cfg.params, &client)
        });
        Ok(Self::new(chains))
    }

    pub async fn aggregate_all(&self, per_attempt_timeout: Duration) -> AggregateResult {
        self.aggregate(&Category::ALL.into_iter().collect(), per_attempt_timeout)
            .await
    }

    /// Resolve `categories` concurrently. Never fails: a category without a
    /// chain, or whose task panicked, is reported as `Unreachable`.
    pub async fn aggregate(
        &self,
        categories: &BTreeSet<Category>,
        per_attempt_timeout: Duration,
    ) -> AggregateResult {
        crate::metrics::ensure_metrics_described();
        let t0 = Instant::now();

        let mut outcomes = BTreeMap::new();
        let mut tasks = JoinSet::new();
        let mut task_category = HashMap::new();

        for &category in categories {
            let Some(chain) = self.chains.get(&category) else {
                tracing::warn!(category = category.as_str(), "no chain configured");
                outcomes.insert(category, unreachable(Duration::ZERO));
                continue;
            };
            let chain = Arc::clone(chain);
            let handle =
                tasks.spawn(async move { (category, chain.resolve(per_attempt_timeout).await) });
            task_category.insert(handle.id(), category);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (category, outcome))) => {
                    outcomes.insert(category, outcome);
                }
                Err(err) => {
                    if let Some(&category) = task_category.get(&err.id()) {
                        tracing::error!(
                            category = category.as_str(),
                            error = %err,
                            "category task aborted"
                        );
                        outcomes.insert(category, unreachable(t0.elapsed()));
                    }
                }
            }
        }

        let elapsed = t0.elapsed();
        histogram!("aggregate_duration_ms").record(elapsed.as_secs_f64() * 1_000.0);
        let ok = outcomes.values().filter(|o| o.is_success()).count();
        tracing::info!(
            requested = categories.len(),
            ok,
            failed = outcomes.len() - ok,
            elapsed_ms = elapsed.as_millis() as u64,
            "aggregation finished"
        );

        AggregateResult { outcomes }
    }
}

fn unreachable(latency: Duration) -> FetchOutcome {
    FetchOutcome::Failure {
        error: ErrorKind::Unreachable,
        tier: Tier::Primary,
        latency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn category_without_chain_is_reported_not_omitted() {
        let agg = Aggregator::new(Vec::new());
        let wanted: BTreeSet<_> = [Category::News, Category::QuoteOfDay].into_iter().collect();
        let res = agg.aggregate(&wanted, Duration::from_millis(10)).await;
        assert_eq!(res.categories(), wanted);
        assert_eq!(
            res.get(Category::News).unwrap().error(),
            Some(ErrorKind::Unreachable)
        );
    }

    #[tokio::test]
    async fn empty_request_yields_empty_result() {
        let agg = Aggregator::new(Vec::new());
        let res = agg.aggregate(&BTreeSet::new(), Duration::from_millis(10)).await;
        assert!(res.is_empty());
    }
}
