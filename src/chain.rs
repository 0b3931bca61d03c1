// src/chain.rs
//! Fallback Chain: primary tier first, secondary tier on any primary failure.

use std::time::Duration;

use metrics::counter;

use crate::capability::Capability;
use crate::config::{FetchParams, SourceDescriptor};
use crate::error::ErrorKind;
use crate::fetch::providers::build_fetcher;
use crate::fetch::types::{Category, FetchOutcome, Tier};
use crate::fetch::{attempt, SourceFetcher};

/// A fetcher plus its own timeout cap.
pub struct ChainLink {
    fetcher: Box<dyn SourceFetcher>,
    timeout_cap: Option<Duration>,
}

impl ChainLink {
    pub fn new(fetcher: Box<dyn SourceFetcher>) -> Self {
        Self {
            fetcher,
            timeout_cap: None,
        }
    }

    pub fn with_timeout_cap(mut self, cap: Option<Duration>) -> Self {
        self.timeout_cap = cap;
        self
    }

    pub fn name(&self) -> &'static str {
        self.fetcher.name()
    }

    async fn run(&self, tier: Tier, per_attempt_timeout: Duration) -> FetchOutcome {
        let timeout = self
            .timeout_cap
            .map_or(per_attempt_timeout, |cap| cap.min(per_attempt_timeout));
        attempt(self.fetcher.as_ref(), tier, timeout).await
    }
}

enum ChainState<'a> {
    Primary,
    Secondary(&'a ChainLink, Duration),
    Done(FetchOutcome),
}

pub struct FallbackChain {
    category: Category,
    /// `None` when the primary's credential is missing.
    primary: Option<ChainLink>,
    secondary: Option<ChainLink>,
    /// Reported when neither tier is usable: `AuthRejected` if every
    /// configured tier lacks its key, `Unreachable` if none was configured.
    no_tier_error: ErrorKind,
}

impl FallbackChain {
    pub fn new(category: Category, primary: ChainLink) -> Self {
        Self {
            category,
            primary: Some(primary),
            secondary: None,
            no_tier_error: ErrorKind::Unreachable,
        }
    }

    pub fn with_secondary(mut self, secondary: ChainLink) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Build from configured descriptors. A descriptor whose credential is
    /// absent contributes no link at all.
    pub fn from_descriptors(
        category: Category,
        descriptors: &[SourceDescriptor],
        params: &FetchParams,
        client: &reqwest::Client,
    ) -> Self {
        let mut links = descriptors.iter().take(2).map(|desc| {
            match build_fetcher(desc, params, client) {
                Capability::Available(f) => {
                    Some(ChainLink::new(f).with_timeout_cap(desc.timeout_cap()))
                }
                Capability::Unavailable(reason) => {
                    tracing::info!(
                        category = category.as_str(),
                        provider = ?desc.provider,
                        %reason,
                        "source tier disabled"
                    );
                    None
                }
            }
        });
        let primary = links.next().flatten();
        let secondary = links.next().flatten();
        let no_tier_error = if descriptors.is_empty() {
            ErrorKind::Unreachable
        } else {
            ErrorKind::AuthRejected
        };
        Self {
            category,
            primary,
            secondary,
            no_tier_error,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Resolve the chain. At most two sequential attempts, each bounded by
    /// `per_attempt_timeout`. The returned latency covers the whole chain.
    pub async fn resolve(&self, per_attempt_timeout: Duration) -> FetchOutcome {
        let mut state = ChainState::Primary;
        loop {
            state = match state {
                ChainState::Primary => match (&self.primary, &self.secondary) {
                    (Some(primary), secondary) => {
                        let outcome = primary.run(Tier::Primary, per_attempt_timeout).await;
                        match (outcome.error(), secondary) {
                            (Some(kind), Some(next)) if kind.triggers_fallback() => {
                                tracing::info!(
                                    category = self.category.as_str(),
                                    error = kind.as_str(),
                                    from = primary.name(),
                                    to = next.name(),
                                    "falling back to secondary source"
                                );
                                ChainState::Secondary(next, outcome.latency())
                            }
                            _ => ChainState::Done(outcome),
                        }
                    }
                    (None, Some(next)) => ChainState::Secondary(next, Duration::ZERO),
                    (None, None) => ChainState::Done(FetchOutcome::Failure {
                        error: self.no_tier_error,
                        tier: Tier::Primary,
                        latency: Duration::ZERO,
                    }),
                },
                ChainState::Secondary(link, spent) => {
                    counter!("fallback_used_total", "category" => self.category.as_str())
                        .increment(1);
                    let outcome = link.run(Tier::Fallback, per_attempt_timeout).await;
                    ChainState::Done(with_total_latency(outcome, spent))
                }
                ChainState::Done(outcome) => return outcome,
            };
        }
    }
}

fn with_total_latency(outcome: FetchOutcome, spent: Duration) -> FetchOutcome {
    match outcome {
        FetchOutcome::Success {
            record,
            tier,
            latency,
        } => FetchOutcome::Success {
            record,
            tier,
            latency: latency + spent,
        },
        FetchOutcome::Failure {
            error,
            tier,
            latency,
        } => FetchOutcome::Failure {
            error,
            tier,
            latency: latency + spent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;

    #[test]
    fn missing_secondary_credential_leaves_single_tier_chain() {
        let descs = vec![
            SourceDescriptor::new(ProviderKind::Quotable),
            SourceDescriptor::new(ProviderKind::ApiNinjas)
                .with_auth_env("COMMAND_CENTER_TEST_NINJA_KEY_NEVER_SET"),
        ];
        let chain = FallbackChain::from_descriptors(
            Category::QuoteOfDay,
            &descs,
            &FetchParams::default(),
            &reqwest::Client::new(),
        );
        assert!(chain.primary.is_some());
        assert!(!chain.has_secondary());
    }

    #[tokio::test]
    async fn chain_without_any_usable_tier_reports_auth_rejected() {
        let descs = vec![SourceDescriptor::new(ProviderKind::Fmp)
            .with_auth_env("COMMAND_CENTER_TEST_FMP_KEY_NEVER_SET")];
        let chain = FallbackChain::from_descriptors(
            Category::MarketQuotes,
            &descs,
            &FetchParams::default(),
            &reqwest::Client::new(),
        );
        let out = chain.resolve(Duration::from_millis(10)).await;
        assert_eq!(out.error(), Some(ErrorKind::AuthRejected));
        assert_eq!(out.tier(), Tier::Primary);
    }

    #[tokio::test]
    async fn chain_without_descriptors_reports_unreachable() {
        let chain = FallbackChain::from_descriptors(
            Category::Weather,
            &[],
            &FetchParams::default(),
            &reqwest::Client::new(),
        );
        let out = chain.resolve(Duration::from_millis(10)).await;
        assert_eq!(out.error(), Some(ErrorKind::Unreachable));
        assert_eq!(out.tier(), Tier::Primary);
    }
}
