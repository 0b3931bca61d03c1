// src/fetch/providers/mod.rs
pub mod market;
pub mod news;
pub mod quote;
pub mod repos;
pub mod weather;

use crate::capability::{credential_from_env, Capability, Credential};
use crate::config::{FetchParams, ProviderKind, SourceDescriptor};
use crate::fetch::SourceFetcher;

/// Build the fetcher a descriptor names.
///
/// When the descriptor's credential is missing the result is `Unavailable`
/// and no fetcher exists, so nothing can ever call that endpoint.
pub fn build_fetcher(
    desc: &SourceDescriptor,
    params: &FetchParams,
    client: &reqwest::Client,
) -> Capability<Box<dyn SourceFetcher>> {
    let credential = match &desc.auth {
        Some(auth) => match credential_from_env(&auth.env) {
            Capability::Available(c) => Some(c),
            Capability::Unavailable(reason) => return Capability::Unavailable(reason),
        },
        None => None,
    };
    let endpoint = desc.endpoint().to_string();
    let client = client.clone();

    let keyed = |c: Option<Credential>| {
        c.map(Capability::Available)
            .unwrap_or_else(|| Capability::unavailable(format!("{:?} needs a key", desc.provider)))
    };

    match desc.provider {
        ProviderKind::OpenMeteo => Capability::Available(Box::new(weather::OpenMeteo::new(
            client, endpoint, params,
        ))),
        ProviderKind::OpenWeather => keyed(credential).map(|key| {
            Box::new(weather::OpenWeather::new(client, endpoint, key, params))
                as Box<dyn SourceFetcher>
        }),
        ProviderKind::Rss => Capability::Available(Box::new(news::RssHeadlines::new(
            client, endpoint, params,
        ))),
        ProviderKind::NewsApi => keyed(credential).map(|key| {
            Box::new(news::NewsApi::new(client, endpoint, key, params)) as Box<dyn SourceFetcher>
        }),
        ProviderKind::Stooq => Capability::Available(Box::new(market::Stooq::new(
            client, endpoint, params,
        ))),
        ProviderKind::Fmp => keyed(credential).map(|key| {
            Box::new(market::Fmp::new(client, endpoint, key, params)) as Box<dyn SourceFetcher>
        }),
        ProviderKind::GithubSearch => Capability::Available(Box::new(
            repos::GithubSearch::new(client, endpoint, credential, params),
        )),
        ProviderKind::Quotable => {
            Capability::Available(Box::new(quote::Quotable::new(client, endpoint)))
        }
        ProviderKind::ApiNinjas => keyed(credential).map(|key| {
            Box::new(quote::ApiNinjas::new(client, endpoint, key)) as Box<dyn SourceFetcher>
        }),
    }
}
