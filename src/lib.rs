// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod capability;
pub mod chain;
pub mod config;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod synth;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{AggregateResult, Aggregator};
pub use crate::api::router;
pub use crate::chain::{ChainLink, FallbackChain};
pub use crate::error::{ErrorKind, FetchError};
pub use crate::fetch::types::{Category, FetchOutcome, SourceRecord, Tier};
pub use crate::fetch::SourceFetcher;
pub use crate::synth::{Briefing, GeneratedBy, Synthesizer};

use axum::Router;
use tracing::{info, warn};

/// Build the full app from the default config locations.
///
/// `/metrics` is mounted only when `METRICS_ROUTES=1`.
pub async fn app() -> anyhow::Result<Router> {
    let sources = config::sources::load_sources_default()?;
    let ai = config::AiConfig::load_default()?;

    let metrics_on = std::env::var("METRICS_ROUTES").ok().as_deref() == Some("1");
    let metrics = if metrics_on {
        match metrics::Metrics::init() {
            Ok(m) => Some(m),
            Err(e) => {
                warn!(error = ?e, "metrics disabled");
                None
            }
        }
    } else {
        None
    };

    let state = api::AppState::from_config(&sources, &ai)?;
    info!(
        per_attempt_timeout_ms = sources.aggregate.per_attempt_timeout_ms,
        ai = state.synthesizer.ai_available(),
        "command center ready"
    );

    let mut router = api::router(state);
    if let Some(m) = metrics {
        router = router.merge(m.router());
    }
    Ok(router)
}
