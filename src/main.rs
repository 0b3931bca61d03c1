//! Command Center: binary entrypoint.
//! Boots the Axum HTTP server around the aggregation engine.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Local subscriber for fetch/chain/briefing events.
///
/// Off unless `COMMAND_CENTER_DEV_LOG=1` on a debug build or a local shuttle
/// run; deployed runs keep the runtime's subscriber. `RUST_LOG` overrides the
/// default filter, and `COMMAND_CENTER_LOG_FORMAT=json` emits one JSON object
/// per event so per-category `latency_ms` and `error` fields can be grepped.
fn enable_dev_tracing() {
    let requested = std::env::var("COMMAND_CENTER_DEV_LOG").is_ok_and(|v| v.trim() == "1");
    let local_run = cfg!(debug_assertions)
        || std::env::var("SHUTTLE_ENV").is_ok_and(|v| {
            matches!(
                v.to_ascii_lowercase().as_str(),
                "local" | "dev" | "development"
            )
        });
    if !(requested && local_run) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("command_center=info,warn"));
    let json = std::env::var("COMMAND_CENTER_LOG_FORMAT")
        .is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json().with_target(false)).try_init()
    } else {
        registry.with(fmt::layer().compact().with_target(false)).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let router = command_center::app().await?;

    Ok(router.into())
}
