// tests/metrics.rs
mod common;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use command_center::{Aggregator, Category, ChainLink, ErrorKind, FallbackChain, Synthesizer};
use common::{record_for, Behavior, Scripted};

// Full in-process app with the /metrics route gated on.
async fn build_app() -> Router {
    std::env::set_var("METRICS_ROUTES", "1");
    command_center::app()
        .await
        .expect("app() should build Router in tests")
}

async fn scrape(app: &Router) -> String {
    let req = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn metrics_endpoint_contains_fetch_and_briefing_series() {
    let app = build_app().await;

    // Scripted chains: news falls back, weather succeeds on the primary.
    let agg = Aggregator::new(vec![
        FallbackChain::new(
            Category::Weather,
            ChainLink::new(Box::new(Scripted::new(
                Category::Weather,
                "free",
                Behavior::Ok(record_for(Category::Weather)),
            ))),
        ),
        FallbackChain::new(
            Category::News,
            ChainLink::new(Box::new(Scripted::new(
                Category::News,
                "free",
                Behavior::Fail(ErrorKind::RateLimited),
            ))),
        )
        .with_secondary(ChainLink::new(Box::new(Scripted::new(
            Category::News,
            "keyed",
            Behavior::Ok(record_for(Category::News)),
        )))),
    ]);
    let res = agg
        .aggregate(
            &[Category::Weather, Category::News].into_iter().collect(),
            std::time::Duration::from_millis(200),
        )
        .await;
    Synthesizer::template_only().synthesize(&res).await;

    let text = scrape(&app).await;
    for series in [
        "fetch_attempts_total",
        "fetch_latency_ms",
        "fallback_used_total",
        "aggregate_duration_ms",
        "briefings_total",
    ] {
        assert!(text.contains(series), "missing {series} in:\n{text}");
    }
    assert!(text.contains(r#"outcome="rate_limited""#), "{text}");
    assert!(text.contains(r#"generated_by="fallback""#), "{text}");
}
