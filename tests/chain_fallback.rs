// tests/chain_fallback.rs
mod common;

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use command_center::{Category, ChainLink, ErrorKind, FallbackChain, Tier};
use common::{news_record, weather_record, Behavior, Scripted};

const T: Duration = Duration::from_millis(80);

fn link(f: Scripted) -> ChainLink {
    ChainLink::new(Box::new(f))
}

#[tokio::test]
async fn primary_timeout_resolves_from_secondary() {
    let primary = Scripted::new(Category::Weather, "slow", Behavior::Hang);
    let secondary = Scripted::new(Category::Weather, "keyed", Behavior::Ok(weather_record()));
    let chain = FallbackChain::new(Category::Weather, link(primary)).with_secondary(link(secondary));

    let out = chain.resolve(T).await;
    assert!(out.is_success(), "expected secondary success, got {out:?}");
    assert_eq!(out.tier(), Tier::Fallback);
    assert_eq!(out.record(), Some(&weather_record()));
    // Latency covers the timed-out primary too.
    assert!(out.latency() >= T);
}

#[tokio::test]
async fn no_secondary_returns_primary_error_unchanged() {
    for kind in [
        ErrorKind::Timeout,
        ErrorKind::Unreachable,
        ErrorKind::AuthRejected,
        ErrorKind::MalformedResponse,
        ErrorKind::RateLimited,
    ] {
        let primary = Scripted::new(Category::News, "only", Behavior::Fail(kind));
        let chain = FallbackChain::new(Category::News, link(primary));
        let out = chain.resolve(T).await;
        assert_eq!(out.error(), Some(kind));
        assert_eq!(out.tier(), Tier::Primary);
    }
}

#[tokio::test]
async fn every_primary_failure_kind_tries_secondary() {
    for kind in [
        ErrorKind::AuthRejected,
        ErrorKind::MalformedResponse,
        ErrorKind::RateLimited,
        ErrorKind::Unreachable,
    ] {
        let primary = Scripted::new(Category::News, "free", Behavior::Fail(kind));
        let secondary = Scripted::new(Category::News, "keyed", Behavior::Ok(news_record()));
        let calls = secondary.calls();
        let chain =
            FallbackChain::new(Category::News, link(primary)).with_secondary(link(secondary));
        let out = chain.resolve(T).await;
        assert!(out.is_success(), "{kind:?} should fall back");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn both_failing_reports_secondary_failure() {
    let primary = Scripted::new(Category::QuoteOfDay, "free", Behavior::Fail(ErrorKind::Timeout));
    let secondary = Scripted::new(
        Category::QuoteOfDay,
        "keyed",
        Behavior::Fail(ErrorKind::AuthRejected),
    );
    let chain =
        FallbackChain::new(Category::QuoteOfDay, link(primary)).with_secondary(link(secondary));
    let out = chain.resolve(T).await;
    assert_eq!(out.error(), Some(ErrorKind::AuthRejected));
    assert_eq!(out.tier(), Tier::Fallback);
}

#[tokio::test]
async fn primary_success_never_touches_secondary() {
    let primary = Scripted::new(Category::Weather, "free", Behavior::Ok(weather_record()));
    let secondary = Scripted::new(Category::Weather, "keyed", Behavior::Ok(weather_record()));
    let calls = secondary.calls();
    let chain = FallbackChain::new(Category::Weather, link(primary)).with_secondary(link(secondary));
    let out = chain.resolve(T).await;
    assert_eq!(out.tier(), Tier::Primary);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn two_hanging_tiers_are_bounded_by_two_attempts() {
    let primary = Scripted::new(Category::Weather, "a", Behavior::Hang);
    let secondary = Scripted::new(Category::Weather, "b", Behavior::Hang);
    let chain = FallbackChain::new(Category::Weather, link(primary)).with_secondary(link(secondary));

    let t0 = Instant::now();
    let out = chain.resolve(T).await;
    let elapsed = t0.elapsed();
    assert_eq!(out.error(), Some(ErrorKind::Timeout));
    assert_eq!(out.tier(), Tier::Fallback);
    assert!(elapsed >= T * 2, "{elapsed:?}");
    assert!(elapsed < T * 2 + Duration::from_millis(150), "{elapsed:?}");
}

#[tokio::test]
async fn link_timeout_cap_shortens_attempt() {
    let primary = Scripted::new(Category::Weather, "slow", Behavior::Hang);
    let chain = FallbackChain::new(
        Category::Weather,
        link(primary).with_timeout_cap(Some(Duration::from_millis(20))),
    );
    let t0 = Instant::now();
    let out = chain.resolve(Duration::from_secs(5)).await;
    assert_eq!(out.error(), Some(ErrorKind::Timeout));
    assert!(t0.elapsed() < Duration::from_secs(1));
}
