// tests/synth_fallback.rs
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use command_center::capability::Capability;
use command_center::synth::ai_adapter::SummaryFuture;
use command_center::synth::template::NO_DATA_BRIEFING;
use command_center::synth::{build_context, DynSummarizer, MockSummarizer, Summarizer};
use command_center::{AggregateResult, Category, ErrorKind, GeneratedBy, Synthesizer};
use common::{failure, record_for, success, weather_record};

fn all_success() -> AggregateResult {
    Category::ALL
        .into_iter()
        .map(|c| (c, success(record_for(c))))
        .collect()
}

fn all_failed() -> AggregateResult {
    Category::ALL
        .into_iter()
        .map(|c| (c, failure(ErrorKind::Unreachable)))
        .collect()
}

/// Summarizer that fails, hangs, or answers blank, and counts calls.
struct Flaky {
    mode: &'static str,
    calls: Arc<AtomicUsize>,
}

impl Summarizer for Flaky {
    fn summarize<'a>(&'a self, _instruction: &'a str, _context: &'a str) -> SummaryFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = self.mode;
        Box::pin(async move {
            match mode {
                "error" => Err(anyhow::anyhow!("service unavailable")),
                "hang" => std::future::pending().await,
                _ => Ok("   ".to_string()),
            }
        })
    }

    fn provider_name(&self) -> &'static str {
        "flaky"
    }
}

fn flaky(mode: &'static str) -> (Synthesizer, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let s: DynSummarizer = Arc::new(Flaky {
        mode,
        calls: Arc::clone(&calls),
    });
    (
        Synthesizer::new(Capability::Available(s), Duration::from_millis(50)),
        calls,
    )
}

#[tokio::test]
async fn all_failures_give_non_empty_fallback_briefing() {
    let b = Synthesizer::template_only().synthesize(&all_failed()).await;
    assert_eq!(b.generated_by, GeneratedBy::Fallback);
    assert!(!b.text.trim().is_empty());
    assert_eq!(b.text, NO_DATA_BRIEFING);
    assert!(b.categories_used.is_empty());
}

#[tokio::test]
async fn all_failures_skip_the_summarizer_entirely() {
    let (synth, calls) = flaky("error");
    let b = synth.synthesize(&all_failed()).await;
    assert_eq!(b.generated_by, GeneratedBy::Fallback);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn context_has_no_line_for_failed_category() {
    let res: AggregateResult = [
        (Category::Weather, success(weather_record())),
        (Category::News, failure(ErrorKind::Timeout)),
    ]
    .into_iter()
    .collect();
    let ctx = build_context(&res);
    assert_eq!(ctx.lines, vec!["Weather in New York: 72°F, Clear".to_string()]);
    assert!(!ctx.text().contains("headlines"));
    assert_eq!(ctx.categories.len(), 1);
}

#[test]
fn context_lines_follow_category_order() {
    let ctx = build_context(&all_success());
    let prefixes: Vec<&str> = ctx
        .lines
        .iter()
        .map(|l| l.split(':').next().unwrap())
        .collect();
    assert_eq!(
        prefixes,
        vec![
            "Weather in New York",
            "Top headlines",
            "Markets",
            "Trending repos",
            "Quote of the day"
        ]
    );
}

#[tokio::test]
async fn template_output_is_deterministic() {
    let synth = Synthesizer::template_only();
    let res = all_success();
    let a = synth.synthesize(&res).await;
    let b = synth.synthesize(&res).await;
    assert_eq!(a.generated_by, GeneratedBy::Fallback);
    assert_eq!(a.text, b.text);
    assert_eq!(a.categories_used, b.categories_used);
    assert_eq!(a.categories_used.len(), 5);
    for section in [
        "**Weather & Environment**",
        "**What's Moving**",
        "**Headlines to Watch**",
        "**Trending in Open Source**",
        "**Thought for Today**",
    ] {
        assert!(a.text.contains(section), "missing {section}\n{}", a.text);
    }
}

#[tokio::test]
async fn template_omits_failed_sections() {
    let res: AggregateResult = [
        (Category::Weather, success(weather_record())),
        (Category::MarketQuotes, failure(ErrorKind::RateLimited)),
    ]
    .into_iter()
    .collect();
    let b = Synthesizer::template_only().synthesize(&res).await;
    assert!(b.text.contains("It's 72°F and clear in New York."));
    assert!(!b.text.contains("What's Moving"));
}

#[tokio::test]
async fn available_summarizer_produces_ai_briefing() {
    let s: DynSummarizer = Arc::new(MockSummarizer::new("  Markets look calm today.  "));
    let synth = Synthesizer::new(Capability::Available(s), Duration::from_secs(1));
    let b = synth.synthesize(&all_success()).await;
    assert_eq!(b.generated_by, GeneratedBy::Ai);
    assert_eq!(b.text, "Markets look calm today.");
    assert_eq!(b.categories_used.len(), 5);
}

#[tokio::test]
async fn erroring_hanging_or_blank_summarizer_falls_back() {
    let expected = Synthesizer::template_only()
        .synthesize(&all_success())
        .await
        .text;
    for mode in ["error", "hang", "blank"] {
        let (synth, calls) = flaky(mode);
        let b = synth.synthesize(&all_success()).await;
        assert_eq!(b.generated_by, GeneratedBy::Fallback, "mode {mode}");
        assert_eq!(b.text, expected, "mode {mode}");
        assert_eq!(calls.load(Ordering::SeqCst), 1, "exactly one attempt");
    }
}

#[test]
fn briefing_serializes_for_the_dashboard() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let b = rt.block_on(Synthesizer::template_only().synthesize(&all_success()));
    let v = serde_json::to_value(&b).unwrap();
    assert_eq!(v["generated_by"], "fallback");
    assert_eq!(v["categories_used"][0], "weather");
    assert!(v["generated_at"].is_string());
}
