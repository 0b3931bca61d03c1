// tests/common/mod.rs
// Shared stubs for integration tests. Not every test file uses every helper.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use command_center::fetch::types::{
    HeadlineItem, MarketRecord, NewsRecord, QuoteItem, QuoteRecord, RepoItem, RepoRecord,
    WeatherRecord,
};
use command_center::{Category, ErrorKind, FetchError, FetchOutcome, SourceFetcher, SourceRecord, Tier};

#[derive(Clone)]
pub enum Behavior {
    Ok(SourceRecord),
    Fail(ErrorKind),
    Hang,
    Panic,
    After(Duration, Box<Behavior>),
}

/// Fetcher that follows a fixed script and counts its calls.
pub struct Scripted {
    category: Category,
    name: &'static str,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    pub fn new(category: Category, name: &'static str, behavior: Behavior) -> Self {
        Self {
            category,
            name,
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SourceFetcher for Scripted {
    fn category(&self) -> Category {
        self.category
    }

    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, _timeout: Duration) -> Result<SourceRecord, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        run(self.behavior.clone()).await
    }
}

async fn run(behavior: Behavior) -> Result<SourceRecord, FetchError> {
    let mut current = behavior;
    loop {
        match current {
            Behavior::Ok(r) => return Ok(r),
            Behavior::Fail(kind) => return Err(FetchError::new(kind, "scripted failure")),
            Behavior::Hang => std::future::pending::<()>().await,
            Behavior::Panic => panic!("scripted panic"),
            Behavior::After(d, next) => {
                tokio::time::sleep(d).await;
                current = *next;
            }
        }
    }
}

pub fn record_for(category: Category) -> SourceRecord {
    match category {
        Category::Weather => weather_record(),
        Category::News => news_record(),
        Category::MarketQuotes => market_record(),
        Category::TrendingRepos => repo_record(),
        Category::QuoteOfDay => quote_record(),
    }
}

pub fn weather_record() -> SourceRecord {
    SourceRecord::Weather(WeatherRecord {
        temperature: 72.0,
        condition: "Clear".into(),
        location: "New York".into(),
    })
}

pub fn news_record() -> SourceRecord {
    SourceRecord::News(NewsRecord {
        headlines: vec![
            HeadlineItem {
                title: "AI Continues to Transform Industries".into(),
                url: Some("https://example.test/ai".into()),
            },
            HeadlineItem {
                title: "Cloud Computing Costs Drop 20%".into(),
                url: None,
            },
        ],
    })
}

pub fn market_record() -> SourceRecord {
    SourceRecord::Market(MarketRecord {
        quotes: vec![
            QuoteItem {
                symbol: "AAPL".into(),
                price: 178.52,
                change_pct: 1.32,
            },
            QuoteItem {
                symbol: "MSFT".into(),
                price: 378.91,
                change_pct: -0.4,
            },
        ],
    })
}

pub fn repo_record() -> SourceRecord {
    SourceRecord::Repos(RepoRecord {
        repos: vec![RepoItem {
            name: "cool/project".into(),
            description: "Something interesting".into(),
            star_count: 1234,
        }],
    })
}

pub fn quote_record() -> SourceRecord {
    SourceRecord::Quote(QuoteRecord {
        text: "The best way to predict the future is to create it.".into(),
        author: "Peter Drucker".into(),
    })
}

pub fn success(record: SourceRecord) -> FetchOutcome {
    FetchOutcome::Success {
        record,
        tier: Tier::Primary,
        latency: Duration::from_millis(5),
    }
}

pub fn failure(error: ErrorKind) -> FetchOutcome {
    FetchOutcome::Failure {
        error,
        tier: Tier::Primary,
        latency: Duration::from_millis(5),
    }
}

/// Serve `router` on an ephemeral local port; returns its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}
