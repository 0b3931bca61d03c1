// src/synth/context.rs
//! Compact one-line-per-category context for the summarizer.

use std::collections::BTreeSet;

use crate::aggregate::AggregateResult;
use crate::fetch::types::{Category, SourceRecord};

/// Lines shown per list category.
const CONTEXT_LIST_ITEMS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Context {
    pub lines: Vec<String>,
    pub categories: BTreeSet<Category>,
}

impl Context {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// One line per successful category, in fixed category order. Failed
/// categories contribute nothing.
pub fn build_context(result: &AggregateResult) -> Context {
    let mut ctx = Context::default();
    for (category, record) in result.successes() {
        ctx.lines.push(context_line(record));
        ctx.categories.insert(category);
    }
    ctx
}

pub fn context_line(record: &SourceRecord) -> String {
    match record {
        SourceRecord::Weather(w) => format!(
            "Weather in {}: {:.0}°F, {}",
            w.location, w.temperature, w.condition
        ),
        SourceRecord::News(n) => {
            let titles: Vec<&str> = n
                .headlines
                .iter()
                .take(CONTEXT_LIST_ITEMS)
                .map(|h| h.title.as_str())
                .collect();
            format!("Top headlines: {}", titles.join("; "))
        }
        SourceRecord::Market(m) => {
            let quotes: Vec<String> = m
                .quotes
                .iter()
                .map(|q| format!("{}: ${:.2} ({:+.1}%)", q.symbol, q.price, q.change_pct))
                .collect();
            format!("Markets: {}", quotes.join(", "))
        }
        SourceRecord::Repos(r) => {
            let repos: Vec<String> = r
                .repos
                .iter()
                .take(CONTEXT_LIST_ITEMS)
                .map(|r| format!("{} ({} stars)", r.name, r.star_count))
                .collect();
            format!("Trending repos: {}", repos.join(", "))
        }
        SourceRecord::Quote(q) => format!("Quote of the day: \"{}\" - {}", q.text, q.author),
    }
}
