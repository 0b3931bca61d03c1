// src/synth/template.rs
//! Deterministic briefing used when the summarizer is unavailable.

use std::fmt::Write as _;

use crate::aggregate::AggregateResult;
use crate::fetch::types::SourceRecord;

pub const NO_DATA_BRIEFING: &str = "Good morning! None of the live data sources answered \
in time, so there is nothing to brief on yet. Check back in a few minutes.";

const TEMPLATE_LIST_ITEMS: usize = 3;

/// Render the successful categories as briefing sections. No clock, no
/// randomness: the same result always renders the same text.
pub fn render_template(result: &AggregateResult) -> String {
    let mut sections: Vec<String> = Vec::new();
    for (_, record) in result.successes() {
        sections.push(section(record));
    }
    if sections.is_empty() {
        return NO_DATA_BRIEFING.to_string();
    }
    let mut out = String::from("Good morning! Here's your intelligence briefing.\n");
    for s in sections {
        out.push('\n');
        out.push_str(&s);
    }
    out.trim_end().to_string()
}

fn section(record: &SourceRecord) -> String {
    let mut s = String::new();
    match record {
        SourceRecord::Weather(w) => {
            let _ = writeln!(s, "**Weather & Environment**");
            let _ = writeln!(
                s,
                "It's {:.0}°F and {} in {}.",
                w.temperature,
                w.condition.to_lowercase(),
                w.location
            );
        }
        SourceRecord::Market(m) => {
            let _ = writeln!(s, "**What's Moving**");
            for q in &m.quotes {
                let direction = if q.change_pct >= 0.0 { "up" } else { "down" };
                let _ = writeln!(
                    s,
                    "• {} is {} {:.1}% at ${:.2}",
                    q.symbol,
                    direction,
                    q.change_pct.abs(),
                    q.price
                );
            }
        }
        SourceRecord::News(n) => {
            let _ = writeln!(s, "**Headlines to Watch**");
            for h in n.headlines.iter().take(TEMPLATE_LIST_ITEMS) {
                let _ = writeln!(s, "• {}", h.title);
            }
        }
        SourceRecord::Repos(r) => {
            let _ = writeln!(s, "**Trending in Open Source**");
            for repo in r.repos.iter().take(TEMPLATE_LIST_ITEMS) {
                if repo.description.is_empty() {
                    let _ = writeln!(s, "• {} ({} stars)", repo.name, repo.star_count);
                } else {
                    let _ = writeln!(
                        s,
                        "• {} ({} stars): {}",
                        repo.name, repo.star_count, repo.description
                    );
                }
            }
        }
        SourceRecord::Quote(q) => {
            let _ = writeln!(s, "**Thought for Today**");
            let _ = writeln!(s, "\"{}\" - {}", q.text, q.author);
        }
    }
    s
}
