// src/synth/mod.rs
//! Synthesizer: aggregated data in, briefing out. Never fails.

pub mod ai_adapter;
pub mod context;
pub mod template;

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use crate::aggregate::AggregateResult;
use crate::capability::Capability;
use crate::config::AiConfig;
use crate::fetch::types::Category;

pub use ai_adapter::{build_summarizer, DynSummarizer, MockSummarizer, Summarizer};
pub use context::{build_context, Context};
pub use template::render_template;

pub const BRIEFING_INSTRUCTION: &str = "You are a personal intelligence briefing assistant. \
Generate a concise, engaging morning briefing based on the provided data. \
Be conversational but professional. Highlight what's most relevant. \
Include 2-3 actionable insights or things to watch today. \
Keep it under 200 words.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedBy {
    Ai,
    Fallback,
}

impl GeneratedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Briefing {
    pub text: String,
    pub generated_by: GeneratedBy,
    pub categories_used: BTreeSet<Category>,
    pub generated_at: DateTime<Utc>,
}

enum SynthState<'a> {
    AiAvailable(&'a DynSummarizer),
    TemplateFallback,
}

pub struct Synthesizer {
    summarizer: Capability<DynSummarizer>,
    timeout: Duration,
}

impl Synthesizer {
    pub fn new(summarizer: Capability<DynSummarizer>, timeout: Duration) -> Self {
        Self {
            summarizer,
            timeout,
        }
    }

    /// Never calls out; every briefing comes from the template.
    pub fn template_only() -> Self {
        Self::new(
            Capability::unavailable("summarizer not configured"),
            Duration::ZERO,
        )
    }

    pub fn from_config(cfg: &AiConfig) -> Self {
        let summarizer = build_summarizer(cfg);
        match &summarizer {
            Capability::Available(s) => {
                tracing::info!(provider = s.provider_name(), "AI briefings enabled")
            }
            Capability::Unavailable(reason) => {
                tracing::info!(%reason, "AI briefings disabled; using template")
            }
        }
        Self::new(summarizer, cfg.timeout())
    }

    pub fn ai_available(&self) -> bool {
        self.summarizer.is_available()
    }

    pub async fn synthesize(&self, result: &AggregateResult) -> Briefing {
        crate::metrics::ensure_metrics_described();
        let ctx = build_context(result);

        let mut state = match &self.summarizer {
            Capability::Available(s) if !ctx.is_empty() => SynthState::AiAvailable(s),
            _ => SynthState::TemplateFallback,
        };

        loop {
            state = match state {
                SynthState::AiAvailable(summarizer) => {
                    match self.try_ai(summarizer.as_ref(), &ctx).await {
                        Some(text) => return self.finish(text, GeneratedBy::Ai, ctx.categories),
                        None => SynthState::TemplateFallback,
                    }
                }
                SynthState::TemplateFallback => {
                    let text = render_template(result);
                    return self.finish(text, GeneratedBy::Fallback, ctx.categories);
                }
            };
        }
    }

    async fn try_ai(&self, summarizer: &dyn Summarizer, ctx: &Context) -> Option<String> {
        let context = ctx.text();
        let call = summarizer.summarize(BRIEFING_INSTRUCTION, &context);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) => match ai_adapter::clean_briefing(&text) {
                Some(t) => Some(t),
                None => {
                    tracing::warn!(provider = summarizer.provider_name(), "empty AI briefing");
                    None
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(
                    provider = summarizer.provider_name(),
                    error = %format!("{e:#}"),
                    "AI briefing failed; using template"
                );
                None
            }
            Err(_) => {
                tracing::warn!(
                    provider = summarizer.provider_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "AI briefing timed out; using template"
                );
                None
            }
        }
    }

    fn finish(
        &self,
        text: String,
        generated_by: GeneratedBy,
        categories_used: BTreeSet<Category>,
    ) -> Briefing {
        counter!("briefings_total", "generated_by" => generated_by.as_str()).increment(1);
        Briefing {
            text,
            generated_by,
            categories_used,
            generated_at: Utc::now(),
        }
    }
}
