//! Summarization capability: provider abstraction over a text-in/text-out call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};

use crate::capability::{Capability, Credential};
use crate::config::AiConfig;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_BRIEFING_CHARS: usize = 2_000;

pub type SummaryFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;

/// Text-in/text-out summarizer used by the Synthesizer.
pub trait Summarizer: Send + Sync {
    /// Generate a summary of `context` following `instruction`.
    fn summarize<'a>(&'a self, instruction: &'a str, context: &'a str) -> SummaryFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynSummarizer = Arc<dyn Summarizer>;

/// Build the summarizer the config asks for, or say why there is none.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock.
/// * Else if `enabled == false` (explicit opt-out), unavailable.
/// * Else available exactly when the provider's key resolves.
/// * Else the configured provider, provided its key resolves.
pub fn build_summarizer(config: &AiConfig) -> Capability<DynSummarizer> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Capability::Available(Arc::new(MockSummarizer::new("Briefing (mock).")));
    }

    if !config.enabled {
        return Capability::unavailable("AI disabled in config");
    }

    match config.provider.as_str() {
        "openai" => config.credential().and_then(|key| {
            match OpenAiSummarizer::new(key, config.model.as_deref(), config.endpoint.as_deref())
            {
                Ok(p) => Capability::Available(Arc::new(p) as DynSummarizer),
                Err(e) => Capability::unavailable(format!("openai client: {e:#}")),
            }
        }),
        other => Capability::unavailable(format!("unsupported AI provider: {other}")),
    }
}

/// OpenAI Chat Completions.
pub struct OpenAiSummarizer {
    http: reqwest::Client,
    api_key: Credential,
    model: String,
    endpoint: String,
}

impl OpenAiSummarizer {
    pub fn new(
        api_key: Credential,
        model_override: Option<&str>,
        endpoint_override: Option<&str>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("command-center/0.1")
            .connect_timeout(Duration::from_secs(4))
            .build()
            .context("reqwest client")?;
        Ok(Self {
            http,
            api_key,
            model: model_override.unwrap_or(DEFAULT_MODEL).to_string(),
            endpoint: endpoint_override.unwrap_or(OPENAI_CHAT_URL).to_string(),
        })
    }

    async fn complete(&self, instruction: &str, context: &str) -> anyhow::Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let user = format!("Generate my morning briefing based on this data:\n\n{context}");
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: instruction,
                },
                Msg {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.7,
            max_tokens: 300,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&req)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("openai returned {status}");
        }
        let body: Resp = resp.json().await.context("openai response body")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("openai returned no choices"))?;
        clean_briefing(&content).ok_or_else(|| anyhow!("openai returned an empty briefing"))
    }
}

impl Summarizer for OpenAiSummarizer {
    fn summarize<'a>(&'a self, instruction: &'a str, context: &'a str) -> SummaryFuture<'a> {
        Box::pin(self.complete(instruction, context))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Returns a fixed text; used for tests/local runs.
#[derive(Clone)]
pub struct MockSummarizer {
    pub fixed: String,
}

impl MockSummarizer {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
        }
    }
}

impl Summarizer for MockSummarizer {
    fn summarize<'a>(&'a self, _instruction: &'a str, _context: &'a str) -> SummaryFuture<'a> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Trim, drop empty output, cap the length.
pub fn clean_briefing(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_BRIEFING_CHARS).collect())
}
