// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::capability::{credential_from_env, Capability, Credential};

pub const ENV_AI_CONFIG_PATH: &str = "COMMAND_CENTER_AI_CONFIG";
pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";

fn default_enabled() -> bool {
    true
}
fn default_provider() -> String {
    "openai".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_ms() -> u64 {
    8_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Opt-out switch. When true the key alone decides availability.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Only "openai" is implemented (case-insensitive).
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// "ENV" means: read from OPENAI_API_KEY at build time.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Override for the chat completions URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            provider: default_provider(),
            model: None,
            api_key: default_api_key(),
            endpoint: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AiConfig = serde_json::from_str(&data)?;

        cfg.provider = cfg.provider.trim().to_lowercase();
        if cfg.timeout_ms == 0 {
            cfg.timeout_ms = default_timeout_ms();
        }
        Ok(cfg)
    }

    /// $COMMAND_CENTER_AI_CONFIG, then config/ai.json, then defaults (enabled,
    /// key from `OPENAI_API_KEY`).
    pub fn load_default() -> anyhow::Result<Self> {
        if let Ok(p) = std::env::var(ENV_AI_CONFIG_PATH) {
            return Self::load_from_file(PathBuf::from(p));
        }
        let default_p = Path::new(DEFAULT_AI_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(default_p);
        }
        Ok(Self::default())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve the API key; a missing key makes the summarizer unavailable.
    pub fn credential(&self) -> Capability<Credential> {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            match self.provider.as_str() {
                "openai" => credential_from_env("OPENAI_API_KEY"),
                other => Capability::unavailable(format!("no key env var for provider {other}")),
            }
        } else if self.api_key.trim().is_empty() {
            Capability::unavailable("api_key is empty")
        } else {
            Capability::Available(Credential::new(self.api_key.trim()))
        }
    }
}
