//! Environment-driven settings.

use anyhow::{Context, Result};
use std::str::FromStr;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "gh-roast";
pub const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Where and how to reach GitHub.
#[derive(Debug, Clone)]
pub struct GithubSettings {
    pub api_url: String,
    /// Sent as `User-Agent`; GitHub rejects requests without one.
    pub user_agent: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// OpenAI-compatible chat endpoint used to write the roast.
#[derive(Debug, Clone)]
pub struct GroqSettings {
    /// Checked when a roast is requested, not at startup.
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GroqSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_GROQ_API_URL.to_string(),
            model: DEFAULT_GROQ_MODEL.to_string(),
            temperature: 0.9,
            max_tokens: 4000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub github: GithubSettings,
    pub groq: GroqSettings,
}

impl Config {
    /// Read settings from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            github: GithubSettings {
                api_url: var("GITHUB_API_URL").unwrap_or(defaults.github.api_url),
                user_agent: var("GITHUB_USER_AGENT").unwrap_or(defaults.github.user_agent),
            },
            groq: GroqSettings {
                api_key: var("GROQ_API_KEY"),
                api_url: var("GROQ_API_URL").unwrap_or(defaults.groq.api_url),
                model: var("GROQ_MODEL").unwrap_or(defaults.groq.model),
                temperature: parsed(var("GROQ_TEMPERATURE"), "GROQ_TEMPERATURE")?
                    .unwrap_or(defaults.groq.temperature),
                max_tokens: parsed(var("GROQ_MAX_TOKENS"), "GROQ_MAX_TOKENS")?
                    .unwrap_or(defaults.groq.max_tokens),
            },
        })
    }
}

fn parsed<T>(raw: Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map(|v| {
        v.trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a number, got {v:?}"))
    })
    .transpose()
}
