use crate::age;
use crate::config::GroqSettings;
use crate::error::{Result, RoastError};
use crate::lenient;
use crate::stats::ProfileStats;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

/// How much of an unparseable model reply is kept for diagnostics.
const EXCERPT_CHARS: usize = 500;

const SYSTEM_PROMPT: &str = "You are a hilarious code reviewer who writes savage but funny roasts \
of GitHub profiles. Always answer with a single valid JSON object and nothing else. \
Escape quotes and special characters inside JSON strings.";

const RESPONSE_SHAPE: &str = r#"{
  "title": "One savage headline",
  "subtitle": "A funny subtitle that works in their numbers",
  "glanceSections": {
    "working": "What somehow works (2-3 sentences)",
    "hindering": "What is hilariously bad (2-3 sentences)",
    "quickWins": "Sarcastic quick fixes (2-3 sentences)",
    "dreams": "Impossible dreams (2-3 sentences)"
  },
  "projects": [
    { "name": "Category name", "count": "~X repos", "description": "2-3 sentence roast" }
  ],
  "narrative": "Three paragraphs roasting their whole GitHub presence",
  "wins": [
    { "title": "Sarcastic achievement", "description": "2-3 sentences" }
  ],
  "friction": [
    { "title": "Problem area", "description": "What they keep doing wrong", "examples": ["...", "...", "..."] }
  ],
  "funEnding": { "headline": "A closing one-liner", "detail": "2-3 sentences" }
}"#;

/// The generated critique, as the caller receives it.
///
/// Any JSON object is accepted. Members the model got the wrong shape for
/// fall back to empty values, and keys outside the requested shape are
/// passed through untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Roast {
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub subtitle: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub glance_sections: GlanceSections,
    #[serde(deserialize_with = "lenient::items")]
    pub projects: Vec<ProjectRoast>,
    /// Paragraphs separated by blank lines.
    #[serde(deserialize_with = "lenient::text")]
    pub narrative: String,
    #[serde(deserialize_with = "lenient::items")]
    pub wins: Vec<Win>,
    #[serde(deserialize_with = "lenient::items")]
    pub friction: Vec<Friction>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub fun_ending: FunEnding,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlanceSections {
    #[serde(deserialize_with = "lenient::text")]
    pub working: String,
    #[serde(deserialize_with = "lenient::text")]
    pub hindering: String,
    #[serde(deserialize_with = "lenient::text")]
    pub quick_wins: String,
    #[serde(deserialize_with = "lenient::text")]
    pub dreams: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectRoast {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    /// Free text such as "~4 repos"; models sometimes send a bare number.
    #[serde(deserialize_with = "lenient::text")]
    pub count: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Win {
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Friction {
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(deserialize_with = "lenient::texts")]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunEnding {
    #[serde(deserialize_with = "lenient::text")]
    pub headline: String,
    #[serde(deserialize_with = "lenient::text")]
    pub detail: String,
}

/// Turns a statistics snapshot into a roast.
///
/// Implementations may fail and are not expected to be deterministic;
/// callers must not retry on their behalf.
#[async_trait]
pub trait RoastGenerator: Send + Sync {
    async fn generate(&self, stats: &ProfileStats) -> Result<Roast>;
}

/// Render the statistics as the plain-text fact sheet the model is grounded on.
pub fn fact_sheet(stats: &ProfileStats, today: NaiveDate) -> String {
    let created = stats.created_at.date_naive();
    let without_readme = stats.public_repos.saturating_sub(stats.has_readme as u64);

    let rows = [
        ("GitHub User", stats.username.clone()),
        ("Name", stats.name.clone()),
        ("Bio", stats.bio.clone()),
        ("Public Repos", stats.public_repos.to_string()),
        (
            "Followers",
            format!("{} | Following: {}", stats.followers, stats.following),
        ),
        (
            "Account Age",
            format!("{} ({})", created.year(), age::age_string(created, today)),
        ),
        (
            "Top Language",
            format!(
                "{} ({} languages total)",
                stats.top_language, stats.language_count
            ),
        ),
        (
            "Total Stars",
            format!("{} | Total Forks: {}", stats.total_stars, stats.total_forks),
        ),
        ("Repos without README", without_readme.to_string()),
        (
            "Abandoned repos (2+ years old)",
            stats.old_repos.to_string(),
        ),
        (
            "Avg commit message length",
            format!("{} characters", stats.avg_commit_message_length),
        ),
        ("One-word commits", stats.one_word_commits.to_string()),
        (
            "Has typos in commits",
            if stats.has_typos { "Yes" } else { "No" }.to_string(),
        ),
        (
            "Recent commit messages analyzed",
            stats.total_commit_messages.to_string(),
        ),
        ("Sample repo names", stats.repo_names.join(", ")),
    ];

    rows.iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The user message sent alongside [`SYSTEM_PROMPT`].
pub fn prompt(stats: &ProfileStats, today: NaiveDate) -> String {
    format!(
        "Write a hilarious roast report for this GitHub user, based only on their real data.\n\n\
         {facts}\n\n\
         Be savage but funny. Roast their love of {language}, their commit messages, \
         their follower ratio, their repo names, their abandoned repos and their star count. \
         Internet humor and programming memes are welcome.\n\n\
         Return ONLY valid JSON in exactly this shape, with no markdown and no extra text:\n\
         {shape}",
        facts = fact_sheet(stats, today),
        language = stats.top_language,
        shape = RESPONSE_SHAPE,
    )
}

/// Remove a surrounding markdown code fence, if the model added one.
fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse a model reply into a [`Roast`]. Only a reply that is not a JSON
/// object is an error.
pub fn extract_roast(raw: &str) -> Result<Roast> {
    let cleaned = strip_fences(raw);
    serde_json::from_str(cleaned).map_err(|e| {
        let excerpt: String = cleaned.chars().take(EXCERPT_CHARS).collect();
        error!(%excerpt, "model reply is not a valid roast");
        RoastError::GenerationParse {
            reason: e.to_string(),
            excerpt,
        }
    })
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Groq's OpenAI-compatible chat completions endpoint.
pub struct GroqClient {
    settings: GroqSettings,
    http: Client,
}

impl GroqClient {
    pub fn new(settings: GroqSettings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .build()
            .context("Failed to create Groq HTTP client")?;
        Ok(Self { settings, http })
    }

    /// Single chat completion; returns the raw text of the first choice.
    async fn complete(&self, api_key: &str, user_prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let url = format!(
            "{}/chat/completions",
            self.settings.api_url.trim_end_matches('/')
        );
        debug!(%url, model = %self.settings.model, "requesting roast");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(RoastError::groq_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RoastError::GenerationUpstream(format!(
                "Groq API error: {body}"
            )));
        }

        let parsed: ChatResponse = resp.json().await.map_err(|e| {
            RoastError::GenerationUpstream(format!("Unexpected Groq response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RoastError::GenerationUpstream("Groq returned no content".into()))
    }
}

#[async_trait]
impl RoastGenerator for GroqClient {
    async fn generate(&self, stats: &ProfileStats) -> Result<Roast> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(RoastError::ConfigurationMissing("GROQ_API_KEY"))?;

        let user_prompt = prompt(stats, Utc::now().date_naive());
        let content = self.complete(api_key, &user_prompt).await?;
        extract_roast(&content)
    }
}
