use crate::error::{Result, RoastError};
use crate::lenient;
use crate::stats::{ActivityEvent, RepoSummary};
use anyhow::{Context, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Page size for the repository and event listings.
const PAGE_SIZE: &str = "100";
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Public profile as returned by `/users/{username}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    pub created_at: DateTime<Utc>,
}

/// Read access to the three GitHub resources the roast is built from.
///
/// `repos` and `events` hand back the raw JSON body; anything that is not a
/// list is treated as empty by [`collect`]. A non-success listing should come
/// back as `Value::Null` rather than an error.
#[async_trait]
pub trait GithubSource: Send + Sync {
    async fn profile(&self, username: &str) -> Result<UserProfile>;
    async fn repos(&self, username: &str) -> Result<Value>;
    async fn events(&self, username: &str) -> Result<Value>;
}

/// Everything the aggregator needs, normalised.
#[derive(Debug, Clone)]
pub struct Collected {
    pub profile: UserProfile,
    pub repos: Vec<RepoSummary>,
    pub events: Vec<ActivityEvent>,
}

/// Fetch profile, repositories and events concurrently and normalise them.
///
/// Only the profile is load-bearing: its failure aborts collection.
pub async fn collect<S>(source: &S, username: &str) -> Result<Collected>
where
    S: GithubSource + ?Sized,
{
    let (profile, repos, events) = tokio::join!(
        source.profile(username),
        source.repos(username),
        source.events(username),
    );

    let profile = profile?;
    let repos = repo_list(repos?);
    let events = event_list(events?);

    debug!(
        login = %profile.login,
        repos = repos.len(),
        events = events.len(),
        "collected GitHub data"
    );

    Ok(Collected {
        profile,
        repos,
        events,
    })
}

// Every field is parsed on its own: a mistyped field defaults without
// costing the rest of the record, and every list item keeps its slot.

#[derive(Default, Deserialize)]
#[serde(default)]
struct RepoRecord {
    #[serde(deserialize_with = "lenient::optional")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient::optional")]
    language: Option<String>,
    #[serde(deserialize_with = "lenient::optional")]
    stargazers_count: Option<u64>,
    #[serde(deserialize_with = "lenient::optional")]
    forks_count: Option<u64>,
    #[serde(deserialize_with = "lenient::optional")]
    has_pages: Option<bool>,
    #[serde(deserialize_with = "lenient::optional")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient::optional")]
    updated_at: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct EventRecord {
    #[serde(rename = "type", deserialize_with = "lenient::optional")]
    kind: Option<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    payload: EventPayload,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct EventPayload {
    #[serde(deserialize_with = "lenient::items")]
    commits: Vec<CommitRecord>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct CommitRecord {
    #[serde(deserialize_with = "lenient::optional")]
    message: Option<String>,
}

/// Items of a JSON list, or nothing if the body isn't one.
fn list_items(body: Value, what: &str) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            warn!(kind = what, "expected a JSON list, got {}", shape_of(&other));
            Vec::new()
        }
    }
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Normalise a raw repository listing, keeping upstream order.
pub fn repo_list(body: Value) -> Vec<RepoSummary> {
    list_items(body, "repos")
        .into_iter()
        .map(|item| serde_json::from_value::<RepoRecord>(item).unwrap_or_default())
        .map(|r| RepoSummary {
            name: r.name.unwrap_or_default(),
            language: r.language.filter(|l| !l.is_empty()),
            stargazers_count: r.stargazers_count.unwrap_or(0),
            forks_count: r.forks_count.unwrap_or(0),
            has_pages: r.has_pages.unwrap_or(false),
            description: r.description.filter(|d| !d.is_empty()),
            updated_at: r
                .updated_at
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|t| t.with_timezone(&Utc)),
        })
        .collect()
}

/// Normalise a raw public event listing, keeping upstream order.
pub fn event_list(body: Value) -> Vec<ActivityEvent> {
    list_items(body, "events")
        .into_iter()
        .map(|item| serde_json::from_value::<EventRecord>(item).unwrap_or_default())
        .map(|e| ActivityEvent {
            kind: e.kind.unwrap_or_default(),
            commit_messages: e
                .payload
                .commits
                .into_iter()
                .filter_map(|c| c.message)
                .collect(),
        })
        .collect()
}

/// Error text for a failed profile fetch: GitHub's `message` if it sent one.
pub fn upstream_message(status: StatusCode, body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("GitHub API returned status {}", status.as_u16()))
}

/// Unauthenticated client for the GitHub REST API.
#[derive(Clone)]
pub struct GithubClient {
    base_url: Arc<Url>,
    http: Arc<Client>,
}

impl GithubClient {
    /// Build a client against `base_url`, identifying itself as `user_agent`.
    pub fn new(base_url: &str, user_agent: &str) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid GitHub API URL {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("GitHub API URL {base_url} cannot carry a path");
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

        let http = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .context("Failed to create GitHub HTTP client")?;

        Ok(Self {
            base_url: Arc::new(base_url),
            http: Arc::new(http),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = (*self.base_url).clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Single GET, no retry. The body is `Null` when it isn't JSON.
    async fn get(&self, url: Url, query: &[(&str, &str)]) -> Result<(StatusCode, Value)> {
        debug!(%url, "GET");

        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(RoastError::github_transport)?;

        let status = resp.status();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);

        Ok((status, body))
    }

    /// GET a listing; a non-success status degrades to `Null`.
    async fn get_list(&self, url: Url, query: &[(&str, &str)], what: &str) -> Result<Value> {
        let (status, body) = self.get(url, query).await?;
        if !status.is_success() {
            warn!(
                kind = what,
                status = status.as_u16(),
                "GitHub listing failed, continuing without it"
            );
            return Ok(Value::Null);
        }
        Ok(body)
    }
}

#[async_trait]
impl GithubSource for GithubClient {
    async fn profile(&self, username: &str) -> Result<UserProfile> {
        let (status, body) = self.get(self.endpoint(&["users", username]), &[]).await?;

        if !status.is_success() {
            return Err(RoastError::Upstream {
                status: status.as_u16(),
                message: upstream_message(status, &body),
            });
        }

        serde_json::from_value(body).map_err(|e| RoastError::Upstream {
            status: status.as_u16(),
            message: format!("Unexpected GitHub profile payload: {e}"),
        })
    }

    async fn repos(&self, username: &str) -> Result<Value> {
        let url = self.endpoint(&["users", username, "repos"]);
        self.get_list(url, &[("per_page", PAGE_SIZE), ("sort", "updated")], "repos")
            .await
    }

    async fn events(&self, username: &str) -> Result<Value> {
        let url = self.endpoint(&["users", username, "events", "public"]);
        self.get_list(url, &[("per_page", PAGE_SIZE)], "events").await
    }
}
