#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use gh_roast::github::{GithubSource, UserProfile};
use gh_roast::roast::{Roast, RoastGenerator};
use gh_roast::{ProfileStats, Result, RoastError, Roaster};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Canned GitHub responses.
pub struct FakeGithub {
    pub profile_status: Option<(u16, &'static str)>,
    pub repos: Value,
    pub events: Value,
    pub calls: AtomicUsize,
}

impl FakeGithub {
    pub fn new(repos: Value, events: Value) -> Self {
        Self {
            profile_status: None,
            repos,
            events,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn missing_user() -> Self {
        Self {
            profile_status: Some((404, "Not Found")),
            ..Self::new(Value::Null, Value::Null)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GithubSource for FakeGithub {
    async fn profile(&self, username: &str) -> Result<UserProfile> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((status, message)) = self.profile_status {
            return Err(RoastError::Upstream {
                status,
                message: message.to_string(),
            });
        }
        Ok(UserProfile {
            login: username.to_string(),
            name: None,
            bio: Some("I write code sometimes".into()),
            public_repos: 4,
            followers: 3,
            following: 120,
            created_at: Utc.with_ymd_and_hms(2014, 3, 9, 12, 0, 0).unwrap(),
        })
    }

    async fn repos(&self, _username: &str) -> Result<Value> {
        Ok(self.repos.clone())
    }

    async fn events(&self, _username: &str) -> Result<Value> {
        Ok(self.events.clone())
    }
}

/// Returns a fixed roast, or fails with an upstream error.
pub struct FakeGenerator {
    pub fail: bool,
    pub seen: std::sync::Mutex<Vec<ProfileStats>>,
}

impl FakeGenerator {
    pub fn ok() -> Self {
        Self {
            fail: false,
            seen: Default::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok()
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl RoastGenerator for FakeGenerator {
    async fn generate(&self, stats: &ProfileStats) -> Result<Roast> {
        self.seen.lock().unwrap().push(stats.clone());
        if self.fail {
            return Err(RoastError::GenerationUpstream(
                "Groq API error: model overloaded".into(),
            ));
        }
        Ok(Roast {
            title: format!("{} ships {} to prod", stats.username, stats.top_language),
            ..Default::default()
        })
    }
}

pub fn roaster(github: Arc<FakeGithub>, generator: Arc<FakeGenerator>) -> Roaster {
    Roaster::new(github, generator)
}

pub fn sample_repos() -> Value {
    json!([
        {
            "name": "dotfiles",
            "language": "Shell",
            "stargazers_count": 2,
            "forks_count": 0,
            "has_pages": false,
            "description": "my dotfiles",
            "updated_at": "2026-09-01T10:00:00Z"
        },
        {
            "name": "blog",
            "language": "Rust",
            "stargazers_count": 5,
            "forks_count": 1,
            "has_pages": true,
            "description": null,
            "updated_at": "2026-08-15T10:00:00Z"
        },
        {
            "name": "todo-app",
            "language": "Rust",
            "forks_count": 2,
            "updated_at": "2019-05-01T10:00:00Z"
        }
    ])
}

pub fn sample_events() -> Value {
    json!([
        { "type": "WatchEvent", "payload": { "action": "started" } },
        {
            "type": "PushEvent",
            "payload": { "commits": [ { "message": "fix" }, { "message": "update readme" } ] }
        },
        { "type": "PushEvent", "payload": { "commits": [ { "message": "dont ask" } ] } },
        { "type": "CreateEvent", "payload": {} }
    ])
}
