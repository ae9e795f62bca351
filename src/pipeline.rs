//! The one request path shared by every front end: collect, aggregate, roast.

use crate::error::{Result, RoastError};
use crate::github::{self, GithubSource};
use crate::roast::{Roast, RoastGenerator};
use crate::stats::{self, ProfileStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// What a successful request returns.
#[derive(Debug, Clone, Serialize)]
pub struct RoastReport {
    pub stats: ProfileStats,
    pub roast: Roast,
}

/// Collaborators for one deployment. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct Roaster {
    github: Arc<dyn GithubSource>,
    generator: Arc<dyn RoastGenerator>,
}

impl Roaster {
    pub fn new(github: Arc<dyn GithubSource>, generator: Arc<dyn RoastGenerator>) -> Self {
        Self { github, generator }
    }

    /// Gather GitHub data and derive statistics, evaluated at `now`.
    #[instrument(skip(self))]
    pub async fn stats_at(&self, username: &str, now: DateTime<Utc>) -> Result<ProfileStats> {
        let username = validated(username)?;
        let collected = github::collect(self.github.as_ref(), username).await?;

        let stats = stats::aggregate(
            &collected.profile,
            &collected.repos,
            &collected.events,
            username,
            now,
        );
        info!(
            login = %stats.username,
            top_language = %stats.top_language,
            commits = stats.total_commit_messages,
            "profile aggregated"
        );
        Ok(stats)
    }

    pub async fn stats(&self, username: &str) -> Result<ProfileStats> {
        self.stats_at(username, Utc::now()).await
    }

    /// Full request: statistics, then a roast grounded on them.
    ///
    /// Any failure fails the whole request; there is no stats-only fallback.
    pub async fn roast(&self, username: &str) -> Result<RoastReport> {
        let stats = self.stats(username).await?;
        let roast = self.generator.generate(&stats).await?;
        Ok(RoastReport { stats, roast })
    }
}

fn validated(username: &str) -> Result<&str> {
    let username = username.trim();
    if username.is_empty() {
        return Err(RoastError::invalid_input("GitHub username is required"));
    }
    Ok(username)
}
