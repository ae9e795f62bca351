//! Deterministic statistics derived from a GitHub profile.
//!
//! [`aggregate`] is a pure function of its inputs plus the evaluation instant;
//! the resulting [`ProfileStats`] is both the response payload and the factual
//! grounding for the roast.

use crate::age;
use crate::github::UserProfile;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Repositories examined, from the front of the recency-sorted listing.
pub const REPO_SAMPLE: usize = 20;
/// Push events whose commits are sampled.
pub const PUSH_EVENT_SAMPLE: usize = 30;
/// Repository names echoed back.
pub const REPO_NAME_LIMIT: usize = 10;
/// Calendar years without an update before a repository counts as abandoned.
pub const ABANDONED_AFTER_YEARS: i32 = 2;

const PUSH_EVENT: &str = "PushEvent";

// Word boundaries are ASCII-only: "édont" counts, "dont_care" doesn't.
static TYPO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9A-Za-z_])(?i-u:teh|wrok|dont|wiht|ths|waht)(?:[^0-9A-Za-z_]|$)")
        .expect("typo regex")
});

/// The parts of a repository the statistics look at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoSummary {
    pub name: String,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub has_pages: bool,
    pub description: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A public event reduced to its kind and any commit messages it carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityEvent {
    pub kind: String,
    pub commit_messages: Vec<String>,
}

impl ActivityEvent {
    pub fn is_push(&self) -> bool {
        self.kind == PUSH_EVENT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub username: String,
    pub name: String,
    pub bio: String,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
    pub created_at: DateTime<Utc>,
    pub top_language: String,
    pub language_count: usize,
    pub total_stars: u64,
    pub total_forks: u64,
    /// Repos with GitHub Pages or a description. A stand-in, not a README check.
    pub has_readme: usize,
    pub old_repos: usize,
    pub avg_commit_message_length: u64,
    pub one_word_commits: usize,
    pub has_typos: bool,
    pub total_commit_messages: usize,
    pub repo_names: Vec<String>,
}

/// Language frequencies in first-seen order.
#[derive(Debug, Default)]
struct LanguageTally(Vec<(String, usize)>);

impl LanguageTally {
    fn record(&mut self, language: &str) {
        match self.0.iter_mut().find(|(l, _)| l == language) {
            Some((_, n)) => *n += 1,
            None => self.0.push((language.to_string(), 1)),
        }
    }

    fn distinct(&self) -> usize {
        self.0.len()
    }

    /// Highest count; ties go to whichever language was seen first.
    fn top(&self) -> Option<&str> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.0 {
            if best.is_none_or(|b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(l, _)| l.as_str())
    }
}

#[derive(Debug, Default)]
struct RepoTotals {
    languages: LanguageTally,
    stars: u64,
    forks: u64,
    described: usize,
    old: usize,
    names: Vec<String>,
}

fn scan_repos(repos: &[RepoSummary], now: DateTime<Utc>) -> RepoTotals {
    let cutoff = age::years_before(now, ABANDONED_AFTER_YEARS);
    let mut totals = RepoTotals::default();

    for repo in repos.iter().take(REPO_SAMPLE) {
        totals.stars = totals.stars.saturating_add(repo.stargazers_count);
        totals.forks = totals.forks.saturating_add(repo.forks_count);

        if let Some(language) = &repo.language {
            totals.languages.record(language);
        }
        if repo.has_pages || repo.description.as_deref().is_some_and(|d| !d.is_empty()) {
            totals.described += 1;
        }
        if repo.updated_at.is_some_and(|t| t < cutoff) {
            totals.old += 1;
        }
        if totals.names.len() < REPO_NAME_LIMIT {
            totals.names.push(repo.name.clone());
        }
    }

    totals
}

#[derive(Debug, Default, PartialEq)]
struct CommitStyle {
    avg_length: u64,
    one_word: usize,
    has_typos: bool,
    total: usize,
}

/// Commit messages from the first few push events, flattened in order.
fn sampled_messages(events: &[ActivityEvent]) -> impl Iterator<Item = &str> {
    events
        .iter()
        .filter(|e| e.is_push())
        .take(PUSH_EVENT_SAMPLE)
        .flat_map(|e| e.commit_messages.iter().map(String::as_str))
}

fn commit_style<'a>(messages: impl Iterator<Item = &'a str>) -> CommitStyle {
    let mut style = CommitStyle::default();
    let mut total_chars = 0u64;

    for msg in messages {
        style.total += 1;
        total_chars += msg.chars().count() as u64;
        if !msg.chars().any(char::is_whitespace) {
            style.one_word += 1;
        }
        if !style.has_typos && TYPO.is_match(msg) {
            style.has_typos = true;
        }
    }

    style.avg_length = rounded_mean(total_chars, style.total as u64);
    style
}

/// `sum / count` rounded half up; zero when there is nothing to average.
fn rounded_mean(sum: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    (2 * sum + count) / (2 * count)
}

fn non_empty_or(value: Option<&str>, fallback: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Build the statistics snapshot for one profile.
///
/// `requested` is the username the caller asked for; it stands in for a
/// missing display name. `now` anchors the abandoned-repository cutoff.
pub fn aggregate(
    profile: &UserProfile,
    repos: &[RepoSummary],
    events: &[ActivityEvent],
    requested: &str,
    now: DateTime<Utc>,
) -> ProfileStats {
    let totals = scan_repos(repos, now);
    let style = commit_style(sampled_messages(events));

    ProfileStats {
        username: profile.login.clone(),
        name: non_empty_or(profile.name.as_deref(), requested),
        bio: non_empty_or(profile.bio.as_deref(), "No bio"),
        public_repos: profile.public_repos,
        followers: profile.followers,
        following: profile.following,
        created_at: profile.created_at,
        top_language: totals.languages.top().unwrap_or("Unknown").to_string(),
        language_count: totals.languages.distinct(),
        total_stars: totals.stars,
        total_forks: totals.forks,
        has_readme: totals.described,
        old_repos: totals.old,
        avg_commit_message_length: style.avg_length,
        one_word_commits: style.one_word,
        has_typos: style.has_typos,
        total_commit_messages: style.total,
        repo_names: totals.names,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    fn profile() -> UserProfile {
        UserProfile {
            login: "octocat".into(),
            name: None,
            bio: None,
            public_repos: 8,
            followers: 10,
            following: 200,
            created_at: Utc.with_ymd_and_hms(2011, 1, 25, 18, 44, 36).unwrap(),
        }
    }

    fn repo(name: &str, language: Option<&str>, stars: u64) -> RepoSummary {
        RepoSummary {
            name: name.into(),
            language: language.map(str::to_string),
            stargazers_count: stars,
            forks_count: 1,
            updated_at: Some(now() - Duration::days(10)),
            ..Default::default()
        }
    }

    fn push(messages: &[&str]) -> ActivityEvent {
        ActivityEvent {
            kind: "PushEvent".into(),
            commit_messages: messages.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn stats(repos: &[RepoSummary], events: &[ActivityEvent]) -> ProfileStats {
        aggregate(&profile(), repos, events, "octocat", now())
    }

    #[test]
    fn empty_profile_yields_neutral_stats() {
        let s = stats(&[], &[]);
        assert_eq!(s.top_language, "Unknown");
        assert_eq!(s.language_count, 0);
        assert_eq!(s.total_stars, 0);
        assert_eq!(s.total_forks, 0);
        assert_eq!(s.has_readme, 0);
        assert_eq!(s.old_repos, 0);
        assert_eq!(s.avg_commit_message_length, 0);
        assert_eq!(s.one_word_commits, 0);
        assert!(!s.has_typos);
        assert_eq!(s.total_commit_messages, 0);
        assert!(s.repo_names.is_empty());
    }

    #[test]
    fn profile_fields_fall_back() {
        let s = stats(&[], &[]);
        assert_eq!(s.username, "octocat");
        assert_eq!(s.name, "octocat");
        assert_eq!(s.bio, "No bio");

        let mut p = profile();
        p.name = Some("The Octocat".into());
        p.bio = Some(String::new());
        let s = aggregate(&p, &[], &[], "OctoCat", now());
        assert_eq!(s.name, "The Octocat");
        assert_eq!(s.bio, "No bio");
    }

    #[test]
    fn only_first_twenty_repos_are_examined() {
        let mut repos: Vec<_> = (0..20).map(|i| repo(&format!("r{i}"), Some("Go"), 1)).collect();
        repos.push(repo("late", Some("Haskell"), 1000));
        repos.push(repo("later", Some("Haskell"), 1000));

        let s = stats(&repos, &[]);
        assert_eq!(s.top_language, "Go");
        assert_eq!(s.language_count, 1);
        assert_eq!(s.total_stars, 20);
        assert_eq!(s.total_forks, 20);
    }

    #[test]
    fn repo_names_are_an_ordered_prefix() {
        let repos: Vec<_> = (0..15).map(|i| repo(&format!("r{i}"), None, 0)).collect();
        let s = stats(&repos, &[]);
        let expected: Vec<String> = (0..10).map(|i| format!("r{i}")).collect();
        assert_eq!(s.repo_names, expected);

        let s = stats(&repos[..3], &[]);
        assert_eq!(s.repo_names, vec!["r0", "r1", "r2"]);
    }

    #[test]
    fn top_language_tie_goes_to_first_seen() {
        let repos = [
            repo("a", Some("Go"), 0),
            repo("b", Some("Go"), 0),
            repo("c", Some("Rust"), 0),
            repo("d", Some("Rust"), 0),
        ];
        let s = stats(&repos, &[]);
        assert_eq!(s.top_language, "Go");
        assert_eq!(s.language_count, 2);
    }

    #[test]
    fn top_language_picks_strict_maximum() {
        let repos = [
            repo("a", Some("Go"), 0),
            repo("b", None, 0),
            repo("c", Some("Rust"), 0),
            repo("d", Some("Rust"), 0),
        ];
        assert_eq!(stats(&repos, &[]).top_language, "Rust");
    }

    #[test]
    fn readme_proxy_counts_pages_or_description() {
        let mut with_pages = repo("pages", None, 0);
        with_pages.has_pages = true;
        let mut with_desc = repo("desc", None, 0);
        with_desc.description = Some("does things".into());
        let mut empty_desc = repo("blank", None, 0);
        empty_desc.description = Some(String::new());

        let s = stats(&[with_pages, with_desc, empty_desc, repo("none", None, 0)], &[]);
        assert_eq!(s.has_readme, 2);
    }

    #[test]
    fn old_repos_use_two_calendar_years() {
        let cutoff = age::years_before(now(), 2);

        let mut stale = repo("stale", None, 0);
        stale.updated_at = Some(cutoff - Duration::days(1));
        let mut recent = repo("recent", None, 0);
        recent.updated_at = Some(cutoff + Duration::days(1));
        let mut boundary = repo("boundary", None, 0);
        boundary.updated_at = Some(cutoff);
        let mut unknown = repo("unknown", None, 0);
        unknown.updated_at = None;

        let s = stats(&[stale, recent, boundary, unknown], &[]);
        assert_eq!(s.old_repos, 1);
    }

    #[test]
    fn average_length_counts_characters() {
        // "fix" is 3 characters, "update readme" is 13: (3 + 13) / 2 = 8.
        let s = stats(&[], &[push(&["fix", "update readme"])]);
        assert_eq!(s.avg_commit_message_length, 8);
        assert_eq!(s.total_commit_messages, 2);

        // (3 + 4) / 2 = 3.5 rounds up.
        let s = stats(&[], &[push(&["fix", "tidy"])]);
        assert_eq!(s.avg_commit_message_length, 4);

        let s = stats(&[], &[push(&["héllo"])]);
        assert_eq!(s.avg_commit_message_length, 5);
    }

    #[test]
    fn one_word_commits_have_no_whitespace() {
        let s = stats(
            &[],
            &[push(&["wip", "fix bug", "refactor\n\nsplit module", "", "lint"])],
        );
        assert_eq!(s.one_word_commits, 3);
    }

    #[test]
    fn typos_match_whole_words_case_insensitively() {
        assert!(stats(&[], &[push(&["fix teh build"])]).has_typos);
        assert!(stats(&[], &[push(&["ok", "DONT merge"])]).has_typos);
        assert!(stats(&[], &[push(&["Waht."])]).has_typos);
        assert!(!stats(&[], &[push(&["dontcare", "theh", "paths", "mathsy"])]).has_typos);
        assert!(!stats(&[], &[push(&["the work is done"])]).has_typos);
        assert!(!stats(&[], &[push(&["dont_care", "don't", "ths1"])]).has_typos);
    }

    #[test]
    fn typo_word_boundaries_are_ascii() {
        assert!(stats(&[], &[push(&["édont"])]).has_typos);
        assert!(stats(&[], &[push(&["wiht→"])]).has_typos);
        assert!(stats(&[], &[push(&["ths"])]).has_typos);
    }

    #[test]
    fn only_push_events_contribute_messages() {
        let watch = ActivityEvent {
            kind: "WatchEvent".into(),
            commit_messages: vec!["teh".into()],
        };
        let s = stats(&[], &[watch, push(&["one", "two words"]), push(&[])]);
        assert_eq!(s.total_commit_messages, 2);
        assert!(!s.has_typos);
    }

    #[test]
    fn only_first_thirty_push_events_are_sampled() {
        let mut events: Vec<_> = (0..30).map(|_| push(&["ok"])).collect();
        events.push(ActivityEvent {
            kind: "IssuesEvent".into(),
            ..Default::default()
        });
        events.push(push(&["teh late one"]));

        let s = stats(&[], &events);
        assert_eq!(s.total_commit_messages, 30);
        assert!(!s.has_typos);
        assert_eq!(s.avg_commit_message_length, 2);
    }

    #[test]
    fn serialises_with_camel_case_names() {
        let value = serde_json::to_value(stats(&[repo("x", Some("C"), 2)], &[])).unwrap();
        for key in [
            "username",
            "publicRepos",
            "createdAt",
            "topLanguage",
            "languageCount",
            "totalStars",
            "totalForks",
            "hasReadme",
            "oldRepos",
            "avgCommitMessageLength",
            "oneWordCommits",
            "hasTypos",
            "totalCommitMessages",
            "repoNames",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["createdAt"], "2011-01-25T18:44:36Z");
    }
}
