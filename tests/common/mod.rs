#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use profile_explorer::models::{Profile, Repository, SearchUser};
use profile_explorer::{Config, GitHubApi};

/// In-memory GitHub with per-login latency and a call log.
#[derive(Clone, Default)]
pub struct FakeGitHub {
    inner: Arc<FakeInner>,
}

#[derive(Default)]
struct FakeInner {
    profiles: Mutex<HashMap<String, Profile>>,
    repos: Mutex<HashMap<String, Vec<Repository>>>,
    searches: Mutex<HashMap<String, Vec<SearchUser>>>,
    commits: Mutex<HashMap<String, Option<u64>>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, login: &str, name: Option<&str>, repos: Vec<Repository>) -> Self {
        self.inner
            .profiles
            .lock()
            .unwrap()
            .insert(login.to_string(), profile(login, name, repos.len() as u32));
        self.inner
            .repos
            .lock()
            .unwrap()
            .insert(login.to_string(), repos);
        self
    }

    /// A user whose profile resolves but whose repository listing fails.
    pub fn with_profile_only(self, login: &str) -> Self {
        self.inner
            .profiles
            .lock()
            .unwrap()
            .insert(login.to_string(), profile(login, None, 0));
        self
    }

    pub fn with_search(self, query: &str, logins: &[&str]) -> Self {
        let users = logins
            .iter()
            .map(|login| SearchUser {
                login: login.to_string(),
                avatar_url: avatar(login),
            })
            .collect();
        self.inner
            .searches
            .lock()
            .unwrap()
            .insert(query.to_string(), users);
        self
    }

    /// `None` simulates a response without a usable `Link` header.
    pub fn with_commits(self, full_name: &str, count: Option<u64>) -> Self {
        self.inner
            .commits
            .lock()
            .unwrap()
            .insert(full_name.to_string(), count);
        self
    }

    /// Delays every request keyed by `key` (a login or a repository full name).
    pub fn with_delay(self, key: &str, millis: u64) -> Self {
        self.inner
            .delays
            .lock()
            .unwrap()
            .insert(key.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn record(&self, call: String) {
        self.inner.calls.lock().unwrap().push(call);
    }

    async fn pause(&self, key: &str) {
        let delay = self.inner.delays.lock().unwrap().get(key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl GitHubApi for FakeGitHub {
    async fn fetch_profile(&self, login: &str) -> Result<Profile> {
        self.record(format!("profile:{login}"));
        self.pause(login).await;
        let profile = self.inner.profiles.lock().unwrap().get(login).cloned();
        profile.with_context(|| format!("GitHub API error (404 Not Found): users/{login}"))
    }

    async fn fetch_repositories(&self, login: &str) -> Result<Vec<Repository>> {
        self.record(format!("repos:{login}"));
        self.pause(login).await;
        let repos = self.inner.repos.lock().unwrap().get(login).cloned();
        repos.with_context(|| format!("GitHub API error (404 Not Found): users/{login}/repos"))
    }

    async fn search_users(&self, query: &str) -> Result<Vec<SearchUser>> {
        self.record(format!("search:{query}"));
        let users = self.inner.searches.lock().unwrap().get(query).cloned();
        users.with_context(|| format!("GitHub API error (422 Unprocessable Entity): {query}"))
    }

    async fn fetch_commit_count(&self, full_name: &str) -> Result<Option<u64>> {
        self.record(format!("commits:{full_name}"));
        self.pause(full_name).await;
        let count = self.inner.commits.lock().unwrap().get(full_name).copied();
        count.with_context(|| format!("GitHub API error (409 Conflict): {full_name}"))
    }
}

pub fn config(subject: &str) -> Config {
    Config {
        default_subject: subject.to_string(),
        debounce: Duration::from_millis(300),
        ..Config::default()
    }
}

pub fn avatar(login: &str) -> String {
    format!("https://avatars.example.com/{login}")
}

pub fn profile(login: &str, name: Option<&str>, public_repos: u32) -> Profile {
    Profile {
        login: login.to_string(),
        name: name.map(str::to_string),
        bio: None,
        avatar_url: avatar(login),
        html_url: format!("https://github.com/{login}"),
        location: None,
        email: None,
        followers: 7,
        following: 2,
        public_repos,
    }
}

pub fn repo(owner: &str, name: &str, stars: u32, forks: u32) -> Repository {
    Repository {
        id: (stars as u64) * 1000 + forks as u64,
        name: name.to_string(),
        full_name: format!("{owner}/{name}"),
        description: Some(format!("{name} description")),
        html_url: format!("https://github.com/{owner}/{name}"),
        homepage: None,
        language: Some("Rust".to_string()),
        topics: vec![],
        stargazers_count: stars,
        forks_count: forks,
        updated_at: "2024-05-01T12:00:00Z".to_string(),
    }
}
