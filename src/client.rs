use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::LINK;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{REPOS_PER_PAGE, SUGGESTION_LIMIT};
use crate::models::{Profile, Repository, SearchResponse, SearchUser};

/// Read-only view of the GitHub REST API used by the explorer.
///
/// Implemented by [`GitHubClient`] over HTTP; tests substitute an in-memory
/// implementation.
pub trait GitHubApi: Send + Sync + 'static {
    /// `GET /users/{login}`
    fn fetch_profile(&self, login: &str) -> impl Future<Output = Result<Profile>> + Send;

    /// `GET /users/{login}/repos`, most recently updated first, one page.
    fn fetch_repositories(&self, login: &str)
        -> impl Future<Output = Result<Vec<Repository>>> + Send;

    /// `GET /search/users`, at most [`SUGGESTION_LIMIT`] results.
    fn search_users(&self, query: &str) -> impl Future<Output = Result<Vec<SearchUser>>> + Send;

    /// Requests `GET /repos/{full_name}/commits?per_page=1` and derives the commit
    /// count from the `Link` header. `Ok(None)` when the header has no usable
    /// `rel="last"` entry.
    fn fetch_commit_count(&self, full_name: &str)
        -> impl Future<Output = Result<Option<u64>>> + Send;
}

/// Creates a preconfigured HTTP client with required headers. Every request
/// made through it fails after `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client> {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("profile-explorer/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Builds request URLs relative to the configured API root.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn profile(&self, login: &str) -> Result<Url> {
        self.path(&["users", login])
    }

    pub fn repositories(&self, login: &str) -> Result<Url> {
        let mut url = self.path(&["users", login, "repos"])?;
        url.query_pairs_mut()
            .append_pair("sort", "updated")
            .append_pair("per_page", &REPOS_PER_PAGE.to_string());
        Ok(url)
    }

    pub fn search_users(&self, query: &str) -> Result<Url> {
        let mut url = self.path(&["search", "users"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("per_page", &SUGGESTION_LIMIT.to_string());
        Ok(url)
    }

    pub fn commits(&self, full_name: &str) -> Result<Url> {
        let (owner, repo) = full_name
            .split_once('/')
            .with_context(|| format!("Repository name is not owner/repo: {full_name}"))?;
        let mut url = self.path(&["repos", owner, repo, "commits"])?;
        url.query_pairs_mut().append_pair("per_page", "1");
        Ok(url)
    }

    fn path(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API url cannot be a base: {}", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// HTTP implementation of [`GitHubApi`].
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    endpoints: Endpoints,
}

impl GitHubClient {
    pub fn new(http: Client, base: Url) -> Self {
        Self {
            http,
            endpoints: Endpoints::new(base),
        }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    async fn get(&self, url: Url) -> Result<Response> {
        log::debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("Failed to send request to GitHub API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("GitHub API error ({status}): {body}");
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.get(url)
            .await?
            .json::<T>()
            .await
            .context("Failed to deserialize GitHub API response")
    }
}

impl GitHubApi for GitHubClient {
    async fn fetch_profile(&self, login: &str) -> Result<Profile> {
        self.get_json(self.endpoints.profile(login)?).await
    }

    async fn fetch_repositories(&self, login: &str) -> Result<Vec<Repository>> {
        self.get_json(self.endpoints.repositories(login)?).await
    }

    async fn search_users(&self, query: &str) -> Result<Vec<SearchUser>> {
        let search: SearchResponse = self.get_json(self.endpoints.search_users(query)?).await?;
        Ok(search.items)
    }

    async fn fetch_commit_count(&self, full_name: &str) -> Result<Option<u64>> {
        let response = self.get(self.endpoints.commits(full_name)?).await?;
        let count = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(last_page);
        Ok(count)
    }
}

/// Extracts the `page` number of the `rel="last"` entry of a `Link` header.
///
/// With `per_page=1` that number equals the total item count. A single-page
/// result has no `Link` header at all, so this under-reports in that case.
pub fn last_page(link: &str) -> Option<u64> {
    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        if !parts.any(|param| param.trim() == r#"rel="last""#) {
            return None;
        }
        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        let url = Url::parse(target).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}
