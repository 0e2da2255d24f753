use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.github.com/";
pub const DEFAULT_SUBJECT: &str = "octocat";
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
/// Repositories requested per load. Only the first page is ever fetched.
pub const REPOS_PER_PAGE: u32 = 100;
/// Candidates returned by one suggestion lookup.
pub const SUGGESTION_LIMIT: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub default_subject: String,
    pub debounce: Duration,
    /// Upper bound for any single HTTP request, avatars included.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API url is valid"),
            default_subject: DEFAULT_SUBJECT.to_string(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Reads configuration from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(raw) = get("GITHUB_API_URL") {
            config.api_url = parse_base_url(&raw)?;
        }
        if let Some(subject) = get("EXPLORER_SUBJECT") {
            config.default_subject = subject.trim().to_string();
        }
        if let Some(raw) = get("EXPLORER_DEBOUNCE_MS") {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid EXPLORER_DEBOUNCE_MS value: {raw}"))?;
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(raw) = get("EXPLORER_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .with_context(|| format!("Invalid EXPLORER_TIMEOUT_SECS value: {raw}"))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

// `Url::join` drops the last path segment unless the base ends with a slash.
fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).with_context(|| format!("Invalid GITHUB_API_URL value: {raw}"))
}
