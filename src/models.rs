use serde::{Deserialize, Deserializer};

/// Represents a GitHub user profile from the `/users/{username}` API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Profile {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
    pub location: Option<String>,
    pub email: Option<String>,
    pub followers: u32,
    pub following: u32,
    pub public_repos: u32,
}

/// A repository from `/users/{username}/repos`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub homepage: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub stargazers_count: u32,
    pub forks_count: u32,
    pub updated_at: String,
}

/// Response from the GitHub Search Users API (`/search/users`).
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<SearchUser>,
}

/// A single user item from the search results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchUser {
    pub login: String,
    pub avatar_url: String,
}

/// A candidate subject shown while searching.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub login: String,
    pub avatar_url: String,
    pub name: Option<String>,
}

// GitHub sends `"homepage": ""` for repositories without one.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
