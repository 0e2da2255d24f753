//! Display mapping for the profile header and repository cards.
//!
//! Everything here is pure: views are derived from state snapshots and only
//! carry the fields that are present in the payload.

use std::fmt;

use chrono::{DateTime, Local, TimeZone};

use crate::models::{Profile, Repository};

/// One rendered repository plus its best-effort commit count.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoCard {
    pub repo: Repository,
    /// `None` until the commit count lookup resolves, and forever if it never does.
    pub commit_count: Option<u64>,
}

impl RepoCard {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            commit_count: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

pub const DEFAULT_LANGUAGE_COLOR: Rgb = Rgb(0x9c, 0xa3, 0xaf);

pub fn language_color(language: &str) -> Rgb {
    match language {
        "JavaScript" => Rgb(0xfa, 0xcc, 0x15),
        "TypeScript" => Rgb(0x3b, 0x82, 0xf6),
        "Python" => Rgb(0x22, 0xc5, 0x5e),
        "Java" => Rgb(0xef, 0x44, 0x44),
        "HTML" => Rgb(0xf9, 0x73, 0x16),
        "CSS" => Rgb(0xec, 0x48, 0x99),
        _ => DEFAULT_LANGUAGE_COLOR,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageView {
    pub name: String,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub language: Option<LanguageView>,
    pub stars: u32,
    pub forks: u32,
    pub commits: Option<u64>,
    pub updated: String,
    pub homepage: Option<String>,
}

impl CardView {
    pub fn from_card(card: &RepoCard) -> Self {
        Self::from_card_in(card, &Local)
    }

    /// Like [`CardView::from_card`] with dates shown in `tz`.
    pub fn from_card_in<Tz>(card: &RepoCard, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let repo = &card.repo;
        Self {
            title: repo.name.clone(),
            url: repo.html_url.clone(),
            description: repo.description.clone().filter(|d| !d.is_empty()),
            topics: repo.topics.clone(),
            language: repo.language.as_ref().map(|name| LanguageView {
                name: name.clone(),
                color: language_color(name),
            }),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            commits: card.commit_count,
            updated: format_date(&repo.updated_at, tz),
            homepage: repo.homepage.clone(),
        }
    }
}

/// Formats an RFC 3339 timestamp as a calendar date (`3/15/2024`).
/// Unparseable input is shown as-is.
pub fn format_date<Tz>(raw: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.with_timezone(tz).format("%-m/%-d/%Y").to_string(),
        Err(e) => {
            log::debug!("Unparseable timestamp {raw:?}: {e}");
            raw.to_string()
        }
    }
}

pub const FALLBACK_TITLE: &str = "GitHub Repositories";

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    pub title: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub social: String,
    pub repositories_heading: String,
}

impl ProfileView {
    /// Header for the current profile, or the placeholder header before the
    /// first successful load.
    pub fn new(profile: Option<&Profile>) -> Self {
        let Some(profile) = profile else {
            return Self {
                title: FALLBACK_TITLE.to_string(),
                bio: None,
                avatar_url: None,
                location: None,
                email: None,
                social: String::new(),
                repositories_heading: "Repositories".to_string(),
            };
        };

        let present = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
        Self {
            title: present(&profile.name).unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            bio: present(&profile.bio),
            avatar_url: Some(profile.avatar_url.clone()).filter(|u| !u.is_empty()),
            location: present(&profile.location),
            email: present(&profile.email),
            social: format!(
                "{} followers · {} following",
                profile.followers, profile.following
            ),
            repositories_heading: format!("Repositories ({})", profile.public_repos),
        }
    }
}
