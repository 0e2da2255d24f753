//! Headless core of the profile explorer: GitHub API access, the fetch and
//! search orchestration, and the display mapping for profile and cards.

pub mod card;
pub mod client;
pub mod config;
pub mod debounce;
pub mod explorer;
pub mod models;

pub use card::{CardView, ProfileView, RepoCard};
pub use client::{GitHubApi, GitHubClient};
pub use config::Config;
pub use explorer::{Explorer, ExplorerState};
