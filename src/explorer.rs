//! Keeps the displayed profile, repository cards and search suggestions in
//! step with the current subject and query.
//!
//! All state lives in one `watch` channel. Every transition is a single
//! `send_modify`/`send_if_modified` call, so observers never see a profile
//! from one load next to repositories from another.

use std::sync::Arc;

use anyhow::Result;
use futures::future::{join_all, try_join_all};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::card::RepoCard;
use crate::client::GitHubApi;
use crate::config::{Config, SUGGESTION_LIMIT};
use crate::debounce::Debouncer;
use crate::models::{Profile, Repository, Suggestion};

/// Message shown when the profile or repository request fails.
pub const LOAD_ERROR_MESSAGE: &str = "Failed to fetch data";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplorerState {
    /// The subject most recently requested.
    pub subject: String,
    pub profile: Option<Profile>,
    pub cards: Vec<RepoCard>,
    pub loading: bool,
    pub error: Option<String>,
    pub query: String,
    pub suggestions: Vec<Suggestion>,
    /// Bumped by every load; results from older loads are discarded.
    generation: u64,
}

impl ExplorerState {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct Explorer<A> {
    inner: Arc<Inner<A>>,
}

struct Inner<A> {
    api: A,
    state: watch::Sender<ExplorerState>,
    debouncer: Debouncer,
}

impl<A> Clone for Explorer<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: GitHubApi> Explorer<A> {
    pub fn new(api: A, config: &Config) -> Self {
        let (state, _) = watch::channel(ExplorerState {
            subject: config.default_subject.clone(),
            ..ExplorerState::default()
        });

        Self {
            inner: Arc::new(Inner {
                api,
                state,
                debouncer: Debouncer::new(config.debounce),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ExplorerState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> ExplorerState {
        self.inner.state.borrow().clone()
    }

    /// Loads the initial subject. Must be called from within a tokio runtime,
    /// as must every other operation that spawns work.
    pub fn start(&self) -> JoinHandle<()> {
        self.load_subject()
    }

    /// Switches to `login`, dropping the current query and suggestions.
    pub fn select(&self, login: impl Into<String>) -> JoinHandle<()> {
        let login = login.into();
        self.inner.debouncer.cancel();
        self.inner.state.send_modify(|s| {
            s.subject = login;
            s.query.clear();
            s.suggestions.clear();
        });
        self.load_subject()
    }

    /// Records a new query and schedules a debounced suggestion lookup for it.
    /// Suggestions for the previous query are dropped right away.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.inner.state.send_if_modified(|s| {
            if s.query == query {
                return false;
            }
            s.query = query.clone();
            s.suggestions.clear();
            true
        });

        let explorer = self.clone();
        self.inner
            .debouncer
            .schedule(async move { explorer.suggest(query).await });
    }

    /// Reloads the current subject.
    pub fn load_subject(&self) -> JoinHandle<()> {
        let mut generation = 0;
        let mut subject = String::new();
        self.inner.state.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
            subject = s.subject.clone();
            s.loading = true;
            s.error = None;
        });

        log::debug!("Loading {subject} (generation {generation})");
        let explorer = self.clone();
        tokio::spawn(async move { explorer.run_load(generation, subject).await })
    }

    async fn run_load(&self, generation: u64, subject: String) {
        let _guard = LoadingGuard {
            inner: &self.inner,
            generation,
        };

        let api = &self.inner.api;
        let result = tokio::try_join!(
            api.fetch_profile(&subject),
            api.fetch_repositories(&subject)
        );

        match result {
            Ok((profile, repos)) => {
                if let Some(full_names) = self.apply_load(generation, profile, repos) {
                    let lookups: Vec<JoinHandle<()>> = full_names
                        .into_iter()
                        .map(|full_name| {
                            let explorer = self.clone();
                            tokio::spawn(async move {
                                explorer.load_commit_count(generation, full_name).await
                            })
                        })
                        .collect();
                    join_all(lookups).await;
                }
            }
            Err(e) => {
                log::error!("Loading {subject} failed: {e:#}");
                self.inner.state.send_if_modified(|s| {
                    if s.generation != generation {
                        return false;
                    }
                    s.error = Some(LOAD_ERROR_MESSAGE.to_string());
                    s.loading = false;
                    true
                });
            }
        }
    }

    /// Returns the full names of the new cards, or `None` if the load was stale.
    fn apply_load(
        &self,
        generation: u64,
        profile: Profile,
        repos: Vec<Repository>,
    ) -> Option<Vec<String>> {
        let full_names: Vec<String> = repos.iter().map(|r| r.full_name.clone()).collect();
        let cards: Vec<RepoCard> = repos.into_iter().map(RepoCard::new).collect();

        let applied = self.inner.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            s.profile = Some(profile);
            s.cards = cards;
            s.loading = false;
            s.error = None;
            true
        });

        if !applied {
            log::debug!("Discarding stale load (generation {generation})");
            return None;
        }
        Some(full_names)
    }

    async fn load_commit_count(&self, generation: u64, full_name: String) {
        match self.inner.api.fetch_commit_count(&full_name).await {
            Ok(Some(count)) => {
                self.inner.state.send_if_modified(|s| {
                    if s.generation != generation {
                        return false;
                    }
                    match s.cards.iter_mut().find(|c| c.repo.full_name == full_name) {
                        Some(card) => {
                            card.commit_count = Some(count);
                            true
                        }
                        None => false,
                    }
                });
            }
            Ok(None) => log::debug!("No commit count available for {full_name}"),
            Err(e) => log::warn!("Commit count lookup for {full_name} failed: {e:#}"),
        }
    }

    async fn suggest(&self, query: String) {
        let term = query.trim();
        if term.is_empty() {
            self.apply_suggestions(&query, Vec::new());
            return;
        }

        match self.lookup_suggestions(term).await {
            Ok(suggestions) => self.apply_suggestions(&query, suggestions),
            Err(e) => log::warn!("Suggestion lookup for {term:?} failed: {e:#}"),
        }
    }

    async fn lookup_suggestions(&self, term: &str) -> Result<Vec<Suggestion>> {
        let api = &self.inner.api;
        let mut candidates = api.search_users(term).await?;
        candidates.truncate(SUGGESTION_LIMIT as usize);

        let lookups: Vec<_> = candidates
            .iter()
            .map(|c| api.fetch_profile(&c.login))
            .collect();
        let details = try_join_all(lookups).await?;

        Ok(candidates
            .into_iter()
            .zip(details)
            .map(|(candidate, detail)| Suggestion {
                login: candidate.login,
                avatar_url: candidate.avatar_url,
                name: detail.name,
            })
            .collect())
    }

    /// Only applies if `query` is still current. A failed lookup never gets
    /// here, so the list stays as `set_query` left it: empty.
    fn apply_suggestions(&self, query: &str, suggestions: Vec<Suggestion>) {
        self.inner.state.send_if_modified(|s| {
            if s.query != query {
                return false;
            }
            s.suggestions = suggestions;
            true
        });
    }
}

/// Clears the loading flag when a load exits without applying a result,
/// including when the load task panics.
struct LoadingGuard<'a, A> {
    inner: &'a Inner<A>,
    generation: u64,
}

impl<A> Drop for LoadingGuard<'_, A> {
    fn drop(&mut self) {
        let generation = self.generation;
        self.inner.state.send_if_modified(|s| {
            if s.generation != generation || !s.loading {
                return false;
            }
            s.loading = false;
            true
        });
    }
}
