use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::{Movie, Page};
use crate::tmdb::TmdbApi;

pub const LOAD_ERROR: &str = "Failed to load movies";

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, page: u32) -> Result<Page<Movie>>;

    fn error_message(&self) -> &'static str {
        LOAD_ERROR
    }
}

pub struct PopularSource {
    api: Arc<dyn TmdbApi>,
}

impl PopularSource {
    pub fn new(api: Arc<dyn TmdbApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource for PopularSource {
    async fn fetch(&self, page: u32) -> Result<Page<Movie>> {
        self.api.popular_movies(page).await
    }
}

pub struct SearchSource {
    api: Arc<dyn TmdbApi>,
    query: String,
}

impl SearchSource {
    pub fn new(api: Arc<dyn TmdbApi>, query: impl Into<String>) -> Self {
        Self {
            api,
            query: query.into(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

#[async_trait]
impl PageSource for SearchSource {
    async fn fetch(&self, page: u32) -> Result<Page<Movie>> {
        self.api.search_movies(&self.query, page).await
    }

    fn error_message(&self) -> &'static str {
        crate::search::SEARCH_ERROR
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaginationState {
    pub items: Vec<Movie>,
    pub page: u32,
    pub total_pages: u32,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            total_pages: 0,
            has_more: true,
            loading: false,
            error: None,
        }
    }
}

#[derive(Default)]
struct Session {
    generation: u64,
    source: Option<Arc<dyn PageSource>>,
}

/// "Load more" accumulator over a [`PageSource`].
///
/// `has_more` always comes from the upstream `total_pages`. A failed page
/// leaves the counter where it was, so the next `load_more` asks for the
/// same page again.
pub struct Paginator {
    session: Mutex<Session>,
    state: watch::Sender<PaginationState>,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new()
    }
}

impl Paginator {
    pub fn new() -> Self {
        let (state, _) = watch::channel(PaginationState::default());
        Self {
            session: Mutex::new(Session::default()),
            state,
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PaginationState> {
        self.state.subscribe()
    }

    pub async fn reset(&self, source: Arc<dyn PageSource>) {
        let generation = {
            let mut session = self.lock();
            session.generation += 1;
            session.source = Some(source.clone());
            self.state.send_replace(PaginationState {
                loading: true,
                ..PaginationState::default()
            });
            session.generation
        };
        self.fetch(generation, source, 1).await;
    }

    pub async fn load_more(&self) -> bool {
        let (generation, source, next) = {
            let session = self.lock();
            let Some(source) = session.source.clone() else {
                return false;
            };
            let mut next = None;
            self.state.send_if_modified(|s| {
                if s.loading || !s.has_more {
                    return false;
                }
                s.loading = true;
                s.error = None;
                next = Some(s.page + 1);
                true
            });
            let Some(next) = next else {
                return false;
            };
            (session.generation, source, next)
        };
        self.fetch(generation, source, next).await;
        true
    }

    async fn fetch(&self, generation: u64, source: Arc<dyn PageSource>, page: u32) {
        debug!(page, "Fetching page");
        let outcome = source.fetch(page).await;

        let session = self.lock();
        if session.generation != generation {
            debug!(page, "Discarding page for a list that was reset");
            return;
        }
        self.state.send_modify(|s| {
            s.loading = false;
            match outcome {
                Ok(result) => {
                    if page == 1 {
                        s.items = result.items;
                    } else {
                        s.items.extend(result.items);
                    }
                    s.page = page;
                    s.total_pages = result.total_pages;
                    s.has_more = page < result.total_pages;
                    s.error = None;
                }
                Err(e) => {
                    warn!(page, "Page fetch failed: {:#}", e);
                    s.error = Some(source.error_message().to_string());
                }
            }
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
