use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::debounce::Debouncer;
use crate::models::Movie;
use crate::tmdb::TmdbApi;

pub const SUGGESTION_LIMIT: usize = 5;
pub const SEARCH_ERROR: &str = "Failed to search movies";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Pending,
    InFlight,
    Settled,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchState {
    pub query: String,
    pub effective_query: Option<String>,
    pub phase: SearchPhase,
    pub suggestions: Vec<Movie>,
    pub results: Vec<Movie>,
    pub error: Option<String>,
}

impl SearchState {
    pub fn in_flight(&self) -> bool {
        self.phase == SearchPhase::InFlight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub debounce: Duration,
    pub min_query_len: usize,
    pub surface_errors: bool,
}

impl SearchSettings {
    pub fn suggestions(debounce: Duration) -> Self {
        Self {
            debounce,
            min_query_len: 2,
            surface_errors: false,
        }
    }

    pub fn results(debounce: Duration) -> Self {
        Self {
            debounce,
            min_query_len: 1,
            surface_errors: true,
        }
    }
}

pub struct SearchPipeline {
    api: Arc<dyn TmdbApi>,
    settings: SearchSettings,
    debouncer: Debouncer,
    state: watch::Sender<SearchState>,
}

impl SearchPipeline {
    pub fn new(api: Arc<dyn TmdbApi>, settings: SearchSettings) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            api,
            settings,
            debouncer: Debouncer::new(settings.debounce),
            state,
        }
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn submitted_query(&self) -> Option<String> {
        let query = self.state.borrow().query.trim().to_string();
        (!query.is_empty()).then_some(query)
    }

    pub fn clear(&self) {
        self.debouncer.cancel();
        self.state.send_replace(SearchState::default());
    }

    /// Record a keystroke. Resolves once this keystroke's work is done: either
    /// superseded during the debounce window, or fetched and applied/discarded.
    pub async fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        let trimmed = text.trim().to_string();

        if trimmed.chars().count() < self.settings.min_query_len {
            self.debouncer.cancel();
            self.state.send_modify(|s| {
                *s = SearchState {
                    query: text,
                    ..SearchState::default()
                };
            });
            return;
        }

        self.state.send_modify(|s| {
            s.query = text.clone();
            s.phase = SearchPhase::Pending;
            s.error = None;
        });

        let Some(query) = self.debouncer.settle(text).await else {
            return;
        };

        let live = self.state.borrow().query == query;
        if !live {
            return;
        }
        self.state.send_modify(|s| {
            s.effective_query = Some(trimmed.clone());
            s.phase = SearchPhase::InFlight;
        });

        debug!(query = %trimmed, "Searching");
        let outcome = self.api.search_movies(&trimmed, 1).await;

        let surface_errors = self.settings.surface_errors;
        let applied = self.state.send_if_modified(|s| {
            if s.query != query {
                return false;
            }
            match outcome {
                Ok(page) => {
                    s.suggestions = page.items.iter().take(SUGGESTION_LIMIT).cloned().collect();
                    s.results = page.items;
                    s.phase = SearchPhase::Settled;
                    s.error = None;
                }
                Err(e) => {
                    warn!(query = %trimmed, "Search failed: {:#}", e);
                    s.suggestions.clear();
                    s.results.clear();
                    s.phase = SearchPhase::Idle;
                    s.error = surface_errors.then(|| SEARCH_ERROR.to_string());
                }
            }
            true
        });
        if !applied {
            debug!(query = %trimmed, "Discarding stale search response");
        }
    }
}
