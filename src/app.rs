use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::enrichment::Enricher;
use crate::favorites::{FavoritesError, FavoritesStorage, FavoritesStore, FileStorage};
use crate::models::{Movie, MovieDetails};
use crate::pagination::{Paginator, PopularSource, SearchSource};
use crate::search::{SearchPipeline, SearchSettings};
use crate::tmdb::{ImageSize, TmdbApi, TmdbClient};
use crate::view::{self, MovieCard};

pub const DETAILS_ERROR: &str = "Failed to load movie details";

/// Composition root: one of each component, wired to a single gateway.
pub struct App {
    pub api: Arc<dyn TmdbApi>,
    pub enricher: Enricher,
    pub favorites: FavoritesStore,
    pub suggestions: Arc<SearchPipeline>,
    pub search: Arc<SearchPipeline>,
    pub popular: Paginator,
    pub results: Paginator,
    image_base_url: String,
}

impl App {
    pub fn new(
        config: &Config,
        api: Arc<dyn TmdbApi>,
        storage: impl FavoritesStorage + 'static,
    ) -> Result<Self> {
        let favorites = FavoritesStore::open(storage).context("Failed to load favorites")?;
        Ok(Self {
            enricher: Enricher::new(api.clone()),
            favorites,
            suggestions: Arc::new(SearchPipeline::new(
                api.clone(),
                SearchSettings::suggestions(config.suggest_debounce),
            )),
            search: Arc::new(SearchPipeline::new(
                api.clone(),
                SearchSettings::results(config.search_debounce),
            )),
            popular: Paginator::new(),
            results: Paginator::new(),
            image_base_url: config.image_base_url.clone(),
            api,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api: Arc<dyn TmdbApi> = Arc::new(TmdbClient::new(config)?);
        let storage = FileStorage::new(config.favorites_path.clone());
        info!("Using favorites at {}", storage.path().display());
        Self::new(config, api, storage)
    }

    pub async fn load_popular(&self) {
        let source = Arc::new(PopularSource::new(self.api.clone()));
        self.popular.reset(source).await;
    }

    /// Open the full results view for `query`. Blank queries are ignored.
    pub async fn open_results(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        info!(query, "Opening search results");
        let source = Arc::new(SearchSource::new(self.api.clone(), query));
        self.results.reset(source).await;
        true
    }

    pub async fn movie_details(&self, id: i64) -> Result<MovieDetails, String> {
        self.api.movie_details(id).await.map_err(|e| {
            warn!(movie_id = id, "Details fetch failed: {:#}", e);
            DETAILS_ERROR.to_string()
        })
    }

    pub fn toggle_favorite(&self, movie: &Movie) -> Result<bool, FavoritesError> {
        self.favorites.toggle(movie.clone())
    }

    pub fn poster_url(&self, path: Option<&str>, size: ImageSize) -> String {
        view::poster_url(&self.image_base_url, path, size)
    }

    pub async fn card(&self, movie: &Movie) -> MovieCard {
        let badges = self.enricher.badges(movie).await;
        MovieCard {
            id: movie.id,
            title: movie.title.clone(),
            year: view::release_year(movie),
            rating: view::rating_label(movie.vote_average),
            poster_url: self.poster_url(movie.poster_path.as_deref(), ImageSize::W500),
            genre: badges.genre,
            certification: badges.certification,
            favorite: self.favorites.contains(movie.id),
        }
    }
}
