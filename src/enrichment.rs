use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::models::Movie;
use crate::tmdb::TmdbApi;

pub const UNCLASSIFIED: &str = "unclassified";
pub const UNRATED: &str = "unrated";

pub const CERTIFICATION_COUNTRIES: [&str; 2] = ["BR", "US"];

type Taxonomy = Arc<HashMap<i32, String>>;

pub struct Enricher {
    api: Arc<dyn TmdbApi>,
    taxonomy: RwLock<Option<Taxonomy>>,
    certifications: RwLock<HashMap<i64, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badges {
    pub genre: String,
    pub certification: String,
}

impl Enricher {
    pub fn new(api: Arc<dyn TmdbApi>) -> Self {
        Self {
            api,
            taxonomy: RwLock::new(None),
            certifications: RwLock::new(HashMap::new()),
        }
    }

    pub async fn primary_genre_name(&self, genre_ids: &[i32]) -> String {
        let Some(first) = genre_ids.first() else {
            return UNCLASSIFIED.to_string();
        };
        let Some(taxonomy) = self.taxonomy().await else {
            return UNCLASSIFIED.to_string();
        };
        taxonomy
            .get(first)
            .cloned()
            .unwrap_or_else(|| UNCLASSIFIED.to_string())
    }

    pub async fn certification(&self, movie_id: i64) -> String {
        let cached = self
            .certifications
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&movie_id)
            .cloned();
        if let Some(hit) = cached {
            return hit;
        }

        let data = match self.api.release_dates(movie_id).await {
            Ok(data) => data,
            Err(e) => {
                warn!(movie_id, "Certification lookup failed: {:#}", e);
                return UNRATED.to_string();
            }
        };
        let label = CERTIFICATION_COUNTRIES
            .iter()
            .find_map(|country| data.certification_for(country))
            .unwrap_or(UNRATED)
            .to_string();

        self.certifications
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(movie_id, label.clone());
        label
    }

    pub async fn badges(&self, movie: &Movie) -> Badges {
        let (genre, certification) = tokio::join!(
            self.primary_genre_name(&movie.genre_ids),
            self.certification(movie.id)
        );
        Badges {
            genre,
            certification,
        }
    }

    async fn taxonomy(&self) -> Option<Taxonomy> {
        let cached = self
            .taxonomy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if cached.is_some() {
            return cached;
        }

        // Concurrent first callers may each fetch; the table is identical so
        // whichever write lands last is fine.
        match self.api.genres().await {
            Ok(genres) => {
                debug!(count = genres.len(), "Genre taxonomy loaded");
                let table: Taxonomy =
                    Arc::new(genres.into_iter().map(|g| (g.id, g.name)).collect());
                *self
                    .taxonomy
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Some(table.clone());
                Some(table)
            }
            Err(e) => {
                warn!("Genre taxonomy fetch failed: {:#}", e);
                None
            }
        }
    }
}
