use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::Movie;

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("favorites storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("favorites record is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("failed to encode favorites: {0}")]
    Encode(#[source] serde_json::Error),
}

pub trait FavoritesStorage: Send + Sync {
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&self, record: &str) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FavoritesStorage for FileStorage {
    fn load(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, record: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, record)?;
        std::fs::rename(&tmp, &self.path)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    record: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn with_record(record: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(record.into())),
        }
    }

    pub fn record(&self) -> Option<String> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FavoritesStorage for MemoryStorage {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.record())
    }

    fn save(&self, record: &str) -> io::Result<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.to_string());
        Ok(())
    }
}

impl<T: FavoritesStorage + ?Sized> FavoritesStorage for Arc<T> {
    fn load(&self) -> io::Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, record: &str) -> io::Result<()> {
        (**self).save(record)
    }
}

#[derive(Serialize)]
struct RecordRef<'a> {
    favorites: &'a [Movie],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Record {
    Wrapped { favorites: Vec<Movie> },
    Bare(Vec<Movie>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    TitleAsc,
    TitleDesc,
    RatingDesc,
    RatingAsc,
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "title-asc" => Ok(SortOrder::TitleAsc),
            "title-desc" => Ok(SortOrder::TitleDesc),
            "rating-desc" => Ok(SortOrder::RatingDesc),
            "rating-asc" => Ok(SortOrder::RatingAsc),
            _ => Err(anyhow::anyhow!(
                "sort must be one of title-asc, title-desc, rating-desc, rating-asc"
            )),
        }
    }
}

pub fn sort_movies(movies: &[Movie], order: SortOrder) -> Vec<Movie> {
    let mut sorted = movies.to_vec();
    sorted.sort_by(|a, b| match order {
        SortOrder::TitleAsc => compare_titles(a, b),
        SortOrder::TitleDesc => compare_titles(b, a),
        SortOrder::RatingDesc => b.vote_average.total_cmp(&a.vote_average),
        SortOrder::RatingAsc => a.vote_average.total_cmp(&b.vote_average),
    });
    sorted
}

fn compare_titles(a: &Movie, b: &Movie) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.title.cmp(&b.title))
}

/// Process-wide favorites set, persisted in full after every mutation.
///
/// Mutations are serialized by one lock held across the persist step, so the
/// stored record always matches a committed in-memory snapshot. Observers get
/// the new snapshot through [`FavoritesStore::subscribe`].
pub struct FavoritesStore {
    storage: Box<dyn FavoritesStorage>,
    movies: Mutex<Vec<Movie>>,
    publisher: watch::Sender<Arc<Vec<Movie>>>,
}

impl FavoritesStore {
    pub fn open(storage: impl FavoritesStorage + 'static) -> Result<Self, FavoritesError> {
        let movies = match storage.load()? {
            None => Vec::new(),
            Some(text) if text.trim().is_empty() => Vec::new(),
            Some(text) => match serde_json::from_str::<Record>(&text)
                .map_err(FavoritesError::Corrupt)?
            {
                Record::Wrapped { favorites } => favorites,
                Record::Bare(favorites) => favorites,
            },
        };
        info!(count = movies.len(), "Loaded favorites");
        Ok(Self::with_movies(Box::new(storage), movies))
    }

    pub fn open_or_reset(storage: impl FavoritesStorage + 'static) -> Result<Self, FavoritesError> {
        let storage: Arc<dyn FavoritesStorage> = Arc::new(storage);
        match Self::open(storage.clone()) {
            Err(FavoritesError::Corrupt(e)) => {
                warn!("Favorites record unreadable, starting empty: {}", e);
                let store = Self::with_movies(Box::new(storage), Vec::new());
                store.persist(&[])?;
                Ok(store)
            }
            other => other,
        }
    }

    fn with_movies(storage: Box<dyn FavoritesStorage>, movies: Vec<Movie>) -> Self {
        let (publisher, _) = watch::channel(Arc::new(movies.clone()));
        Self {
            storage,
            movies: Mutex::new(movies),
            publisher,
        }
    }

    pub fn list(&self) -> Vec<Movie> {
        self.lock().clone()
    }

    pub fn sorted(&self, order: SortOrder) -> Vec<Movie> {
        sort_movies(&self.lock(), order)
    }

    pub fn contains(&self, movie_id: i64) -> bool {
        self.lock().iter().any(|m| m.id == movie_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn add(&self, movie: Movie) -> Result<bool, FavoritesError> {
        let mut movies = self.lock();
        if movies.iter().any(|m| m.id == movie.id) {
            debug!(movie_id = movie.id, "Already a favorite");
            return Ok(false);
        }
        let mut next = movies.clone();
        next.push(movie);
        self.commit(&mut movies, next)?;
        Ok(true)
    }

    pub fn remove(&self, movie_id: i64) -> Result<usize, FavoritesError> {
        let mut movies = self.lock();
        let next: Vec<Movie> = movies.iter().filter(|m| m.id != movie_id).cloned().collect();
        let removed = movies.len() - next.len();
        if removed == 0 {
            debug!(movie_id, "Not a favorite");
            return Ok(0);
        }
        self.commit(&mut movies, next)?;
        Ok(removed)
    }

    pub fn toggle(&self, movie: Movie) -> Result<bool, FavoritesError> {
        let mut movies = self.lock();
        let present = movies.iter().any(|m| m.id == movie.id);
        let next: Vec<Movie> = if present {
            movies.iter().filter(|m| m.id != movie.id).cloned().collect()
        } else {
            movies.iter().cloned().chain(std::iter::once(movie)).collect()
        };
        self.commit(&mut movies, next)?;
        Ok(!present)
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Movie>>> {
        self.publisher.subscribe()
    }

    fn commit(&self, current: &mut Vec<Movie>, next: Vec<Movie>) -> Result<(), FavoritesError> {
        self.persist(&next)?;
        *current = next;
        self.publisher.send_replace(Arc::new(current.clone()));
        Ok(())
    }

    fn persist(&self, movies: &[Movie]) -> Result<(), FavoritesError> {
        let record = serde_json::to_string(&RecordRef { favorites: movies })
            .map_err(FavoritesError::Encode)?;
        self.storage.save(&record)?;
        debug!(count = movies.len(), "Persisted favorites");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Movie>> {
        self.movies.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
