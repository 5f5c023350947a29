use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
pub const DEFAULT_LANGUAGE: &str = "pt-BR";
pub const DEFAULT_SUGGEST_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub image_base_url: String,
    pub language: String,
    pub favorites_path: PathBuf,
    pub suggest_debounce: Duration,
    pub search_debounce: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("Missing required environment variable: TMDB_API_KEY"))?;

        Ok(Self {
            api_key,
            base_url: var_or("TMDB_BASE_URL", DEFAULT_BASE_URL),
            image_base_url: var_or("TMDB_IMAGE_BASE_URL", DEFAULT_IMAGE_BASE_URL),
            language: var_or("TMDB_LANGUAGE", DEFAULT_LANGUAGE),
            favorites_path: env::var("CINEVERSE_FAVORITES_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_favorites_path),
            suggest_debounce: millis_var(
                "CINEVERSE_SUGGEST_DEBOUNCE_MS",
                DEFAULT_SUGGEST_DEBOUNCE_MS,
            )?,
            search_debounce: millis_var("CINEVERSE_SEARCH_DEBOUNCE_MS", DEFAULT_SEARCH_DEBOUNCE_MS)?,
        })
    }

    /// Defaults for everything but the credential.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            favorites_path: default_favorites_path(),
            suggest_debounce: Duration::from_millis(DEFAULT_SUGGEST_DEBOUNCE_MS),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn millis_var(key: &str, default: u64) -> Result<Duration> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{key} must be a whole number of milliseconds"))?;
            Ok(Duration::from_millis(ms))
        }
        _ => Ok(Duration::from_millis(default)),
    }
}

pub fn default_favorites_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("cineverse/favorites.json");
    path
}
