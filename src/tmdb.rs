use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::models::{Genre, Movie, MovieDetails, Page, ReleaseDatesResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    W92,
    #[default]
    W300,
    W500,
    W780,
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W92 => "w92",
            ImageSize::W300 => "w300",
            ImageSize::W500 => "w500",
            ImageSize::W780 => "w780",
            ImageSize::Original => "original",
        }
    }
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn popular_movies(&self, page: u32) -> Result<Page<Movie>>;
    async fn search_movies(&self, query: &str, page: u32) -> Result<Page<Movie>>;
    async fn movie_details(&self, id: i64) -> Result<MovieDetails>;
    async fn release_dates(&self, id: i64) -> Result<ReleaseDatesResponse>;
    async fn genres(&self) -> Result<Vec<Genre>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
    image_base_url: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &Config) -> Result<Self> {
        let user_agent = format!("cineverse/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            image_base_url: config.image_base_url.clone(),
            language: config.language.clone(),
        })
    }

    pub fn image_url(&self, path: &str, size: ImageSize) -> String {
        format_image_url(&self.image_base_url, path, size)
    }

    fn url(&self, route: &str, extra: &str) -> String {
        format!(
            "{}{route}?api_key={}&language={}{extra}",
            self.base_url,
            self.api_key,
            urlencoding::encode(&self.language)
        )
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        debug!(url = %self.redact(url), "TMDB request");
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {}: {}", self.redact(url), status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }

    fn redact(&self, url: &str) -> String {
        url.replace(&self.api_key, "***")
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn popular_movies(&self, page: u32) -> Result<Page<Movie>> {
        let url = self.url("/movie/popular", &format!("&page={page}"));
        self.get_json(&url)
            .await
            .with_context(|| format!("popular movies page {page}"))
    }

    async fn search_movies(&self, query: &str, page: u32) -> Result<Page<Movie>> {
        let url = self.url(
            "/search/movie",
            &format!("&query={}&page={page}", urlencoding::encode(query)),
        );
        self.get_json(&url)
            .await
            .with_context(|| format!("search '{query}' page {page}"))
    }

    async fn movie_details(&self, id: i64) -> Result<MovieDetails> {
        let url = self.url(&format!("/movie/{id}"), "");
        self.get_json(&url)
            .await
            .with_context(|| format!("movie details {id}"))
    }

    async fn release_dates(&self, id: i64) -> Result<ReleaseDatesResponse> {
        let url = self.url(&format!("/movie/{id}/release_dates"), "");
        self.get_json(&url)
            .await
            .with_context(|| format!("release dates {id}"))
    }

    async fn genres(&self) -> Result<Vec<Genre>> {
        #[derive(Deserialize)]
        struct GenreList {
            genres: Vec<Genre>,
        }

        let url = self.url("/genre/movie/list", "");
        let data: GenreList = self.get_json(&url).await.context("genre list")?;
        Ok(data.genres)
    }
}

/// `{base}/{size}{path}`; upstream paths already carry their leading slash.
pub fn format_image_url(base: &str, path: &str, size: ImageSize) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}/{}{path}", size.as_str())
    } else {
        format!("{base}/{}/{path}", size.as_str())
    }
}
