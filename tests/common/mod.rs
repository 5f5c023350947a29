#![allow(dead_code)]

use anyhow::anyhow;
use cineverse::models::{
    CountryReleases, Genre, Movie, MovieDetails, Page, ReleaseDate, ReleaseDatesResponse,
};
use cineverse::tmdb::TmdbApi;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const PER_PAGE: usize = 3;

#[derive(Default)]
pub struct FakeTmdb {
    pub popular_total_pages: u32,
    pub empty_popular_pages: HashSet<u32>,
    pub failing_popular_pages: Mutex<HashSet<u32>>,
    /// query -> (latency, results, total pages)
    pub search: HashMap<String, (Duration, Vec<Movie>, u32)>,
    pub search_fails: AtomicBool,
    pub genres: Option<Vec<Genre>>,
    pub release_dates: HashMap<i64, ReleaseDatesResponse>,
    pub details: HashMap<i64, MovieDetails>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeTmdb {
    pub fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn fail_search(&self, fail: bool) {
        self.search_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_popular_page(&self, page: u32, fail: bool) {
        let mut pages = self.failing_popular_pages.lock().unwrap();
        if fail {
            pages.insert(page);
        } else {
            pages.remove(&page);
        }
    }
}

#[async_trait::async_trait]
impl TmdbApi for FakeTmdb {
    async fn popular_movies(&self, page: u32) -> anyhow::Result<Page<Movie>> {
        self.record(format!("popular:{page}"));
        if self.failing_popular_pages.lock().unwrap().contains(&page) {
            return Err(anyhow!("upstream 503 for page {}", page));
        }
        let items = if self.empty_popular_pages.contains(&page) {
            Vec::new()
        } else {
            (0..PER_PAGE)
                .map(|i| movie(page as i64 * 100 + i as i64, &format!("Popular {page}-{i}")))
                .collect()
        };
        Ok(Page {
            page_number: page,
            items,
            total_pages: self.popular_total_pages,
            total_results: self.popular_total_pages * PER_PAGE as u32,
        })
    }

    async fn search_movies(&self, query: &str, page: u32) -> anyhow::Result<Page<Movie>> {
        self.record(format!("search:{query}:{page}"));
        let (latency, items, total_pages) = self
            .search
            .get(query)
            .cloned()
            .unwrap_or((Duration::ZERO, Vec::new(), 0));
        tokio::time::sleep(latency).await;
        if self.search_fails.load(Ordering::SeqCst) {
            return Err(anyhow!("network down"));
        }
        Ok(Page {
            page_number: page,
            total_results: items.len() as u32,
            items,
            total_pages,
        })
    }

    async fn movie_details(&self, id: i64) -> anyhow::Result<MovieDetails> {
        self.record(format!("details:{id}"));
        self.details
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("404 movie {}", id))
    }

    async fn release_dates(&self, id: i64) -> anyhow::Result<ReleaseDatesResponse> {
        self.record(format!("release_dates:{id}"));
        self.release_dates
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("404 release dates {}", id))
    }

    async fn genres(&self) -> anyhow::Result<Vec<Genre>> {
        self.record("genres".to_string());
        self.genres.clone().ok_or_else(|| anyhow!("genre list unavailable"))
    }
}

pub fn movie(id: i64, title: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        overview: "Test overview".to_string(),
        poster_path: Some("/test.jpg".to_string()),
        backdrop_path: None,
        release_date: chrono::NaiveDate::from_ymd_opt(2023, 1, 1),
        vote_average: 8.5,
        vote_count: 100,
        genre_ids: vec![28, 12],
    }
}

pub fn rated(id: i64, title: &str, vote_average: f64) -> Movie {
    Movie {
        vote_average,
        ..movie(id, title)
    }
}

pub fn titled(prefix: &str, count: usize) -> Vec<Movie> {
    (0..count)
        .map(|i| movie(i as i64 + 1, &format!("{prefix} {i}")))
        .collect()
}

pub fn releases(entries: &[(&str, &str)]) -> ReleaseDatesResponse {
    ReleaseDatesResponse {
        id: 1,
        results: entries
            .iter()
            .map(|(country, cert)| CountryReleases {
                iso_3166_1: country.to_string(),
                release_dates: vec![ReleaseDate {
                    certification: cert.to_string(),
                    note: None,
                    release_type: 3,
                    release_date: Some("2023-01-01T00:00:00.000Z".to_string()),
                }],
            })
            .collect(),
    }
}

pub fn genre(id: i32, name: &str) -> Genre {
    Genre {
        id,
        name: name.to_string(),
    }
}
