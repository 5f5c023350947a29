//! Presentation helpers: image fallbacks, labels, title highlighting.

use chrono::Datelike;

use crate::models::Movie;
use crate::tmdb::{format_image_url, ImageSize};

pub const PLACEHOLDER_IMAGE: &str = "/placeholder.jpg";

#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard {
    pub id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub rating: String,
    pub poster_url: String,
    pub genre: String,
    pub certification: String,
    pub favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub matched: bool,
}

pub fn poster_url(image_base: &str, path: Option<&str>, size: ImageSize) -> String {
    match path.filter(|p| !p.is_empty()) {
        Some(p) => format_image_url(image_base, p, size),
        None => PLACEHOLDER_IMAGE.to_string(),
    }
}

pub fn release_year(movie: &Movie) -> Option<i32> {
    movie.release_date.map(|d| d.year())
}

pub fn rating_label(vote_average: f64) -> String {
    format!("{vote_average:.1}")
}

/// Split `title` into runs, marking every case-insensitive literal match of `term`.
pub fn highlight(title: &str, term: &str) -> Vec<Segment> {
    let needle: Vec<char> = term.chars().collect();
    if needle.is_empty() {
        return vec![Segment {
            text: title.to_string(),
            matched: false,
        }];
    }

    let hay: Vec<(usize, char)> = title.char_indices().collect();
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;
    while i + needle.len() <= hay.len() {
        let hit = hay[i..i + needle.len()]
            .iter()
            .zip(&needle)
            .all(|((_, a), b)| same_letter(*a, *b));
        if !hit {
            i += 1;
            continue;
        }
        let start = hay[i].0;
        let end = hay
            .get(i + needle.len())
            .map(|(idx, _)| *idx)
            .unwrap_or(title.len());
        if start > plain_start {
            segments.push(Segment {
                text: title[plain_start..start].to_string(),
                matched: false,
            });
        }
        segments.push(Segment {
            text: title[start..end].to_string(),
            matched: true,
        });
        plain_start = end;
        i += needle.len();
    }
    if plain_start < title.len() || segments.is_empty() {
        segments.push(Segment {
            text: title[plain_start..].to_string(),
            matched: false,
        });
    }
    segments
}

fn same_letter(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
