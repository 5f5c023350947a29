use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Snapshot of a movie as returned by list and search endpoints.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        serialize_with = "plain_date"
    )]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// Full record from the detail endpoint. The detail payload carries resolved
/// genres instead of `genre_ids`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        serialize_with = "plain_date"
    )]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub budget: u64,
    #[serde(default)]
    pub revenue: u64,
}

impl MovieDetails {
    pub fn to_movie(&self) -> Movie {
        Movie {
            id: self.id,
            title: self.title.clone(),
            overview: self.overview.clone(),
            poster_path: self.poster_path.clone(),
            backdrop_path: self.backdrop_path.clone(),
            release_date: self.release_date,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            genre_ids: self.genres.iter().map(|g| g.id).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Page<T> {
    #[serde(rename = "page")]
    pub page_number: u32,
    #[serde(rename = "results")]
    pub items: Vec<T>,
    pub total_pages: u32,
    pub total_results: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ReleaseDatesResponse {
    pub id: i64,
    #[serde(default)]
    pub results: Vec<CountryReleases>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CountryReleases {
    pub iso_3166_1: String,
    #[serde(default)]
    pub release_dates: Vec<ReleaseDate>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ReleaseDate {
    #[serde(default)]
    pub certification: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(rename = "type", default)]
    pub release_type: u8,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl ReleaseDatesResponse {
    /// Certification of the first release listed for `country`, if non-empty.
    pub fn certification_for(&self, country: &str) -> Option<&str> {
        self.results
            .iter()
            .find(|r| r.iso_3166_1 == country)
            .and_then(|r| r.release_dates.first())
            .map(|rd| rd.certification.trim())
            .filter(|c| !c.is_empty())
    }
}

// Upstream sends "" for unreleased titles.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()))
}

fn plain_date<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
        None => serializer.serialize_str(""),
    }
}
