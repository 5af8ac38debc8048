use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of catalog item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TitleKind {
    #[serde(rename = "Movie")]
    Movie,
    #[serde(rename = "TV Show")]
    Series,
}

impl TitleKind {
    /// Canonical form as stored in the catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleKind::Movie => "Movie",
            TitleKind::Series => "TV Show",
        }
    }

    /// Parses the stored/queried form. Unknown values fall back to `Movie`
    /// with a warning, so a malformed row surfaces in the logs instead of
    /// being dropped.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "movie" => TitleKind::Movie,
            "tv show" | "series" => TitleKind::Series,
            other => {
                tracing::warn!(kind = other, "Unrecognized title kind, treating as Movie");
                TitleKind::Movie
            }
        }
    }
}

impl std::fmt::Display for TitleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One catalog item: a movie or TV show with descriptive attributes and the
/// mutable enrichment fields the enrichment cache writes back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Title {
    /// Internal stable identifier
    pub id: Uuid,
    /// External-facing business identifier (e.g. "s1234"); lookups accept either
    pub show_id: String,
    pub kind: TitleKind,
    pub name: String,
    pub director: Option<String>,
    pub cast: Option<String>,
    pub country: Option<String>,
    pub date_added: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Option<String>,
    pub duration: Option<String>,
    /// Comma-joined genre list as loaded from the source data; not normalized
    pub listed_in: Option<String>,
    pub description: Option<String>,

    // Enrichment fields, written only by the enrichment cache.
    pub poster: Option<String>,
    pub imdb_rating: Option<String>,
    /// Set once a provider lookup produced data; guards against re-fetching
    #[serde(default)]
    pub imdb_fetched: bool,
    pub enriched_at: Option<DateTime<Utc>>,
}

impl Title {
    /// Parsed genre tags from the denormalized `listed_in` field
    pub fn genres(&self) -> Vec<String> {
        self.listed_in.as_deref().map(parse_genres).unwrap_or_default()
    }

    /// Attaches enrichment data to this in-flight copy of the title. The
    /// durable store write happens separately in the background writer.
    pub fn apply_enrichment(&mut self, enrichment: Enrichment) {
        if enrichment.poster.is_some() {
            self.poster = enrichment.poster;
        }
        if enrichment.imdb_rating.is_some() {
            self.imdb_rating = enrichment.imdb_rating;
        }
    }
}

/// Splits a comma-joined genre field into trimmed tags.
///
/// Empty input yields an empty vec; `Title::genres` handles the absent field.
pub fn parse_genres(listed_in: &str) -> Vec<String> {
    listed_in
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Poster/rating pair attached to a title by the enrichment cache
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Enrichment {
    pub poster: Option<String>,
    pub imdb_rating: Option<String>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.poster.is_none() && self.imdb_rating.is_none()
    }
}

/// Structured outcome of a rating provider lookup
///
/// An all-`None` value with no ratings represents the "provider had nothing"
/// outcome; transport failures are reported as errors by the provider and
/// absorbed at the enrichment boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RatingLookup {
    pub title: Option<String>,
    pub imdb_rating: Option<String>,
    pub imdb_votes: Option<String>,
    pub metascore: Option<String>,
    pub poster: Option<String>,
    pub ratings: Vec<SourceRating>,
}

impl RatingLookup {
    /// Whether the provider returned any usable field at all
    pub fn has_data(&self) -> bool {
        self.imdb_rating.is_some()
            || self.imdb_votes.is_some()
            || self.metascore.is_some()
            || self.poster.is_some()
            || !self.ratings.is_empty()
    }
}

/// One rating from a single review source (e.g. "Rotten Tomatoes")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRating {
    pub source: String,
    pub rating: String,
}

/// One page of catalog query results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitlePage {
    pub items: Vec<Title>,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Single-title response with the genre field parsed out
#[derive(Debug, Clone, Serialize)]
pub struct TitleDetail {
    #[serde(flatten)]
    pub title: Title,
    pub genres: Vec<String>,
}

/// Personalized recommendation sample
#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub items: Vec<Title>,
    pub based_on_genres: Vec<String>,
}

/// Full provider payload for one title, served by `title_reviews`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleReviews {
    pub title: String,
    pub imdb_rating: Option<String>,
    pub imdb_votes: Option<String>,
    pub metascore: Option<String>,
    pub poster: Option<String>,
    pub reviews: Vec<SourceRating>,
}
