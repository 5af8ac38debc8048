use std::collections::BTreeSet;
use std::sync::Arc;

use crate::cached;
use crate::db::cache::{Cache, CacheKey};
use crate::db::store::CatalogStore;
use crate::error::AppResult;
use crate::models::parse_genres;

const GENRE_CACHE_TTL: u64 = 3600; // 1 hour

/// Distinct genre tags derived from the denormalized genre field
///
/// The source field is comma-joined text with no secondary structure, so the
/// index is built by a full-collection projection scan: split, trim, dedup,
/// sort ascending. The scan is read-only and infrequent; with the Redis
/// cache attached its result is reused for an hour.
pub struct GenreIndex {
    store: Arc<dyn CatalogStore>,
    cache: Option<Cache>,
}

impl GenreIndex {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store, cache: None }
    }

    pub fn with_response_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sorted, deduplicated set of every genre tag in the catalog
    pub async fn list_genres(&self) -> AppResult<Vec<String>> {
        match &self.cache {
            Some(cache) => cached!(cache, CacheKey::Genres, GENRE_CACHE_TTL, self.scan()),
            None => self.scan().await,
        }
    }

    async fn scan(&self) -> AppResult<Vec<String>> {
        let fields = self.store.genre_fields().await?;

        let mut genres = BTreeSet::new();
        for field in &fields {
            genres.extend(parse_genres(field));
        }

        tracing::debug!(
            scanned = fields.len(),
            distinct = genres.len(),
            "Genre index rebuilt"
        );

        Ok(genres.into_iter().collect())
    }
}
