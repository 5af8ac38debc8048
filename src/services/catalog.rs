use std::sync::Arc;

use uuid::Uuid;

use crate::cached;
use crate::db::cache::{Cache, CacheKey};
use crate::db::predicate::TitlePredicate;
use crate::db::store::{CatalogStore, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{Title, TitleDetail, TitleKind, TitlePage, TitleReviews};
use crate::services::enrichment::EnrichmentCache;
use crate::services::providers::RatingProvider;

const REVIEWS_CACHE_TTL: u64 = 604800; // 1 week

/// Filter and pagination parameters for a catalog listing
///
/// The boundary layer validates ranges before handing the query over; this
/// core treats `page` and `page_size` as authoritative for offset math.
#[derive(Debug, Clone)]
pub struct TitleQuery {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    pub kind: Option<TitleKind>,
    /// Free-text search over name, cast, and director
    pub search: Option<String>,
    pub genre: Option<String>,
    /// Viewer age from the authenticated context, if any
    pub viewer_age: Option<i32>,
    pub kids_mode: bool,
}

impl Default for TitleQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 15,
            kind: None,
            search: None,
            genre: None,
            viewer_age: None,
            kids_mode: false,
        }
    }
}

/// Catalog query engine: filtered/paginated listings, point lookups,
/// provider reviews, and view tracking.
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    users: Arc<dyn UserStore>,
    enrichment: Arc<EnrichmentCache>,
    provider: Arc<dyn RatingProvider>,
    cache: Option<Cache>,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        users: Arc<dyn UserStore>,
        enrichment: Arc<EnrichmentCache>,
        provider: Arc<dyn RatingProvider>,
    ) -> Self {
        Self {
            store,
            users,
            enrichment,
            provider,
            cache: None,
        }
    }

    /// Attaches the Redis response cache used for review payloads
    pub fn with_response_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// One page of titles matching the query, each enriched concurrently.
    ///
    /// The response is assembled only after every title's enrichment call
    /// has completed (cache hit or provider round trip); the page keeps its
    /// store order regardless of enrichment completion order.
    pub async fn list_titles(&self, query: &TitleQuery) -> AppResult<TitlePage> {
        let predicate = TitlePredicate::browse(
            query.kind,
            query.search.as_deref(),
            query.genre.as_deref(),
            query.viewer_age,
            query.kids_mode,
        );

        let total = self.store.count_titles(&predicate).await?;

        let offset = u64::from(query.page.saturating_sub(1)) * u64::from(query.page_size);
        let mut items = self
            .store
            .find_titles(&predicate, offset, query.page_size)
            .await?;

        self.enrichment.enrich_page(&mut items).await;

        let pages = if query.page_size > 0 {
            total.div_ceil(u64::from(query.page_size)) as u32
        } else {
            0
        };

        tracing::debug!(
            page = query.page,
            page_size = query.page_size,
            total,
            returned = items.len(),
            "Titles page served"
        );

        Ok(TitlePage {
            items,
            total,
            page: query.page,
            pages,
            has_next: query.page < pages,
            has_prev: query.page > 1,
        })
    }

    /// Looks up a title by either identifier and parses out its genres
    pub async fn get_title(&self, id: &str) -> AppResult<TitleDetail> {
        let title = self.find_title(id).await?;
        let genres = title.genres();
        Ok(TitleDetail { title, genres })
    }

    /// Full provider payload (per-source ratings, votes, metascore, poster)
    /// for one title, cached in Redis for a week when the cache is attached.
    pub async fn title_reviews(&self, id: &str) -> AppResult<TitleReviews> {
        let title = self.find_title(id).await?;

        match &self.cache {
            Some(cache) => {
                let key = CacheKey::Reviews(title.show_id.clone());
                cached!(cache, key, REVIEWS_CACHE_TTL, self.fetch_reviews(&title))
            }
            None => self.fetch_reviews(&title).await,
        }
    }

    /// Records that a user viewed a title by merging the title's genres into
    /// the user's interest set. The merge is delegated to the user store and
    /// reports `NotFound` for an unknown user.
    pub async fn track_view(&self, user_id: Uuid, title_id: &str) -> AppResult<()> {
        let title = self.find_title(title_id).await?;
        let genres = title.genres();

        if genres.is_empty() {
            tracing::debug!(title_id = %title.id, "Viewed title has no genres to track");
            return Ok(());
        }

        self.users.merge_viewed_genres(user_id, &genres).await?;

        tracing::debug!(user_id = %user_id, title_id = %title.id, genres = genres.len(), "View tracked");
        Ok(())
    }

    /// Two-step lookup: the identifier is tried as an internal UUID first
    /// (parse-or-none, never error-driven), then as the business show id.
    async fn find_title(&self, id: &str) -> AppResult<Title> {
        if let Ok(internal_id) = Uuid::parse_str(id) {
            if let Some(title) = self.store.title_by_id(internal_id).await? {
                return Ok(title);
            }
        }

        self.store
            .title_by_show_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Title {} not found", id)))
    }

    async fn fetch_reviews(&self, title: &Title) -> AppResult<TitleReviews> {
        let lookup = self
            .provider
            .lookup(&title.name, title.release_year)
            .await?;

        Ok(TitleReviews {
            title: lookup.title.unwrap_or_else(|| title.name.clone()),
            imdb_rating: lookup.imdb_rating,
            imdb_votes: lookup.imdb_votes,
            metascore: lookup.metascore,
            poster: lookup.poster,
            reviews: lookup.ratings,
        })
    }
}
