use std::sync::Arc;

use uuid::Uuid;

use crate::db::predicate::TitlePredicate;
use crate::db::store::{CatalogStore, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::Recommendations;
use crate::services::enrichment::EnrichmentCache;

/// Number of accumulated genre tags the recommendation predicate draws from
const GENRE_PROFILE_WIDTH: usize = 5;

/// Genre-overlap recommendations with a random-sampling fallback
///
/// The user's first few accumulated genre interests (first-seen order, no
/// frequency ranking) drive a disjunctive genre predicate; matching titles
/// are sampled uniformly at random rather than taken in storage order. A
/// user with no history gets an unconditioned sample under age restriction
/// only.
pub struct RecommendationService {
    store: Arc<dyn CatalogStore>,
    users: Arc<dyn UserStore>,
    enrichment: Arc<EnrichmentCache>,
}

impl RecommendationService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        users: Arc<dyn UserStore>,
        enrichment: Arc<EnrichmentCache>,
    ) -> Self {
        Self {
            store,
            users,
            enrichment,
        }
    }

    /// Up to `limit` recommended titles for a user, enriched concurrently.
    ///
    /// Fails with `NotFound` for an unknown user; may return fewer than
    /// `limit` items when the catalog has fewer matches.
    pub async fn recommend(
        &self,
        user_id: Uuid,
        viewer_age: Option<i32>,
        limit: u32,
    ) -> AppResult<Recommendations> {
        let user = self
            .users
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let based_on_genres: Vec<String> = user
            .viewed_genres
            .iter()
            .take(GENRE_PROFILE_WIDTH)
            .cloned()
            .collect();

        let predicate = if based_on_genres.is_empty() {
            TitlePredicate::unrestricted(viewer_age)
        } else {
            TitlePredicate::genre_overlap(&based_on_genres, viewer_age)
        };

        let mut items = self.store.sample_titles(&predicate, limit).await?;

        self.enrichment.enrich_page(&mut items).await;

        tracing::debug!(
            user_id = %user_id,
            genres = based_on_genres.len(),
            sampled = items.len(),
            "Recommendations served"
        );

        Ok(Recommendations {
            items,
            based_on_genres,
        })
    }
}
