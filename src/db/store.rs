use uuid::Uuid;

use crate::db::predicate::TitlePredicate;
use crate::error::AppResult;
use crate::models::{Enrichment, Title, User};

/// Document-store seam for the title catalog
///
/// Backends interpret [`TitlePredicate`] in their own query language (the
/// PostgreSQL backend compiles it to SQL); `TitlePredicate::matches` defines
/// the expected semantics.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Number of titles matching the predicate
    async fn count_titles(&self, predicate: &TitlePredicate) -> AppResult<u64>;

    /// One page of matching titles, ordered by `(name, id)` for stable paging
    async fn find_titles(
        &self,
        predicate: &TitlePredicate,
        offset: u64,
        limit: u32,
    ) -> AppResult<Vec<Title>>;

    /// Uniform random sample of up to `limit` matching titles
    async fn sample_titles(&self, predicate: &TitlePredicate, limit: u32)
        -> AppResult<Vec<Title>>;

    /// Point lookup by the internal identifier
    async fn title_by_id(&self, id: Uuid) -> AppResult<Option<Title>>;

    /// Point lookup by the external business identifier
    async fn title_by_show_id(&self, show_id: &str) -> AppResult<Option<Title>>;

    /// Narrow update of the enrichment fields plus the fetched flag.
    ///
    /// Additive and idempotent: `None` fields leave existing values in place,
    /// so concurrent writers for the same title converge on the same record.
    async fn apply_enrichment(&self, id: Uuid, enrichment: &Enrichment) -> AppResult<()>;

    /// Projection of every non-null genre field, for the genre index scan
    async fn genre_fields(&self) -> AppResult<Vec<String>>;
}

/// Seam to the user-store collaborator owned by the authentication service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Appends the genres missing from the user's set, preserving first-seen
    /// order. Fails with `NotFound` for an unknown user.
    async fn merge_viewed_genres(&self, id: Uuid, genres: &[String]) -> AppResult<()>;
}
