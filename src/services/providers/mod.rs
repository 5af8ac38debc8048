/// Rating data provider abstraction
///
/// Pluggable source of third-party rating/poster data, looked up by title
/// name and optional release year. The enrichment cache and the reviews
/// operation both consume this seam.
use crate::{error::AppResult, models::RatingLookup};

pub mod omdb;

pub use omdb::OmdbProvider;

/// Trait for rating data providers
///
/// A lookup that succeeds but finds nothing returns an empty
/// [`RatingLookup`]; transport and quota failures return errors. Callers at
/// the enrichment boundary treat both the same way and never surface them.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RatingProvider: Send + Sync {
    /// Look up rating/poster data by title name and optional release year
    async fn lookup(&self, name: &str, year: Option<i32>) -> AppResult<RatingLookup>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
