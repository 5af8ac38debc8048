pub mod catalog;
pub mod enrichment;
pub mod genres;
pub mod providers;
pub mod recommendations;

pub use catalog::{CatalogService, TitleQuery};
pub use enrichment::{EnrichmentCache, EnrichmentWriterHandle};
pub use genres::GenreIndex;
pub use recommendations::RecommendationService;

use std::sync::Arc;

use crate::config::Config;
use crate::db::cache::{Cache, CacheWriterHandle};
use crate::db::store::{CatalogStore, UserStore};
use crate::db::{create_pool, create_redis_client, PgCatalog, PgUsers};
use crate::services::providers::{OmdbProvider, RatingProvider};

/// Fully wired service set
///
/// All collaborators (store, user store, provider, caches) are constructed
/// here and injected explicitly; nothing is looked up from global state. The
/// two background writer tasks live as long as this value and are flushed by
/// [`Services::shutdown`].
pub struct Services {
    pub catalog: CatalogService,
    pub recommendations: RecommendationService,
    pub genres: GenreIndex,
    cache_writer: CacheWriterHandle,
    enrichment_writer: EnrichmentWriterHandle,
}

impl Services {
    /// Connects to PostgreSQL and Redis and wires every service
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database_url).await?;
        let redis_client = create_redis_client(&config.redis_url)?;

        let (cache, cache_writer) = Cache::new(redis_client.clone());

        let store: Arc<dyn CatalogStore> = Arc::new(PgCatalog::new(pool.clone()));
        let users: Arc<dyn UserStore> = Arc::new(PgUsers::new(pool));
        let provider: Arc<dyn RatingProvider> =
            Arc::new(OmdbProvider::new(redis_client, config)?);

        let (enrichment, enrichment_writer) =
            EnrichmentCache::new(Arc::clone(&provider), Arc::clone(&store));

        let catalog = CatalogService::new(
            Arc::clone(&store),
            Arc::clone(&users),
            Arc::clone(&enrichment),
            Arc::clone(&provider),
        )
        .with_response_cache(cache.clone());

        let recommendations =
            RecommendationService::new(Arc::clone(&store), users, Arc::clone(&enrichment));

        let genres = GenreIndex::new(store).with_response_cache(cache);

        tracing::info!("Catalog services wired");

        Ok(Self {
            catalog,
            recommendations,
            genres,
            cache_writer,
            enrichment_writer,
        })
    }

    /// Flushes and stops the background writer tasks
    pub async fn shutdown(self) {
        self.enrichment_writer.shutdown().await;
        self.cache_writer.shutdown().await;
    }
}
