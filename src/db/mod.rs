pub mod cache;
pub mod postgres;
pub mod predicate;
pub mod store;

pub use cache::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use postgres::{create_pool, PgCatalog, PgUsers};
pub use predicate::{TitlePredicate, KID_RATINGS, MATURE_RATINGS};
pub use store::{CatalogStore, UserStore};
