use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::db::store::CatalogStore;
use crate::models::{Enrichment, Title};
use crate::services::providers::RatingProvider;

/// Cache-aside enrichment of titles with third-party rating/poster data
///
/// The title record itself is the cache: a read that finds the fetched flag
/// or a populated enrichment field returns immediately. On a miss the
/// provider is called by (name, release year) and any data found is written
/// back to the store through a detached background writer, so the read path
/// never waits on the write. All provider failures degrade to empty
/// enrichment; `enrich` cannot fail.
pub struct EnrichmentCache {
    provider: Arc<dyn RatingProvider>,
    write_tx: mpsc::UnboundedSender<EnrichmentWrite>,
}

struct EnrichmentWrite {
    title_id: Uuid,
    enrichment: Enrichment,
}

/// Handle for gracefully shutting down the enrichment writer
pub struct EnrichmentWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl EnrichmentWriterHandle {
    /// Signals the writer task to flush queued write-backs and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Enrichment writer shutdown signal sent");
    }
}

impl EnrichmentCache {
    /// Creates the cache and spawns its store write-back task.
    ///
    /// The writer task is process-wide: it outlives individual requests and
    /// keeps applying queued writes after their originating reads return.
    pub fn new(
        provider: Arc<dyn RatingProvider>,
        store: Arc<dyn CatalogStore>,
    ) -> (Arc<Self>, EnrichmentWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            Self::writer_task(store, write_rx, shutdown_rx).await;
        });

        let cache = Arc::new(Self { provider, write_tx });

        (cache, EnrichmentWriterHandle { shutdown_tx })
    }

    /// Applies queued write-backs until shutdown, then drains what remains.
    /// Failures are logged, never propagated: the write-back is best-effort
    /// and its outcome is unobserved by the read path.
    async fn writer_task(
        store: Arc<dyn CatalogStore>,
        mut write_rx: mpsc::UnboundedReceiver<EnrichmentWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Enrichment writer task started");

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    Self::apply_write(&store, write).await;
                }
                _ = shutdown_rx.recv() => {
                    while let Ok(write) = write_rx.try_recv() {
                        Self::apply_write(&store, write).await;
                    }
                    tracing::info!("Enrichment writer task stopped");
                    break;
                }
                else => break,
            }
        }
    }

    async fn apply_write(store: &Arc<dyn CatalogStore>, write: EnrichmentWrite) {
        if let Err(e) = store.apply_enrichment(write.title_id, &write.enrichment).await {
            tracing::error!(
                error = %e,
                title_id = %write.title_id,
                "Failed to write back enrichment"
            );
        }
    }

    /// Returns the best-available poster/rating pair for a title.
    ///
    /// Cached fields win; otherwise one provider round trip is made and, if
    /// it found anything, the result is queued for write-back. Two readers
    /// racing on the same cold title may both call the provider; the writes
    /// carry identical values, so last-write-wins is harmless.
    pub async fn enrich(&self, title: &Title) -> Enrichment {
        if title.imdb_fetched || title.poster.is_some() || title.imdb_rating.is_some() {
            tracing::debug!(title_id = %title.id, "Enrichment cache hit");
            return Enrichment {
                poster: title.poster.clone(),
                imdb_rating: title.imdb_rating.clone(),
            };
        }

        tracing::debug!(title_id = %title.id, name = %title.name, "Enrichment cache miss");

        let lookup = match self.provider.lookup(&title.name, title.release_year).await {
            Ok(lookup) => lookup,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    title_id = %title.id,
                    provider = self.provider.name(),
                    "Rating lookup failed, serving without enrichment"
                );
                return Enrichment::default();
            }
        };

        let enrichment = Enrichment {
            poster: lookup.poster.clone(),
            imdb_rating: lookup.imdb_rating.clone(),
        };

        // Persist the fetched flag only when the provider had something;
        // a title the provider knows nothing about stays eligible for a
        // retry on a later read.
        if lookup.has_data() {
            let write = EnrichmentWrite {
                title_id: title.id,
                enrichment: enrichment.clone(),
            };
            if let Err(e) = self.write_tx.send(write) {
                tracing::error!(error = %e, "Failed to queue enrichment write-back");
            }
        }

        enrichment
    }

    /// Enriches every title of a page concurrently and in place.
    ///
    /// Fan-out/fan-in: one sub-task per title, all awaited before returning,
    /// results placed back at their original positions. A slow provider
    /// response for one title never delays a cache hit for another.
    pub async fn enrich_page(self: &Arc<Self>, titles: &mut [Title]) {
        let mut tasks = Vec::with_capacity(titles.len());

        for title in titles.iter() {
            let cache = Arc::clone(self);
            let title = title.clone();
            tasks.push(tokio::spawn(async move { cache.enrich(&title).await }));
        }

        for (title, task) in titles.iter_mut().zip(tasks) {
            match task.await {
                Ok(enrichment) => title.apply_enrichment(enrichment),
                Err(e) => {
                    tracing::error!(error = %e, title_id = %title.id, "Enrichment task failed");
                }
            }
        }
    }
}
