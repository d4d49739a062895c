//! Enrichment pipeline orchestration
//!
//! Fan-out/fan-in over the store, resolver, and metadata fetchers:
//! one task per stored record, and a two-way concurrent fetch for
//! title and favicon inside each task. Emission protocol per record:
//!
//! 1. Resolve the alias. A remote 404 deletes the stale local record
//!    (best-effort) and emits nothing; any other failure emits nothing.
//! 2. Emit a partial snapshot with the target URL.
//! 3. If the target URL parses, fetch title and favicon concurrently and
//!    emit a final snapshot; otherwise the partial emission stands alone.
//!
//! The stream completes when every task has finished. Dropping the
//! receiver cancels: senders observe the closed channel and tasks stop
//! without emitting further.

use crate::enrich::{EnrichedLink, LinkIcon, PipelineError, Snapshot, PLACEHOLDER_ICON};
use crate::metadata::MetadataFetcher;
use crate::resolver::{AliasResolver, ResolverError};
use crate::storage::{LinkRecord, LinkStore};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use url::Url;

/// Orchestrates store, resolver, and metadata fetchers into a snapshot
/// stream
pub struct EnrichmentPipeline<S> {
    store: Arc<Mutex<S>>,
    resolver: AliasResolver,
    metadata: MetadataFetcher,
    icon_size: u32,
}

impl<S: LinkStore + Send + 'static> EnrichmentPipeline<S> {
    /// Creates a pipeline over a shared store
    pub fn new(
        store: Arc<Mutex<S>>,
        resolver: AliasResolver,
        metadata: MetadataFetcher,
        icon_size: u32,
    ) -> Self {
        Self {
            store,
            resolver,
            metadata,
            icon_size,
        }
    }

    /// Enriches every stored link, streaming snapshots as they become ready
    ///
    /// Returns the receiving end of the snapshot stream. No ordering is
    /// guaranteed across records; within one record the partial snapshot
    /// always precedes the final one. The channel closes once all records
    /// have been attempted.
    ///
    /// # Errors
    ///
    /// * `PipelineError::Store` - the initial bulk load from the store
    ///   failed; nothing is spawned and nothing is emitted
    pub async fn enrich_all(&self) -> Result<mpsc::UnboundedReceiver<Snapshot>, PipelineError> {
        let records = {
            let store = self.store.lock().unwrap();
            store.load_all()?
        };

        tracing::info!(count = records.len(), "enriching stored links");

        let (tx, rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();

        for record in records {
            tasks.spawn(enrich_record(
                record,
                self.resolver.clone(),
                self.metadata.clone(),
                Arc::clone(&self.store),
                self.icon_size,
                tx.clone(),
            ));
        }

        // The clones held by the tasks keep the channel open; the stream
        // completes when the last task finishes.
        drop(tx);

        tokio::spawn(async move {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    tracing::warn!(error = %e, "enrichment task failed");
                }
            }
        });

        Ok(rx)
    }
}

/// Enriches a single stored record, emitting at most two snapshots
async fn enrich_record<S: LinkStore + Send + 'static>(
    record: LinkRecord,
    resolver: AliasResolver,
    metadata: MetadataFetcher,
    store: Arc<Mutex<S>>,
    icon_size: u32,
    tx: mpsc::UnboundedSender<Snapshot>,
) {
    let resolved = match resolver.resolve(&record.server_id).await {
        Ok(resolved) => resolved,
        Err(ResolverError::NotFound) => {
            // The remote alias no longer exists, so the local pointer is
            // stale. Deletion is best-effort cleanup; a failure here must
            // not surface on the stream.
            tracing::info!(server_id = %record.server_id, "remote alias gone, deleting local record");
            let outcome = store.lock().unwrap().delete(&record.server_id);
            if let Err(e) = outcome {
                tracing::warn!(server_id = %record.server_id, error = %e, "self-healing delete failed");
            }
            return;
        }
        Err(e) => {
            tracing::debug!(server_id = %record.server_id, error = %e, "resolve failed, skipping link");
            return;
        }
    };

    let target = resolved.url;
    let partial = EnrichedLink {
        record: record.clone(),
        url: target.clone(),
        title: None,
        icon: None,
    };
    if tx.send(Snapshot::Partial(partial)).is_err() {
        return;
    }

    // Metadata fetching needs a parseable URL; otherwise the partial
    // emission stands alone.
    let Ok(site_url) = Url::parse(&target) else {
        tracing::debug!(server_id = %record.server_id, url = %target, "target URL does not parse, skipping metadata");
        return;
    };

    if tx.is_closed() {
        return;
    }

    let (title, favicon) = tokio::join!(
        metadata.fetch_page_title(&site_url),
        metadata.fetch_favicon(&site_url, icon_size),
    );

    let title = title.unwrap_or_else(|| target.clone());
    let icon = favicon
        .and_then(|bytes| image::load_from_memory(&bytes).ok())
        .map_or(LinkIcon::Placeholder(PLACEHOLDER_ICON), LinkIcon::Image);

    let enriched = EnrichedLink {
        record,
        url: target,
        title: Some(title),
        icon: Some(icon),
    };
    let _ = tx.send(Snapshot::Final(enriched));
}
