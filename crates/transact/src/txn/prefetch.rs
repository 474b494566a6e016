//! Prefetch planning and loading.
//!
//! Runs the read side of a batch front to back: classify ids, resolve
//! them, resolve conditional expressions, then bulk-load the bodies and
//! versions the write phase will need. After this module finishes, the
//! write phase never has to ask storage who anything is.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;

use crate::cache::SharedCaches;
use crate::chunk::{chunks, DEFAULT_CHUNK_SIZE};
use crate::config::StorageSettings;
use crate::core::TransactionStore;
use crate::error::TransactResult;
use crate::model::ModelAdapter;
use crate::partition::{PartitionSettings, RequestPartition};
use crate::txn::context::TransactionContext;
use crate::txn::{conditional, extract, resolve};
use crate::types::{BundleEntry, Pid};

/// The persistent ids each prefetch pass has queued for loading.
pub(crate) struct PrefetchSets {
    /// Resources whose current body should be in the body cache.
    pub(crate) bodies: Vec<Pid>,
    /// Resources whose current version alone is needed.
    pub(crate) versions: HashSet<Pid>,
}

impl PrefetchSets {
    pub(crate) fn new() -> Self {
        PrefetchSets {
            bodies: Vec::new(),
            versions: HashSet::new(),
        }
    }
}

/// Resolves and prefetches everything a bundle will touch.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn prefetch_bundle(
    store: &dyn TransactionStore,
    caches: &Arc<SharedCaches>,
    adapter: &dyn ModelAdapter,
    settings: &StorageSettings,
    partition_settings: &PartitionSettings,
    partition: &RequestPartition,
    context: &mut TransactionContext,
    entries: &[BundleEntry],
) -> TransactResult<()> {
    let mut sets = PrefetchSets::new();

    let reasons = extract::classify_prefetch_ids(entries, adapter);
    resolve::resolve_entry_ids(store, context, partition, settings, &reasons, &mut sets).await?;

    let requests = extract::collect_conditional_requests(entries, adapter, settings);
    conditional::resolve_conditional_urls(
        store,
        caches,
        context,
        adapter,
        settings,
        partition_settings,
        partition,
        requests,
        &mut sets,
    )
    .await?;

    preload_bodies(store, &sets.bodies).await?;
    prefetch_versions(store, caches, context, &sets.versions).await?;
    Ok(())
}

/// Warms the body cache in bounded chunks. Deleted rows are loaded too:
/// a direct target may be a tombstone about to be written over.
async fn preload_bodies(store: &dyn TransactionStore, bodies: &[Pid]) -> TransactResult<()> {
    if bodies.is_empty() {
        return Ok(());
    }
    let mut pids = bodies.to_vec();
    pids.sort();
    pids.dedup();
    for chunk in chunks(&pids, DEFAULT_CHUNK_SIZE) {
        store.preload_bodies(chunk, true).await?;
    }
    Ok(())
}

/// Fills in current versions, preferring the shared version cache and
/// querying storage only for the remainder.
///
/// Fresh versions are published back to the shared cache only after the
/// surrounding transaction commits; publishing earlier would let a rolled
/// back transaction poison the cache.
async fn prefetch_versions(
    store: &dyn TransactionStore,
    caches: &Arc<SharedCaches>,
    context: &mut TransactionContext,
    versions: &HashSet<Pid>,
) -> TransactResult<()> {
    if versions.is_empty() {
        return Ok(());
    }
    trace!("Versions to fetch: {:?}", versions);

    let mut remaining: Vec<Pid> = Vec::new();
    for &pid in versions {
        match caches.lookup_version(pid) {
            Some(version) => context.record_version(pid, version),
            None => remaining.push(pid),
        }
    }
    remaining.sort();

    for chunk in chunks(&remaining, DEFAULT_CHUNK_SIZE) {
        for (pid, version) in store.load_versions(chunk).await? {
            context.record_version(pid, version);
            let caches = Arc::clone(caches);
            context.queue_commit_hook(move || caches.store_version(pid, version));
        }
    }
    Ok(())
}
