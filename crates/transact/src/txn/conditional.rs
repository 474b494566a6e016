//! Batched resolution of conditional expressions.
//!
//! Token-equality dominates conditional URLs, so every candidate that
//! reduces to a single token predicate is folded into one hashed index
//! lookup per chunk. Everything else falls back to a per-expression
//! search. Either way a candidate resolves to at most one persistent id;
//! a second distinct id for the same expression is a client error.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::SharedCaches;
use crate::chunk::DEFAULT_CHUNK_SIZE;
use crate::config::StorageSettings;
use crate::core::{HashColumn, TransactionStore};
use crate::error::{RequestError, TransactResult};
use crate::matchurl::{
    hash_token_system_and_value, hash_token_value, parse_match_url, MatchUrlPattern,
    MatchUrlQuery, ParamValue,
};
use crate::model::ModelAdapter;
use crate::partition::{PartitionFilter, PartitionId, PartitionSettings, RequestPartition};
use crate::txn::context::TransactionContext;
use crate::txn::extract::ConditionalRequest;
use crate::txn::prefetch::PrefetchSets;
use crate::types::Pid;

/// One admitted conditional expression awaiting resolution.
#[derive(Debug, Clone)]
pub(crate) struct MatchUrlCandidate {
    expression: String,
    query: MatchUrlQuery,
    prefetch_body: bool,
    prefetch_version: bool,
    hash_system_and_value: Option<u64>,
    hash_value: Option<u64>,
    resolved: Option<Pid>,
}

/// Resolves all collected conditional expressions against storage.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn resolve_conditional_urls(
    store: &dyn TransactionStore,
    caches: &Arc<SharedCaches>,
    context: &mut TransactionContext,
    adapter: &dyn ModelAdapter,
    settings: &StorageSettings,
    partition_settings: &PartitionSettings,
    partition: &RequestPartition,
    requests: Vec<ConditionalRequest>,
    sets: &mut PrefetchSets,
) -> TransactResult<()> {
    if requests.is_empty() {
        return Ok(());
    }

    let pattern = MatchUrlPattern::new();
    let mut candidates = admit_requests(
        requests, adapter, caches, settings, partition, &pattern, context, sets,
    )?;

    let hash_partition = if partition_settings.include_partition_in_search_hashes {
        partition.sole_id(partition_settings)
    } else {
        None
    };
    let filter = PartitionFilter::for_hash_lookup(partition_settings, partition);

    for chunk in candidates.chunks_mut(DEFAULT_CHUNK_SIZE) {
        resolve_chunk(
            store,
            caches,
            context,
            settings,
            partition,
            &filter,
            hash_partition,
            chunk,
            sets,
        )
        .await?;
    }
    Ok(())
}

/// Turns collected requests into candidates, consuming what the shared
/// cache already knows.
///
/// An expression with a cache hit is recorded and never becomes a
/// candidate. An expression failing the shape check is dropped without
/// error; the write phase resolves it on its own. Shaped expressions must
/// name a known resource type and parse against its definition.
#[allow(clippy::too_many_arguments)]
fn admit_requests(
    requests: Vec<ConditionalRequest>,
    adapter: &dyn ModelAdapter,
    caches: &Arc<SharedCaches>,
    settings: &StorageSettings,
    partition: &RequestPartition,
    pattern: &MatchUrlPattern,
    context: &mut TransactionContext,
    sets: &mut PrefetchSets,
) -> TransactResult<Vec<MatchUrlCandidate>> {
    let mut candidates = Vec::new();
    for request in requests {
        if settings.match_url_cache_enabled {
            if let Some(pid) =
                caches.lookup_match_url(&request.resource_type, &request.expression, partition)
            {
                if request.prefetch_body {
                    sets.bodies.push(pid);
                }
                context.record_match_url(request.expression, Some(pid));
                continue;
            }
        }
        if !pattern.is_match(&request.expression) {
            continue;
        }
        let definition = adapter
            .resource_definition(&request.resource_type)
            .ok_or_else(|| RequestError::UnknownResourceType {
                resource_type: request.resource_type.clone(),
            })?;
        let query = parse_match_url(&request.expression, &definition)?;
        candidates.push(MatchUrlCandidate {
            expression: request.expression,
            query,
            prefetch_body: request.prefetch_body,
            prefetch_version: request.prefetch_version,
            hash_system_and_value: None,
            hash_value: None,
            resolved: None,
        });
    }
    Ok(candidates)
}

/// Resolves one chunk of candidates: hashed lookups for the aggregable
/// ones, per-expression searches for the rest, then not-found records for
/// whatever neither path matched.
#[allow(clippy::too_many_arguments)]
async fn resolve_chunk(
    store: &dyn TransactionStore,
    caches: &Arc<SharedCaches>,
    context: &mut TransactionContext,
    settings: &StorageSettings,
    partition: &RequestPartition,
    filter: &PartitionFilter,
    hash_partition: Option<PartitionId>,
    chunk: &mut [MatchUrlCandidate],
    sets: &mut PrefetchSets,
) -> TransactResult<()> {
    let mut by_system_and_value: HashMap<u64, Vec<usize>> = HashMap::new();
    let mut by_value: HashMap<u64, Vec<usize>> = HashMap::new();
    let mut fallback: Vec<usize> = Vec::new();

    for (idx, candidate) in chunk.iter_mut().enumerate() {
        match aggregate_hash(&candidate.query, hash_partition) {
            Some(AggregateHash::SystemAndValue(hash)) => {
                candidate.hash_system_and_value = Some(hash);
                by_system_and_value.entry(hash).or_default().push(idx);
            }
            Some(AggregateHash::Value(hash)) => {
                candidate.hash_value = Some(hash);
                by_value.entry(hash).or_default().push(idx);
            }
            None => fallback.push(idx),
        }
    }

    lookup_hashes(
        store,
        caches,
        context,
        settings,
        partition,
        filter,
        HashColumn::SystemAndValue,
        &by_system_and_value,
        chunk,
        sets,
    )
    .await?;
    lookup_hashes(
        store,
        caches,
        context,
        settings,
        partition,
        filter,
        HashColumn::Value,
        &by_value,
        chunk,
        sets,
    )
    .await?;

    for idx in fallback {
        let pids = store.match_search(partition, &chunk[idx].query).await?;
        for pid in pids {
            handle_found(caches, context, settings, partition, &mut chunk[idx], pid, sets)?;
        }
    }

    for candidate in chunk.iter() {
        if candidate.resolved.is_none() {
            debug!("Was unable to match url {} from database", candidate.expression);
            context.record_match_url(candidate.expression.clone(), None);
        }
    }
    Ok(())
}

/// Issues one hashed index lookup and fans every returned row out to all
/// candidates sharing its hash.
#[allow(clippy::too_many_arguments)]
async fn lookup_hashes(
    store: &dyn TransactionStore,
    caches: &Arc<SharedCaches>,
    context: &mut TransactionContext,
    settings: &StorageSettings,
    partition: &RequestPartition,
    filter: &PartitionFilter,
    column: HashColumn,
    by_hash: &HashMap<u64, Vec<usize>>,
    chunk: &mut [MatchUrlCandidate],
    sets: &mut PrefetchSets,
) -> TransactResult<()> {
    if by_hash.is_empty() {
        return Ok(());
    }

    let hashes: Vec<u64> = by_hash.keys().copied().collect();
    // One row per hash is the contract; the +1 leaves room to notice an
    // ambiguous expression instead of silently truncating it away.
    let max_results = hashes.len() + 1;
    let rows = store
        .lookup_token_hashes(filter, column, &hashes, max_results)
        .await?;

    for row in rows {
        if let Some(indices) = by_hash.get(&row.hash) {
            for &idx in indices {
                handle_found(
                    caches,
                    context,
                    settings,
                    partition,
                    &mut chunk[idx],
                    row.pid,
                    sets,
                )?;
            }
        }
    }
    Ok(())
}

/// Marks one candidate resolved and records the match everywhere it is
/// needed: prefetch sets, the transaction cache, and (after the
/// surrounding transaction commits) the shared cache.
fn handle_found(
    caches: &Arc<SharedCaches>,
    context: &mut TransactionContext,
    settings: &StorageSettings,
    partition: &RequestPartition,
    candidate: &mut MatchUrlCandidate,
    pid: Pid,
    sets: &mut PrefetchSets,
) -> TransactResult<()> {
    match candidate.resolved {
        Some(existing) if existing != pid => {
            return Err(RequestError::AmbiguousMatchUrl {
                url: candidate.expression.clone(),
            }
            .into());
        }
        // The same row can surface more than once; only the first counts.
        Some(_) => return Ok(()),
        None => {}
    }

    debug!("Matched url {} from database", candidate.expression);
    candidate.resolved = Some(pid);
    if candidate.prefetch_body {
        sets.bodies.push(pid);
    }
    if candidate.prefetch_version {
        sets.versions.insert(pid);
    }
    if settings.match_url_cache_enabled {
        let caches = Arc::clone(caches);
        let resource_type = candidate.query.resource_type().to_string();
        let expression = candidate.expression.clone();
        let partition = partition.clone();
        context.queue_commit_hook(move || {
            caches.store_match_url(&resource_type, &expression, &partition, pid);
        });
    }
    context.record_match_url(candidate.expression.clone(), Some(pid));
    Ok(())
}

enum AggregateHash {
    SystemAndValue(u64),
    Value(u64),
}

/// Computes the hash for a candidate on the aggregate path, or `None` for
/// candidates that must fall back to a full search.
///
/// When both system and value are non-blank the stronger system+value
/// hash is always preferred; a candidate never lands in both columns.
fn aggregate_hash(query: &MatchUrlQuery, partition: Option<PartitionId>) -> Option<AggregateHash> {
    let (name, token) = query.single_token()?;
    let ParamValue::Token { system, value } = token else {
        return None;
    };
    if value.trim().is_empty() {
        return None;
    }
    match system.as_deref() {
        Some(system) if !system.trim().is_empty() => Some(AggregateHash::SystemAndValue(
            hash_token_system_and_value(partition, query.resource_type(), name, system, value),
        )),
        _ => Some(AggregateHash::Value(hash_token_value(
            partition,
            query.resource_type(),
            name,
            value,
        ))),
    }
}
