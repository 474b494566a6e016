//! Bulk identity resolution.

use std::collections::HashMap;

use crate::config::{ClientIdStrategy, StorageSettings};
use crate::core::{ResolveMode, TransactionStore};
use crate::error::TransactResult;
use crate::partition::RequestPartition;
use crate::txn::context::TransactionContext;
use crate::txn::prefetch::PrefetchSets;
use crate::types::{LogicalId, PrefetchReason};

/// Picks the resolution mode for a whole batch.
///
/// One reference target anywhere forces the strict mode: a concurrent
/// transaction may have deleted the target after the cross-transaction
/// cache last saw it, and a reference to a deleted resource must be
/// rejected. Direct targets alone can trust the cache, since writing over
/// a deleted resource is legal no matter what the cached status said.
pub(crate) fn resolve_mode_for(reasons: &HashMap<LogicalId, PrefetchReason>) -> ResolveMode {
    if reasons
        .values()
        .any(|reason| *reason == PrefetchReason::ReferenceTarget)
    {
        ResolveMode::IncludeDeletedNoCacheUnlessDeletesDisabled
    } else {
        ResolveMode::IncludeDeletedCacheOk
    }
}

/// Resolves every classified id in one storage round trip and records the
/// results, found or not, in the transaction context.
pub(crate) async fn resolve_entry_ids(
    store: &dyn TransactionStore,
    context: &mut TransactionContext,
    partition: &RequestPartition,
    settings: &StorageSettings,
    reasons: &HashMap<LogicalId, PrefetchReason>,
    sets: &mut PrefetchSets,
) -> TransactResult<()> {
    if reasons.is_empty() {
        return Ok(());
    }

    let ids: Vec<LogicalId> = reasons.keys().cloned().collect();
    let mode = resolve_mode_for(reasons);
    let outcomes = store.resolve_identities(partition, &ids, mode).await?;

    for (id, reason) in reasons {
        match outcomes.get(id) {
            // A reference to a deleted resource is a reference to nothing.
            Some(lookup) if *reason == PrefetchReason::ReferenceTarget && lookup.is_deleted() => {
                context.record_resolved_id(id.clone(), None);
            }
            Some(lookup) => {
                if *reason == PrefetchReason::DirectTarget && wants_body_prefetch(settings, id) {
                    sets.bodies.push(lookup.pid);
                }
                context.record_resolved_id(id.clone(), Some(lookup.pid));
            }
            None => {
                context.record_resolved_id(id.clone(), None);
            }
        }
    }
    Ok(())
}

/// Whether a direct target's current body is worth loading up front.
///
/// Under the `any` id strategy a numeric id part may be a server-assigned
/// sequence value whose row the write phase reads anyway.
fn wants_body_prefetch(settings: &StorageSettings, id: &LogicalId) -> bool {
    settings.client_id_strategy != ClientIdStrategy::Any || !id.id_part_is_numeric()
}
