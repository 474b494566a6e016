//! The transaction processor.
//!
//! Drives one bundle through its two phases: a read-only prefetch pass that
//! resolves every identity, conditional expression, body, and version the
//! bundle will touch, followed by an ordered write pass that executes entries
//! through the [`WriteExecutor`] seam. The surrounding storage transaction is
//! owned by the caller; the processor only sees its [`WriteSession`].

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::cache::SharedCaches;
use crate::config::StorageSettings;
use crate::core::{FlushMode, FlushModeGuard, TransactionStore, WriteExecutor, WriteSession};
use crate::error::{FlushError, TransactResult};
use crate::model::ModelAdapter;
use crate::partition::{PartitionSettings, RequestPartition};
use crate::txn::context::TransactionContext;
use crate::txn::prefetch;
use crate::types::{BundleEntry, BundleMethod, EntryOutcomes, TransactionBundle, WriteAction};

/// What processing one bundle leaves behind.
///
/// The outcomes are available immediately, but the shared caches must not
/// learn anything from a transaction that might still roll back, so cache
/// publication is deferred until the caller reports the commit.
pub struct ProcessedBundle {
    outcomes: EntryOutcomes,
    commit_hooks: Vec<Box<dyn FnOnce() + Send + Sync>>,
}

impl std::fmt::Debug for ProcessedBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessedBundle")
            .field("outcomes", &self.outcomes)
            .field("commit_hooks", &self.commit_hooks.len())
            .finish()
    }
}

impl ProcessedBundle {
    /// Returns the per-entry outcomes of the write phase.
    pub fn outcomes(&self) -> &EntryOutcomes {
        &self.outcomes
    }

    /// Consumes the result after a successful commit, running the deferred
    /// cache publication work.
    pub fn committed(mut self) -> EntryOutcomes {
        for hook in self.commit_hooks.drain(..) {
            hook();
        }
        self.outcomes
    }

    /// Consumes the result after a rollback, discarding the deferred work.
    pub fn rolled_back(self) -> EntryOutcomes {
        self.outcomes
    }
}

/// Processes transaction bundles against a backing store.
///
/// One processor serves many transactions: it owns the long-lived pieces
/// (store, executor, model, shared caches, settings), while the per-request
/// pieces (partition scope, write session, bundle) arrive with each
/// [`process`](TransactionProcessor::process) call.
///
/// # Examples
///
/// ```ignore
/// let processor = TransactionProcessor::new(store, executor, adapter)
///     .with_settings(StorageSettings::default());
///
/// let processed = processor
///     .process(session.as_ref(), &RequestPartition::Default, &bundle)
///     .await?;
/// // ... commit the surrounding transaction ...
/// let outcomes = processed.committed();
/// ```
pub struct TransactionProcessor {
    store: Arc<dyn TransactionStore>,
    executor: Arc<dyn WriteExecutor>,
    adapter: Arc<dyn ModelAdapter>,
    caches: Arc<SharedCaches>,
    settings: StorageSettings,
    partition_settings: PartitionSettings,
}

impl TransactionProcessor {
    /// Creates a processor with default settings and fresh shared caches.
    pub fn new(
        store: Arc<dyn TransactionStore>,
        executor: Arc<dyn WriteExecutor>,
        adapter: Arc<dyn ModelAdapter>,
    ) -> Self {
        Self {
            store,
            executor,
            adapter,
            caches: Arc::new(SharedCaches::new()),
            settings: StorageSettings::default(),
            partition_settings: PartitionSettings::default(),
        }
    }

    /// Shares caches with other processors, or with tests that seed them.
    pub fn with_caches(mut self, caches: Arc<SharedCaches>) -> Self {
        self.caches = caches;
        self
    }

    /// Overrides the storage policy settings.
    pub fn with_settings(mut self, settings: StorageSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Overrides the partition behavior of the backing store.
    pub fn with_partition_settings(mut self, settings: PartitionSettings) -> Self {
        self.partition_settings = settings;
        self
    }

    /// Processes one bundle inside the caller's storage transaction.
    ///
    /// The session is switched to commit-only flushing for the duration of
    /// the call and restored afterwards, on error paths included. Entries
    /// execute in bundle order; buffered writes are flushed whenever the
    /// HTTP verb changes from one entry to the next, and once more after the
    /// last entry, so storage applies writes in the order clients observe.
    ///
    /// # Arguments
    ///
    /// * `session` - The write session of the surrounding transaction
    /// * `partition` - The partition scope every lookup and write must honor
    /// * `bundle` - The ordered entries to execute
    ///
    /// # Returns
    ///
    /// The per-entry outcomes, wrapped so that shared-cache publication can
    /// be deferred until the caller commits.
    ///
    /// # Errors
    ///
    /// Returns a request error for malformed or ambiguous conditional
    /// expressions, a store error when a lookup fails, and a flush error
    /// (naming the resource types in the bundle) when the session cannot
    /// apply buffered writes.
    pub async fn process(
        &self,
        session: &dyn WriteSession,
        partition: &RequestPartition,
        bundle: &TransactionBundle,
    ) -> TransactResult<ProcessedBundle> {
        let mut context = TransactionContext::new();
        let _guard = FlushModeGuard::hold(session, FlushMode::Commit);

        prefetch::prefetch_bundle(
            self.store.as_ref(),
            &self.caches,
            self.adapter.as_ref(),
            &self.settings,
            &self.partition_settings,
            partition,
            &mut context,
            bundle.entries(),
        )
        .await?;

        self.execute_writes(session, partition, &mut context, bundle.entries())
            .await?;

        let updated = context.updated_resource_ids();
        if !updated.is_empty() {
            self.store.delete_search_urls(&updated).await?;
        }

        let commit_hooks = context.take_commit_hooks();
        Ok(ProcessedBundle {
            outcomes: context.into_outcomes(),
            commit_hooks,
        })
    }

    async fn execute_writes(
        &self,
        session: &dyn WriteSession,
        partition: &RequestPartition,
        context: &mut TransactionContext,
        entries: &[BundleEntry],
    ) -> TransactResult<()> {
        let mut active_verb: Option<BundleMethod> = None;
        for (index, entry) in entries.iter().enumerate() {
            // Writes buffered under one verb must land before the next verb
            // starts reading.
            if let Some(previous) = active_verb {
                if previous != entry.method {
                    self.flush_session(session, context).await?;
                }
            }
            active_verb = Some(entry.method);

            let outcome = self.executor.execute(context, partition, index, entry).await?;

            let resolved = match outcome.action {
                WriteAction::Deleted => None,
                _ => outcome.pid,
            };
            context.record_resolved_id(outcome.id.clone(), resolved);
            if let (Some(pid), Some(version)) = (outcome.pid, outcome.version) {
                context.record_version(pid, version);
            }
            context.record_outcome(index, outcome);
        }

        if active_verb.is_some() {
            self.flush_session(session, context).await?;
        }
        Ok(())
    }

    async fn flush_session(
        &self,
        session: &dyn WriteSession,
        context: &TransactionContext,
    ) -> TransactResult<()> {
        let inserts = session.pending_inserts();
        let updates = session.pending_updates();
        let start = Instant::now();
        match session.flush().await {
            Ok(()) => {
                debug!(
                    "Session flush took {}ms for {} inserts and {} updates",
                    start.elapsed().as_millis(),
                    inserts,
                    updates
                );
                Ok(())
            }
            Err(source) => Err(FlushError::Failed {
                resource_types: context.outcomes().describe_resource_types(),
                source,
            }
            .into()),
        }
    }
}
