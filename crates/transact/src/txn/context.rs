//! Per-batch resolution state.

use std::collections::{HashMap, HashSet};

use crate::types::{EntryOutcome, EntryOutcomes, LogicalId, Pid, WriteAction};

/// State accumulated while processing one bundle.
///
/// The context is constructed once per batch and threaded through every
/// phase as an argument. It holds the transaction-scoped resolution
/// caches, so a second lookup of an identity or expression already
/// resolved in this batch never reaches storage. A recorded `None` is the
/// explicit not-found sentinel, distinct from a key that was never
/// resolved at all.
#[derive(Default)]
pub struct TransactionContext {
    resolved_ids: HashMap<LogicalId, Option<Pid>>,
    resolved_match_urls: HashMap<String, Option<Pid>>,
    resolved_versions: HashMap<Pid, i64>,
    updated_ids: HashSet<Pid>,
    commit_hooks: Vec<Box<dyn FnOnce() + Send + Sync>>,
    outcomes: EntryOutcomes,
}

impl TransactionContext {
    /// Creates an empty context for one batch.
    pub fn new() -> Self {
        TransactionContext::default()
    }

    /// Records the resolution of a logical id. `None` means the id is
    /// known not to exist.
    pub fn record_resolved_id(&mut self, id: LogicalId, pid: Option<Pid>) {
        self.resolved_ids.insert(id, pid);
    }

    /// Looks up a previously recorded id resolution.
    ///
    /// The outer `Option` is whether the id was resolved in this batch at
    /// all; the inner one is whether it exists.
    pub fn resolved_id(&self, id: &LogicalId) -> Option<Option<Pid>> {
        self.resolved_ids.get(id).copied()
    }

    /// Records the resolution of a conditional expression. `None` means
    /// the expression is known to match nothing.
    pub fn record_match_url(&mut self, url: impl Into<String>, pid: Option<Pid>) {
        self.resolved_match_urls.insert(url.into(), pid);
    }

    /// Looks up a previously recorded conditional expression resolution.
    pub fn resolved_match_url(&self, url: &str) -> Option<Option<Pid>> {
        self.resolved_match_urls.get(url).copied()
    }

    /// Records the current version of a resource.
    pub fn record_version(&mut self, pid: Pid, version: i64) {
        self.resolved_versions.insert(pid, version);
    }

    /// Looks up a version recorded by prefetch.
    pub fn resolved_version(&self, pid: Pid) -> Option<i64> {
        self.resolved_versions.get(&pid).copied()
    }

    /// Queues work to run after the surrounding transaction commits.
    pub fn queue_commit_hook(&mut self, hook: impl FnOnce() + Send + Sync + 'static) {
        self.commit_hooks.push(Box::new(hook));
    }

    /// Takes the queued commit hooks, leaving none behind. The caller
    /// runs them only once the transaction has committed.
    pub fn take_commit_hooks(&mut self) -> Vec<Box<dyn FnOnce() + Send + Sync>> {
        std::mem::take(&mut self.commit_hooks)
    }

    /// Records the outcome of one entry.
    pub fn record_outcome(&mut self, index: usize, outcome: EntryOutcome) {
        if let Some(pid) = outcome.pid {
            if matches!(
                outcome.action,
                WriteAction::Updated | WriteAction::Patched | WriteAction::Deleted
            ) {
                self.updated_ids.insert(pid);
            }
        }
        self.outcomes.record(index, outcome);
    }

    /// Resources whose stored state changed in place during this batch,
    /// sorted for deterministic processing.
    pub fn updated_resource_ids(&self) -> Vec<Pid> {
        let mut ids: Vec<Pid> = self.updated_ids.iter().copied().collect();
        ids.sort();
        ids
    }

    /// The outcomes recorded so far, in submission order.
    pub fn outcomes(&self) -> &EntryOutcomes {
        &self.outcomes
    }

    /// Consumes the context, yielding the final outcome map.
    pub fn into_outcomes(self) -> EntryOutcomes {
        self.outcomes
    }
}
