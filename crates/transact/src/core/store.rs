//! Storage traits for transaction pre-resolution.
//!
//! This module defines the read-side seam between the transaction
//! processor and a concrete backend. The processor batches its lookups;
//! implementations translate each batch into whatever the backend does
//! best (typically a single indexed query per call).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::matchurl::MatchUrlQuery;
use crate::partition::{PartitionFilter, RequestPartition};
use crate::types::{LogicalId, Pid};

/// How identity resolution treats deleted rows and cached mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Deleted rows are returned and cached mappings may be used.
    IncludeDeletedCacheOk,
    /// Deleted rows are returned, but cached mappings are only safe when
    /// the system cannot delete resources. A cached mapping has no deleted
    /// flag, so a recently deleted target would slip through it.
    IncludeDeletedNoCacheUnlessDeletesDisabled,
}

impl ResolveMode {
    /// Whether a cached identity mapping may satisfy the lookup.
    pub fn cache_trusted(&self, deletes_enabled: bool) -> bool {
        match self {
            ResolveMode::IncludeDeletedCacheOk => true,
            ResolveMode::IncludeDeletedNoCacheUnlessDeletesDisabled => !deletes_enabled,
        }
    }
}

/// Resolution result for one logical id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityLookup {
    /// The persistent id the logical id maps to.
    pub pid: Pid,
    /// When the resource was deleted, if it currently is.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl IdentityLookup {
    /// Creates a lookup for a live resource.
    pub fn new(pid: Pid) -> Self {
        IdentityLookup {
            pid,
            deleted_at: None,
        }
    }

    /// Creates a lookup for a deleted resource.
    pub fn deleted(pid: Pid, deleted_at: DateTime<Utc>) -> Self {
        IdentityLookup {
            pid,
            deleted_at: Some(deleted_at),
        }
    }

    /// Returns `true` if the resource is currently deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Which token index column a hash lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashColumn {
    /// Hash over system and value together.
    SystemAndValue,
    /// Hash over the value alone.
    Value,
}

/// One row from a token hash lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenHashRow {
    /// The resource holding the indexed token.
    pub pid: Pid,
    /// The stored hash, echoed back so callers can map rows to queries.
    pub hash: u64,
}

/// Read-side storage operations used during transaction pre-resolution.
///
/// All methods operate on batches. Implementations should issue one
/// backend query per call; the processor already chunks oversized batches
/// before calling.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Resolves logical ids to persistent ids in bulk.
    ///
    /// # Arguments
    ///
    /// * `partition` - The partition scope of the request
    /// * `ids` - The logical ids to resolve
    /// * `mode` - Deleted-row and cache handling for this resolution
    ///
    /// # Returns
    ///
    /// A map holding an entry for every id that exists, deleted or not.
    /// Ids with no entry do not exist.
    ///
    /// # Errors
    ///
    /// * `StoreError::LookupFailed` - If the backend query fails
    async fn resolve_identities(
        &self,
        partition: &RequestPartition,
        ids: &[LogicalId],
        mode: ResolveMode,
    ) -> StoreResult<HashMap<LogicalId, IdentityLookup>>;

    /// Finds resources whose token index contains any of the given hashes.
    ///
    /// # Arguments
    ///
    /// * `filter` - Partition predicate to apply to the index rows
    /// * `column` - Which hash column the values were computed for
    /// * `hashes` - The hashes to probe
    /// * `max_results` - Upper bound on returned rows; implementations
    ///   must stop at this bound so callers can detect overflow
    ///
    /// # Errors
    ///
    /// * `StoreError::LookupFailed` - If the backend query fails
    async fn lookup_token_hashes(
        &self,
        filter: &PartitionFilter,
        column: HashColumn,
        hashes: &[u64],
        max_results: usize,
    ) -> StoreResult<Vec<TokenHashRow>>;

    /// Runs a full search for one conditional expression.
    ///
    /// This is the fallback for expressions the hashed path cannot
    /// aggregate. Implementations should cap the search at two results;
    /// the caller only distinguishes zero, one, and many.
    ///
    /// # Errors
    ///
    /// * `StoreError::SearchFailed` - If the search cannot be executed
    async fn match_search(
        &self,
        partition: &RequestPartition,
        query: &MatchUrlQuery,
    ) -> StoreResult<Vec<Pid>>;

    /// Warms the resource body cache for the given pids.
    ///
    /// # Arguments
    ///
    /// * `pids` - The resources whose current bodies will be read soon
    /// * `include_deleted` - Whether deleted rows should be loaded too
    ///
    /// # Errors
    ///
    /// * `StoreError::LookupFailed` - If the backend query fails
    async fn preload_bodies(&self, pids: &[Pid], include_deleted: bool) -> StoreResult<()>;

    /// Loads current version numbers for the given pids.
    ///
    /// # Errors
    ///
    /// * `StoreError::LookupFailed` - If the backend query fails
    async fn load_versions(&self, pids: &[Pid]) -> StoreResult<Vec<(Pid, i64)>>;

    /// Drops stored conditional-URL records for resources that changed.
    ///
    /// Called after the write phase so stale records never satisfy a
    /// later conditional operation.
    ///
    /// # Errors
    ///
    /// * `StoreError::LookupFailed` - If the backend delete fails
    async fn delete_search_urls(&self, pids: &[Pid]) -> StoreResult<()>;
}
